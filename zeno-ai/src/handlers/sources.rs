use std::sync::Arc;

use async_trait::async_trait;
use storage::{GroundingLink, LinkStore, MarkSent};
use tracing::{info, instrument, warn};
use zeno_core::{Bot, CallbackEvent, CallbackHandler, Result, SendOptions, TextFormat, ZenoError};

use crate::reconciler::SOURCES_PREFIX;
use crate::render::{escape_html, TELEGRAM_TEXT_LIMIT};

const ACK_SENT: &str = "Sources sent.";
const ACK_ALREADY_SENT: &str = "Sources already sent.";
const ACK_EXPIRED: &str = "Sources expired.";
const ACK_FAILED: &str = "Couldn't send sources. Try again.";

/// Numbered HTML list of links, cut off before Telegram's length limit.
pub(crate) fn format_sources(links: &[GroundingLink]) -> String {
    let mut out = String::from("<b>Sources</b>\n");
    for (i, link) in links.iter().enumerate() {
        let title = if link.title.trim().is_empty() {
            link.uri.as_str()
        } else {
            link.title.as_str()
        };
        let line = format!(
            "{}. <a href=\"{}\">{}</a>\n",
            i + 1,
            escape_html(&link.uri),
            escape_html(title)
        );
        if out.chars().count() + line.chars().count() > TELEGRAM_TEXT_LIMIT {
            break;
        }
        out.push_str(&line);
    }
    out.trim_end().to_string()
}

/// "Show sources": delivers a stored link set once, replying to the answer, then removes the button.
pub struct SourcesCallback {
    bot: Arc<dyn Bot>,
    links: Arc<dyn LinkStore>,
}

impl SourcesCallback {
    pub fn new(bot: Arc<dyn Bot>, links: Arc<dyn LinkStore>) -> Self {
        Self { bot, links }
    }

    async fn clear_button(&self, chat_id: i64, message_id: i32) {
        if let Err(e) = self.bot.clear_actions(chat_id, message_id).await {
            warn!(chat_id, message_id, error = %e, "Failed to remove sources button");
        }
    }
}

#[async_trait]
impl CallbackHandler for SourcesCallback {
    #[instrument(skip(self, event), fields(user_id = event.from.id, data = %event.data))]
    async fn handle_callback(&self, event: &CallbackEvent) -> Result<Option<String>> {
        let Some(id) = event.data.strip_prefix(SOURCES_PREFIX) else {
            return Ok(None);
        };
        let (Some(chat_id), Some(message_id)) = (event.chat_id, event.message_id) else {
            return Ok(Some(ACK_EXPIRED.to_string()));
        };

        let record = self
            .links
            .find_links(id)
            .await
            .map_err(|e| ZenoError::Database(e.to_string()))?;
        let Some(record) = record else {
            self.clear_button(chat_id, message_id).await;
            return Ok(Some(ACK_EXPIRED.to_string()));
        };

        let marked = self
            .links
            .mark_sent(id)
            .await
            .map_err(|e| ZenoError::Database(e.to_string()))?;
        match marked {
            MarkSent::Marked => {
                let options = SendOptions::reply_to(message_id).with_format(TextFormat::Html);
                if let Err(e) = self
                    .bot
                    .send_message(chat_id, &format_sources(&record.links), &options)
                    .await
                {
                    warn!(chat_id, sources_id = %id, error = %e, "Failed to send sources");
                    if let Err(e) = self.links.reset_sent(id).await {
                        warn!(sources_id = %id, error = %e, "Failed to release sources after a failed send");
                    }
                    return Ok(Some(ACK_FAILED.to_string()));
                }
                self.clear_button(chat_id, message_id).await;
                info!(chat_id, sources_id = %id, count = record.links.len(), "Sources delivered");
                Ok(Some(ACK_SENT.to_string()))
            }
            MarkSent::AlreadySent => {
                self.clear_button(chat_id, message_id).await;
                Ok(Some(ACK_ALREADY_SENT.to_string()))
            }
            MarkSent::NotFound => Ok(Some(ACK_EXPIRED.to_string())),
        }
    }
}
