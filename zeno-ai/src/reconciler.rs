//! Response reconciliation: the placeholder message, interim status edits and the final answer.
//!
//! The final answer may strip `[IMAGE: …]` directives (enqueued for the image worker), is rendered for the
//! pathway that produced it, carries the "Show sources" control when grounding links were stored, and overflows
//! to Telegraph (or several messages) past Telegram's length limit.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use zeno_core::{Bot, InlineAction, SendOptions, TextFormat};

use crate::directive::extract_image_directives;
use crate::engine::ProgressSink;
use crate::error::AiError;
use crate::image_worker::{ImageJob, ImageQueue};
use crate::render::{chunk_text, markdown_to_html, TELEGRAM_TEXT_LIMIT};
use crate::telegraph::Publisher;

pub const PLACEHOLDER_TEXT: &str = "...";
pub const GENERATING_IMAGE_TEXT: &str = "Generating image...";
pub const SOURCES_LABEL: &str = "Show sources";
pub const SOURCES_PREFIX: &str = "sources:";
const QUEUE_BUSY_NOTE: &str = "(Couldn't queue the image right now, try again in a bit.)";
/// Leaves room for the tags markdown rendering adds.
const MARKDOWN_CHUNK_CHARS: usize = 3500;

/// How the final text is shown. Chosen by the pathway, never guessed from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    Plain,
    Markdown,
}

#[derive(Debug, Clone)]
pub struct FinalAnswer {
    pub text: String,
    pub rendering: Rendering,
    pub sources_id: Option<String>,
    /// Strip `[IMAGE: …]` directives and enqueue them.
    pub image_directives: bool,
    /// Title used if the answer has to be published elsewhere.
    pub title: String,
}

#[derive(Clone)]
pub struct Reconciler {
    bot: Arc<dyn Bot>,
    image_queue: ImageQueue,
    publisher: Option<Arc<dyn Publisher>>,
}

impl Reconciler {
    pub fn new(bot: Arc<dyn Bot>, image_queue: ImageQueue, publisher: Option<Arc<dyn Publisher>>) -> Self {
        Self {
            bot,
            image_queue,
            publisher,
        }
    }

    /// Sends the placeholder replying to `reply_to`. Failure here aborts the turn.
    pub async fn open(&self, chat_id: i64, reply_to: i32) -> Result<Placeholder, AiError> {
        let message_id = self
            .bot
            .send_message(chat_id, PLACEHOLDER_TEXT, &SendOptions::reply_to(reply_to))
            .await?;
        debug!(chat_id, message_id, "Placeholder sent");
        Ok(Placeholder {
            reconciler: self.clone(),
            chat_id,
            message_id,
            reply_to,
        })
    }
}

/// One sent placeholder, edited in place until the answer is final.
pub struct Placeholder {
    reconciler: Reconciler,
    chat_id: i64,
    message_id: i32,
    reply_to: i32,
}

fn sources_action(sources_id: Option<&str>) -> Option<InlineAction> {
    sources_id.map(|id| InlineAction::new(SOURCES_LABEL, format!("{}{}", SOURCES_PREFIX, id)))
}

fn render(text: &str, rendering: Rendering) -> (String, TextFormat) {
    match rendering {
        Rendering::Plain => (text.to_string(), TextFormat::Plain),
        Rendering::Markdown => (markdown_to_html(text), TextFormat::Html),
    }
}

impl Placeholder {
    pub fn message_id(&self) -> i32 {
        self.message_id
    }

    fn bot(&self) -> &Arc<dyn Bot> {
        &self.reconciler.bot
    }

    /// Interim status. Failures are logged and ignored.
    pub async fn status(&self, text: &str) {
        if let Err(e) = self
            .bot()
            .edit_message(self.chat_id, self.message_id, text, &SendOptions::default())
            .await
        {
            warn!(chat_id = self.chat_id, message_id = self.message_id, error = %e, "Status edit failed");
        }
    }

    /// Replaces the placeholder with a user-facing error text.
    pub async fn fail(&self, text: &str) {
        self.status(text).await;
    }

    fn enqueue_images(&self, prompts: Vec<String>) -> bool {
        let mut all_queued = true;
        for prompt in prompts {
            let job = ImageJob {
                prompt,
                chat_id: self.chat_id,
                reply_to_message_id: Some(self.reply_to),
            };
            if self.reconciler.image_queue.try_enqueue(job).is_err() {
                all_queued = false;
            }
        }
        all_queued
    }

    /// Publishes the final answer. An empty answer (after directive stripping, with no image queued) is
    /// [`AiError::EmptyResult`] and leaves the placeholder untouched.
    #[instrument(skip(self, answer), fields(chat_id = self.chat_id, message_id = self.message_id))]
    pub async fn finish(&self, answer: FinalAnswer) -> Result<(), AiError> {
        let (text, prompts) = if answer.image_directives {
            let (text, prompts) = extract_image_directives(&answer.text);
            (text.trim().to_string(), prompts)
        } else {
            (answer.text.trim().to_string(), Vec::new())
        };

        let had_images = !prompts.is_empty();
        let queued = self.enqueue_images(prompts);
        let mut text = if text.is_empty() && had_images {
            GENERATING_IMAGE_TEXT.to_string()
        } else {
            text
        };
        if text.is_empty() {
            return Err(AiError::EmptyResult);
        }
        if !queued {
            text.push_str("\n\n");
            text.push_str(QUEUE_BUSY_NOTE);
        }

        let action = sources_action(answer.sources_id.as_deref());
        let (rendered, format) = render(&text, answer.rendering);
        if rendered.chars().count() <= TELEGRAM_TEXT_LIMIT {
            let options = SendOptions::default().with_format(format).with_action(action);
            self.bot()
                .edit_message(self.chat_id, self.message_id, &rendered, &options)
                .await?;
            info!(chars = rendered.chars().count(), images = had_images, "Answer delivered");
            return Ok(());
        }

        if let Some(publisher) = &self.reconciler.publisher {
            match publisher.publish(&answer.title, &text).await {
                Ok(link) => {
                    let notice = format!("The answer is too long for Telegram, read it here:\n{}", link);
                    let options = SendOptions::default().with_action(action);
                    self.bot()
                        .edit_message(self.chat_id, self.message_id, &notice, &options)
                        .await?;
                    info!(link = %link, "Long answer published");
                    return Ok(());
                }
                Err(e) => warn!(error = %e, "Publishing failed, splitting answer instead"),
            }
        }

        self.deliver_chunks(&text, answer.rendering, action).await
    }

    /// First chunk replaces the placeholder, the rest follow as replies; the sources control goes on the last one.
    async fn deliver_chunks(&self, text: &str, rendering: Rendering, action: Option<InlineAction>) -> Result<(), AiError> {
        let max = match rendering {
            Rendering::Plain => TELEGRAM_TEXT_LIMIT,
            Rendering::Markdown => MARKDOWN_CHUNK_CHARS,
        };
        let chunks = chunk_text(text, max);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            let (mut body, mut format) = render(chunk, rendering);
            if body.chars().count() > TELEGRAM_TEXT_LIMIT {
                body = chunk.clone();
                format = TextFormat::Plain;
            }
            let options = SendOptions {
                reply_to: Some(self.reply_to),
                format,
                action: if i == last { action.clone() } else { None },
            };
            if i == 0 {
                self.bot()
                    .edit_message(self.chat_id, self.message_id, &body, &options)
                    .await?;
            } else {
                self.bot().send_message(self.chat_id, &body, &options).await?;
            }
        }
        info!(chunks = chunks.len(), "Long answer split");
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for Placeholder {
    async fn on_tool(&self, tool: &str, status: &str) {
        debug!(tool, "Tool status");
        self.status(status).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_action_data() {
        let action = sources_action(Some("abc")).unwrap();
        assert_eq!(action.label, SOURCES_LABEL);
        assert_eq!(action.data, "sources:abc");
        assert!(sources_action(None).is_none());
    }

    #[test]
    fn test_render_follows_pathway() {
        assert_eq!(render("**hi**", Rendering::Plain), ("**hi**".to_string(), TextFormat::Plain));
        assert_eq!(render("**hi**", Rendering::Markdown), ("<b>hi</b>".to_string(), TextFormat::Html));
    }
}
