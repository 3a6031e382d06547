//! Dispatcher runner: converts teloxide updates to core types and passes messages to the HandlerChain and
//! inline-button presses to the CallbackHandler. Each update is processed in its own task.

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info, instrument, warn};
use zeno_core::{CallbackHandler, HandlerChain, User};

use crate::adapters::{callback_to_core, TelegramUserWrapper};
use crate::messenger::TelegramMessenger;

/// Days of journal kept on startup.
pub const JOURNAL_RETENTION_DAYS: i64 = 7;

/// Resolves the bot's own account with getMe.
pub async fn resolve_identity(bot: &teloxide::Bot) -> Result<User> {
    let me = bot.get_me().await.context("getMe failed")?;
    let user = TelegramUserWrapper(&me.user).to_core();
    info!(user_id = user.id, username = ?user.username, "Bot identity resolved");
    Ok(user)
}

async fn on_message(
    msg: teloxide::types::Message,
    messenger: Arc<TelegramMessenger>,
    chain: HandlerChain,
) -> ResponseResult<()> {
    let core_msg = messenger.observe(&msg).await;

    info!(
        user_id = ?core_msg.sender_id(),
        chat_id = core_msg.chat.id,
        message_id = core_msg.id,
        has_media = core_msg.media.is_some(),
        "Received message"
    );

    tokio::spawn(async move {
        if let Err(e) = chain.handle(&core_msg).await {
            error!(error = %e, chat_id = core_msg.chat.id, message_id = core_msg.id, "Handler chain failed");
        }
    });
    Ok(())
}

async fn on_edited_message(msg: teloxide::types::Message, messenger: Arc<TelegramMessenger>) -> ResponseResult<()> {
    messenger.observe(&msg).await;
    Ok(())
}

async fn on_callback(
    bot: teloxide::Bot,
    query: CallbackQuery,
    callbacks: Arc<dyn CallbackHandler>,
) -> ResponseResult<()> {
    let event = callback_to_core(&query);
    info!(user_id = event.from.id, data = %event.data, "Received callback");

    tokio::spawn(async move {
        let ack = match callbacks.handle_callback(&event).await {
            Ok(ack) => ack,
            Err(e) => {
                error!(error = %e, user_id = event.from.id, data = %event.data, "Callback handler failed");
                None
            }
        };
        let mut req = bot.answer_callback_query(query.id.clone());
        if let Some(text) = ack {
            req = req.text(text);
        }
        if let Err(e) = req.await {
            warn!(error = %e, "Failed to answer callback query");
        }
    });
    Ok(())
}

/// Runs the dispatcher until Ctrl-C. Old journal entries are pruned before polling starts.
#[instrument(skip(bot, messenger, chain, callbacks))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    messenger: Arc<TelegramMessenger>,
    chain: HandlerChain,
    callbacks: Arc<dyn CallbackHandler>,
) -> Result<()> {
    match messenger.journal().cleanup_older_than(JOURNAL_RETENTION_DAYS).await {
        Ok(removed) => info!(removed, "Journal cleanup done"),
        Err(e) => warn!(error = %e, "Journal cleanup failed"),
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_edited_message().endpoint(on_edited_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!(handlers = chain.len(), "Starting dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![messenger, chain, callbacks])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped");
    Ok(())
}
