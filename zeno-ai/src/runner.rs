//! Startup wiring: storage, Telegram transport, provider clients, image worker, handler chain, dispatcher.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gemini_client::GeminiClient;
use image_generation_client::{GeminiImageGenerator, ImageGenerator};
use llm_client::GeminiGateway;
use storage::{CredentialRepository, JournalRepository, LinkRepository, SettingsRepository, SqlitePoolManager};
use tracing::{info, instrument, warn};
use zeno_core::{init_tracing, Bot, CallbackHandler, HandlerChain};
use zeno_telegram::{resolve_identity, run_dispatcher, BaseConfig, MessageJournal, TelegramMessenger};

use crate::config::AiConfig;
use crate::context::{AppContext, BotIdentity, CerebrasGateways};
use crate::handlers::{AllowlistHandler, ConversationHandler, CredentialHandler, SourcesCallback};
use crate::image_worker::{image_queue, ImageWorker, IMAGE_QUEUE_CAPACITY};
use crate::telegraph::{Publisher, TelegraphPublisher};
use crate::tools::DockerSandbox;

/// How long queued image jobs may keep running after the dispatcher stops.
pub const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Allowlist → credential command → conversation.
pub fn build_handler_chain(ctx: Arc<AppContext>) -> Result<HandlerChain> {
    let conversation = ConversationHandler::new(ctx.clone()).context("invalid INLINE_TRIGGER")?;
    Ok(HandlerChain::new()
        .add_handler(Arc::new(AllowlistHandler::new(ctx.config.allowed_chat_ids.clone())))
        .add_handler(Arc::new(CredentialHandler::new(ctx.bot.clone(), ctx.credentials.clone())))
        .add_handler(Arc::new(conversation)))
}

/// Main entry: validate config, init logging, build everything, run until Ctrl-C, then drain the image worker.
#[instrument(skip(base, ai))]
pub async fn run_bot(base: BaseConfig, ai: AiConfig) -> Result<()> {
    base.validate()?;
    ai.validate()?;
    init_tracing(&base.log_file)?;

    info!(
        database_url = %base.database_url,
        chat_model = %ai.default_model,
        ask_model = %ai.ask_model,
        allowed_chats = ai.allowed_chat_ids.len(),
        "Initializing bot"
    );

    let pool = SqlitePoolManager::new(&base.database_url)
        .await
        .with_context(|| format!("failed to open database {}", base.database_url))?;
    let credentials = Arc::new(CredentialRepository::new(pool.clone()).await?);
    let links = Arc::new(LinkRepository::new(pool.clone()).await?);
    let settings = Arc::new(SettingsRepository::new(pool.clone()).await?);
    let journal = JournalRepository::new(pool).await?;

    let teloxide_bot = base.build_bot()?;
    let me = resolve_identity(&teloxide_bot).await?;
    let identity = BotIdentity {
        user_id: me.id,
        username: ai.bot_username.clone().or(me.username).unwrap_or_default(),
    };
    if identity.username.is_empty() {
        warn!("Bot has no username, mention triggers are disabled");
    }

    let messenger = Arc::new(TelegramMessenger::new(teloxide_bot.clone(), MessageJournal::new(journal)));
    let bot: Arc<dyn Bot> = messenger.clone();

    let gemini = GeminiClient::with_base_url(ai.aistudio_api_key.clone(), ai.gemini_base_url.clone());
    let images: Arc<dyn ImageGenerator> = Arc::new(GeminiImageGenerator::new(gemini.clone()));
    let (queue, jobs) = image_queue(IMAGE_QUEUE_CAPACITY);
    let worker = ImageWorker::new(jobs, bot.clone(), images.clone(), ai.image_model.clone()).spawn();
    let publisher: Arc<dyn Publisher> = Arc::new(TelegraphPublisher::new(
        settings,
        ai.telegraph_access_token.clone(),
    ));

    let ctx = Arc::new(AppContext {
        identity: identity.clone(),
        bot: bot.clone(),
        credentials,
        links: links.clone(),
        chat_gateway: Arc::new(GeminiGateway::new(gemini)),
        ask_gateways: Arc::new(CerebrasGateways::new(ai.cerebras_base_url.clone())),
        images,
        sandbox: Arc::new(DockerSandbox::new(ai.sandbox_container.clone())),
        publisher: Some(publisher),
        image_queue: queue,
        config: ai,
    });
    let chain = build_handler_chain(ctx.clone())?;
    let callbacks: Arc<dyn CallbackHandler> = Arc::new(SourcesCallback::new(bot, links));
    drop(ctx);

    info!(user_id = identity.user_id, username = %identity.username, "Bot started successfully");
    run_dispatcher(teloxide_bot, messenger, chain, callbacks).await?;

    // The worker exits once every queue handle is gone and the queue is empty.
    match tokio::time::timeout(WORKER_SHUTDOWN_GRACE, worker).await {
        Ok(_) => info!("Image worker drained"),
        Err(_) => warn!(grace = ?WORKER_SHUTDOWN_GRACE, "Image worker still busy, abandoning queued jobs"),
    }
    Ok(())
}
