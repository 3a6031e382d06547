//! Shared fakes for zeno-ai integration tests.
//!
//! [`MockBot`] records every outgoing call as a [`Call`] on an unbounded channel and serves a scripted message
//! journal for history and by-id lookups. The provider, image and sandbox fakes are scripted the same way.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image_generation_client::{GeneratedImage, ImageError, ImageGenerator, ImageOptions};
use llm_client::{
    GenerationRequest, GenerationResponse, GroundingLink, ProviderError, ProviderGateway, Role, ToolCall, Turn,
    TurnPart,
};
use storage::{CredentialRepository, LinkRepository, SqlitePoolManager};
use tokio::sync::mpsc;
use zeno_ai::config::AiConfig;
use zeno_ai::context::{AppContext, BotIdentity, GatewayFactory};
use zeno_ai::image_worker::{image_queue, ImageJob, ImageQueue};
use zeno_ai::telegraph::Publisher;
use zeno_ai::tools::{Language, Sandbox, SandboxError, SandboxOutput};
use zeno_ai::AiError;
use zeno_core::{
    Bot, Chat, ChatKind, Media, Message, PeerRef, Result, SendOptions, Sender, User, ZenoError,
};

pub const BOT_ID: i64 = 999;
pub const BOT_USERNAME: &str = "NityaXbot";
pub const GROUP_ID: i64 = -100;
pub const FIRST_SENT_ID: i32 = 1000;

/// One recorded outgoing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat_id: i64,
        message_id: i32,
        text: String,
        options: SendOptions,
    },
    Edit {
        chat_id: i64,
        message_id: i32,
        text: String,
        options: SendOptions,
    },
    ClearActions {
        chat_id: i64,
        message_id: i32,
    },
    Document {
        chat_id: i64,
        path: PathBuf,
        caption: String,
        reply_to: Option<i32>,
    },
    /// `bytes` is read from the file at call time, before it is cleaned up.
    Photo {
        chat_id: i64,
        caption: String,
        reply_to: Option<i32>,
        bytes: Vec<u8>,
    },
}

impl Call {
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Mock transport. Sent messages get sequential ids starting at [`FIRST_SENT_ID`].
pub struct MockBot {
    journal: Mutex<Vec<Message>>,
    users: Mutex<HashMap<i64, User>>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicI32,
    /// By-id lookups return `Unsupported`, forcing the history fallback.
    pub lookups_unsupported: AtomicBool,
    pub history_fails: AtomicBool,
    pub sends_fail: AtomicBool,
    pub photos_fail: AtomicBool,
    tx: mpsc::UnboundedSender<Call>,
}

impl MockBot {
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<Call>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bot = Arc::new(Self {
            journal: Mutex::new(Vec::new()),
            users: Mutex::new(HashMap::new()),
            media: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(FIRST_SENT_ID),
            lookups_unsupported: AtomicBool::new(false),
            history_fails: AtomicBool::new(false),
            sends_fail: AtomicBool::new(false),
            photos_fail: AtomicBool::new(false),
            tx,
        });
        (bot, rx)
    }

    pub fn add_message(&self, message: Message) {
        self.journal.lock().unwrap().push(message);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn add_media(&self, file_id: &str, bytes: Vec<u8>) {
        self.media.lock().unwrap().insert(file_id.to_string(), bytes);
    }

    fn record(&self, call: Call) {
        let _ = self.tx.send(call);
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn get_history(&self, chat_id: i64, before_id: i32, limit: usize) -> Result<Vec<Message>> {
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(ZenoError::Bot("history unavailable".to_string()));
        }
        let mut found: Vec<Message> = self
            .journal
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat.id == chat_id && m.id < before_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| std::cmp::Reverse(m.id));
        found.truncate(limit);
        Ok(found)
    }

    async fn get_messages_by_ids(&self, chat_id: i64, ids: &[i32]) -> Result<Vec<Message>> {
        if self.lookups_unsupported.load(Ordering::SeqCst) {
            return Err(ZenoError::Unsupported("lookup by id".to_string()));
        }
        Ok(self
            .journal
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat.id == chat_id && ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn download_media(&self, media: &Media) -> Result<Vec<u8>> {
        self.media
            .lock()
            .unwrap()
            .get(&media.file_id)
            .cloned()
            .ok_or_else(|| ZenoError::Bot(format!("no such file: {}", media.file_id)))
    }

    async fn send_message(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<i32> {
        if self.sends_fail.load(Ordering::SeqCst) {
            return Err(ZenoError::Bot("send failed".to_string()));
        }
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(Call::Send {
            chat_id,
            message_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(message_id)
    }

    async fn edit_message(&self, chat_id: i64, message_id: i32, text: &str, options: &SendOptions) -> Result<()> {
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(())
    }

    async fn clear_actions(&self, chat_id: i64, message_id: i32) -> Result<()> {
        self.record(Call::ClearActions { chat_id, message_id });
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()> {
        self.record(Call::Document {
            chat_id,
            path: path.to_path_buf(),
            caption: caption.to_string(),
            reply_to,
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path, caption: &str, reply_to: Option<i32>) -> Result<()> {
        let bytes = std::fs::read(path)?;
        if self.photos_fail.load(Ordering::SeqCst) {
            return Err(ZenoError::Bot("photo upload failed".to_string()));
        }
        self.record(Call::Photo {
            chat_id,
            caption: caption.to_string(),
            reply_to,
            bytes,
        });
        Ok(())
    }
}

/// Everything recorded so far, without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Call>) -> Vec<Call> {
    let mut calls = Vec::new();
    while let Ok(call) = rx.try_recv() {
        calls.push(call);
    }
    calls
}

/// Waits for the next recorded call, failing the test after a few seconds.
pub async fn next_call(rx: &mut mpsc::UnboundedReceiver<Call>) -> Call {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a bot call")
        .expect("bot call channel closed")
}

pub fn user(id: i64, first_name: &str) -> User {
    User {
        id,
        username: None,
        first_name: Some(first_name.to_string()),
        last_name: None,
        is_bot: false,
    }
}

pub fn group() -> Chat {
    Chat::new(GROUP_ID, ChatKind::Group)
}

pub fn text_from(id: i32, chat: Chat, from: &User, text: &str) -> Message {
    Message::text(id, chat, Some(Sender::User(from.clone())), text)
}

/// A message authored by the bot account.
pub fn bot_message(id: i32, chat: Chat, text: &str) -> Message {
    Message::text(id, chat, Some(Sender::Peer(PeerRef::User(BOT_ID))), text)
}

pub fn identity() -> BotIdentity {
    BotIdentity {
        user_id: BOT_ID,
        username: BOT_USERNAME.to_string(),
    }
}

pub fn text_response(text: &str) -> GenerationResponse {
    GenerationResponse {
        text: text.to_string(),
        tool_calls: Vec::new(),
        grounding_links: Vec::new(),
        candidate_count: 1,
        turn: Turn {
            role: Role::Model,
            parts: vec![TurnPart::Text(text.to_string())],
        },
    }
}

pub fn tool_response(text: &str, calls: Vec<ToolCall>) -> GenerationResponse {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(TurnPart::Text(text.to_string()));
    }
    parts.extend(calls.iter().cloned().map(TurnPart::ToolCall));
    GenerationResponse {
        text: text.to_string(),
        tool_calls: calls,
        grounding_links: Vec::new(),
        candidate_count: 1,
        turn: Turn {
            role: Role::Model,
            parts,
        },
    }
}

pub fn grounded_response(text: &str, links: &[(&str, &str)]) -> GenerationResponse {
    GenerationResponse {
        grounding_links: links
            .iter()
            .map(|(title, uri)| GroundingLink {
                title: title.to_string(),
                uri: uri.to_string(),
            })
            .collect(),
        ..text_response(text)
    }
}

/// Gateway that replays a script. When the script runs out, `fallback` (if any) is returned forever.
pub struct MockGateway {
    script: Mutex<VecDeque<std::result::Result<GenerationResponse, ProviderError>>>,
    fallback: Option<GenerationResponse>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGateway {
    pub fn scripted(script: Vec<std::result::Result<GenerationResponse, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn always(response: GenerationResponse) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ProviderGateway for MockGateway {
    fn supports_tools(&self) -> bool {
        true
    }

    async fn generate(&self, request: &GenerationRequest) -> std::result::Result<GenerationResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(result) => result,
            None => self.fallback.clone().ok_or(ProviderError::EmptyResult),
        }
    }
}

/// Hands out one shared gateway and remembers which keys were used.
pub struct MockGatewayFactory {
    pub gateway: Arc<MockGateway>,
    keys: Mutex<Vec<String>>,
}

impl MockGatewayFactory {
    pub fn new(gateway: Arc<MockGateway>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            keys: Mutex::new(Vec::new()),
        })
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

impl GatewayFactory for MockGatewayFactory {
    fn for_key(&self, api_key: &str) -> Arc<dyn ProviderGateway> {
        self.keys.lock().unwrap().push(api_key.to_string());
        self.gateway.clone()
    }
}

/// Image generator fed from a script; an exhausted script yields a tiny PNG.
pub struct MockImageGenerator {
    script: Mutex<VecDeque<std::result::Result<GeneratedImage, ImageError>>>,
    calls: Mutex<Vec<(String, String, ImageOptions)>>,
}

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn png() -> GeneratedImage {
    GeneratedImage {
        bytes: PNG_BYTES.to_vec(),
        mime_type: "image/png".to_string(),
    }
}

impl MockImageGenerator {
    pub fn scripted(script: Vec<std::result::Result<GeneratedImage, ImageError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// `(model, prompt, options)` per call, in order.
    pub fn calls(&self) -> Vec<(String, String, ImageOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
        _timeout: Duration,
    ) -> std::result::Result<GeneratedImage, ImageError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), prompt.to_string(), options.clone()));
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(png()))
    }
}

/// Sandbox that echoes a fixed output and counts executions.
pub struct MockSandbox {
    output: SandboxOutput,
    runs: AtomicUsize,
}

impl MockSandbox {
    pub fn new(stdout: &str) -> Arc<Self> {
        Arc::new(Self {
            output: SandboxOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: Some(0),
            },
            runs: AtomicUsize::new(0),
        })
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sandbox for MockSandbox {
    async fn execute(
        &self,
        _language: Language,
        _code: &str,
        _timeout: Duration,
    ) -> std::result::Result<SandboxOutput, SandboxError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Publisher that returns a fixed link, or fails.
pub struct MockPublisher {
    pub link: Option<String>,
    published: Mutex<Vec<(String, String)>>,
}

impl MockPublisher {
    pub fn returning(link: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            link: link.map(str::to_string),
            published: Mutex::new(Vec::new()),
        })
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, title: &str, content: &str) -> std::result::Result<String, AiError> {
        self.published
            .lock()
            .unwrap()
            .push((title.to_string(), content.to_string()));
        self.link
            .clone()
            .ok_or_else(|| AiError::Transport("publishing disabled".to_string()))
    }
}

pub fn test_config(generated_dir: PathBuf) -> AiConfig {
    AiConfig {
        aistudio_api_key: "service-key".to_string(),
        bot_username: Some(BOT_USERNAME.to_string()),
        inline_trigger: "@ask".to_string(),
        gemini_base_url: "http://localhost:1".to_string(),
        cerebras_base_url: "http://localhost:1".to_string(),
        default_model: "chat-model".to_string(),
        image_model: "image-model".to_string(),
        high_image_model: "image-model-hq".to_string(),
        ask_model: "ask-model".to_string(),
        reply_model: "reply-model".to_string(),
        allowed_chat_ids: Vec::new(),
        max_media_size: 1024,
        sandbox_container: "test-sandbox".to_string(),
        generated_dir,
        enable_grounding: true,
        telegraph_access_token: None,
    }
}

pub async fn memory_pool() -> SqlitePoolManager {
    SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}

/// Everything an orchestrator test needs, with handles on the fakes for assertions.
pub struct Harness {
    pub bot: Arc<MockBot>,
    pub calls: mpsc::UnboundedReceiver<Call>,
    pub chat_gateway: Arc<MockGateway>,
    pub ask_factory: Arc<MockGatewayFactory>,
    pub images: Arc<MockImageGenerator>,
    pub sandbox: Arc<MockSandbox>,
    pub credentials: Arc<CredentialRepository>,
    pub links: Arc<LinkRepository>,
    pub jobs: mpsc::Receiver<ImageJob>,
    pub queue: ImageQueue,
    pub generated: tempfile::TempDir,
    pub ctx: Arc<AppContext>,
}

pub struct HarnessBuilder {
    chat_gateway: Arc<MockGateway>,
    ask_gateway: Arc<MockGateway>,
    images: Arc<MockImageGenerator>,
    publisher: Option<Arc<dyn Publisher>>,
    queue_capacity: usize,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            chat_gateway: MockGateway::scripted(Vec::new()),
            ask_gateway: MockGateway::scripted(Vec::new()),
            images: MockImageGenerator::scripted(Vec::new()),
            publisher: None,
            queue_capacity: 10,
        }
    }
}

impl HarnessBuilder {
    pub fn chat_gateway(mut self, gateway: Arc<MockGateway>) -> Self {
        self.chat_gateway = gateway;
        self
    }

    pub fn ask_gateway(mut self, gateway: Arc<MockGateway>) -> Self {
        self.ask_gateway = gateway;
        self
    }

    pub fn images(mut self, images: Arc<MockImageGenerator>) -> Self {
        self.images = images;
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub async fn build(self) -> Harness {
        let (bot, calls) = MockBot::with_receiver();
        let pool = memory_pool().await;
        let credentials = Arc::new(CredentialRepository::new(pool.clone()).await.expect("credential repo"));
        let links = Arc::new(LinkRepository::new(pool).await.expect("link repo"));
        let ask_factory = MockGatewayFactory::new(self.ask_gateway);
        let sandbox = MockSandbox::new("42\n");
        let (queue, jobs) = image_queue(self.queue_capacity);
        let generated = tempfile::tempdir().expect("tempdir");

        let ctx = Arc::new(AppContext {
            config: test_config(generated.path().to_path_buf()),
            identity: identity(),
            bot: bot.clone(),
            credentials: credentials.clone(),
            links: links.clone(),
            chat_gateway: self.chat_gateway.clone(),
            ask_gateways: ask_factory.clone(),
            images: self.images.clone(),
            sandbox: sandbox.clone(),
            publisher: self.publisher,
            image_queue: queue.clone(),
        });

        Harness {
            bot,
            calls,
            chat_gateway: self.chat_gateway,
            ask_factory,
            images: self.images,
            sandbox,
            credentials,
            links,
            jobs,
            queue,
            generated,
            ctx,
        }
    }
}
