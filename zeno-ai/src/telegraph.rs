//! Telegraph publishing for answers too long for one Telegram message.
//!
//! The access token comes from config, else the `telegraph_token` setting, else a freshly created account that is
//! then stored. Links point at `graph.org`, which serves the same pages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use storage::SettingsStore;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::AiError;

pub const DEFAULT_TELEGRAPH_URL: &str = "https://api.telegra.ph";
pub const TELEGRAPH_TIMEOUT: Duration = Duration::from_secs(10);
pub const TOKEN_SETTING: &str = "telegraph_token";
const AUTHOR_NAME: &str = "Nitya";
const LINK_BASE: &str = "https://graph.org";

/// Publishes long text somewhere linkable and returns the link.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, title: &str, content: &str) -> Result<String, AiError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, AiError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(AiError::Transport(format!(
                "telegraph api error: {}",
                self.error.unwrap_or_else(|| "unknown".to_string())
            ))),
        }
    }
}

#[derive(Deserialize)]
struct Account {
    access_token: String,
}

#[derive(Deserialize)]
struct Page {
    path: String,
}

pub struct TelegraphPublisher {
    http: Client,
    base_url: String,
    settings: Arc<dyn SettingsStore>,
    token: RwLock<Option<String>>,
}

impl TelegraphPublisher {
    pub fn new(settings: Arc<dyn SettingsStore>, configured_token: Option<String>) -> Self {
        Self::with_base_url(settings, configured_token, DEFAULT_TELEGRAPH_URL.to_string())
    }

    pub fn with_base_url(settings: Arc<dyn SettingsStore>, configured_token: Option<String>, base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
            token: RwLock::new(configured_token.filter(|t| !t.is_empty())),
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, method: &str, form: &[(&str, &str)]) -> Result<T, AiError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .timeout(TELEGRAPH_TIMEOUT)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout(TELEGRAPH_TIMEOUT)
                } else {
                    AiError::Transport(e.to_string())
                }
            })?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| AiError::Transport(format!("telegraph response: {}", e)))?;
        envelope.into_result()
    }

    async fn access_token(&self) -> Result<String, AiError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        let mut guard = self.token.write().await;
        if let Some(token) = guard.clone() {
            return Ok(token);
        }

        match self.settings.get_setting(TOKEN_SETTING).await {
            Ok(Some(token)) if !token.is_empty() => {
                info!("Loaded Telegraph token from settings");
                *guard = Some(token.clone());
                return Ok(token);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to read Telegraph token setting"),
        }

        info!("No Telegraph token configured, creating account");
        let account: Account = self
            .post("createAccount", &[("short_name", AUTHOR_NAME), ("author_name", AUTHOR_NAME)])
            .await?;
        if let Err(e) = self.settings.put_setting(TOKEN_SETTING, &account.access_token).await {
            warn!(error = %e, "Failed to store Telegraph token");
        }
        *guard = Some(account.access_token.clone());
        Ok(account.access_token)
    }
}

#[async_trait]
impl Publisher for TelegraphPublisher {
    #[instrument(skip(self, content), fields(chars = content.chars().count()))]
    async fn publish(&self, title: &str, content: &str) -> Result<String, AiError> {
        let token = self.access_token().await?;
        let nodes = json!([{"tag": "p", "children": [content]}]).to_string();
        let page: Page = self
            .post(
                "createPage",
                &[
                    ("access_token", token.as_str()),
                    ("title", title),
                    ("author_name", AUTHOR_NAME),
                    ("content", nodes.as_str()),
                    ("return_content", "true"),
                ],
            )
            .await?;
        let link = format!("{}/{}", LINK_BASE, page.path);
        info!(link = %link, "Published to Telegraph");
        Ok(link)
    }
}
