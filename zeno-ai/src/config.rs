//! AI config: provider keys and endpoints, model names, chat allowlist, media cap, sandbox and Telegraph settings.
//! Loaded from env after `dotenvy::dotenv()`; the Telegram/log/DB part lives in [`zeno_telegram::BaseConfig`].

use std::env;
use std::path::PathBuf;

use anyhow::Result;

pub const DEFAULT_CEREBRAS_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const DEFAULT_MAX_MEDIA_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// AISTUDIO_API_KEY: service-wide key for the tool-enabled pathway and the image worker
    pub aistudio_api_key: String,
    /// BOT_USERNAME without `@`; None means resolve with getMe
    pub bot_username: Option<String>,
    /// INLINE_TRIGGER, e.g. `@ask`
    pub inline_trigger: String,
    pub gemini_base_url: String,
    pub cerebras_base_url: String,
    pub default_model: String,
    pub image_model: String,
    pub high_image_model: String,
    pub ask_model: String,
    pub reply_model: String,
    /// Empty = every chat allowed
    pub allowed_chat_ids: Vec<i64>,
    pub max_media_size: u64,
    pub sandbox_container: String,
    pub generated_dir: PathBuf,
    pub enable_grounding: bool,
    pub telegraph_access_token: Option<String>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn var_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Comma-separated chat ids; unparsable items are skipped.
pub fn parse_chat_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AiConfig {
    pub fn load() -> Result<Self> {
        let aistudio_api_key = env::var("AISTUDIO_API_KEY").unwrap_or_default().trim().to_string();
        let max_media_size = env::var("MAX_MEDIA_SIZE")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_MEDIA_SIZE);
        let enable_grounding = env::var("ENABLE_GROUNDING")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(true);

        Ok(Self {
            aistudio_api_key,
            bot_username: var_opt("BOT_USERNAME").map(|u| u.trim_start_matches('@').to_string()),
            inline_trigger: var_or("INLINE_TRIGGER", "@ask"),
            gemini_base_url: var_or("GEMINI_BASE_URL", gemini_client::DEFAULT_BASE_URL),
            cerebras_base_url: var_or("CEREBRAS_BASE_URL", DEFAULT_CEREBRAS_BASE_URL),
            default_model: var_or("DEFAULT_MODEL", "gemini-3-flash-preview"),
            image_model: var_or("IMAGE_MODEL", "gemini-2.5-flash-image"),
            high_image_model: var_or("HIGH_IMAGE_MODEL", "gemini-3-pro-image-preview"),
            ask_model: var_or("ASK_MODEL", "qwen-3-32b"),
            reply_model: var_or("REPLY_MODEL", "zai-glm-4.7"),
            allowed_chat_ids: env::var("ALLOWED_CHAT_IDS")
                .map(|s| parse_chat_ids(&s))
                .unwrap_or_default(),
            max_media_size,
            sandbox_container: var_or("SANDBOX_CONTAINER", "zeno-sandbox"),
            generated_dir: PathBuf::from(var_or("GENERATED_DIR", "generated")),
            enable_grounding,
            telegraph_access_token: var_opt("TELEGRAPH_ACCESS_TOKEN"),
        })
    }

    /// Fails fast on a missing service key, a bad endpoint URL or an empty trigger.
    pub fn validate(&self) -> Result<()> {
        if self.aistudio_api_key.is_empty() {
            anyhow::bail!("AISTUDIO_API_KEY is required");
        }
        for (name, url) in [
            ("GEMINI_BASE_URL", &self.gemini_base_url),
            ("CEREBRAS_BASE_URL", &self.cerebras_base_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                anyhow::bail!("{} is not a valid URL: {}", name, url);
            }
        }
        if self.inline_trigger.chars().any(char::is_whitespace) {
            anyhow::bail!("INLINE_TRIGGER must be a single token: {:?}", self.inline_trigger);
        }
        Ok(())
    }

    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chat_ids.is_empty() || self.allowed_chat_ids.contains(&chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "AISTUDIO_API_KEY",
        "BOT_USERNAME",
        "INLINE_TRIGGER",
        "GEMINI_BASE_URL",
        "CEREBRAS_BASE_URL",
        "DEFAULT_MODEL",
        "IMAGE_MODEL",
        "HIGH_IMAGE_MODEL",
        "ASK_MODEL",
        "REPLY_MODEL",
        "ALLOWED_CHAT_IDS",
        "MAX_MEDIA_SIZE",
        "SANDBOX_CONTAINER",
        "GENERATED_DIR",
        "ENABLE_GROUNDING",
        "TELEGRAPH_ACCESS_TOKEN",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    /// **Test: Defaults apply when only the service key is set.**
    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();
        env::set_var("AISTUDIO_API_KEY", "key");

        let config = AiConfig::load().unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.inline_trigger, "@ask");
        assert_eq!(config.default_model, "gemini-3-flash-preview");
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.high_image_model, "gemini-3-pro-image-preview");
        assert_eq!(config.ask_model, "qwen-3-32b");
        assert_eq!(config.reply_model, "zai-glm-4.7");
        assert_eq!(config.max_media_size, DEFAULT_MAX_MEDIA_SIZE);
        assert_eq!(config.sandbox_container, "zeno-sandbox");
        assert!(config.enable_grounding);
        assert!(config.allowed_chat_ids.is_empty());
        assert!(config.bot_username.is_none());
        assert!(config.is_chat_allowed(12345));
        clear_env();
    }

    /// **Test: Custom values are parsed; bad chat ids are skipped and a zero media cap falls back to default.**
    #[test]
    #[serial]
    fn test_load_custom_values() {
        clear_env();
        env::set_var("AISTUDIO_API_KEY", "key");
        env::set_var("BOT_USERNAME", "@NityaXbot");
        env::set_var("ALLOWED_CHAT_IDS", "-1001, abc, 42,");
        env::set_var("MAX_MEDIA_SIZE", "0");
        env::set_var("ENABLE_GROUNDING", "false");
        env::set_var("TELEGRAPH_ACCESS_TOKEN", "tok");

        let config = AiConfig::load().unwrap();

        assert_eq!(config.bot_username.as_deref(), Some("NityaXbot"));
        assert_eq!(config.allowed_chat_ids, vec![-1001, 42]);
        assert!(config.is_chat_allowed(42));
        assert!(!config.is_chat_allowed(7));
        assert_eq!(config.max_media_size, DEFAULT_MAX_MEDIA_SIZE);
        assert!(!config.enable_grounding);
        assert_eq!(config.telegraph_access_token.as_deref(), Some("tok"));
        clear_env();
    }

    /// **Test: validate fails on a missing service key and on a malformed endpoint.**
    #[test]
    #[serial]
    fn test_validate_failures() {
        clear_env();
        assert!(AiConfig::load().unwrap().validate().is_err());

        env::set_var("AISTUDIO_API_KEY", "key");
        env::set_var("GEMINI_BASE_URL", "::not a url::");
        let err = AiConfig::load().unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_BASE_URL"));
        clear_env();
    }
}
