//! Per-pathway sampling parameters and call timeouts.

use std::time::Duration;

pub use openai_client::SamplingParams;

/// Lightweight ask pathway (chat completion with a per-user key).
pub const ASK_SAMPLING: SamplingParams = SamplingParams {
    temperature: 1.0,
    top_p: 0.95,
    max_tokens: 1024,
};

/// Tool-enabled chat pathway.
pub const CHAT_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.7,
    top_p: 0.95,
    max_tokens: 8192,
};

pub const ASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Per model call inside the tool loop.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(120);
