//! Provider-agnostic request and response types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sampling::{SamplingParams, ASK_SAMPLING, ASK_TIMEOUT};

/// Binary input extracted from a message's media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A declared tool: name, description and a JSON schema for its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A model's request to run a named tool.
///
/// `signature` is an opaque provider token that must accompany the call when the turn is replayed.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
    pub signature: Option<String>,
}

impl ToolCall {
    /// Non-object arguments are treated as empty.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            signature: None,
        }
    }

    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }

    /// Accepts JSON booleans and the strings "true"/"false".
    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        match self.arguments.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Outcome of one tool call, fed back into the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub payload: Map<String, Value>,
}

impl ToolResult {
    pub fn ok(payload: Map<String, Value>) -> Self {
        Self { success: true, payload }
    }

    /// Failure with a single `error` message.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("error".to_string(), Value::String(message.into()));
        Self {
            success: false,
            payload,
        }
    }

    /// `{"success": bool, ...payload}`
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        map.insert("success".to_string(), Value::Bool(self.success));
        Value::Object(map)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnPart {
    Text(String),
    Attachment(Attachment),
    ToolCall(ToolCall),
    ToolResult { name: String, result: ToolResult },
}

/// One turn of an exchange after the initial transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    pub fn tool_results(results: Vec<(String, ToolResult)>) -> Self {
        Self {
            role: Role::User,
            parts: results
                .into_iter()
                .map(|(name, result)| TurnPart::ToolResult { name, result })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub title: String,
    pub uri: String,
}

/// What the gateway sends. The transcript and attachments form the first user turn; `exchange` holds model turns
/// and tool results accumulated since.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: Option<String>,
    pub transcript: String,
    pub attachments: Vec<Attachment>,
    pub exchange: Vec<Turn>,
    pub model: String,
    pub sampling: SamplingParams,
    pub tools: Vec<ToolSpec>,
    pub grounding: bool,
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            transcript: transcript.into(),
            attachments: Vec::new(),
            exchange: Vec::new(),
            model: model.into(),
            sampling: ASK_SAMPLING,
            tools: Vec::new(),
            grounding: false,
            timeout: ASK_TIMEOUT,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_grounding(mut self, grounding: bool) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Transcript text followed by attachments, as one user turn.
    pub fn first_turn(&self) -> Turn {
        let mut parts = vec![TurnPart::Text(self.transcript.clone())];
        parts.extend(self.attachments.iter().cloned().map(TurnPart::Attachment));
        Turn {
            role: Role::User,
            parts,
        }
    }
}

/// Parsed first candidate/choice.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// Concatenated user-visible text (may be empty).
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub grounding_links: Vec<GroundingLink>,
    /// Number of candidates/choices the provider returned.
    pub candidate_count: usize,
    /// The model turn, for replay in the next request of the same exchange.
    pub turn: Turn,
}
