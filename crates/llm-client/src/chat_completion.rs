//! Chat-completion adapter: one system message, the transcript as a user message, text-only replay turns.

use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, OpenAIClient,
};
use prompt::{ChatMessage, MessageRole};
use tracing::{instrument, warn};

use crate::error::ProviderError;
use crate::request::{GenerationRequest, GenerationResponse, Role, Turn, TurnPart};
use crate::ProviderGateway;

/// Gateway over an OpenAI-compatible endpoint. Holds one caller's key.
#[derive(Clone)]
pub struct ChatCompletionGateway {
    client: OpenAIClient,
}

impl ChatCompletionGateway {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: OpenAIClient::with_base_url(api_key, base_url),
        }
    }
}

fn to_openai(msg: &ChatMessage) -> Result<ChatCompletionRequestMessage, ProviderError> {
    let content = msg.content.clone();
    let built: Result<ChatCompletionRequestMessage, _> = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
    };
    built.map_err(|e| ProviderError::Unsupported(e.to_string()))
}

/// Flattens the request into role-tagged messages. Only text parts survive.
fn to_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let mut messages = prompt::transcript_messages(request.system_prompt.as_deref(), &request.transcript);
    for turn in &request.exchange {
        let text: String = turn
            .parts
            .iter()
            .filter_map(|p| match p {
                TurnPart::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            continue;
        }
        messages.push(match turn.role {
            Role::User => ChatMessage::user(text),
            Role::Model => ChatMessage::assistant(text),
        });
    }
    messages
}

#[async_trait]
impl ProviderGateway for ChatCompletionGateway {
    fn supports_tools(&self) -> bool {
        false
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        if !request.tools.is_empty() || request.grounding {
            return Err(ProviderError::Unsupported(
                "chat completion does not take tools or grounding".to_string(),
            ));
        }
        if !request.attachments.is_empty() {
            warn!(count = request.attachments.len(), "Dropping attachments: chat completion is text-only");
        }

        let messages = to_messages(request)
            .iter()
            .map(to_openai)
            .collect::<Result<Vec<_>, _>>()?;

        let text = self
            .client
            .chat_completion(&request.model, messages, request.sampling, request.timeout)
            .await?;

        Ok(GenerationResponse {
            turn: Turn {
                role: Role::Model,
                parts: vec![TurnPart::Text(text.clone())],
            },
            text,
            tool_calls: Vec::new(),
            grounding_links: Vec::new(),
            candidate_count: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_messages_roles_and_text_only() {
        let mut req = GenerationRequest::new("m", "transcript").with_system_prompt("persona");
        req.exchange.push(Turn {
            role: Role::Model,
            parts: vec![TurnPart::Text("earlier answer".to_string())],
        });
        req.exchange.push(Turn::tool_results(vec![]));

        let msgs = to_messages(&req);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].role, MessageRole::System);
        assert_eq!(msgs[1].content, "transcript");
        assert_eq!(msgs[2].role, MessageRole::Assistant);
    }
}
