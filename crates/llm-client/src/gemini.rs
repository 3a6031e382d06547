//! Gemini adapter: multimodal parts, function declarations, optional Google Search grounding.

use async_trait::async_trait;
use gemini_client::{
    Content, FunctionCall, FunctionDeclaration, GeminiClient, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, Part, Tool,
};
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::request::{GenerationRequest, GenerationResponse, GroundingLink, Role, ToolCall, Turn, TurnPart};
use crate::ProviderGateway;

/// Gateway over `generateContent`, authenticated with the service-wide key.
#[derive(Clone)]
pub struct GeminiGateway {
    client: GeminiClient,
}

impl GeminiGateway {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn to_part(part: &TurnPart) -> Part {
    match part {
        TurnPart::Text(text) => Part::text(text.clone()),
        TurnPart::Attachment(a) => Part::inline(a.mime_type.clone(), &a.bytes),
        TurnPart::ToolCall(call) => Part {
            function_call: Some(FunctionCall {
                name: call.name.clone(),
                args: serde_json::Value::Object(call.arguments.clone()),
            }),
            thought_signature: call.signature.clone(),
            ..Part::default()
        },
        TurnPart::ToolResult { name, result } => Part::function_response(name.clone(), result.to_value()),
    }
}

fn to_content(turn: &Turn) -> Content {
    let parts = turn.parts.iter().map(to_part).collect();
    match turn.role {
        Role::User => Content::user(parts),
        Role::Model => Content::model(parts),
    }
}

/// Builds the wire request: first user turn, replayed exchange, declarations and sampling.
pub(crate) fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
    let mut contents = vec![to_content(&request.first_turn())];
    contents.extend(request.exchange.iter().filter(|t| !t.is_empty()).map(to_content));

    let mut tools = Vec::new();
    if !request.tools.is_empty() {
        tools.push(Tool::functions(
            request
                .tools
                .iter()
                .map(|t| FunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        ));
    }
    if request.grounding {
        tools.push(Tool::google_search());
    }

    GenerateContentRequest {
        contents,
        system_instruction: request.system_prompt.as_deref().map(Content::system),
        tools: if tools.is_empty() { None } else { Some(tools) },
        generation_config: Some(GenerationConfig {
            temperature: Some(request.sampling.temperature),
            top_p: Some(request.sampling.top_p),
            max_output_tokens: Some(request.sampling.max_tokens),
            ..GenerationConfig::default()
        }),
    }
}

/// Reads the first candidate into the provider-agnostic shape. Thought parts are skipped.
pub(crate) fn parse_response(response: GenerateContentResponse) -> Result<GenerationResponse, ProviderError> {
    let candidate_count = response.candidates.len();
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResult)?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut turn_parts = Vec::new();

    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if part.is_thought() {
            continue;
        }
        if let Some(call) = part.function_call {
            let tool_call = ToolCall {
                signature: part.thought_signature,
                ..ToolCall::new(call.name, call.args)
            };
            turn_parts.push(TurnPart::ToolCall(tool_call.clone()));
            tool_calls.push(tool_call);
        } else if let Some(t) = part.text {
            text.push_str(&t);
            turn_parts.push(TurnPart::Text(t));
        }
    }

    let mut grounding_links: Vec<GroundingLink> = Vec::new();
    if let Some(meta) = candidate.grounding_metadata {
        for web in meta.grounding_chunks.into_iter().filter_map(|c| c.web) {
            if web.uri.is_empty() || grounding_links.iter().any(|l| l.uri == web.uri) {
                continue;
            }
            let title = if web.title.is_empty() { web.uri.clone() } else { web.title };
            grounding_links.push(GroundingLink { title, uri: web.uri });
        }
    }

    Ok(GenerationResponse {
        text: text.trim().to_string(),
        tool_calls,
        grounding_links,
        candidate_count,
        turn: Turn {
            role: Role::Model,
            parts: turn_parts,
        },
    })
}

#[async_trait]
impl ProviderGateway for GeminiGateway {
    fn supports_tools(&self) -> bool {
        true
    }

    #[instrument(skip(self, request), fields(model = %request.model, turns = request.exchange.len() + 1))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let wire = build_request(request);
        let response = self
            .client
            .generate_content(&request.model, &wire, request.timeout)
            .await?;
        let parsed = parse_response(response)?;
        debug!(
            text_len = parsed.text.len(),
            tool_calls = parsed.tool_calls.len(),
            links = parsed.grounding_links.len(),
            "Gemini response parsed"
        );
        Ok(parsed)
    }
}
