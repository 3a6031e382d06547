//! The three tools the model may call, as a closed set: argument parsing and validation, declarations sent to the
//! provider, and execution.
//!
//! Validation problems never abort an exchange; they come back to the model as failed [`ToolResult`]s.

mod sandbox;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image_generation_client::{ImageError, ImageGenerator, ImageOptions};
use llm_client::{ToolCall, ToolResult, ToolSpec};
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use zeno_core::Bot;

use crate::error::AiError;
use crate::mime;

pub use sandbox::{DockerSandbox, Language, Sandbox, SandboxError, SandboxOutput, SANDBOX_TIMEOUT};

pub const CREATE_IMAGE: &str = "create_image";
pub const SEND_FILE: &str = "send_file";
pub const RUN_CODE: &str = "run_code";

pub const IMAGE_TOOL_TIMEOUT: Duration = Duration::from_secs(90);
pub const HIGH_QUALITY_IMAGE_SIZE: &str = "2K";
pub const ASPECT_RATIOS: &[&str] = &["1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9"];
pub const FILE_CAPTION: &str = "Here's your file.";
const MAX_OUTPUT_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateImageArgs {
    pub prompt: String,
    /// None = provider default.
    pub aspect_ratio: Option<String>,
    pub high_quality: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tool {
    CreateImage(CreateImageArgs),
    SendFile { path: PathBuf },
    RunCode { language: Language, code: String },
}

/// Keeps an allow-listed aspect ratio; anything else means "use the default".
pub fn normalize_aspect_ratio(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    ASPECT_RATIOS
        .iter()
        .find(|r| r.eq_ignore_ascii_case(raw))
        .map(|r| r.to_string())
}

fn required_str<'a>(call: &'a ToolCall, key: &str) -> Result<&'a str, AiError> {
    call.str_arg(key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AiError::Validation(format!("{}: '{}' is required", call.name, key)))
}

impl Tool {
    pub fn parse(call: &ToolCall) -> Result<Self, AiError> {
        match call.name.as_str() {
            CREATE_IMAGE => Ok(Tool::CreateImage(CreateImageArgs {
                prompt: required_str(call, "prompt")?.to_string(),
                aspect_ratio: normalize_aspect_ratio(call.str_arg("aspect_ratio")),
                high_quality: call.bool_arg("high_quality").unwrap_or(false),
            })),
            SEND_FILE => Ok(Tool::SendFile {
                path: PathBuf::from(required_str(call, "path")?),
            }),
            RUN_CODE => {
                let raw_language = required_str(call, "language")?;
                let language = Language::parse(raw_language).ok_or_else(|| {
                    AiError::Validation(format!(
                        "run_code: unsupported language '{}' (use python, shell or javascript)",
                        raw_language
                    ))
                })?;
                let code = call
                    .str_arg("code")
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| AiError::Validation("run_code: 'code' is required".to_string()))?;
                Ok(Tool::RunCode {
                    language,
                    code: code.to_string(),
                })
            }
            other => Err(AiError::Validation(format!("unknown tool: {}", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::CreateImage(_) => CREATE_IMAGE,
            Tool::SendFile { .. } => SEND_FILE,
            Tool::RunCode { .. } => RUN_CODE,
        }
    }

    /// Short status shown on the placeholder while the tool runs.
    pub fn status_text(&self) -> &'static str {
        match self {
            Tool::CreateImage(_) => "Generating image...",
            Tool::SendFile { .. } => "Sending file...",
            Tool::RunCode { .. } => "Running code...",
        }
    }
}

/// Function declarations for the tool-enabled provider.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: CREATE_IMAGE.to_string(),
            description: "Generate an image from a text prompt. Use this when the user asks you to create, generate \
                          or draw an image. Returns the path of the saved image; deliver it with send_file."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string", "description": "Detailed description of the image"},
                    "aspect_ratio": {"type": "string", "enum": ASPECT_RATIOS},
                    "high_quality": {"type": "boolean", "description": "Only when the user asks for high quality"}
                },
                "required": ["prompt"]
            }),
        },
        ToolSpec {
            name: SEND_FILE.to_string(),
            description: "Send a previously generated file to the chat as a document.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path returned by create_image"}
                },
                "required": ["path"]
            }),
        },
        ToolSpec {
            name: RUN_CODE.to_string(),
            description: "Execute a short program in an isolated sandbox and return its output.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "language": {"type": "string", "enum": ["python", "shell", "javascript"]},
                    "code": {"type": "string"}
                },
                "required": ["language", "code"]
            }),
        },
    ]
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n[truncated]", &text[..idx]),
        None => text.to_string(),
    }
}

/// Where side effects of a tool land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTarget {
    pub chat_id: i64,
    pub reply_to: Option<i32>,
}

pub struct ToolExecutor {
    bot: Arc<dyn Bot>,
    images: Arc<dyn ImageGenerator>,
    sandbox: Arc<dyn Sandbox>,
    image_model: String,
    high_image_model: String,
    generated_dir: PathBuf,
}

impl ToolExecutor {
    pub fn new(
        bot: Arc<dyn Bot>,
        images: Arc<dyn ImageGenerator>,
        sandbox: Arc<dyn Sandbox>,
        image_model: String,
        high_image_model: String,
        generated_dir: PathBuf,
    ) -> Self {
        Self {
            bot,
            images,
            sandbox,
            image_model,
            high_image_model,
            generated_dir,
        }
    }

    /// Parses and runs one call. Never fails: every problem becomes a failed result.
    pub async fn dispatch(&self, call: &ToolCall, target: ToolTarget) -> ToolResult {
        match Tool::parse(call) {
            Ok(tool) => self.execute(&tool, target).await,
            Err(e) => {
                info!(tool = %call.name, error = %e, "Tool call rejected");
                ToolResult::failure(e.to_string())
            }
        }
    }

    pub async fn execute(&self, tool: &Tool, target: ToolTarget) -> ToolResult {
        match tool {
            Tool::CreateImage(args) => self.create_image(args).await,
            Tool::SendFile { path } => self.send_file(path, target).await,
            Tool::RunCode { language, code } => self.run_code(*language, code).await,
        }
    }

    #[instrument(skip(self, args), fields(high_quality = args.high_quality, aspect_ratio = ?args.aspect_ratio))]
    async fn create_image(&self, args: &CreateImageArgs) -> ToolResult {
        let (model, image_size) = if args.high_quality {
            (&self.high_image_model, Some(HIGH_QUALITY_IMAGE_SIZE.to_string()))
        } else {
            (&self.image_model, None)
        };
        let options = ImageOptions {
            aspect_ratio: args.aspect_ratio.clone(),
            image_size,
        };

        let image = match self
            .images
            .generate_image(model, &args.prompt, &options, IMAGE_TOOL_TIMEOUT)
            .await
        {
            Ok(image) => image,
            Err(e) => {
                warn!(model = %model, error = %e, "create_image failed");
                let message = match e {
                    ImageError::Timeout(_) => "image generation timed out",
                    ImageError::NoCandidates => "no image was generated (the prompt may have been blocked)",
                    ImageError::NoImage => "the model returned no image",
                    ImageError::Provider(_) => "image service error",
                };
                return ToolResult::failure(message);
            }
        };

        match self.store_image(&image.bytes, &image.mime_type).await {
            Ok(path) => {
                info!(path = %path.display(), size = image.bytes.len(), "Image stored");
                let mut payload = Map::new();
                payload.insert("path".to_string(), Value::String(path.display().to_string()));
                payload.insert("mime_type".to_string(), Value::String(image.mime_type));
                ToolResult::ok(payload)
            }
            Err(e) => {
                warn!(error = %e, "Failed to store generated image");
                ToolResult::failure("could not save the generated image")
            }
        }
    }

    async fn store_image(&self, bytes: &[u8], mime_type: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.generated_dir).await?;
        let path = self
            .generated_dir
            .join(format!("{}.{}", Uuid::new_v4(), mime::image_extension(mime_type)));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Only files inside the generated-content directory can be sent.
    async fn resolve_sendable(&self, path: &Path) -> Result<PathBuf, String> {
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| format!("file not found: {}", path.display()))?;
        let root = tokio::fs::canonicalize(&self.generated_dir)
            .await
            .map_err(|_| "no generated files available".to_string())?;
        if !resolved.starts_with(&root) {
            return Err(format!("file is not a generated file: {}", path.display()));
        }
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| format!("file not found: {}", path.display()))?;
        if !meta.is_file() {
            return Err(format!("not a file: {}", path.display()));
        }
        Ok(resolved)
    }

    #[instrument(skip(self), fields(chat_id = target.chat_id))]
    async fn send_file(&self, path: &Path, target: ToolTarget) -> ToolResult {
        let resolved = match self.resolve_sendable(path).await {
            Ok(p) => p,
            Err(message) => return ToolResult::failure(message),
        };
        match self
            .bot
            .send_document(target.chat_id, &resolved, FILE_CAPTION, target.reply_to)
            .await
        {
            Ok(()) => {
                let mut payload = Map::new();
                payload.insert("sent".to_string(), Value::Bool(true));
                ToolResult::ok(payload)
            }
            Err(e) => {
                warn!(error = %e, "send_file delivery failed");
                ToolResult::failure("failed to send the file")
            }
        }
    }

    #[instrument(skip(self, code), fields(language = language.as_str()))]
    async fn run_code(&self, language: Language, code: &str) -> ToolResult {
        match self.sandbox.execute(language, code, SANDBOX_TIMEOUT).await {
            Ok(output) => {
                let mut payload = Map::new();
                payload.insert(
                    "stdout".to_string(),
                    Value::String(truncate_chars(&output.stdout, MAX_OUTPUT_CHARS)),
                );
                payload.insert(
                    "stderr".to_string(),
                    Value::String(truncate_chars(&output.stderr, MAX_OUTPUT_CHARS)),
                );
                if output.succeeded() {
                    ToolResult::ok(payload)
                } else {
                    payload.insert("exit_code".to_string(), json!(output.exit_code));
                    payload.insert("error".to_string(), Value::String("process exited with an error".to_string()));
                    ToolResult {
                        success: false,
                        payload,
                    }
                }
            }
            Err(SandboxError::Timeout(_)) => ToolResult::failure("execution timed out"),
            Err(e) => {
                warn!(error = %e, "Sandbox run failed");
                ToolResult::failure("sandbox unavailable")
            }
        }
    }
}
