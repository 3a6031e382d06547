//! Image generation client.
//!
//! [`ImageGenerator`] takes a prompt and returns the first generated image. [`GeminiImageGenerator`] calls a
//! Gemini image model through `generateContent` and scans candidates for inline image data.

use std::time::Duration;

use async_trait::async_trait;
use gemini_client::{
    Content, GeminiClient, GeminiError, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ImageConfig, Part,
};
use thiserror::Error;

/// Optional shaping of the output image; `None` fields use the model default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// e.g. `16:9`
    pub aspect_ratio: Option<String>,
    /// e.g. `2K`; only honored by models that support it.
    pub image_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image provider error: {0}")]
    Provider(String),

    #[error("image generation timed out after {0:?}")]
    Timeout(Duration),

    /// Well-formed response without candidates (often a safety block).
    #[error("no candidates returned")]
    NoCandidates,

    /// Candidates came back but none carried an image.
    #[error("no image in response")]
    NoImage,
}

impl From<GeminiError> for ImageError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::Timeout(d) => ImageError::Timeout(d),
            other => ImageError::Provider(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
        timeout: Duration,
    ) -> Result<GeneratedImage, ImageError>;
}

/// Gemini image models (`gemini-2.5-flash-image`, `gemini-3-pro-image-preview`, …).
#[derive(Clone)]
pub struct GeminiImageGenerator {
    client: GeminiClient,
}

impl GeminiImageGenerator {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn image_request(prompt: &str, options: &ImageOptions) -> GenerateContentRequest {
    let image_config = if options.aspect_ratio.is_some() || options.image_size.is_some() {
        Some(ImageConfig {
            aspect_ratio: options.aspect_ratio.clone(),
            image_size: options.image_size.clone(),
        })
    } else {
        None
    };
    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text(prompt)])],
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            image_config,
            ..GenerationConfig::default()
        }),
        ..GenerateContentRequest::default()
    }
}

/// First inline image across all candidates, in order.
fn first_image(response: &GenerateContentResponse) -> Result<GeneratedImage, ImageError> {
    if response.candidates.is_empty() {
        return Err(ImageError::NoCandidates);
    }
    let blob = response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.inline_data.as_ref())
        .find(|b| b.mime_type.starts_with("image/"))
        .ok_or(ImageError::NoImage)?;

    let bytes = blob
        .decode()
        .map_err(|e| ImageError::Provider(format!("invalid image payload: {}", e)))?;
    Ok(GeneratedImage {
        bytes,
        mime_type: blob.mime_type.clone(),
    })
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    #[tracing::instrument(skip(self, prompt, options))]
    async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        options: &ImageOptions,
        timeout: Duration,
    ) -> Result<GeneratedImage, ImageError> {
        tracing::info!(
            model = %model,
            aspect_ratio = ?options.aspect_ratio,
            prompt_preview = %prompt.chars().take(100).collect::<String>(),
            "Image generation request"
        );

        let response = self
            .client
            .generate_content(model, &image_request(prompt, options), timeout)
            .await?;
        let image = first_image(&response)?;

        tracing::info!(model = %model, mime = %image.mime_type, bytes = image.bytes.len(), "Image generated");
        Ok(image)
    }
}
