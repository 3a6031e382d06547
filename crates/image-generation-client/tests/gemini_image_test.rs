//! Integration tests for [`image_generation_client::GeminiImageGenerator`] against a mockito server.

use std::time::Duration;

use gemini_client::GeminiClient;
use image_generation_client::{GeminiImageGenerator, ImageError, ImageGenerator, ImageOptions};

/// **Test: First inline image is decoded and returned.**
#[tokio::test]
async fn test_generate_image_returns_first_image() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash-image:generateContent")
        .match_header("x-goog-api-key", "AIza-img")
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/jpeg","data":"/9j/"}}]}}]}"#)
        .create_async()
        .await;

    let generator = GeminiImageGenerator::new(GeminiClient::with_base_url("AIza-img".to_string(), server.url()));
    let image = generator
        .generate_image("gemini-2.5-flash-image", "a cat", &ImageOptions::default(), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(image.mime_type, "image/jpeg");
    assert_eq!(image.bytes, vec![0xff, 0xd8, 0xff]);
}

/// **Test: An HTTP failure is a Provider error, distinct from NoCandidates/NoImage.**
#[tokio::test]
async fn test_generate_image_provider_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/m:generateContent")
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let generator = GeminiImageGenerator::new(GeminiClient::with_base_url("k".to_string(), server.url()));
    let err = generator
        .generate_image("m", "a cat", &ImageOptions::default(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, ImageError::Provider(_)));
}
