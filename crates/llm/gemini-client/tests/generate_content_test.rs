//! Integration tests for [`gemini_client::GeminiClient::generate_content`] against a mockito server.

use std::time::Duration;

use gemini_client::{Content, GeminiClient, GeminiError, GenerateContentRequest, Part, Tool};

fn request() -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::text("hello")])],
        system_instruction: Some(Content::system("be brief")),
        tools: Some(vec![Tool::google_search()]),
        generation_config: None,
    }
}

/// **Test: Request is authenticated with x-goog-api-key; text, function call and grounding chunks are parsed.**
///
/// **Setup:** Mock `/models/m:generateContent` returning one candidate with a text part, a functionCall part and
/// grounding metadata.
/// **Action:** `generate_content("m", ..)`.
/// **Expected:** Parts and grounding chunks decoded; the mock saw the key header and the camelCase body.
#[tokio::test]
async fn test_generate_content_parses_candidate() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/m:generateContent")
        .match_header("x-goog-api-key", "AIza-test")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"systemInstruction":{"parts":[{"text":"be brief"}]},"tools":[{"googleSearch":{}}]}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
              "candidates": [{
                "content": {"role": "model", "parts": [
                  {"text": "Here you go"},
                  {"functionCall": {"name": "create_image", "args": {"prompt": "a cat"}}, "thoughtSignature": "sig"}
                ]},
                "finishReason": "STOP",
                "groundingMetadata": {"groundingChunks": [{"web": {"uri": "https://example.com", "title": "Example"}}]}
              }],
              "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
            }"#,
        )
        .create_async()
        .await;

    let client = GeminiClient::with_base_url("AIza-test".to_string(), server.url());
    let response = client
        .generate_content("m", &request(), Duration::from_secs(5))
        .await
        .unwrap();

    mock.assert_async().await;
    let parts = response.first_parts();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].text.as_deref(), Some("Here you go"));
    let call = parts[1].function_call.as_ref().unwrap();
    assert_eq!(call.name, "create_image");
    assert_eq!(call.args["prompt"], "a cat");
    assert_eq!(parts[1].thought_signature.as_deref(), Some("sig"));

    let grounding = response.candidates[0].grounding_metadata.as_ref().unwrap();
    assert_eq!(grounding.grounding_chunks[0].web.as_ref().unwrap().title, "Example");
}

/// **Test: Non-success status carries code and the API's error message.**
#[tokio::test]
async fn test_generate_content_status_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/m:generateContent")
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::with_base_url("bad".to_string(), server.url());
    let err = client
        .generate_content("m", &request(), Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        GeminiError::Status { code, message } => {
            assert_eq!(code, 403);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// **Test: A non-JSON success body is a Decode error, never passed through.**
#[tokio::test]
async fn test_generate_content_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/m:generateContent")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let client = GeminiClient::with_base_url("k".to_string(), server.url());
    let err = client
        .generate_content("m", &request(), Duration::from_secs(5))
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::Decode(_)));
}

/// **Test: Zero candidates decode to an empty candidate list (classification is the caller's job).**
#[tokio::test]
async fn test_generate_content_zero_candidates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/m:generateContent")
        .with_status(200)
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::with_base_url("k".to_string(), server.url());
    let response = client
        .generate_content("m", &request(), Duration::from_secs(5))
        .await
        .unwrap();

    assert!(response.candidates.is_empty());
    assert!(response.first_parts().is_empty());
}
