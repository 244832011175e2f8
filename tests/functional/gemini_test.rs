//! Functional tests for the Gemini model client

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};
use yacht_shot::{
    backend::{
        gemini::GeminiModel,
        traits::{ImageModel, ModelRequest, OutputKind},
    },
    config::ModelConfig,
    media::ImagePayload,
    AppError,
};

const ENDPOINT: &str = "/v1beta/models/test-model:generateContent";

fn model(server: &MockServer) -> GeminiModel {
    GeminiModel::new(&ModelConfig {
        provider: "google".to_string(),
        id: "test-model".to_string(),
        base_url: format!("{}/", server.uri()),
        api_key: Some("secret".to_string()),
        timeout_ms: 5_000,
    })
    .unwrap()
}

fn request() -> ModelRequest {
    ModelRequest {
        prompt: "put me on the yacht".to_string(),
        images: vec![ImagePayload::new(b"base".to_vec(), "image/jpeg")],
        output: OutputKind::ImageAndText,
    }
}

#[tokio::test]
async fn test_generate_parses_inline_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "secret"))
        .and(body_partial_json(json!({
            "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Enjoy the sea"},
                        {"inlineData": {"mimeType": "image/png", "data": "Zm9v"}}
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = model(&server).generate(request()).await.unwrap();
    assert_eq!(response.files.len(), 1);
    assert_eq!(response.files[0].media_type, "image/png");
    assert_eq!(response.files[0].base64.as_deref(), Some("Zm9v"));
    assert_eq!(response.text, Some(json!("Enjoy the sea")));
}

#[tokio::test]
async fn test_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The caller does not have permission",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&server)
        .await;

    let err = model(&server).generate(request()).await.unwrap_err();
    assert!(err.is_auth_failure());
    match err {
        AppError::Provider {
            status,
            code,
            message,
            provider,
        } => {
            assert_eq!(status, Some(403));
            assert_eq!(code.as_deref(), Some("PERMISSION_DENIED"));
            assert_eq!(message, "The caller does not have permission");
            assert_eq!(provider, "google");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unstructured_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = model(&server).generate(request()).await.unwrap_err();
    assert!(!err.is_auth_failure());
    assert!(err.to_string().contains("upstream exploded"));
}
