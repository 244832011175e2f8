//! Functional tests for `POST /api/generate`

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};
use yacht_shot::{
    api::routes::create_router,
    backend::traits::{ImageModel, ModelFile, ModelRequest, ModelResponse, OutputKind},
    config::Settings,
    prompt::{COMPOSITE_BASE, EDIT_BASE},
    AppError, AppState,
};

type Reply = Box<dyn Fn() -> yacht_shot::Result<ModelResponse> + Send + Sync>;

struct StubModel {
    reply: Reply,
    delay: Option<Duration>,
    calls: Mutex<Vec<ModelRequest>>,
}

impl StubModel {
    fn new(reply: impl Fn() -> yacht_shot::Result<ModelResponse> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            delay: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(|| Ok(ModelResponse::default())),
            delay: Some(delay),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn png_file() -> Arc<Self> {
        Self::new(|| {
            Ok(ModelResponse {
                files: vec![ModelFile {
                    media_type: "image/png".to_string(),
                    base64: Some("Zm9v".to_string()),
                    bytes: None,
                }],
                text: None,
            })
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ImageModel for StubModel {
    fn provider(&self) -> &str {
        "stub"
    }

    fn model_id(&self) -> &str {
        "stub-model"
    }

    async fn generate(&self, request: ModelRequest) -> yacht_shot::Result<ModelResponse> {
        self.calls.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.reply)()
    }
}

async fn scene_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scene.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"base".to_vec()),
        )
        .mount(&server)
        .await;
    server
}

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.scene.base_image_url = format!("{}/scene.jpg", server.uri());
    settings
}

fn app(settings: Settings, model: Arc<StubModel>) -> Router {
    create_router(Arc::new(AppState::new(settings, model).unwrap()))
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_file_part_becomes_data_url() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let response = app(settings_for(&server), model.clone())
        .oneshot(post(r#"{"prompt":"wave"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"ok": true, "dataUrl": "data:image/png;base64,Zm9v"})
    );

    let calls = model.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].images.len(), 1);
    assert_eq!(calls[0].images[0].bytes, b"base".to_vec());
    assert_eq!(calls[0].images[0].media_type, "image/jpeg");
    assert!(calls[0].prompt.starts_with(EDIT_BASE));
    assert!(calls[0].prompt.ends_with(" — wave"));
    assert_eq!(calls[0].output, OutputKind::ImageAndText);
}

#[tokio::test]
async fn test_configured_output_kind_is_requested() {
    let server = scene_server().await;
    let mut settings = settings_for(&server);
    settings.generation.output = OutputKind::Image;
    let model = StubModel::png_file();
    let response = app(settings, model.clone()).oneshot(post("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.calls.lock()[0].output, OutputKind::Image);
}

#[tokio::test]
async fn test_text_data_url_returned_unchanged() {
    let server = scene_server().await;
    let model = StubModel::new(|| {
        Ok(ModelResponse {
            files: vec![],
            text: Some(json!("data:image/gif,GIF89a")),
        })
    });
    let response = app(settings_for(&server), model)
        .oneshot(post("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["dataUrl"], "data:image/gif,GIF89a");
}

#[tokio::test]
async fn test_malformed_json_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let model = StubModel::png_file();

    let response = app(settings_for(&server), model.clone())
        .oneshot(post("{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Invalid JSON"}));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_null_body_is_an_empty_request() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let response = app(settings_for(&server), model.clone())
        .oneshot(post("null"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.call_count(), 1);
    assert!(model.calls.lock()[0].prompt.starts_with(EDIT_BASE));
}

#[tokio::test]
async fn test_mistyped_field_is_malformed() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let response = app(settings_for(&server), model.clone())
        .oneshot(post(r#"{"prompt":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Invalid JSON"}));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_permission_error_maps_to_unauthorized() {
    let server = scene_server().await;
    let model = StubModel::new(|| {
        Err(AppError::Provider {
            provider: "google".to_string(),
            status: None,
            code: None,
            message: "Caller lacks permission to use this model".to_string(),
        })
    });
    let response = app(settings_for(&server), model)
        .oneshot(post(r#"{"prompt":"x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let header_id = response.headers()["x-error-id"].to_str().unwrap().to_string();

    let body = json_body(response).await;
    let error_id = body["errorId"].as_str().unwrap();
    assert!(!error_id.is_empty());
    assert_eq!(error_id, header_id);
    assert_eq!(body["details"]["name"], "ProviderError");
    assert_eq!(body["details"]["provider"], "google");
}

#[tokio::test]
async fn test_empty_extraction_is_a_failure() {
    let server = scene_server().await;
    let model = StubModel::new(|| Ok(ModelResponse::default()));
    let response = app(settings_for(&server), model)
        .oneshot(post("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body.get("ok").is_none());
    assert!(body["errorId"].is_string());
    assert_eq!(body["details"]["name"], "ExtractionEmpty");
}

#[tokio::test]
async fn test_empty_image_part_is_a_failure() {
    let server = scene_server().await;
    let model = StubModel::new(|| {
        Ok(ModelResponse {
            files: vec![ModelFile {
                media_type: "image/png".to_string(),
                base64: Some(String::new()),
                bytes: None,
            }],
            text: None,
        })
    });
    let response = app(settings_for(&server), model)
        .oneshot(post("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body.get("dataUrl").is_none());
    assert_eq!(body["details"]["name"], "ExtractionEmpty");
}

#[tokio::test]
async fn test_user_data_url_switches_to_composite() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let body = json!({
        "imageUrl": " data:image/png;base64,dXNlcg== ",
        "prompt": "  smile more  "
    });
    let response = app(settings_for(&server), model.clone())
        .oneshot(post(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = model.calls.lock();
    let request = &calls[0];
    assert_eq!(request.images.len(), 2);
    assert_eq!(request.images[1].bytes, b"user".to_vec());
    assert_eq!(request.images[1].media_type, "image/png");
    assert!(request.prompt.starts_with(COMPOSITE_BASE));
    assert!(request.prompt.ends_with(" — smile more"));
}

#[tokio::test]
async fn test_user_remote_image_is_fetched() {
    let server = scene_server().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/webp; q=1")
                .set_body_bytes(b"me".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let model = StubModel::png_file();
    let body = json!({ "imageUrl": format!("{}/me", server.uri()) });

    let response = app(settings_for(&server), model.clone())
        .oneshot(post(body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = model.calls.lock();
    assert_eq!(calls[0].images[1].media_type, "image/webp");
    assert_eq!(calls[0].images[1].bytes, b"me".to_vec());
}

#[tokio::test]
async fn test_unsupported_image_scheme_is_ignored() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let response = app(settings_for(&server), model.clone())
        .oneshot(post(r#"{"imageUrl":"file:///etc/passwd"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = model.calls.lock();
    assert_eq!(calls[0].images.len(), 1);
    assert!(calls[0].prompt.starts_with(EDIT_BASE));
}

#[tokio::test]
async fn test_invalid_user_data_url_is_rejected() {
    let server = scene_server().await;
    let model = StubModel::png_file();
    let response = app(settings_for(&server), model.clone())
        .oneshot(post(r#"{"imageUrl":"data:image/png;base64"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["details"]["name"], "InvalidFormat");
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_base_image_failure_reports_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/scene.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let model = StubModel::png_file();

    let response = app(settings_for(&server), model.clone())
        .oneshot(post("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["details"]["name"], "UpstreamFetchError");
    assert_eq!(body["details"]["status"], 404);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_production_hides_details() {
    let server = scene_server().await;
    let mut settings = settings_for(&server);
    settings.environment = "production".to_string();
    let model = StubModel::new(|| Ok(ModelResponse::default()));

    let response = app(settings, model).oneshot(post("{}")).await.unwrap();
    let body = json_body(response).await;
    assert!(body["errorId"].is_string());
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_required_prompt() {
    let server = scene_server().await;
    let mut settings = settings_for(&server);
    settings.generation.require_prompt = true;
    let model = StubModel::png_file();

    let response = app(settings, model.clone())
        .oneshot(post(r#"{"prompt":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Prompt is required"}));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_deadline_exceeded() {
    let server = scene_server().await;
    let mut settings = settings_for(&server);
    settings.generation.deadline_ms = 100;
    let model = StubModel::slow(Duration::from_secs(5));

    let response = app(settings, model).oneshot(post("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json_body(response).await["details"]["name"], "Timeout");
}

#[tokio::test]
async fn test_health() {
    let server = scene_server().await;
    let response = app(settings_for(&server), StubModel::png_file())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}
