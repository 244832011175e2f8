//! Functional tests for the remote image fetcher

use tokio_test::{assert_err, assert_ok};
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};
use yacht_shot::{config::FetchConfig, media::fetcher::RemoteImageFetcher, AppError};

fn fetcher() -> RemoteImageFetcher {
    RemoteImageFetcher::new(&FetchConfig { timeout_ms: 5_000 }).unwrap()
}

#[tokio::test]
async fn test_content_type_parameters_are_stripped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .and(header("cache-control", "no-cache"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg; charset=binary")
                .set_body_bytes(vec![1, 2, 3]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payload = assert_ok!(fetcher().fetch(&format!("{}/a.png", server.uri())).await);
    assert_eq!(payload.media_type, "image/jpeg");
    assert_eq!(payload.bytes, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_extension_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos/deck.JPEG"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9]))
        .mount(&server)
        .await;

    let url = format!("{}/photos/deck.JPEG?size=large", server.uri());
    let payload = fetcher().fetch(&url).await.unwrap();
    assert_eq!(payload.media_type, "image/jpeg");
}

#[tokio::test]
async fn test_default_media_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9]))
        .mount(&server)
        .await;

    let payload = fetcher().fetch(&format!("{}/blob", server.uri())).await.unwrap();
    assert_eq!(payload.media_type, "image/png");
}

#[tokio::test]
async fn test_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = assert_err!(fetcher().fetch(&format!("{}/gone.png", server.uri())).await);
    match err {
        AppError::UpstreamFetch { status, .. } => assert_eq!(status, Some(503)),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure() {
    // Nothing listens on port 9 (discard) on test machines
    let err = fetcher().fetch("http://127.0.0.1:9/x.png").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamFetch { status: None, .. }));
}
