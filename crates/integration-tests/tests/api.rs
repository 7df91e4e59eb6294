//! Index, health checks and response headers.

use axum::http::StatusCode;
use serde_json::json;

use autodromo_integration_tests::TestApp;
use autodromo_server::messages;

#[tokio::test]
async fn test_index_anonymous() {
    let mut app = TestApp::new();

    let resp = app.get("/").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json, json!({ "message": messages::INDEX_ANONYMOUS }));
}

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::new();

    let resp = app.get("/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, "ok");
}

#[tokio::test]
async fn test_readiness_with_reachable_provider() {
    let mut app = TestApp::new();

    let resp = app.get("/health/ready").await;

    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let mut app = TestApp::new();

    for resp in [app.get("/").await, app.get("/profile").await] {
        assert_eq!(resp.headers["x-frame-options"], "DENY");
        assert_eq!(resp.headers["x-content-type-options"], "nosniff");
        assert_eq!(resp.headers["cache-control"], "no-store");
    }
}

#[tokio::test]
async fn test_request_id_generated_and_echoed() {
    let mut app = TestApp::new();

    let resp = app.get("/").await;
    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route() {
    let mut app = TestApp::new();

    let resp = app.get("/cars").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_method() {
    let mut app = TestApp::new();

    let resp = app.get("/signup").await;

    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
}
