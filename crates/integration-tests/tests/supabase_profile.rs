//! `GET /profile` against the real Supabase client and a mock PostgREST.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autodromo_integration_tests::TestApp;
use autodromo_server::config::SupabaseConfig;
use autodromo_server::supabase::SupabaseClient;

async fn app_against(server: &MockServer) -> TestApp {
    let client = SupabaseClient::new(&SupabaseConfig {
        url: Url::parse(&server.uri()).expect("mock server URI"),
        api_key: SecretString::from("anon-key-for-tests".to_string()),
        timeout: Duration::from_secs(5),
    })
    .expect("Failed to build Supabase client");

    let mut app = TestApp::with_profile_store(Arc::new(client));
    app.identity.add_account("mika@hakkinen.fi", "mp4-13-98");
    let login = app
        .post_json(
            "/login",
            json!({ "email": "mika@hakkinen.fi", "password": "mp4-13-98" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    app
}

#[tokio::test]
async fn test_profile_relays_store_body_unchanged() {
    // Offset timestamp and an extra column must survive the round trip
    let body = r#"[{"id":"user-1","email":"mika@hakkinen.fi","username":"mika","favorite_car":"McLaren MP4-13","created_at":"2024-05-01T12:30:00.123456+00:00","country":"FI"}]"#;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.user-1"))
        .and(header("authorization", "Bearer token-user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    let mut app = app_against(&server).await;

    let resp = app.get("/profile").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text, body);
    assert_eq!(resp.headers["content-type"], "application/json");
}

#[tokio::test]
async fn test_profile_store_outage_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let mut app = app_against(&server).await;

    let resp = app.get("/profile").await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.json, json!({ "error": "External service error" }));
}
