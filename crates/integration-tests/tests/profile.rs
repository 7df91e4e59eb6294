//! `GET /profile` through the full router.

use axum::http::StatusCode;
use serde_json::json;

use autodromo_integration_tests::TestApp;
use autodromo_server::messages;

async fn signed_up_and_logged_in(app: &mut TestApp) {
    app.post_json(
        "/signup",
        json!({
            "email": "fangio@maserati.ar",
            "password": "250f-1957",
            "username": "chueco",
            "favorite_car": "Maserati 250F",
        }),
    )
    .await;
    let login = app
        .post_json(
            "/login",
            json!({ "email": "fangio@maserati.ar", "password": "250f-1957" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_requires_login_and_skips_store() {
    let mut app = TestApp::new();

    let resp = app.get("/profile").await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json, json!({ "error": messages::LOGIN_REQUIRED }));
    assert_eq!(app.profiles.find_calls(), 0);
}

#[tokio::test]
async fn test_profile_returns_own_row_as_list() {
    let mut app = TestApp::new();
    signed_up_and_logged_in(&mut app).await;

    let resp = app.get("/profile").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.json,
        json!([{
            "id": "user-1",
            "email": "fangio@maserati.ar",
            "username": "chueco",
            "favorite_car": "Maserati 250F",
            "created_at": null,
        }])
    );
    assert_eq!(app.profiles.find_calls(), 1);
}

#[tokio::test]
async fn test_profile_without_row_is_empty_list() {
    let mut app = TestApp::new();
    app.identity.add_account("stirling@moss.uk", "vanwall57");
    app.post_json(
        "/login",
        json!({ "email": "stirling@moss.uk", "password": "vanwall57" }),
    )
    .await;

    let resp = app.get("/profile").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json, json!([]));
}

#[tokio::test]
async fn test_profile_with_tampered_cookie() {
    let mut app = TestApp::new();
    signed_up_and_logged_in(&mut app).await;
    let cookie = app.cookie().expect("login should set a cookie").to_string();

    // Flip the last character of the signed value
    let mut tampered = cookie.clone();
    let last = tampered.pop().expect("cookie has a value");
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let mut forged = app.fresh_browser();
    forged.set_cookie(&tampered);
    let resp = forged.get("/profile").await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.profiles.find_calls(), 0);
}
