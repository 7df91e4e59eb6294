//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                - Greeting (personalised when signed in)
//! GET  /health          - Liveness check
//! GET  /health/ready    - Readiness check (identity provider reachable)
//!
//! # Auth
//! POST /signup          - Create account and profile row
//! POST /login           - Email/password login
//! GET  /login/google    - Redirect to Google OAuth
//! GET  /callback        - Handle OAuth callback
//! GET  /logout          - Logout
//!
//! # Profile (requires auth)
//! GET  /profile         - Own profile rows
//! ```

pub mod auth;
pub mod health;
pub mod home;
pub mod oauth;
pub mod profile;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{StatusCode, header::LOCATION},
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// `{"message": "..."}` body shared by the informational endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A `302 Found` redirect to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Password auth
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        // Google OAuth
        .route("/login/google", get(oauth::login_google))
        .route("/callback", get(oauth::callback))
        // Profile
        .route("/profile", get(profile::show))
}

/// Build the full application: routes, session, security headers and tracing.
///
/// Sentry layers are added by the binary so tests can drive this router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        request_id = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    tracing::info!("request completed");
                }),
        )
        .with_state(state)
}
