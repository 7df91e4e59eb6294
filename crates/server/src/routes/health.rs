//! Health check routes.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable unless the identity provider answers its
/// health probe.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.identity().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Identity provider health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
