//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error is rendered as a
//! JSON body `{"error": "..."}`; server-side failures are captured to Sentry
//! before responding and never expose upstream details to the client.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{IdentityError, ProfileStoreError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity provider refused the request or could not be reached.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Profile store operation failed.
    #[error("Profile store error: {0}")]
    Profiles(#[from] ProfileStoreError),

    /// Session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Identity(IdentityError::Rejected(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Identity(IdentityError::InvalidUrl(_)) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Identity(_) | Self::Profiles(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message placed in the JSON body.
    ///
    /// Provider rejections are surfaced verbatim; server-side failures are
    /// replaced with a generic text.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Identity(IdentityError::Rejected(message))
            | Self::BadRequest(message)
            | Self::Unauthorized(message) => message.clone(),
            Self::Identity(IdentityError::InvalidUrl(_)) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Identity(_) | Self::Profiles(_) => "External service error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Malformed request bodies (wrong content type, invalid JSON, wrong field
/// types) are client errors like any other and get the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
