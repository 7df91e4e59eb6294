//! Authentication extractors.
//!
//! Provide the signed-in user to route handlers, or reject the request before
//! the handler body runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::session::AuthSession;
use crate::error::AppError;
use crate::messages;
use crate::models::AuthenticatedUser;

/// Extractor that requires an authenticated session.
///
/// Rejects with `401 {"error": "Faça login primeiro!"}` when nobody is signed
/// in, so the handler (and anything it would call) never runs.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));

        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized(messages::LOGIN_REQUIRED.to_string()))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request. An unreadable
/// session counts as anonymous.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = match AuthSession::from_request_parts(parts, state).await {
            Ok(session) => session.get().await.ok().flatten(),
            Err(_) => None,
        };

        Ok(Self(user))
    }
}
