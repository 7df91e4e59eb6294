//! Password authentication route handlers.
//!
//! Signup, login and logout. Credentials are checked by the identity
//! provider; this module only validates the request shape, records the
//! outcome in the session and persists the signup profile.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;

use autodromo_core::NewProfile;

use super::MessageResponse;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::messages;
use crate::middleware::AuthSession;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// `POST /signup` body.
///
/// Fields are optional at the type level so that a missing one produces the
/// API's own 400 rather than a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub favorite_car: Option<String>,
}

/// `POST /login` body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| AppError::BadRequest(format!("missing field: {field}")))
}

// =============================================================================
// Signup
// =============================================================================

/// Create an identity, then its profile row.
///
/// The two steps are not transactional: if the profile insert fails the
/// identity already exists without a profile. That case is logged with the
/// user id and answered with the upstream-error shape; the user can still log
/// in, and the next OAuth sign-in upserts the missing row.
///
/// # Route
///
/// `POST /signup`
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(payload) = payload?;
    let email = required("email", payload.email)?;
    let password = required("password", payload.password)?;
    let username = required("username", payload.username)?;

    let created = state
        .identity()
        .sign_up(&email, &password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Signup refused by identity provider"))?;

    let profile = NewProfile {
        id: created.user.id.clone(),
        email: created.user.email.clone(),
        username,
        favorite_car: payload.favorite_car,
    };

    if let Err(e) = state
        .profiles()
        .insert(&profile, created.access_token.as_ref())
        .await
    {
        tracing::error!(
            user_id = %created.user.id,
            error = %e,
            "Identity created but profile insert failed; user has no profile row"
        );
        return Err(e.into());
    }

    tracing::info!(user_id = %created.user.id, "Account created");

    Ok(Json(MessageResponse::new(messages::SIGNUP_OK)))
}

// =============================================================================
// Login
// =============================================================================

/// Authenticate with email and password and start a session.
///
/// A refused login leaves the session exactly as it was.
///
/// # Route
///
/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    session: AuthSession,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(payload) = payload?;
    let email = required("email", payload.email)?;
    let password = required("password", payload.password)?;

    let signed_in = state
        .identity()
        .sign_in_with_password(&email, &password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login refused by identity provider"))?;

    session
        .set(&signed_in.user, signed_in.access_token.as_ref())
        .await?;
    set_sentry_user(&signed_in.user.id, Some(signed_in.user.email.as_str()));

    tracing::info!(user_id = %signed_in.user.id, "User logged in");

    Ok(Json(MessageResponse::new(messages::LOGIN_OK)))
}

// =============================================================================
// Logout
// =============================================================================

/// End the session.
///
/// The provider-side token is revoked on a best-effort basis: whatever the
/// provider answers, the local session is destroyed.
///
/// # Route
///
/// `GET /logout`
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<MessageResponse>> {
    match session.access_token().await {
        Ok(Some(token)) => {
            if let Err(e) = state.identity().sign_out(&token).await {
                tracing::warn!(error = %e, "Failed to revoke provider session");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to read provider token from session"),
    }

    session.clear().await?;
    clear_sentry_user();

    Ok(Json(MessageResponse::new(messages::LOGOUT_OK)))
}
