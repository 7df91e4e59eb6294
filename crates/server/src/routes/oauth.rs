//! OAuth route handlers.
//!
//! - Login: redirects the browser to the identity provider's Google flow
//! - Callback: resolves the returned `code` to a user, starts a session and
//!   makes sure the user has a profile row

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use autodromo_core::NewProfile;

use super::found;
use crate::error::{AppError, Result, set_sentry_user};
use crate::messages;
use crate::middleware::AuthSession;
use crate::services::{IdentityError, OAuthProvider};
use crate::state::AppState;

/// Query parameters on the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code issued by the provider.
    pub code: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Start the Google OAuth flow.
///
/// Stateless: nothing is stored in the session.
///
/// # Route
///
/// `GET /login/google`
pub async fn login_google(State(state): State<AppState>) -> Result<Response> {
    let redirect_to = state.config().oauth_callback_url();
    let url = state
        .identity()
        .authorize_url(OAuthProvider::Google, &redirect_to)?;

    Ok(found(&url))
}

/// Handle the OAuth callback.
///
/// On success the user is signed in and their profile row is upserted with
/// the email's local part as username and a placeholder favourite car, so
/// repeating the callback never duplicates or fails on an existing row.
///
/// # Route
///
/// `GET /callback`
pub async fn callback(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = &query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "OAuth provider returned an error"
        );
    }

    let Some(code) = query.code.filter(|code| !code.is_empty()) else {
        tracing::warn!("OAuth callback missing code");
        return Err(AppError::BadRequest(messages::OAUTH_FAILED.to_string()));
    };

    let signed_in = match state.identity().exchange_code(&code).await {
        Ok(signed_in) => signed_in,
        Err(e @ (IdentityError::Rejected(_) | IdentityError::Malformed(_))) => {
            tracing::warn!(error = %e, "OAuth code did not resolve to a user");
            return Err(AppError::BadRequest(messages::OAUTH_FAILED.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    session
        .set(&signed_in.user, signed_in.access_token.as_ref())
        .await?;
    set_sentry_user(&signed_in.user.id, Some(signed_in.user.email.as_str()));

    let profile = NewProfile::from_oauth(
        signed_in.user.id.clone(),
        signed_in.user.email.clone(),
        messages::PLACEHOLDER_FAVORITE_CAR,
    );
    state
        .profiles()
        .upsert(&profile, signed_in.access_token.as_ref())
        .await?;

    tracing::info!(user_id = %signed_in.user.id, "User signed in with Google");

    Ok(found("/"))
}
