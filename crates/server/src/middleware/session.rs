//! Session middleware configuration and the per-request session handle.
//!
//! Sessions live in the in-process `tower-sessions` memory store. The cookie
//! only carries the session id and is signed with a key derived from
//! `AUTODROMO_SESSION_SECRET`, so clients cannot forge or tamper with it.

use axum::{extract::FromRequestParts, http::request::Parts};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite, time};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::models::{AuthenticatedUser, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "autodromo_session";

/// Create the session layer with an in-memory store and signed cookies.
///
/// Expiry is a sliding window: every request that touches the session pushes
/// the deadline out by `config.session_ttl`.
#[must_use]
pub fn create_session_layer(config: &ServerConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let store = MemoryStore::default();
    let ttl_seconds = i64::try_from(config.session_ttl.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(ttl_seconds)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.session_secret))
}

/// Derive the 64-byte cookie signing key from the configured secret.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    // SHA-512 output is exactly the 64 bytes `Key::from` requires
    Key::from(digest.as_slice())
}

/// The current request's session, narrowed to authentication state.
///
/// Handlers receive it as an extractor instead of touching process-wide
/// state. All writes end up in the `Set-Cookie` of the response.
#[derive(Debug, Clone)]
pub struct AuthSession(Session);

impl AuthSession {
    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn get(&self) -> Result<Option<AuthenticatedUser>, AppError> {
        Ok(self.0.get(session_keys::CURRENT_USER).await?)
    }

    /// The identity provider token of the signed-in user, if one was issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn access_token(&self) -> Result<Option<SecretString>, AppError> {
        let token: Option<String> = self.0.get(session_keys::PROVIDER_TOKEN).await?;
        Ok(token.map(SecretString::from))
    }

    /// Record `user` as signed in, replacing any previous user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set(
        &self,
        user: &AuthenticatedUser,
        access_token: Option<&SecretString>,
    ) -> Result<(), AppError> {
        self.0.insert(session_keys::CURRENT_USER, user).await?;
        match access_token {
            Some(token) => {
                self.0
                    .insert(session_keys::PROVIDER_TOKEN, token.expose_secret())
                    .await?;
            }
            None => {
                self.0
                    .remove::<String>(session_keys::PROVIDER_TOKEN)
                    .await?;
            }
        }
        Ok(())
    }

    /// Forget the signed-in user and destroy the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be updated.
    pub async fn clear(&self) -> Result<(), AppError> {
        self.0
            .remove::<AuthenticatedUser>(session_keys::CURRENT_USER)
            .await?;
        self.0.flush().await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
    }
}
