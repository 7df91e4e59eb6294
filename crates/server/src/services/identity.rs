//! Identity provider interface.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::models::AuthenticatedUser;

/// Errors returned by an [`IdentityProvider`].
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider refused the request (bad credentials, duplicate signup,
    /// invalid OAuth code). The message is the provider's own text.
    #[error("{0}")]
    Rejected(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider failed on its side (5xx).
    #[error("identity provider unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    /// The provider answered with a body we could not interpret.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// A provider URL could not be built.
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl IdentityError {
    /// Whether the provider deliberately refused the request, as opposed to
    /// the call itself failing.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// OAuth providers offered at `/login/{provider}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    /// Provider name as understood by the identity provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

/// Result of a successful credential or OAuth exchange.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    /// Identity issued by the provider.
    pub user: AuthenticatedUser,
    /// Provider token for the user, when the provider issued one (signup with
    /// pending email confirmation does not).
    pub access_token: Option<SecretString>,
}

/// Credential storage, OAuth flows and provider session tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a user from email and password.
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError>;

    /// Authenticate with email and password.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError>;

    /// URL the browser is sent to in order to start an OAuth flow.
    ///
    /// `redirect_to` is where the provider sends the browser back with a
    /// `code` query parameter.
    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, IdentityError>;

    /// Resolve the `code` received on the OAuth callback to a user.
    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, IdentityError>;

    /// Invalidate the provider-side session behind `access_token`.
    async fn sign_out(&self, access_token: &SecretString) -> Result<(), IdentityError>;

    /// Check that the provider is reachable.
    async fn health_check(&self) -> Result<(), IdentityError>;
}
