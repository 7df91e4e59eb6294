//! Supabase Auth (GoTrue) as the identity provider.

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

use autodromo_core::{Email, UserId};

use super::{SupabaseClient, error_message};
use crate::models::AuthenticatedUser;
use crate::services::{IdentityError, IdentityProvider, OAuthProvider, ProviderSession};

// ─────────────────────────────────────────────────────────────────────────────
// Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: UserId,
    email: Option<Email>,
}

impl UserResponse {
    fn into_user(self) -> Result<AuthenticatedUser, IdentityError> {
        let email = self
            .email
            .ok_or_else(|| IdentityError::Malformed(format!("user {} has no email", self.id)))?;
        Ok(AuthenticatedUser { id: self.id, email })
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: UserResponse,
}

impl SessionResponse {
    fn into_session(self) -> Result<ProviderSession, IdentityError> {
        Ok(ProviderSession {
            user: self.user.into_user()?,
            access_token: Some(SecretString::from(self.access_token)),
        })
    }
}

/// Signup answers with a session when email confirmation is disabled and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(UserResponse),
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity Provider
// ─────────────────────────────────────────────────────────────────────────────

impl SupabaseClient {
    /// Send a request and decode a successful JSON body.
    async fn send_auth<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, IdentityError> {
        let response = request.send().await?;
        let response = check_auth_status(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| IdentityError::Malformed(e.to_string()))
    }
}

/// Map non-success statuses: 4xx is a refusal, anything else an outage.
async fn check_auth_status(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = error_message(status, response).await;
    if status.is_client_error() {
        tracing::debug!(status = status.as_u16(), %message, "Supabase Auth refused request");
        Err(IdentityError::Rejected(message))
    } else {
        Err(IdentityError::Unavailable {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError> {
        let url = self.endpoint("auth/v1/signup")?;
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }));

        match self.send_auth::<SignUpResponse>(request).await? {
            SignUpResponse::Session(session) => session.into_session(),
            SignUpResponse::User(user) => Ok(ProviderSession {
                user: user.into_user()?,
                access_token: None,
            }),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }));

        self.send_auth::<SessionResponse>(request)
            .await?
            .into_session()
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, IdentityError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, IdentityError> {
        let url = self.endpoint("auth/v1/user")?;
        let token = SecretString::from(code.to_owned());
        let request = self.request(Method::GET, url, Some(&token));

        let user = self.send_auth::<UserResponse>(request).await?.into_user()?;
        Ok(ProviderSession {
            user,
            access_token: Some(token),
        })
    }

    async fn sign_out(&self, access_token: &SecretString) -> Result<(), IdentityError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check_auth_status(response).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), IdentityError> {
        let url = self.endpoint("auth/v1/health")?;
        let response = self.request(Method::GET, url, None).send().await?;
        check_auth_status(response).await?;
        Ok(())
    }
}
