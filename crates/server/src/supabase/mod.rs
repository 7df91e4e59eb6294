//! Supabase-backed implementations of the collaborator traits.
//!
//! A single [`SupabaseClient`] talks to two Supabase services:
//!
//! - **Auth** (`/auth/v1`) implements [`IdentityProvider`](crate::services::IdentityProvider)
//! - **PostgREST** (`/rest/v1`) implements [`ProfileStore`](crate::services::ProfileStore)
//!
//! Every request carries the project API key as `apikey`. The `Authorization`
//! bearer is the user's access token when one is known, else the API key.
//!
//! # Example
//!
//! ```rust,ignore
//! use autodromo_server::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//! let session = client.sign_in_with_password("a@b.com", "hunter22").await?;
//! let rows = client.find_by_id(&session.user.id, session.access_token.as_ref()).await?;
//! ```

mod auth;
mod rest;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::SupabaseConfig;

/// Client for a Supabase project.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("autodromo/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Url::join replaces the last segment unless the base ends in '/'
        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                http,
                base_url,
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// Resolve a path relative to the project URL.
    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.inner.base_url.join(path)
    }

    /// Start a request with the project's auth headers.
    fn request(&self, method: Method, url: Url, bearer: Option<&SecretString>) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.inner.api_key);
        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(bearer.expose_secret())
    }
}

/// Error body shapes returned by Supabase services.
///
/// Auth uses `msg` or `error`/`error_description`; PostgREST uses `message`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or_else(|| match self.error {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            })
            .filter(|m| !m.is_empty())
    }
}

/// Extract a human-readable message from a failed response.
///
/// Falls back to the status reason phrase when the body is not a known shape.
async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    parse_error_message(status, &text)
}

fn parse_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.to_string(), str::to_string)
        })
}
