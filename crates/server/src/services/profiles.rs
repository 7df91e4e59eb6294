//! Profile store interface.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use serde_json::value::RawValue;

use autodromo_core::{NewProfile, UserId};

/// Errors returned by a [`ProfileStore`].
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the request.
    #[error("profile store error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The table URL could not be built.
    #[error("invalid profile store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistence for `profiles` rows keyed by user id.
///
/// `access_token` is the signed-in user's provider token. The store's
/// row-level policies only let a user touch their own row, so callers pass it
/// whenever they have one.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a new row. Fails if a row with the same id exists.
    async fn insert(
        &self,
        profile: &NewProfile,
        access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError>;

    /// Insert a row, or update the existing one with the same id.
    async fn upsert(
        &self,
        profile: &NewProfile,
        access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError>;

    /// Rows whose id equals `id` (zero or one), as the JSON array the store
    /// returned. The text is passed through untouched, so columns and
    /// timestamp formats are whatever the store emits.
    async fn find_by_id(
        &self,
        id: &UserId,
        access_token: Option<&SecretString>,
    ) -> Result<Box<RawValue>, ProfileStoreError>;
}
