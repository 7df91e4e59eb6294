//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{IdentityProvider, ProfileStore};
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The two external collaborators
/// are injected as trait objects so handlers never reach for global clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Create application state from explicit collaborators.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                profiles,
            }),
        }
    }

    /// Create application state backed by the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_supabase(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let client = SupabaseClient::new(&config.supabase)?;
        let identity: Arc<dyn IdentityProvider> = Arc::new(client.clone());
        let profiles: Arc<dyn ProfileStore> = Arc::new(client);
        Ok(Self::new(config, identity, profiles))
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the profile store.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.inner.profiles.as_ref()
    }
}
