//! Integration test support for the Autodromo API.
//!
//! Tests drive the real router from [`autodromo_server::routes::app`] in
//! process, with the identity provider and the profile store replaced by
//! the in-memory fakes below. No network or Supabase project is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p autodromo-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use serde_json::value::RawValue;
use tower::ServiceExt;
use url::Url;

use autodromo_core::{Email, NewProfile, Profile, UserId};
use autodromo_server::config::{ServerConfig, SupabaseConfig};
use autodromo_server::models::AuthenticatedUser;
use autodromo_server::routes;
use autodromo_server::services::{
    IdentityError, IdentityProvider, OAuthProvider, ProfileStore, ProfileStoreError,
    ProviderSession,
};
use autodromo_server::state::AppState;

/// Public URL the test server pretends to be served from.
pub const BASE_URL: &str = "http://localhost:5000";

/// Authorize endpoint of [`FakeIdentityProvider`].
pub const FAKE_AUTHORIZE_URL: &str = "https://auth.test/authorize";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Configuration for an in-process server.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 5000,
        base_url: BASE_URL.to_string(),
        session_secret: SecretString::from("t3st!Sig#For$Integration%Runs^42&xyzQ7".to_string()),
        session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        supabase: SupabaseConfig {
            url: Url::parse("http://127.0.0.1:54321").expect("valid test URL"),
            api_key: SecretString::from("anon-key-for-tests".to_string()),
            timeout: Duration::from_secs(5),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

// ============================================================================
// Fake identity provider
// ============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: Email,
    password: String,
}

/// In-memory identity provider.
///
/// Accounts are keyed by email. OAuth codes must be registered with
/// [`FakeIdentityProvider::register_code`] before the callback is hit.
#[derive(Debug, Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    codes: Mutex<HashMap<String, AuthenticatedUser>>,
    next_id: AtomicUsize,
    sign_up_calls: AtomicUsize,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    fail_sign_out: AtomicBool,
}

impl FakeIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account directly, bypassing `/signup`.
    pub fn add_account(&self, email: &str, password: &str) -> UserId {
        let id = UserId::new(format!(
            "user-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        ));
        let email = Email::parse(email).unwrap_or_else(|e| panic!("bad test email: {e}"));
        lock(&self.accounts).insert(
            email.as_str().to_string(),
            Account {
                id: id.clone(),
                email,
                password: password.to_string(),
            },
        );
        id
    }

    /// Make `code` resolve to the given user on the OAuth callback.
    pub fn register_code(&self, code: &str, id: &str, email: &str) {
        let user = AuthenticatedUser {
            id: UserId::new(id),
            email: Email::parse(email).unwrap_or_else(|e| panic!("bad test email: {e}")),
        };
        lock(&self.codes).insert(code.to_string(), user);
    }

    /// Make every `sign_out` fail as if the provider were down.
    pub fn fail_sign_out(&self) {
        self.fail_sign_out.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn session_for(user: AuthenticatedUser) -> ProviderSession {
        let token = SecretString::from(format!("token-{}", user.id));
        ProviderSession {
            user,
            access_token: Some(token),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderSession, IdentityError> {
        self.sign_up_calls.fetch_add(1, Ordering::SeqCst);

        let email = Email::parse(email).map_err(|_| {
            IdentityError::Rejected("Unable to validate email address: invalid format".to_string())
        })?;
        if password.len() < 6 {
            return Err(IdentityError::Rejected(
                "Password should be at least 6 characters.".to_string(),
            ));
        }
        if lock(&self.accounts).contains_key(email.as_str()) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }

        let id = self.add_account(email.as_str(), password);
        Ok(Self::session_for(AuthenticatedUser { id, email }))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, IdentityError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let account = lock(&self.accounts)
            .get(email)
            .filter(|account| account.password == password)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("Invalid login credentials".to_string()))?;

        Ok(Self::session_for(AuthenticatedUser {
            id: account.id,
            email: account.email,
        }))
    }

    fn authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, IdentityError> {
        let url = Url::parse_with_params(
            FAKE_AUTHORIZE_URL,
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderSession, IdentityError> {
        lock(&self.codes)
            .get(code)
            .cloned()
            .map(Self::session_for)
            .ok_or_else(|| IdentityError::Rejected("invalid JWT".to_string()))
    }

    async fn sign_out(&self, _access_token: &SecretString) -> Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

// ============================================================================
// Fake profile store
// ============================================================================

/// In-memory `profiles` table.
#[derive(Debug, Default)]
pub struct FakeProfileStore {
    rows: Mutex<HashMap<UserId, Profile>>,
    insert_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    find_calls: AtomicUsize,
    fail_writes: AtomicBool,
}

impl FakeProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert and upsert fail as if the store were down.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Stored row for `id`, if any.
    #[must_use]
    pub fn row(&self, id: &str) -> Option<Profile> {
        lock(&self.rows).get(&UserId::new(id)).cloned()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        lock(&self.rows).len()
    }

    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), ProfileStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProfileStoreError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn insert(
        &self,
        profile: &NewProfile,
        _access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let mut rows = lock(&self.rows);
        if rows.contains_key(&profile.id) {
            return Err(ProfileStoreError::Api {
                status: 409,
                message: "duplicate key value violates unique constraint \"profiles_pkey\""
                    .to_string(),
            });
        }
        rows.insert(profile.id.clone(), profile.clone().into_profile(None));
        Ok(())
    }

    async fn upsert(
        &self,
        profile: &NewProfile,
        _access_token: Option<&SecretString>,
    ) -> Result<(), ProfileStoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        lock(&self.rows).insert(profile.id.clone(), profile.clone().into_profile(None));
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        _access_token: Option<&SecretString>,
    ) -> Result<Box<RawValue>, ProfileStoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        let rows: Vec<Profile> = lock(&self.rows).get(id).cloned().into_iter().collect();
        Ok(serde_json::value::to_raw_value(&rows)?)
    }
}

// ============================================================================
// Test harness
// ============================================================================

/// A response collected from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Body parsed as JSON, or `Value::Null` when it is not JSON.
    pub json: Value,
    pub text: String,
}

impl TestResponse {
    /// The `Location` header, for redirects.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// One browser talking to one in-process server.
///
/// Keeps the session cookie between requests like a browser would.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub identity: Arc<FakeIdentityProvider>,
    pub profiles: Arc<FakeProfileStore>,
}

impl TestApp {
    /// Server backed by fresh, empty fakes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fakes(
            Arc::new(FakeIdentityProvider::new()),
            Arc::new(FakeProfileStore::new()),
        )
    }

    /// Server backed by the given fakes.
    #[must_use]
    pub fn with_fakes(identity: Arc<FakeIdentityProvider>, profiles: Arc<FakeProfileStore>) -> Self {
        let state = AppState::new(test_config(), identity.clone(), profiles.clone());
        Self {
            router: routes::app(state),
            cookie: None,
            identity,
            profiles,
        }
    }

    /// Server backed by a fake identity provider and an arbitrary profile
    /// store, e.g. a real client pointed at a mock upstream.
    ///
    /// `self.profiles` is a detached fake that the router never calls.
    #[must_use]
    pub fn with_profile_store(store: Arc<dyn ProfileStore>) -> Self {
        let identity = Arc::new(FakeIdentityProvider::new());
        let state = AppState::new(test_config(), identity.clone(), store);
        Self {
            router: routes::app(state),
            cookie: None,
            identity,
            profiles: Arc::new(FakeProfileStore::new()),
        }
    }

    /// A second browser against the same server and session store.
    #[must_use]
    pub fn fresh_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            cookie: None,
            identity: self.identity.clone(),
            profiles: self.profiles.clone(),
        }
    }

    /// A second browser holding a copy of this one's cookie.
    #[must_use]
    pub fn clone_browser(&self) -> Self {
        Self {
            cookie: self.cookie.clone(),
            ..self.fresh_browser()
        }
    }

    /// The `name=value` pair of the session cookie, if held.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Replace the held cookie, e.g. with a forged one.
    pub fn set_cookie(&mut self, cookie: &str) {
        self.cookie = Some(cookie.to_string());
    }

    /// Whether the browser currently holds a session cookie.
    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    /// Send a request and collect the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        self.store_cookie(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            json,
            text,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post_json(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Follow `Set-Cookie` the way a browser does: keep `name=value`, drop it
    /// when the server expires the cookie.
    fn store_cookie(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or_default().trim();
            let removed = pair.ends_with('=') || raw.contains("Max-Age=0");
            self.cookie = if removed { None } else { Some(pair.to_string()) };
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
