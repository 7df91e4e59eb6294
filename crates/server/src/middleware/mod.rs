//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (binary only)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (record `x-request-id` on the span)
//! 4. Security headers
//! 5. Session layer (tower-sessions, signed cookie, memory store)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{AuthSession, SESSION_COOKIE_NAME, create_session_layer};
