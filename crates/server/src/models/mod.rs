//! Domain models for the server.

pub mod session;

pub use session::{AuthenticatedUser, keys as session_keys};
