//! External collaborators the handlers depend on.
//!
//! Identity (credentials, OAuth, provider tokens) and profile persistence are
//! owned by an external backend. Handlers only see the traits defined here;
//! [`crate::supabase`] provides the production implementations and tests
//! substitute in-memory doubles.

pub mod identity;
pub mod profiles;

pub use identity::{IdentityError, IdentityProvider, OAuthProvider, ProviderSession};
pub use profiles::{ProfileStore, ProfileStoreError};
