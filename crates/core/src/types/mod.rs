//! Core types for Autodromo.

pub mod email;
pub mod id;
pub mod profile;

pub use email::{Email, EmailError};
pub use id::UserId;
pub use profile::{NewProfile, Profile};
