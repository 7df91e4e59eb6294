//! Autodromo Core - Shared types library.
//!
//! This crate provides the types shared between the HTTP server and its
//! test harness:
//! - [`Email`] - validated email address
//! - [`UserId`] - opaque user identifier issued by the identity provider
//! - [`Profile`] / [`NewProfile`] - rows of the external `profiles` table
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Identity and
//! persistence are owned by external services; these types describe the data
//! exchanged with them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
