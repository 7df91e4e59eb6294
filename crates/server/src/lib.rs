//! Autódromo API server library.
//!
//! Signup, login (password and Google OAuth), logout and profile lookup for
//! the motorsport-history site. Identities and profile rows live in Supabase;
//! this crate holds only the signed session cookie that remembers who is
//! logged in.
//!
//! The router is built by [`routes::app`] so integration tests can drive it
//! with in-memory collaborators.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;
