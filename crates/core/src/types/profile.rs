//! Rows of the external `profiles` table.
//!
//! The table lives in the backend-as-a-service database; see
//! `supabase/schema.sql` for its definition and row-level policies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Email, UserId};

/// A profile row as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the owning user's provider id.
    pub id: UserId,
    pub email: Email,
    pub username: String,
    /// Absent until the user names one.
    pub favorite_car: Option<String>,
    /// Set by the database on insert.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A profile row to insert or upsert.
///
/// `created_at` is left to the database default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub favorite_car: Option<String>,
}

impl NewProfile {
    /// The profile persisted when a user first signs in through OAuth.
    ///
    /// The username is the local part of the email and the favourite car is
    /// `placeholder_car`.
    #[must_use]
    pub fn from_oauth(id: UserId, email: Email, placeholder_car: &str) -> Self {
        let username = email.local_part().to_owned();
        Self {
            id,
            email,
            username,
            favorite_car: Some(placeholder_car.to_owned()),
        }
    }

    /// Materialise the row as the store would return it.
    #[must_use]
    pub fn into_profile(self, created_at: Option<DateTime<Utc>>) -> Profile {
        Profile {
            id: self.id,
            email: self.email,
            username: self.username,
            favorite_car: self.favorite_car,
            created_at,
        }
    }
}
