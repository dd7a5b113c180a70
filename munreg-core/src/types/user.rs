//! User accounts.
//!
//! Kept for compatibility with the admin tooling; nothing authenticates
//! against these records.

use serde::{Deserialize, Serialize};

/// A stored user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (assigned by the store)
    pub id: u64,
    /// Unique login name
    pub username: String,
    /// Stored as given
    pub password: String,
}

/// Input for creating a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Password
    pub password: String,
}

impl NewUser {
    /// Creates a new user payload.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Attaches the store-assigned id.
    pub fn into_user(self, id: u64) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
        }
    }
}
