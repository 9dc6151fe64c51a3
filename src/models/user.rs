//! User model
//!
//! Defines the User entity. Users are created at registration and are
//! immutable afterwards; no operation deletes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// User entity representing a registered account.
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given username and password hash.
    ///
    /// The password must already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash it.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
