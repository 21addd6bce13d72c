//! Database models for users.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Request structure for creating users in the database
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    /// Stored lowercased; lookups by email are case-insensitive.
    pub email: String,
    pub password_hash: String,
}

/// Database response for a user record
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}
