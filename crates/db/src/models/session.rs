//! Auth session model and DTOs.

use sqlx::FromRow;
use storysplice_core::types::{DbId, Timestamp};

/// A refresh-token session row from the `auth_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct AuthSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a new auth session.
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
}
