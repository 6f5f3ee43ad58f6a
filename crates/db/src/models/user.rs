//! User entity. Users are created on first sight of a username (the
//! external auth layer owns sign-in) and never deleted, because
//! annotations reference them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub display_name: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for `POST /api/v1/users` (get-or-create).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub display_name: Option<String>,
}
