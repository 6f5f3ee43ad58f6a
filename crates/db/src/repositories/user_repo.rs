//! Repository for the `users` table.

use sqlx::{PgConnection, PgPool};

use labelforge_core::types::DbId;

use crate::models::user::{CreateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, username, display_name, created_at";

/// Provides lookup and get-or-create operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Get a user by username, creating it on first sight.
    ///
    /// The no-op `DO UPDATE` makes `RETURNING` yield the existing row
    /// on conflict instead of nothing.
    pub async fn get_or_create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, display_name) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_users_username \
             DO UPDATE SET display_name = COALESCE(EXCLUDED.display_name, users.display_name) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// List all users, ordered by username.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY username");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Transactional form of `get_or_create` for callers that batch
    /// several upserts in one transaction.
    pub async fn get_or_create_tx(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username) \
             VALUES ($1) \
             ON CONFLICT ON CONSTRAINT uq_users_username \
             DO UPDATE SET username = EXCLUDED.username \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_one(conn)
            .await
    }
}
