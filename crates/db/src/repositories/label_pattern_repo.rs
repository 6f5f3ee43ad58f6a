//! Repository for the `label_patterns` table.

use sqlx::PgPool;

use crate::models::label_patterns::LabelPatterns;

/// Column list for `label_patterns` queries.
const COLUMNS: &str = "id, label, patterns, created_at, updated_at";

/// Provides get/set operations for per-label pattern lists.
pub struct LabelPatternRepo;

impl LabelPatternRepo {
    /// The pattern list for a label, if one was ever set.
    pub async fn get(pool: &PgPool, label: &str) -> Result<Option<LabelPatterns>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM label_patterns WHERE label = $1");
        sqlx::query_as::<_, LabelPatterns>(&query)
            .bind(label)
            .fetch_optional(pool)
            .await
    }

    /// Replace the pattern list for a label, creating the row if
    /// needed.
    pub async fn set(
        pool: &PgPool,
        label: &str,
        patterns: &[String],
    ) -> Result<LabelPatterns, sqlx::Error> {
        let query = format!(
            "INSERT INTO label_patterns (label, patterns) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_label_patterns_label \
             DO UPDATE SET patterns = EXCLUDED.patterns, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LabelPatterns>(&query)
            .bind(label)
            .bind(serde_json::json!(patterns))
            .fetch_one(pool)
            .await
    }
}
