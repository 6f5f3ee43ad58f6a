//! Repository for the `models` and `inferences` tables.

use sqlx::PgPool;

use labelforge_core::scoring::uncertainty::text_key;
use labelforge_core::types::DbId;

use crate::models::model::{Inference, Model, NewInference};

/// Column list for `models` queries.
const MODEL_COLUMNS: &str = "id, label, version, config, created_at";

/// Column list for `inferences` queries.
const INFERENCE_COLUMNS: &str = "id, model_id, text_sha256, text, probs, created_at";

/// Provides operations on the model registry and its inference cache.
pub struct ModelRepo;

impl ModelRepo {
    /// Register the next version for a label. Versions start at 1 and
    /// increase by one; the MAX subquery keeps the sequence dense even
    /// after out-of-band deletes.
    pub async fn create_next_version(
        pool: &PgPool,
        label: &str,
        config: &serde_json::Value,
    ) -> Result<Model, sqlx::Error> {
        let query = format!(
            "INSERT INTO models (label, version, config) \
             VALUES ($1, \
                     (SELECT COALESCE(MAX(version), 0) + 1 FROM models WHERE label = $1), \
                     $2) \
             RETURNING {MODEL_COLUMNS}"
        );
        sqlx::query_as::<_, Model>(&query)
            .bind(label)
            .bind(config)
            .fetch_one(pool)
            .await
    }

    /// The most recent model version for a label, if any.
    pub async fn latest_for_label(
        pool: &PgPool,
        label: &str,
    ) -> Result<Option<Model>, sqlx::Error> {
        let query = format!(
            "SELECT {MODEL_COLUMNS} FROM models \
             WHERE label = $1 \
             ORDER BY version DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Model>(&query)
            .bind(label)
            .fetch_optional(pool)
            .await
    }

    /// List all versions for a label, newest first.
    pub async fn list_for_label(pool: &PgPool, label: &str) -> Result<Vec<Model>, sqlx::Error> {
        let query = format!(
            "SELECT {MODEL_COLUMNS} FROM models WHERE label = $1 ORDER BY version DESC"
        );
        sqlx::query_as::<_, Model>(&query)
            .bind(label)
            .fetch_all(pool)
            .await
    }

    /// Find a model by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Model>, sqlx::Error> {
        let query = format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = $1");
        sqlx::query_as::<_, Model>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Store cached predictions for a model version. The text key is
    /// the SHA-256 of the trimmed text, matching the lookup the
    /// uncertainty model performs at scoring time. Re-inserting a text
    /// overwrites its probabilities.
    pub async fn store_inferences(
        pool: &PgPool,
        model_id: DbId,
        inferences: &[NewInference],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for inference in inferences {
            sqlx::query(
                "INSERT INTO inferences (model_id, text_sha256, text, probs) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT ON CONSTRAINT uq_inferences_model_text \
                 DO UPDATE SET probs = EXCLUDED.probs",
            )
            .bind(model_id)
            .bind(text_key(&inference.text))
            .bind(&inference.text)
            .bind(serde_json::json!(inference.probs))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(inferences.len())
    }

    /// All cached predictions for a model version.
    pub async fn list_inferences(
        pool: &PgPool,
        model_id: DbId,
    ) -> Result<Vec<Inference>, sqlx::Error> {
        let query = format!(
            "SELECT {INFERENCE_COLUMNS} FROM inferences WHERE model_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Inference>(&query)
            .bind(model_id)
            .fetch_all(pool)
            .await
    }
}
