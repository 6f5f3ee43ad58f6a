//! Repository for the `training_data` table.

use sqlx::PgPool;

use labelforge_core::types::DbId;

use crate::models::training_data::TrainingData;

/// Column list for `training_data` queries.
const COLUMNS: &str = "id, label, model_id, output_path, record_count, dropped_count, created_at";

/// Provides operations on training-data export records.
pub struct TrainingDataRepo;

impl TrainingDataRepo {
    /// Record a completed export under the model version that owns it.
    pub async fn create(
        pool: &PgPool,
        label: &str,
        model_id: DbId,
        output_path: &str,
        record_count: i32,
        dropped_count: i32,
    ) -> Result<TrainingData, sqlx::Error> {
        let query = format!(
            "INSERT INTO training_data (label, model_id, output_path, record_count, dropped_count) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrainingData>(&query)
            .bind(label)
            .bind(model_id)
            .bind(output_path)
            .bind(record_count)
            .bind(dropped_count)
            .fetch_one(pool)
            .await
    }

    /// Find an export by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TrainingData>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM training_data WHERE id = $1");
        sqlx::query_as::<_, TrainingData>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a label's exports, newest first.
    pub async fn list_for_label(
        pool: &PgPool,
        label: &str,
    ) -> Result<Vec<TrainingData>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM training_data WHERE label = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TrainingData>(&query)
            .bind(label)
            .fetch_all(pool)
            .await
    }
}
