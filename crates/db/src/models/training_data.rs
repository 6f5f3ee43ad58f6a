//! Training-data export artifacts.

use serde::Serialize;
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `training_data` table: one immutable export of the
/// aggregated annotations for a label, owned by the model version that
/// consumed it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TrainingData {
    pub id: DbId,
    pub label: String,
    pub model_id: DbId,
    pub output_path: String,
    pub record_count: i32,
    pub dropped_count: i32,
    pub created_at: Timestamp,
}
