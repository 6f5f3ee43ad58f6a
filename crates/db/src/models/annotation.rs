//! Annotation entity: one user's judgment on one (entity, label) pair.
//!
//! `value` is nullable so a row can record "requested but skipped"
//! without a vote; aggregation ignores NULL and 0 values.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `annotations` table, joined with the username for
/// API responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub entity_type: String,
    pub entity: String,
    pub label: String,
    pub value: Option<i32>,
    pub weight: f64,
    pub context: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for a single annotation upsert. Identified by the unique key
/// (entity_type, entity, label, user); a second submission for the same
/// key overwrites value, weight and context in place.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertAnnotation {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "entity_type must not be empty"))]
    pub entity_type: String,
    #[validate(length(min = 1, message = "entity must not be empty"))]
    pub entity: String,
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: String,
    pub value: Option<i32>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub context: serde_json::Value,
}

fn default_weight() -> f64 {
    1.0
}

impl UpsertAnnotation {
    /// Values outside {-1, 0, 1} are rejected before they reach the
    /// database.
    pub fn check_value(&self) -> Result<(), labelforge_core::CoreError> {
        match self.value {
            None | Some(-1) | Some(0) | Some(1) => Ok(()),
            Some(other) => Err(labelforge_core::CoreError::Validation(format!(
                "annotation value must be -1, 0 or 1, got {other}"
            ))),
        }
    }
}

/// DTO for `POST /api/v1/annotations/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkAnnotations {
    pub annotations: Vec<UpsertAnnotation>,
}

/// Query parameters for the aggregation endpoint.
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    #[serde(default)]
    pub tie_break: labelforge_core::annotation::TieBreak,
}
