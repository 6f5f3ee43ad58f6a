//! Task entity: a bundle of (labels, annotators, data files, entity type)
//! that drives a round of annotation requests.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `tasks` table. The three list columns are JSONB
/// arrays of strings; order is preserved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub name: String,
    pub entity_type: String,
    pub labels: serde_json::Value,
    pub annotators: serde_json::Value,
    pub data_filenames: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

fn json_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl Task {
    pub fn labels(&self) -> Vec<String> {
        json_strings(&self.labels)
    }

    pub fn annotators(&self) -> Vec<String> {
        json_strings(&self.annotators)
    }

    pub fn data_filenames(&self) -> Vec<String> {
        json_strings(&self.data_filenames)
    }
}

/// DTO for `POST /api/v1/tasks` and `PUT /api/v1/tasks/{id}`.
///
/// Annotator and data-file lists must be non-empty; labels must be
/// non-empty and unique across all tasks (checked by the repository).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "entity_type must not be empty"))]
    pub entity_type: String,
    #[validate(length(min = 1, message = "labels must not be empty"))]
    pub labels: Vec<String>,
    #[validate(length(min = 1, message = "annotators must not be empty"))]
    pub annotators: Vec<String>,
    #[validate(length(min = 1, message = "data_filenames must not be empty"))]
    pub data_filenames: Vec<String>,
}
