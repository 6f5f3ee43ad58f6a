//! Per-label pattern lists for the pattern scoring model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

/// A row from the `label_patterns` table. `patterns` is a JSONB array
/// of phrase strings; each phrase is tokenized at scoring time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LabelPatterns {
    pub id: DbId,
    pub label: String,
    pub patterns: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LabelPatterns {
    pub fn phrases(&self) -> Vec<String> {
        self.patterns
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// DTO for `PUT /api/v1/labels/{label}/patterns`. Replaces the whole
/// list.
#[derive(Debug, Deserialize)]
pub struct SetPatterns {
    pub patterns: Vec<String>,
}
