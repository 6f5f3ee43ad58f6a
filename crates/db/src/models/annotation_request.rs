//! Annotation request entity: a queued unit of work for one annotator.
//!
//! Requests are ordered per (task, user) by `order_index`, lowest
//! first. The generator replaces a user's pending queue atomically;
//! completed rows survive the swap as history.

use serde::Serialize;
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `annotation_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationRequest {
    pub id: DbId,
    pub task_id: DbId,
    pub user_id: DbId,
    pub entity_type: String,
    pub entity: String,
    pub label: String,
    pub source: String,
    pub score: f64,
    pub order_index: i32,
    pub context: serde_json::Value,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One request to insert during a queue swap. Rows are written in
/// reverse rank order so the most important request carries the lowest
/// `order_index`.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub entity: String,
    pub label: String,
    pub source: String,
    pub score: f64,
    pub context: serde_json::Value,
}
