//! Background job entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use labelforge_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// Job type handled by the worker.
pub const JOB_GENERATE_REQUESTS: &str = "generate_requests";

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status_id: StatusId,
    pub parameters: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub progress_percent: i16,
    pub submitted_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a new job via `POST /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct SubmitJob {
    pub job_type: String,
    pub parameters: serde_json::Value,
}

/// Query parameters for `GET /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    /// Filter by status ID (e.g. 1 = pending, 4 = failed).
    pub status_id: Option<StatusId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Parameters for a `generate_requests` job.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequestsParams {
    pub task_id: DbId,
    /// Maximum requests to queue per annotator.
    pub max_per_annotator: usize,
    /// Maximum annotators asked about one entity.
    pub max_per_datapoint: usize,
    /// Optional RNG seed for reproducible interleaving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}
