//! Handlers for inspecting background jobs.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;

use labelforge_core::error::CoreError;
use labelforge_core::types::DbId;
use labelforge_db::models::job::JobListQuery;
use labelforge_db::repositories::JobRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /jobs?status_id=&limit=&offset=
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: jobs }))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "job", id }))?;
    Ok(Json(DataResponse { data: job }))
}
