//! Handlers for annotation tasks and their per-user request queues.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use labelforge_core::error::CoreError;
use labelforge_core::types::DbId;
use labelforge_db::models::job::{GenerateRequestsParams, SubmitJob, JOB_GENERATE_REQUESTS};
use labelforge_db::models::task::{Task, TaskInput};
use labelforge_db::repositories::{JobRepo, RequestRepo, TaskRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Quotas for a request-generation run. Defaults match the environment
/// knobs of typical deployments: a queue of 100 per annotator, each
/// entity shown to at most 3 people.
#[derive(Debug, Deserialize)]
pub struct AssignParams {
    #[serde(default = "default_max_per_annotator")]
    pub max_per_annotator: usize,
    #[serde(default = "default_max_per_datapoint")]
    pub max_per_datapoint: usize,
    pub seed: Option<u64>,
}

fn default_max_per_annotator() -> usize {
    100
}

fn default_max_per_datapoint() -> usize {
    3
}

impl Default for AssignParams {
    fn default() -> Self {
        Self {
            max_per_annotator: default_max_per_annotator(),
            max_per_datapoint: default_max_per_datapoint(),
            seed: None,
        }
    }
}

/// Query parameters for fetching a user's request queue.
#[derive(Debug, Deserialize)]
pub struct RequestQueueQuery {
    pub username: String,
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let task = TaskRepo::create(&state.pool, &input).await?;
    tracing::info!(task_id = task.id, name = %task.name, "Task created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// GET /tasks
pub async fn list_tasks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let tasks = TaskRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let task = find_task(&state, id).await?;
    Ok(Json(DataResponse { data: task }))
}

/// PUT /tasks/{id}
///
/// Edit a task. Pending requests invalidated by the edit are purged in
/// the same transaction; completed requests stay.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TaskInput>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let task = TaskRepo::update(&state.pool, id, &input).await?;
    tracing::info!(task_id = task.id, "Task updated");
    Ok(Json(DataResponse { data: task }))
}

/// POST /tasks/{id}/assign
///
/// Enqueue a request-generation job for the task and return 202 with
/// the job row. The worker does the scoring and assignment.
pub async fn assign_task(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Option<Json<AssignParams>>,
) -> AppResult<impl IntoResponse> {
    find_task(&state, id).await?;
    let Json(params) = params.unwrap_or_default();

    let parameters = serde_json::to_value(GenerateRequestsParams {
        task_id: id,
        max_per_annotator: params.max_per_annotator,
        max_per_datapoint: params.max_per_datapoint,
        seed: params.seed,
    })
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    let job = JobRepo::submit(
        &state.pool,
        &SubmitJob {
            job_type: JOB_GENERATE_REQUESTS.to_string(),
            parameters,
        },
    )
    .await?;
    tracing::info!(task_id = id, job_id = job.id, "Request generation enqueued");
    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// GET /tasks/{id}/requests?username=
///
/// A user's request queue for a task, most important first. Stale rows
/// are hidden.
pub async fn get_request_queue(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<RequestQueueQuery>,
) -> AppResult<impl IntoResponse> {
    find_task(&state, id).await?;
    let user = UserRepo::find_by_username(&state.pool, &query.username)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!("unknown username {:?}", query.username))
        })?;
    let requests = RequestRepo::fetch_for_user(&state.pool, id, user.id).await?;
    Ok(Json(DataResponse { data: requests }))
}

pub(crate) async fn find_task(state: &AppState, id: DbId) -> AppResult<Task> {
    TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::NotFound { entity: "task", id }))
}
