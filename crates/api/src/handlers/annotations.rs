//! Handlers for annotation submission.
//!
//! Both paths retry transient database failures with exponential
//! backoff before surfacing an error, so a deadlock or dropped
//! connection does not lose an annotator's work.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use labelforge_core::annotation::AnnotationContext;
use labelforge_core::retry::{with_retries, RetryPolicy};
use labelforge_db::is_transient_error;
use labelforge_db::models::annotation::{BulkAnnotations, UpsertAnnotation};
use labelforge_db::repositories::AnnotationRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn validate_annotation(input: &UpsertAnnotation) -> Result<(), AppError> {
    input.validate()?;
    input.check_value().map_err(AppError::Core)?;
    if !input.context.is_null() {
        AnnotationContext::from_json(&input.context).map_err(AppError::Core)?;
    }
    if input.weight <= 0.0 {
        return Err(AppError::BadRequest(format!(
            "weight must be positive, got {}",
            input.weight
        )));
    }
    Ok(())
}

/// POST /annotations
///
/// Upsert one annotation, keyed on (entity_type, entity, label, user).
pub async fn upsert_annotation(
    State(state): State<AppState>,
    Json(input): Json<UpsertAnnotation>,
) -> AppResult<impl IntoResponse> {
    validate_annotation(&input)?;
    let annotation = with_retries(RetryPolicy::default(), is_transient_error, || {
        AnnotationRepo::upsert(&state.pool, &input)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: annotation })))
}

/// POST /annotations/bulk
///
/// Upsert a batch atomically. Validation failures reject the whole
/// batch before anything is written.
pub async fn upsert_annotations_bulk(
    State(state): State<AppState>,
    Json(input): Json<BulkAnnotations>,
) -> AppResult<impl IntoResponse> {
    if input.annotations.is_empty() {
        return Err(AppError::BadRequest(
            "annotations must not be empty".to_string(),
        ));
    }
    for annotation in &input.annotations {
        validate_annotation(annotation)?;
    }
    let saved = with_retries(RetryPolicy::default(), is_transient_error, || {
        AnnotationRepo::upsert_bulk(&state.pool, &input.annotations)
    })
    .await?;
    tracing::info!(count = saved.len(), "Bulk annotations saved");
    Ok((StatusCode::CREATED, Json(DataResponse { data: saved })))
}
