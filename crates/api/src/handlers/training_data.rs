//! Handlers for training-data exports.
//!
//! An export aggregates a label's annotations, joins each entity with
//! its latest recorded text, and writes one JSONL file under the data
//! directory. Entities with no text are dropped and counted, never
//! fatal. Every export registers the next model version for the label
//! and is recorded as owned by it, so the provenance of a trained
//! classifier is always one join away.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use labelforge_core::export::merge_examples;
use labelforge_db::models::annotation::AggregateQuery;
use labelforge_db::models::model::default_training_config;
use labelforge_db::repositories::{AnnotationRepo, ModelRepo, TrainingDataRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /labels/{label}/training-data
///
/// Build an export for the label, register the next model version
/// (config snapshotted from the standard defaults), and record the
/// artifact under it. Returns 400 when the aggregate is empty:
/// exporting nothing is a caller mistake.
pub async fn build_training_data(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Query(query): Query<AggregateQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = AnnotationRepo::aggregate_label(&state.pool, &label, query.tie_break).await?;
    if rows.is_empty() {
        return Err(AppError::BadRequest(format!(
            "label {label:?} has no decisive annotations to export"
        )));
    }

    let texts = AnnotationRepo::texts_by_entity(&state.pool, &label).await?;
    let outcome = merge_examples(&label, &rows, |entity| texts.get(entity).cloned());

    let mut lines = String::new();
    for example in &outcome.examples {
        let line = serde_json::to_string(example)
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        lines.push_str(&line);
        lines.push('\n');
    }

    let dir = std::path::Path::new(&state.config.data_dir).join("training");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::InternalError(format!("creating {}: {e}", dir.display())))?;
    let filename = format!("{label}_{}.jsonl", chrono::Utc::now().format("%Y%m%dT%H%M%SZ"));
    let path = dir.join(&filename);
    tokio::fs::write(&path, lines)
        .await
        .map_err(|e| AppError::InternalError(format!("writing {}: {e}", path.display())))?;

    let model =
        ModelRepo::create_next_version(&state.pool, &label, &default_training_config()).await?;
    let record = TrainingDataRepo::create(
        &state.pool,
        &label,
        model.id,
        &path.to_string_lossy(),
        outcome.examples.len() as i32,
        outcome.dropped as i32,
    )
    .await?;
    tracing::info!(
        label = %label,
        model_version = model.version,
        records = record.record_count,
        dropped = record.dropped_count,
        path = %record.output_path,
        "Training data exported"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// GET /labels/{label}/training-data
pub async fn list_training_data(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> AppResult<impl IntoResponse> {
    let exports = TrainingDataRepo::list_for_label(&state.pool, &label).await?;
    Ok(Json(DataResponse { data: exports }))
}
