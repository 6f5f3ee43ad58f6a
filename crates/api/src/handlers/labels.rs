//! Handlers for label-scoped views: raw annotations, the weighted
//! majority aggregate, the agreement matrix, and pattern lists.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use labelforge_core::kappa;
use labelforge_core::types::DbId;
use labelforge_db::models::annotation::AggregateQuery;
use labelforge_db::models::label_patterns::SetPatterns;
use labelforge_db::repositories::{AnnotationRepo, LabelPatternRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional task scoping for the agreement matrix links.
#[derive(Debug, Deserialize)]
pub struct KappaQuery {
    pub task_id: Option<DbId>,
}

/// Optional filters for the annotation listing.
#[derive(Debug, Deserialize)]
pub struct AnnotationListQuery {
    pub username: Option<String>,
    pub entity: Option<String>,
}

/// GET /labels/{label}/annotations?username=&entity=
///
/// The target of the agreement matrix links: filtered to a user pair's
/// entity, the two judgments show up side by side.
pub async fn list_annotations(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Query(query): Query<AnnotationListQuery>,
) -> AppResult<impl IntoResponse> {
    let annotations = AnnotationRepo::list_by_label(
        &state.pool,
        &label,
        query.username.as_deref(),
        query.entity.as_deref(),
    )
    .await?;
    Ok(Json(DataResponse { data: annotations }))
}

/// GET /labels/{label}/aggregate?tie_break=
///
/// Weighted majority vote per entity. `tie_break` is `positive`
/// (default) or `negative`.
pub async fn aggregate_label(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Query(query): Query<AggregateQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = AnnotationRepo::aggregate_label(&state.pool, &label, query.tie_break).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /labels/{label}/kappa
///
/// Pairwise Cohen's kappa between every two annotators of the label.
/// NaN cells (no usable overlap) serialize as null.
pub async fn kappa_matrix(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Query(query): Query<KappaQuery>,
) -> AppResult<impl IntoResponse> {
    let votes = AnnotationRepo::votes_by_user(&state.pool, &label).await?;
    let matrix = kappa::compute_matrix(&label, query.task_id, &votes);
    Ok(Json(DataResponse { data: matrix }))
}

/// GET /labels/{label}/patterns
pub async fn get_patterns(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> AppResult<impl IntoResponse> {
    let phrases = LabelPatternRepo::get(&state.pool, &label)
        .await?
        .map(|row| row.phrases())
        .unwrap_or_default();
    Ok(Json(DataResponse { data: phrases }))
}

/// PUT /labels/{label}/patterns
///
/// Replace the label's pattern list. Empty phrases are rejected.
pub async fn set_patterns(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Json(input): Json<SetPatterns>,
) -> AppResult<impl IntoResponse> {
    if input.patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "patterns must not contain empty phrases".to_string(),
        ));
    }
    let row = LabelPatternRepo::set(&state.pool, &label, &input.patterns).await?;
    tracing::info!(label = %label, count = input.patterns.len(), "Pattern list replaced");
    Ok(Json(DataResponse { data: row }))
}
