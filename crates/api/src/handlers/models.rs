//! Handlers for the model registry and its inference cache.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use labelforge_core::error::CoreError;
use labelforge_core::types::DbId;
use labelforge_db::models::model::{default_training_config, NewInference};
use labelforge_db::repositories::ModelRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for registering a model version under a label. The config
/// defaults to the standard training snapshot when omitted.
#[derive(Debug, Deserialize)]
pub struct RegisterVersion {
    pub config: Option<serde_json::Value>,
}

/// Body for storing cached predictions.
#[derive(Debug, Deserialize)]
pub struct StoreInferences {
    pub inferences: Vec<NewInference>,
}

/// POST /labels/{label}/models
///
/// Register the next model version for a label, snapshotting the
/// training config.
pub async fn register_model(
    State(state): State<AppState>,
    Path(label): Path<String>,
    input: Option<Json<RegisterVersion>>,
) -> AppResult<impl IntoResponse> {
    let config = input
        .and_then(|Json(body)| body.config)
        .unwrap_or_else(default_training_config);
    let model = ModelRepo::create_next_version(&state.pool, &label, &config).await?;
    tracing::info!(label = %label, version = model.version, "Model version registered");
    Ok((StatusCode::CREATED, Json(DataResponse { data: model })))
}

/// GET /labels/{label}/models
pub async fn list_models(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> AppResult<impl IntoResponse> {
    let models = ModelRepo::list_for_label(&state.pool, &label).await?;
    Ok(Json(DataResponse { data: models }))
}

/// POST /models/{id}/inferences
///
/// Store cached class probabilities for a model version. Each entry
/// must carry a non-empty probability vector.
pub async fn store_inferences(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StoreInferences>,
) -> AppResult<impl IntoResponse> {
    ensure_model_exists(&state, id).await?;
    if input.inferences.iter().any(|i| i.probs.is_empty()) {
        return Err(AppError::BadRequest(
            "each inference needs a non-empty probability vector".to_string(),
        ));
    }
    let stored = ModelRepo::store_inferences(&state.pool, id, &input.inferences).await?;
    tracing::info!(model_id = id, stored, "Inferences cached");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: serde_json::json!({ "stored": stored }),
        }),
    ))
}

/// GET /models/{id}/inferences
pub async fn list_inferences(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_model_exists(&state, id).await?;
    let inferences = ModelRepo::list_inferences(&state.pool, id).await?;
    Ok(Json(DataResponse { data: inferences }))
}

async fn ensure_model_exists(state: &AppState, id: DbId) -> AppResult<()> {
    ModelRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "model", id }))?;
    Ok(())
}
