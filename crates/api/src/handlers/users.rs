//! Handlers for annotator accounts.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use labelforge_db::models::user::CreateUser;
use labelforge_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /users
///
/// Get-or-create a user by username. Idempotent.
pub async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> AppResult<impl IntoResponse> {
    if input.username.trim().is_empty() {
        return Err(AppError::BadRequest("username must not be empty".into()));
    }
    let user = UserRepo::get_or_create(&state.pool, &input).await?;
    Ok(Json(DataResponse { data: user }))
}

/// GET /users
///
/// List all users.
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}
