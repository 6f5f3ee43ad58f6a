pub mod annotations;
pub mod health;
pub mod jobs;
pub mod labels;
pub mod models;
pub mod tasks;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users                               list, get-or-create
///
/// /tasks                               list, create
/// /tasks/{id}                          get, update
/// /tasks/{id}/assign                   enqueue request generation (POST)
/// /tasks/{id}/requests                 a user's queue (?username=)
///
/// /annotations                         upsert one (POST)
/// /annotations/bulk                    upsert a batch (POST)
///
/// /labels/{label}/annotations          raw annotations
/// /labels/{label}/aggregate            weighted majority (?tie_break=)
/// /labels/{label}/kappa                agreement matrix (?task_id=)
/// /labels/{label}/patterns             get, replace (GET, PUT)
/// /labels/{label}/models               list, register (GET, POST)
/// /labels/{label}/training-data        list, build (GET, POST)
///
/// /models/{id}/inferences              list, store (GET, POST)
///
/// /jobs                                list (?status_id=, ?limit=, ?offset=)
/// /jobs/{id}                           get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(tasks::router())
        .merge(annotations::router())
        .merge(labels::router())
        .merge(models::router())
        .merge(jobs::router())
}
