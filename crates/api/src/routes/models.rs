use axum::routing::get;
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/models/{id}/inferences",
        get(models::list_inferences).post(models::store_inferences),
    )
}
