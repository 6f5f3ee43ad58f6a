use axum::routing::post;
use axum::Router;

use crate::handlers::annotations;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/annotations", post(annotations::upsert_annotation))
        .route(
            "/annotations/bulk",
            post(annotations::upsert_annotations_bulk),
        )
}
