use axum::routing::get;
use axum::Router;

use crate::handlers::{labels, models, training_data};
use crate::state::AppState;

/// ```text
/// GET /labels/{label}/annotations       list_annotations
/// GET /labels/{label}/aggregate         aggregate_label (?tie_break=)
/// GET /labels/{label}/kappa             kappa_matrix (?task_id=)
/// GET /labels/{label}/patterns          get_patterns
/// PUT /labels/{label}/patterns          set_patterns
/// GET /labels/{label}/models            list_models
/// POST /labels/{label}/models           register_model
/// GET /labels/{label}/training-data     list_training_data
/// POST /labels/{label}/training-data    build_training_data
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/labels/{label}/annotations", get(labels::list_annotations))
        .route("/labels/{label}/aggregate", get(labels::aggregate_label))
        .route("/labels/{label}/kappa", get(labels::kappa_matrix))
        .route(
            "/labels/{label}/patterns",
            get(labels::get_patterns).put(labels::set_patterns),
        )
        .route(
            "/labels/{label}/models",
            get(models::list_models).post(models::register_model),
        )
        .route(
            "/labels/{label}/training-data",
            get(training_data::list_training_data).post(training_data::build_training_data),
        )
}
