use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// ```text
/// GET    /tasks                 list_tasks
/// POST   /tasks                 create_task
/// GET    /tasks/{id}            get_task
/// PUT    /tasks/{id}            update_task
/// POST   /tasks/{id}/assign     assign_task
/// GET    /tasks/{id}/requests   get_request_queue (?username=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/{id}", get(tasks::get_task).put(tasks::update_task))
        .route("/tasks/{id}/assign", post(tasks::assign_task))
        .route("/tasks/{id}/requests", get(tasks::get_request_queue))
}
