use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Moderation and oversight, nested under `/admin` and restricted to the
/// `admin` role by the middleware layered over this router. These
/// handlers skip ownership scoping on purpose: admin is the override.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/users/{id}", delete(handlers::admin::delete_user))
        .route("/jobs", get(handlers::admin::all_jobs))
        .route("/jobs/{id}/status", put(handlers::admin::set_job_status))
        .route("/applications", get(handlers::admin::all_applications))
        .route("/stats", get(handlers::admin::stats))
}
