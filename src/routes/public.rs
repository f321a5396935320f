use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Listing handlers rely on the
/// repository to scope out tombstoned rows and inactive postings; there
/// is no second chance at the handler layer.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // Identity bootstrap.
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Job board: active postings only.
        .route("/jobs", get(handlers::jobs::list_jobs))
        .route("/jobs/{id}", get(handlers::jobs::get_job))
        // Project gallery. The detail route counts a view and, when a
        // valid token is present, reports is_liked for that caller.
        .route("/projects", get(handlers::projects::list_projects))
        .route("/projects/{id}", get(handlers::projects::get_project))
        .route("/projects/{id}/likes", get(handlers::social::project_likes))
        .route(
            "/projects/{id}/comments",
            get(handlers::social::project_comments),
        )
        .route("/categories", get(handlers::projects::list_categories))
        // Follow graph is publicly readable.
        .route("/users/{id}/followers", get(handlers::social::user_followers))
        .route("/users/{id}/following", get(handlers::social::user_following))
}
