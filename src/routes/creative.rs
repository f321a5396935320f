use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Creative Router Module
///
/// Portfolio publishing, restricted to `creative` accounts by the role
/// middleware layered over this router. Mutations on a specific project
/// are additionally ownership-scoped inside the repository.
pub fn creative_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(handlers::projects::create_project))
        .route("/me/projects", get(handlers::projects::my_projects))
        .route(
            "/projects/{id}",
            put(handlers::projects::update_project).delete(handlers::projects::delete_project),
        )
}
