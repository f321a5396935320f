use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes open to any role once the token checks out. Everything acting
/// on a specific record goes through an ownership-scoped repository call,
/// so these handlers never compare owner ids themselves.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // Own profile.
        .route(
            "/me",
            get(handlers::profile::get_me).put(handlers::profile::update_me),
        )
        // Direct-to-storage upload pipeline.
        .route(
            "/uploads/presigned",
            post(handlers::uploads::get_presigned_url),
        )
        // Job seeking.
        .route("/jobs/{id}/apply", post(handlers::applications::apply_for_job))
        .route(
            "/me/applications",
            get(handlers::applications::my_applications),
        )
        // Likes: edge plus counter move together in the repository.
        .route(
            "/projects/{id}/like",
            post(handlers::social::like_project).delete(handlers::social::unlike_project),
        )
        // Comments.
        .route(
            "/projects/{id}/comments",
            post(handlers::social::add_comment),
        )
        .route("/comments/{id}", delete(handlers::social::delete_comment))
        // Follow graph.
        .route(
            "/users/{id}/follow",
            post(handlers::social::follow_user).delete(handlers::social::unfollow_user),
        )
}
