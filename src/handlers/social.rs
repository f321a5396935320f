use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{CommentResponse, CreateCommentRequest, LikeResponse, Role, UserSummary},
};

/// like_project
///
/// [Authenticated Route] Creates the like edge and bumps the project's
/// counter in one atomic repository call. Liking twice is a conflict,
/// never a double count.
#[utoipa::path(
    post,
    path = "/projects/{id}/like",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 201, description = "Liked"),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Already liked")
    )
)]
pub async fn like_project(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.like_project(id, project_id).await?;
    Ok(StatusCode::CREATED)
}

/// unlike_project
///
/// [Authenticated Route] Removes the edge and decrements the counter
/// (floored at zero). Unliking something never liked is not found.
#[utoipa::path(
    delete,
    path = "/projects/{id}/like",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Unliked"),
        (status = 404, description = "No live like")
    )
)]
pub async fn unlike_project(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.unlike_project(id, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// project_likes
///
/// [Public Route] Who liked a project, newest first.
#[utoipa::path(
    get,
    path = "/projects/{id}/likes",
    params(("id" = i64, Path, description = "Project ID")),
    responses((status = 200, description = "Likes", body = [LikeResponse]))
)]
pub async fn project_likes(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<LikeResponse>>, ApiError> {
    Ok(Json(state.repo.likes_for_project(project_id).await?))
}

/// add_comment
///
/// [Authenticated Route] Comments on a live project.
#[utoipa::path(
    post,
    path = "/projects/{id}/comments",
    params(("id" = i64, Path, description = "Project ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn add_comment(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::Validation("content is required".to_string()));
    }
    let comment = state
        .repo
        .add_comment(id, project_id, payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// project_comments
///
/// [Public Route] A project's comments, newest first.
#[utoipa::path(
    get,
    path = "/projects/{id}/comments",
    params(("id" = i64, Path, description = "Project ID")),
    responses((status = 200, description = "Comments", body = [CommentResponse]))
)]
pub async fn project_comments(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    Ok(Json(state.repo.comments_for_project(project_id).await?))
}

/// delete_comment
///
/// [Authenticated Route] Authors delete their own comments; admins
/// delete anything.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn delete_comment(
    AuthUser { id: user_id, role, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = match role {
        Role::Admin => state.repo.delete_comment_admin(id).await?,
        Role::Creative | Role::Company => state.repo.delete_comment_owned(id, user_id).await?,
    };
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// follow_user
///
/// [Authenticated Route] Creates a follow edge. Following yourself is
/// rejected outright; following twice is a conflict.
#[utoipa::path(
    post,
    path = "/users/{id}/follow",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 201, description = "Following"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already following"),
        (status = 422, description = "Cannot follow yourself")
    )
)]
pub async fn follow_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(target_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if id == target_id {
        return Err(ApiError::Validation("cannot follow yourself".to_string()));
    }
    state.repo.follow_user(id, target_id).await?;
    Ok(StatusCode::CREATED)
}

/// unfollow_user
///
/// [Authenticated Route] Removes the follow edge.
#[utoipa::path(
    delete,
    path = "/users/{id}/follow",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 404, description = "Not following")
    )
)]
pub async fn unfollow_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(target_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.unfollow_user(id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// user_followers
///
/// [Public Route] Accounts following the given user.
#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Followers", body = [UserSummary]))
)]
pub async fn user_followers(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.repo.followers_of(user_id).await?))
}

/// user_following
///
/// [Public Route] Accounts the given user follows.
#[utoipa::path(
    get,
    path = "/users/{id}/following",
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Following", body = [UserSummary]))
)]
pub async fn user_following(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.repo.following_of(user_id).await?))
}
