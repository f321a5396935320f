use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Category, CreateProjectRequest, Page, ProjectFilter, ProjectResponse,
        UpdateProjectRequest,
    },
};

/// list_projects
///
/// [Public Route] The project gallery with search and category filters.
#[utoipa::path(
    get,
    path = "/projects",
    params(ProjectFilter),
    responses((status = 200, description = "Project listing", body = Page<ProjectResponse>))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Result<Json<Page<ProjectResponse>>, ApiError> {
    Ok(Json(state.repo.list_projects(filter).await?))
}

/// get_project
///
/// [Public Route] Single project. Counts the view, and reports is_liked
/// when the caller happens to present a valid token.
#[utoipa::path(
    get,
    path = "/projects/{id}",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Found", body = ProjectResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_project(
    viewer: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProjectResponse>, ApiError> {
    state
        .repo
        .get_project(id, viewer.map(|v| v.id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_project
///
/// [Creative Route] Publishes a project; image keys come from the
/// presigned upload flow and the first one becomes the cover.
#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Published", body = ProjectResponse),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn create_project(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "title and description are required".to_string(),
        ));
    }
    if payload.image_urls.is_empty() {
        return Err(ApiError::Validation(
            "at least one image is required".to_string(),
        ));
    }

    let project = state.repo.create_project(id, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// my_projects
///
/// [Creative Route] The caller's own projects, tombstones excluded.
#[utoipa::path(
    get,
    path = "/me/projects",
    responses((status = 200, description = "My projects", body = [ProjectResponse]))
)]
pub async fn my_projects(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    Ok(Json(state.repo.projects_for_owner(id).await?))
}

/// update_project
///
/// [Creative Route] Ownership-scoped partial update.
#[utoipa::path(
    put,
    path = "/projects/{id}",
    params(("id" = i64, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated", body = ProjectResponse),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn update_project(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    state
        .repo
        .update_project_owned(id, user_id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_project
///
/// [Creative Route] Ownership-scoped soft delete.
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    params(("id" = i64, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn delete_project(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.soft_delete_project_owned(id, user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// list_categories
///
/// [Public Route] Reference data for the gallery filters.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories().await?))
}
