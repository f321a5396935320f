use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::ApiError,
    models::{
        AdminDashboardStats, ApplicationResponse, JobResponse, JobStatus, Page, PageParams,
        UserResponse,
    },
};

// The admin role gate lives on the router layer; these handlers only run
// for authenticated admins.

/// list_users
///
/// [Admin Route] Paginated account listing.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(PageParams),
    responses((status = 200, description = "Users", body = Page<UserResponse>))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<UserResponse>>, ApiError> {
    Ok(Json(state.repo.list_users(params).await?))
}

/// delete_user
///
/// [Admin Route] Removes an account. Owned jobs and projects become
/// tombstones and the account's interaction edges are cleaned up (with
/// counters adjusted) in the same transaction.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_user_cascading(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// all_jobs
///
/// [Admin Route] Every undeleted posting, regardless of status.
#[utoipa::path(
    get,
    path = "/admin/jobs",
    params(PageParams),
    responses((status = 200, description = "Jobs", body = Page<JobResponse>))
)]
pub async fn all_jobs(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<JobResponse>>, ApiError> {
    Ok(Json(state.repo.list_all_jobs(params).await?))
}

/// set_job_status
///
/// [Admin Route] Moderation override on a posting's status.
#[utoipa::path(
    put,
    path = "/admin/jobs/{id}/status",
    params(("id" = i64, Path, description = "Job ID")),
    request_body = JobStatus,
    responses(
        (status = 200, description = "Updated", body = JobResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn set_job_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(status): Json<JobStatus>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .repo
        .set_job_status(id, status)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// all_applications
///
/// [Admin Route] Every application across the platform.
#[utoipa::path(
    get,
    path = "/admin/applications",
    params(PageParams),
    responses((status = 200, description = "Applications", body = Page<ApplicationResponse>))
)]
pub async fn all_applications(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<ApplicationResponse>>, ApiError> {
    Ok(Json(state.repo.list_all_applications(params).await?))
}

/// stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    Ok(Json(state.repo.get_stats().await?))
}
