use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{ApplicationResponse, ApplyJobRequest, UpdateApplicationStatusRequest},
};

/// apply_for_job
///
/// [Authenticated Route] Submits an application, snapshotting the current
/// resume onto the application. A resume must already be on the profile;
/// a closed or missing job is simply not found; applying twice is a
/// conflict.
#[utoipa::path(
    post,
    path = "/jobs/{id}/apply",
    params(("id" = i64, Path, description = "Job ID")),
    request_body = ApplyJobRequest,
    responses(
        (status = 201, description = "Submitted", body = ApplicationResponse),
        (status = 404, description = "Job not found or not active"),
        (status = 409, description = "Already applied"),
        (status = 422, description = "No resume on profile")
    )
)]
pub async fn apply_for_job(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(payload): Json<ApplyJobRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), ApiError> {
    let user = state.repo.get_user(id).await?.ok_or(ApiError::NotFound)?;
    if user.resume_url.is_empty() {
        return Err(ApiError::Validation("upload a resume first".to_string()));
    }

    let application = state
        .repo
        .create_application(id, &user.resume_url, job_id, payload.cover_letter)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// my_applications
///
/// [Authenticated Route] The caller's applications with the job and
/// company embedded.
#[utoipa::path(
    get,
    path = "/me/applications",
    responses((status = 200, description = "My applications", body = [ApplicationResponse]))
)]
pub async fn my_applications(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    Ok(Json(state.repo.applications_for_user(id).await?))
}

/// job_applications
///
/// [Company Route] Applications received on one of the caller's own
/// jobs. A job that exists under another poster is indistinguishable
/// from one that does not exist.
#[utoipa::path(
    get,
    path = "/jobs/{id}/applications",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applications", body = [ApplicationResponse]),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn job_applications(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    state
        .repo
        .applications_for_job_owned(job_id, user_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_application_status
///
/// [Company Route] Moves an application through the review pipeline.
/// The status write and the poster-ownership check are one statement in
/// the repository.
#[utoipa::path(
    put,
    path = "/applications/{id}/status",
    params(("id" = i64, Path, description = "Application ID")),
    request_body = UpdateApplicationStatusRequest,
    responses(
        (status = 200, description = "Updated", body = ApplicationResponse),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn update_application_status(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(app_id): Path<i64>,
    Json(payload): Json<UpdateApplicationStatusRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    state
        .repo
        .set_application_status_owned(app_id, user_id, payload.status)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
