use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{CreateJobRequest, JobFilter, JobResponse, Page, UpdateJobRequest},
};

/// list_jobs
///
/// [Public Route] The job board: active, undeleted postings with search
/// and facet filters.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobFilter),
    responses((status = 200, description = "Job listing", body = Page<JobResponse>))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Page<JobResponse>>, ApiError> {
    Ok(Json(state.repo.list_jobs(filter).await?))
}

/// get_job
///
/// [Public Route] Single job with its company profile.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Found", body = JobResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .repo
        .get_job(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_job
///
/// [Company Route] Posts a job under the caller's company. Ownership is
/// established here: `posted_by` is always the authenticated account.
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Posted", body = JobResponse),
        (status = 422, description = "No company profile yet")
    )
)]
pub async fn create_job(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "title and description are required".to_string(),
        ));
    }

    let user = state.repo.get_user(id).await?.ok_or(ApiError::NotFound)?;
    let Some(company_id) = user.company_id else {
        return Err(ApiError::Validation(
            "create a company profile first".to_string(),
        ));
    };

    let job = state.repo.create_job(id, company_id, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// my_jobs
///
/// [Company Route] Every posting owned by the caller, all statuses.
#[utoipa::path(
    get,
    path = "/company/jobs",
    responses((status = 200, description = "My postings", body = [JobResponse]))
)]
pub async fn my_jobs(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    Ok(Json(state.repo.jobs_for_owner(id).await?))
}

/// update_job
///
/// [Company Route] Partial update, ownership-scoped: the repository
/// matches id and owner in one lookup, so a foreign job looks absent.
#[utoipa::path(
    put,
    path = "/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated", body = JobResponse),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn update_job(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    state
        .repo
        .update_job_owned(id, user_id, payload)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_job
///
/// [Company Route] Ownership-scoped soft delete; the row survives as a
/// tombstone and drops out of every listing.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not yours")
    )
)]
pub async fn delete_job(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if state.repo.soft_delete_job_owned(id, user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
