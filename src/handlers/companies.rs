use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{CompanyResponse, CreateCompanyRequest, UpdateCompanyRequest},
};

/// create_company
///
/// [Company Route] Creates the caller's company profile and links it in
/// the same transaction. An account gets exactly one; a second attempt
/// is a conflict.
#[utoipa::path(
    post,
    path = "/company",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Created", body = CompanyResponse),
        (status = 409, description = "Already linked to a company")
    )
)]
pub async fn create_company(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("company name is required".to_string()));
    }
    let company = state.repo.create_company_for(id, payload).await?;
    Ok((StatusCode::CREATED, Json(company.into())))
}

/// get_my_company
///
/// [Company Route] The caller's company profile.
#[utoipa::path(
    get,
    path = "/company",
    responses(
        (status = 200, description = "Company", body = CompanyResponse),
        (status = 404, description = "No company profile yet")
    )
)]
pub async fn get_my_company(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CompanyResponse>, ApiError> {
    state
        .repo
        .company_for_user(id)
        .await?
        .map(|c| Json(c.into()))
        .ok_or(ApiError::NotFound)
}

/// update_company
///
/// [Company Route] Partial update of the caller's company.
#[utoipa::path(
    put,
    path = "/company",
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Updated", body = CompanyResponse),
        (status = 404, description = "No company profile yet")
    )
)]
pub async fn update_company(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCompanyRequest>,
) -> Result<Json<CompanyResponse>, ApiError> {
    state
        .repo
        .update_company_for(id, payload)
        .await?
        .map(|c| Json(c.into()))
        .ok_or(ApiError::NotFound)
}
