use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{UpdateProfileRequest, UserResponse},
};

/// get_me
///
/// [Authenticated Route] The caller's own profile, read fresh from the
/// store rather than echoed from token claims.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserResponse))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let (user, company) = state
        .repo
        .get_user_with_company(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(UserResponse::from_parts(user, company)))
}

/// update_me
///
/// [Authenticated Route] Partial profile update. Omitted fields stay as
/// they are; an explicit empty string clears the field.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated", body = UserResponse))
)]
pub async fn update_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repo
        .update_profile(id, payload)
        .await?
        .ok_or(ApiError::NotFound)?;
    let company = state.repo.company_for_user(user.id).await?;
    Ok(Json(UserResponse::from_parts(user, company)))
}
