use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::issue_token,
    credentials,
    error::ApiError,
    models::{
        AuthResponse, LoginRequest, NewUser, RegisterRequest, RegisterRole, Role, UserResponse,
    },
};

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

/// register
///
/// [Public Route] Creates an account and signs the caller straight in.
/// The role is limited to the two self-service roles; admin accounts are
/// seeded from configuration only.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_registration(&payload)?;

    let role = match payload.role {
        Some(RegisterRole::Company) => Role::Company,
        Some(RegisterRole::Creative) | None => Role::Creative,
    };

    let password_hash = credentials::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash,
            role,
        })
        .await?;

    let token = issue_token(&state.config, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from_parts(user, None),
        }),
    ))
}

/// login
///
/// [Public Route] Verifies credentials and issues a fresh token. A wrong
/// email and a wrong password are indistinguishable from outside.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !credentials::verify_password(&user.password_hash, &payload.password) {
        return Err(ApiError::Unauthenticated);
    }

    let company = state.repo.company_for_user(user.id).await?;
    let token = issue_token(&state.config, &user)?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from_parts(user, company),
    }))
}
