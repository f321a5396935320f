use axum::{Json, extract::State};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{PresignedUrlRequest, PresignedUrlResponse},
};

/// get_presigned_url
///
/// [Authenticated Route] Hands the client a short-lived URL for a direct
/// upload to object storage; the resulting key is then attached to a
/// profile, company, or project through the normal update endpoints. The
/// key is server-generated, so callers cannot choose their own paths.
#[utoipa::path(
    post,
    path = "/uploads/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL issued", body = PresignedUrlResponse),
        (status = 422, description = "Content type not allowed for this kind")
    )
)]
pub async fn get_presigned_url(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    if !payload.kind.accepts(&payload.file_type) {
        return Err(ApiError::Validation(format!(
            "content type {} is not allowed for this upload kind",
            payload.file_type
        )));
    }

    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("{}/{}.{}", payload.kind.prefix(), Uuid::new_v4(), extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => Ok(Json(PresignedUrlResponse {
            upload_url: url,
            resource_key: object_key,
        })),
        Err(e) => {
            tracing::error!("storage error: {}", e);
            Err(ApiError::Internal)
        }
    }
}
