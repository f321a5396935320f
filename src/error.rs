use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ApiError
///
/// The closed error taxonomy every handler and repository method speaks.
/// Ownership mismatches are reported as `NotFound`, never as a distinct
/// "not yours" outcome, so a caller probing ids cannot tell which records
/// exist under other owners.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, badly signed, or expired token.
    #[error("authentication required")]
    Unauthenticated,

    /// Valid token, wrong role class for the route.
    #[error("insufficient permissions")]
    Forbidden,

    /// The resource is absent, soft-deleted, or owned by someone else.
    #[error("resource not found")]
    NotFound,

    /// A uniqueness contract was violated (duplicate edge, registered
    /// email, already-linked company).
    #[error("{0}")]
    Conflict(String),

    /// The request payload failed a field-level check. The message names
    /// the offending field so the caller can correct it.
    #[error("{0}")]
    Validation(String),

    /// Datastore or storage-service failure. Details are logged, never
    /// returned to the client.
    #[error("internal server error")]
    Internal,
}

/// Wire shape of every error response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    /// Database errors surface as a generic `Internal`; the underlying
    /// error text goes to the log, not the client.
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("database error: {:?}", e);
        ApiError::Internal
    }
}

/// True when the error is a Postgres unique-constraint violation (23505).
/// Call sites that own a uniqueness contract map this to `Conflict`.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        // The Display impl must never carry datastore text.
        assert_eq!(ApiError::Internal.to_string(), "internal server error");
    }
}
