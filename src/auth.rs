use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, error::ApiError, models::{Role, User}};

/// Claims
///
/// Signed token payload. The token is the whole session: no server-side
/// session table exists, and `role` is trusted as-embedded until expiry.
/// A role change therefore only takes effect once the holder re-issues
/// (logs in again) — a deliberate staleness window, not a lookup we forgot.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: i64,
    pub email: String,
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. The token is dead once now >= exp.
    pub exp: i64,
}

/// Why a token failed verification. Collapsed to a generic 401 at the
/// HTTP boundary so callers cannot probe which case they hit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("malformed token")]
    Malformed,
}

/// issue_token
///
/// Mints a signed token for the given account. The lifetime comes from
/// configuration (`token_ttl_hours`), never from the call site.
pub fn issue_token(config: &AppConfig, user: &User) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("token signing failed: {:?}", e);
        ApiError::Internal
    })
}

/// verify_token
///
/// Validates signature and expiry, then returns the embedded claims.
/// Does not touch the datastore: the claims ARE the resolved identity.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    // No grace period: a token is invalid the second it expires.
    validation.leeway = 0;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(AuthError::ExpiredToken),
            ErrorKind::InvalidSignature => Err(AuthError::InvalidSignature),
            _ => Err(AuthError::Malformed),
        },
    }
}

/// AuthUser
///
/// The per-request resolved identity, extracted from the bearer token.
/// Handlers take this as an argument; extraction failure rejects the
/// request with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        let claims =
            verify_token(&config.jwt_secret, token).map_err(|_| ApiError::Unauthenticated)?;

        Ok(AuthUser::from(claims))
    }
}

/// Optional extraction for public routes that personalize when a valid
/// token happens to be present (e.g. is_liked on project reads). Any
/// verification failure degrades to anonymous instead of rejecting.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(<AuthUser as FromRequestParts<S>>::from_request_parts(parts, state)
            .await
            .ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(role: Role) -> User {
        User {
            id: 42,
            name: "Maya".to_string(),
            email: "maya@example.com".to_string(),
            password_hash: String::new(),
            role,
            phone: String::new(),
            location: String::new(),
            bio: String::new(),
            skills: String::new(),
            website: String::new(),
            avatar_url: String::new(),
            resume_url: String::new(),
            for_hire: false,
            verified: true,
            company_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify_preserves_identity() {
        let config = AppConfig::default();
        let user = sample_user(Role::Company);

        let token = issue_token(&config, &user).unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "maya@example.com");
        assert_eq!(claims.role, Role::Company);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expiry_window_follows_config() {
        let mut config = AppConfig::default();
        config.token_ttl_hours = 24;
        let token = issue_token(&config, &sample_user(Role::Creative)).unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let config = AppConfig::default();
        // Hand-build claims already past their expiry; the signature is
        // still valid.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "old@example.com".to_string(),
            role: Role::Creative,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verify_token(&config.jwt_secret, &token),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn wrong_secret_is_an_invalid_signature() {
        let config = AppConfig::default();
        let token = issue_token(&config, &sample_user(Role::Admin)).unwrap();
        assert_eq!(
            verify_token("a-different-secret", &token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let config = AppConfig::default();
        assert_eq!(
            verify_token(&config.jwt_secret, "not.a.token"),
            Err(AuthError::Malformed)
        );
    }

    #[test]
    fn role_is_read_from_the_token_not_the_store() {
        // Demoting an account does not invalidate tokens already in the
        // wild; the embedded role stands until expiry.
        let config = AppConfig::default();
        let token = issue_token(&config, &sample_user(Role::Admin)).unwrap();
        let claims = verify_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }
}
