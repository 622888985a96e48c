use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::{JwtKeys, Verification};
use crate::error::AppError;

/// Gate for protected routes: extracts and validates the bearer token,
/// yielding the caller's `person_id`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::MissingToken)?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Verification::Valid(claims) => Ok(AuthUser(claims.person_id)),
            Verification::Expired => {
                warn!("expired token presented");
                Err(AppError::InvalidToken)
            }
            Verification::Malformed => {
                warn!("invalid token presented");
                Err(AppError::InvalidToken)
            }
        }
    }
}

// Expect "Bearer <token>"; scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
