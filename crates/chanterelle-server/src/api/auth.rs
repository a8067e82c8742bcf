//! Bearer token extraction for admin routes.

use super::AppState;
use crate::error::ApiError;
use crate::token::SessionClaims;
use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use tracing::debug;

/// An authenticated admin, extracted from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: SessionClaims,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(ApiError::MissingAuthorization)?;

        let token = parse_bearer(value.to_str().map_err(|_| ApiError::MalformedAuthorization)?)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::InvalidToken
        })?;

        Ok(AdminSession { claims })
    }
}

/// Split `Bearer <token>` into the token.
fn parse_bearer(value: &str) -> Result<&str, ApiError> {
    let mut parts = value.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            if token.is_empty() {
                Err(ApiError::MalformedAuthorization)
            } else {
                Ok(token)
            }
        }
        _ => Err(ApiError::MalformedAuthorization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(parse_bearer("bearer abc").unwrap(), "abc");
        assert!(matches!(
            parse_bearer("Basic dXNlcjpwYXNz"),
            Err(ApiError::MalformedAuthorization)
        ));
        assert!(matches!(
            parse_bearer("Bearer"),
            Err(ApiError::MalformedAuthorization)
        ));
        assert!(matches!(
            parse_bearer("Bearer   "),
            Err(ApiError::MalformedAuthorization)
        ));
    }
}
