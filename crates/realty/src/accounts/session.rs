use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::domain::{Role, UserId};
use super::token::{Claims, TokenAuthority};
use crate::error::ApiError;
use crate::inquiries::domain::Viewer;

/// Authenticated caller resolved from `Authorization: Bearer <token>`.
///
/// Wrap in `Option` for routes where signing in is optional; an absent or rejected token
/// then yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.user_id,
            role: self.role,
        }
    }

    pub fn require_agent(&self, message: &str) -> Result<(), ApiError> {
        if self.role.is_agent() {
            Ok(())
        } else {
            Err(ApiError::forbidden(message))
        }
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authority = parts
            .extensions
            .get::<Arc<TokenAuthority>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("token authority extension missing".to_string()))?;
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;
        let claims = authority.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ApiError::forbidden("Invalid token")
        })?;
        Ok(Session::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
