//! Authentication middleware.
//!
//! Tokens are issued and checked upstream; this layer only reads the identity
//! the authenticating proxy forwards (`X-User-Id`, `X-User-Name`) and makes it
//! available to handlers as [`AuthenticatedUser`].

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Identity of the caller, established by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
}

impl AuthenticatedUser {
    /// Reads the forwarded identity headers.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user identity".into()))?
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| AppError::Unauthorized("invalid user identity".into()))?;

        let username = headers
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("user-{id}"));

        Ok(Self { id, username })
    }
}

/// Rejects requests that carry no authenticated identity.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    match AuthenticatedUser::from_headers(req.headers()) {
        Ok(user) => {
            tracing::debug!(user_id = user.id, "authenticated request");
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("missing user identity".into()))
    }
}
