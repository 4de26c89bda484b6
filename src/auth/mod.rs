//! Bearer-token authentication.
//!
//! The request layer only authenticates: it verifies the bearer token and hands
//! the caller's [`Claims`] to the handlers. Role checks happen in the services.

mod password;
mod token;

pub use password::*;
pub use token::*;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;

/// Authentication layer for protected routes.
///
/// Rejects the request with 401 unless it carries `Authorization: Bearer <token>`
/// with a valid, unexpired token.
pub async fn require_bearer(
    tokens: Arc<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Authorization header missing".to_string()))?;

    let token = bearer_token(header_value.to_str().unwrap_or_default())
        .ok_or_else(|| AppError::Unauthenticated("Invalid authorization format".to_string()))?;

    let claims = tokens
        .verify(token)
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    tracing::debug!(user_id = %claims.sub, role = %claims.role, "Authenticated request");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extract the token from a `Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}
