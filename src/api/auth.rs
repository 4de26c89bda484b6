//! Authentication endpoints. These are the only API routes without a bearer token.

use axum::{extract::State, http::StatusCode, Json};

use super::JsonBody;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, PublicUser};
use crate::validation::Candidate;
use crate::AppState;

/// POST /api/v1/auth/login - Exchange credentials for a token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state
        .library
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/register - Create an account.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(candidate): JsonBody<Candidate>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = state.library.register(&candidate).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
