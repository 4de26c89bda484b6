//! REST API module.
//!
//! Handlers are thin: they extract the request, call the [`LibraryService`]
//! and render the result. Errors render as `{"error": "..."}`.
//!
//! [`LibraryService`]: crate::services::LibraryService

mod auth;
mod books;
mod events;
mod stats;

pub use auth::*;
pub use books::*;
pub use events::*;
pub use stats::*;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// JSON request body whose rejections render as [`AppError::BadRequest`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(request, state).await?;
        Ok(JsonBody(body))
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_string())
}
