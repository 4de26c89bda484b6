//! Book API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use super::JsonBody;
use crate::auth::Claims;
use crate::errors::AppError;
use crate::models::Book;
use crate::validation::Candidate;
use crate::AppState;

/// GET /api/v1/books - List all books.
pub async fn list_books(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
) -> Json<Vec<Book>> {
    Json(state.library.list_books(&caller).await)
}

/// GET /api/v1/books/{id} - Get a single book.
pub async fn get_book(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let book = state.library.get_book(&caller, &id).await?;
    Ok(Json(book))
}

/// POST /api/v1/books - Create a book (admin).
pub async fn create_book(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    JsonBody(candidate): JsonBody<Candidate>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = state.library.create_book(&caller, &candidate).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT /api/v1/books/{id} - Update a book (admin).
pub async fn update_book(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Candidate>,
) -> Result<Json<Book>, AppError> {
    let book = state.library.update_book(&caller, &id, &patch).await?;
    Ok(Json(book))
}

/// DELETE /api/v1/books/{id} - Delete a book (admin).
pub async fn delete_book(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.library.delete_book(&caller, &id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}
