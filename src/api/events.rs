//! Event API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use super::JsonBody;
use crate::auth::Claims;
use crate::errors::AppError;
use crate::models::Event;
use crate::validation::Candidate;
use crate::AppState;

/// GET /api/v1/events - List all events.
pub async fn list_events(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
) -> Json<Vec<Event>> {
    Json(state.library.list_events(&caller).await)
}

/// GET /api/v1/events/{id} - Get a single event.
pub async fn get_event(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Event>, AppError> {
    let event = state.library.get_event(&caller, &id).await?;
    Ok(Json(event))
}

/// POST /api/v1/events - Create an event (admin).
pub async fn create_event(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    JsonBody(candidate): JsonBody<Candidate>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state.library.create_event(&caller, &candidate).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/v1/events/{id} - Update an event (admin).
pub async fn update_event(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Candidate>,
) -> Result<Json<Event>, AppError> {
    let event = state.library.update_event(&caller, &id, &patch).await?;
    Ok(Json(event))
}

/// DELETE /api/v1/events/{id} - Delete an event (admin).
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(caller): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.library.delete_event(&caller, &id).await?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
