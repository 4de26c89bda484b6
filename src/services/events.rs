//! Event operations.

use chrono::Utc;
use serde_json::Value;

use super::{merge_patch, LibraryService};
use crate::auth::Claims;
use crate::errors::AppError;
use crate::models::Event;
use crate::validation::{parse_timestamp, validate, Candidate};

impl LibraryService {
    /// All events in insertion order. Open to every role.
    pub async fn list_events(&self, _caller: &Claims) -> Vec<Event> {
        self.stores.events.list().await
    }

    pub async fn get_event(&self, _caller: &Claims, id: &str) -> Result<Event, AppError> {
        self.stores
            .events
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))
    }

    /// Admin only. `isUpcoming` is derived from `date` here and kept as is
    /// afterwards, even once the date has passed.
    pub async fn create_event(
        &self,
        caller: &Claims,
        candidate: &Candidate,
    ) -> Result<Event, AppError> {
        caller.require_admin()?;

        let mut candidate = candidate.clone();
        if let Some(date) = candidate.get("date").and_then(parse_timestamp) {
            candidate.insert("isUpcoming".to_string(), Value::Bool(date >= Utc::now()));
        }

        let event: Event = validate(&candidate)?;
        let event = self.stores.events.insert(event).await?;

        tracing::info!(event_id = %event.id, user_id = %caller.sub, "Event created");
        Ok(event)
    }

    /// Admin only. `isUpcoming` changes only when the patch sets it.
    pub async fn update_event(
        &self,
        caller: &Claims,
        id: &str,
        patch: &Candidate,
    ) -> Result<Event, AppError> {
        caller.require_admin()?;

        let event = self
            .stores
            .events
            .update(id, |existing| merge_patch(existing, patch))
            .await?;

        tracing::info!(event_id = %event.id, user_id = %caller.sub, "Event updated");
        Ok(event)
    }

    /// Admin only.
    pub async fn delete_event(&self, caller: &Claims, id: &str) -> Result<(), AppError> {
        caller.require_admin()?;

        self.stores.events.remove(id).await?;

        tracing::info!(event_id = %id, user_id = %caller.sub, "Event deleted");
        Ok(())
    }
}
