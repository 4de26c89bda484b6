//! Book catalogue operations.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::{merge_patch, LibraryService};
use crate::auth::Claims;
use crate::errors::AppError;
use crate::models::Book;
use crate::validation::{validate, Candidate};

impl LibraryService {
    /// All books in insertion order. Open to every role.
    pub async fn list_books(&self, _caller: &Claims) -> Vec<Book> {
        self.stores.books.list().await
    }

    pub async fn get_book(&self, _caller: &Claims, id: &str) -> Result<Book, AppError> {
        self.stores
            .books
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Admin only. `addedDate` defaults to now.
    pub async fn create_book(&self, caller: &Claims, candidate: &Candidate) -> Result<Book, AppError> {
        caller.require_admin()?;

        let mut candidate = candidate.clone();
        if candidate.get("addedDate").map_or(true, Value::is_null) {
            candidate.insert(
                "addedDate".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }

        let book: Book = validate(&candidate)?;
        let book = self.stores.books.insert(book).await?;

        tracing::info!(book_id = %book.id, user_id = %caller.sub, "Book created");
        Ok(book)
    }

    /// Admin only. Fields in `patch` override the stored ones.
    pub async fn update_book(
        &self,
        caller: &Claims,
        id: &str,
        patch: &Candidate,
    ) -> Result<Book, AppError> {
        caller.require_admin()?;

        let book = self
            .stores
            .books
            .update(id, |existing| merge_patch(existing, patch))
            .await?;

        tracing::info!(book_id = %book.id, user_id = %caller.sub, "Book updated");
        Ok(book)
    }

    /// Admin only.
    pub async fn delete_book(&self, caller: &Claims, id: &str) -> Result<(), AppError> {
        caller.require_admin()?;

        self.stores.books.remove(id).await?;

        tracing::info!(book_id = %id, user_id = %caller.sub, "Book deleted");
        Ok(())
    }
}
