//! Aggregates for the dashboard charts.

use std::collections::BTreeMap;

use chrono::Datelike;

use super::LibraryService;
use crate::auth::Claims;

impl LibraryService {
    /// Number of books per year they were added to the catalogue.
    pub async fn books_added_per_year(&self, _caller: &Claims) -> BTreeMap<String, usize> {
        self.stores
            .books
            .with_records(|books| {
                let mut counts = BTreeMap::new();
                for book in books {
                    *counts.entry(book.added_date.year().to_string()).or_insert(0) += 1;
                }
                counts
            })
            .await
    }

    /// Number of accounts per role. Roles without accounts are omitted.
    pub async fn users_per_role(&self, _caller: &Claims) -> BTreeMap<String, usize> {
        self.stores
            .users
            .with_records(|users| {
                let mut counts = BTreeMap::new();
                for user in users {
                    *counts.entry(user.role.to_string()).or_insert(0) += 1;
                }
                counts
            })
            .await
    }
}
