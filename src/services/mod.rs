//! Access-controlled operations over the library collections.
//!
//! Every catalogue operation takes the caller's verified
//! [`Claims`](crate::auth::Claims): holding them
//! is what "authenticated" means here. Mutations additionally require the admin
//! role, checked before the store is touched.

mod accounts;
mod books;
mod events;
mod stats;

use std::sync::Arc;

use serde_json::Value;

use crate::auth::TokenService;
use crate::errors::AppError;
use crate::store::{Record, Stores};
use crate::validation::{validate, Candidate, Schema};

/// The request-facing service layer.
pub struct LibraryService {
    stores: Stores,
    tokens: Arc<TokenService>,
}

impl LibraryService {
    pub fn new(stores: Stores, tokens: Arc<TokenService>) -> Self {
        Self { stores, tokens }
    }

    #[cfg(test)]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }
}

/// Overlay `patch` onto the stored record and validate the merged result.
///
/// `null` removes a field, `id` is ignored.
fn merge_patch<T>(existing: &T, patch: &Candidate) -> Result<T, AppError>
where
    T: Record + Schema,
{
    let mut merged = match serde_json::to_value(existing) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(AppError::Internal(format!(
                "{} did not serialize to an object",
                T::LABEL
            )))
        }
        Err(e) => return Err(AppError::Internal(format!("Failed to serialize record: {}", e))),
    };
    merged.remove("id");

    for (key, value) in patch.iter().filter(|(key, _)| key.as_str() != "id") {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }

    Ok(validate::<T>(&merged)?)
}
