//! Generic file-backed collection.

use std::path::{Path, PathBuf};

use indexmap::map::{Values, ValuesMut};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Record, StoreError};
use crate::errors::AppError;

type Records<T> = IndexMap<String, T>;

/// In-memory mapping from id to record, mirrored to a JSON file.
///
/// Mutations hold the write lock until the file write has finished, so writes
/// to one collection are serialized and the file always reflects the latest
/// in-memory state once a mutation returns.
pub struct CollectionStore<T: Record> {
    path: PathBuf,
    records: RwLock<Records<T>>,
}

impl<T: Record> CollectionStore<T> {
    /// Path of the backing file for this collection inside `data_dir`.
    pub fn file_path(data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.json", T::COLLECTION))
    }

    /// Read and parse the backing file.
    pub async fn load(data_dir: &Path) -> Result<Self, StoreError> {
        let path = Self::file_path(data_dir);

        let raw = tokio::fs::read(&path).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let mut document: Value =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;

        let items = match document.get_mut(T::COLLECTION).map(Value::take) {
            Some(items @ Value::Array(_)) => items,
            _ => {
                return Err(StoreError::MissingCollection {
                    path,
                    field: T::COLLECTION,
                })
            }
        };
        let list: Vec<T> = serde_json::from_value(items).map_err(|source| StoreError::Parse {
            path: path.clone(),
            source,
        })?;

        let mut records: Records<T> = IndexMap::with_capacity(list.len());
        for record in list {
            let id = record.id().to_string();
            if records.insert(id.clone(), record).is_some() {
                return Err(StoreError::DuplicateId { path, id });
            }
        }

        tracing::info!("Loaded {} {} from {:?}", records.len(), T::COLLECTION, path);

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// All records in insertion order.
    pub async fn list(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Run a read-only computation over the current records without cloning them.
    pub async fn with_records<R>(&self, f: impl FnOnce(Values<'_, String, T>) -> R) -> R {
        let records = self.records.read().await;
        f(records.values())
    }

    /// Append a record, assigning a fresh id when it has none, and persist.
    pub async fn insert(&self, record: T) -> Result<T, AppError> {
        self.insert_checked(record, |_, _| Ok(())).await
    }

    /// Like [`insert`](Self::insert), but `check` runs against the current
    /// records under the same write lock and can veto the insert.
    pub async fn insert_checked<F>(&self, mut record: T, check: F) -> Result<T, AppError>
    where
        F: FnOnce(&T, Values<'_, String, T>) -> Result<(), AppError>,
    {
        let mut records = self.records.write().await;

        check(&record, records.values())?;

        if record.id().is_empty() {
            record.set_id(Uuid::now_v7().to_string());
        }
        if records.contains_key(record.id()) {
            return Err(AppError::Conflict(format!(
                "{} {} already exists",
                T::LABEL,
                record.id()
            )));
        }

        records.insert(record.id().to_string(), record.clone());
        self.persist(&records).await?;

        Ok(record)
    }

    /// Replace the record `id` with the result of `apply`, and persist.
    ///
    /// `apply` sees the current stored record; the id is preserved whatever
    /// `apply` returns.
    pub async fn update<F>(&self, id: &str, apply: F) -> Result<T, AppError>
    where
        F: FnOnce(&T) -> Result<T, AppError>,
    {
        let mut records = self.records.write().await;

        let existing = records
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::LABEL, id)))?;

        let mut updated = apply(existing)?;
        updated.set_id(id.to_string());

        if let Some(slot) = records.get_mut(id) {
            *slot = updated.clone();
        }
        self.persist(&records).await?;

        Ok(updated)
    }

    /// Delete the record `id` and persist. Insertion order of the rest is kept.
    pub async fn remove(&self, id: &str) -> Result<T, AppError> {
        let mut records = self.records.write().await;

        let removed = records
            .shift_remove(id)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::LABEL, id)))?;
        self.persist(&records).await?;

        Ok(removed)
    }

    /// Rewrite records in place. `f` returns how many records it changed; the
    /// file is only rewritten when that is non-zero.
    pub async fn modify_all<F>(&self, f: F) -> Result<usize, AppError>
    where
        F: FnOnce(ValuesMut<'_, String, T>) -> Result<usize, AppError>,
    {
        let mut records = self.records.write().await;

        let changed = f(records.values_mut())?;
        if changed > 0 {
            self.persist(&records).await?;
        }

        Ok(changed)
    }

    /// Write the whole collection to a sibling temp file, then rename it over
    /// the backing file.
    async fn persist(&self, records: &Records<T>) -> Result<(), StoreError> {
        // Records are serialized directly so fields keep their declared order.
        let document = IndexMap::from([(T::COLLECTION, records.values().collect::<Vec<&T>>())]);
        let bytes = serde_json::to_vec_pretty(&document).map_err(|source| StoreError::Serialize {
            collection: T::COLLECTION,
            source,
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Persisted {} {} to {:?}", records.len(), T::COLLECTION, self.path);
        Ok(())
    }
}
