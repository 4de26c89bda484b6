//! JSON file persistence.
//!
//! Each collection lives in memory and is mirrored to `<data_dir>/<collection>.json`,
//! a document of the form `{"<collection>": [records...]}` rewritten after every
//! mutation. The in-memory copy is the source of truth while the process runs.

mod collection;

pub use collection::*;

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::models::{Book, Event, User};

/// A record stored in a collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, used both as file stem and as the document's array field.
    const COLLECTION: &'static str;
    /// Human-readable record name used in error messages.
    const LABEL: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} has no \"{field}\" array")]
    MissingCollection { path: PathBuf, field: &'static str },
    #[error("{path} contains duplicate id {id:?}")]
    DuplicateId { path: PathBuf, id: String },
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The three collections of the library.
pub struct Stores {
    pub users: CollectionStore<User>,
    pub books: CollectionStore<Book>,
    pub events: CollectionStore<Event>,
}

impl Stores {
    /// Load every collection from `data_dir`. Any failure is fatal to startup.
    pub async fn load(data_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            users: CollectionStore::load(data_dir).await?,
            books: CollectionStore::load(data_dir).await?,
            events: CollectionStore::load(data_dir).await?,
        })
    }
}
