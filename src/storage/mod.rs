//! Key-Value Storage Abstraction
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Allows swapping between memory, filesystem and SQLite without API changes
//! - Repositories own their key names and blob shapes; backends only see JSON values

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod connections;
pub mod filesystem;
pub mod history;
pub mod memory;
pub mod settings;
pub mod sqlite;
pub mod templates;

pub use connections::ConnectionStore;
pub use filesystem::FileSystemStore;
pub use history::ReportHistory;
pub use memory::InMemoryStore;
pub use settings::SettingsStore;
pub use sqlite::SqliteStore;
pub use templates::TemplateStore;

use crate::config::{StorageBackend, StorageConfig};
use std::sync::Arc;

/// Whole-document store: every write replaces the blob under its key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` if the key has never been written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    async fn keys(&self) -> Result<Vec<String>>;

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Build the backend selected in configuration
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Filesystem => Arc::new(FileSystemStore::new(config.path.clone()).await?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config.path.join("reportforge.db"))?),
    };
    tracing::debug!("[Storage] Opened {:?} backend at {:?}", config.backend, config.path);
    Ok(store)
}

/// Decode a stored blob, treating corrupt data as absent.
///
/// Repositories call this so a damaged document degrades to the empty
/// collection instead of blocking every later read.
pub(crate) fn decode_or_default<T>(key: &str, value: Option<Value>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match value {
        None => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("[Storage] Discarding unreadable '{}' blob: {}", key, e);
            T::default()
        }),
    }
}
