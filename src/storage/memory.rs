//! In-Memory Key-Value Storage
//!
//! Information Hiding:
//! - HashMap storage structure hidden from users
//! - Thread-safe access via RwLock hidden behind async interface
//! - Suitable for testing and one-shot CLI runs

use super::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Data is lost when process terminates
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        tracing::debug!("[InMemoryStore] Wrote '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        tracing::debug!("[InMemoryStore] Removed '{}'", key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(key))
    }
}
