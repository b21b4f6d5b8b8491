//! File System Key-Value Storage
//!
//! Information Hiding:
//! - File paths and JSON serialization format hidden from users
//! - Directory structure management hidden behind interface
//! - Persistence mechanism independent of storage trait users

use super::KeyValueStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;

/// Each key is a JSON file stored as {base_path}/{key}.json
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .context("Failed to create storage directory")?;

        Ok(Self { base_path })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for FileSystemStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.key_path(key);

        if !path.exists() {
            tracing::debug!("[FileSystemStore] Key '{}' does not exist", key);
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context(format!("Failed to read key file: {:?}", path))?;

        let value = serde_json::from_str(&json)
            .context(format!("Failed to parse key file: {:?}", path))?;

        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.key_path(key);
        let json = serde_json::to_string_pretty(&value).context("Failed to serialize value")?;

        // Write beside the target, then rename over it
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)
            .await
            .context(format!("Failed to write key file: {:?}", staging))?;
        fs::rename(&staging, &path)
            .await
            .context(format!("Failed to replace key file: {:?}", path))?;

        tracing::debug!("[FileSystemStore] Wrote '{}' to {:?}", key, path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);

        if path.exists() {
            fs::remove_file(&path)
                .await
                .context(format!("Failed to delete key file: {:?}", path))?;
            tracing::debug!("[FileSystemStore] Removed '{}' at {:?}", key, path);
        }

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .context("Failed to read storage directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(key.to_string());
                }
            }
        }

        tracing::debug!("[FileSystemStore] Listed {} keys", keys.len());
        Ok(keys)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.key_path(key).exists())
    }
}
