//! SQLite Key-Value Storage
//!
//! Information Hiding:
//! - Table layout and SQL hidden behind the store trait
//! - Values are kept as JSON text in a single `kv` table
//! - Connection locking hidden behind async interface

use super::KeyValueStore;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("Failed to open in-memory database")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create kv table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("SQLite connection lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn()?
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .context("Failed to read key")?;

        match raw {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context(format!("Failed to parse value of '{}'", key))?,
            )),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let raw = serde_json::to_string(&value).context("Failed to serialize value")?;
        self.conn()?
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, raw],
            )
            .context("Failed to write key")?;
        tracing::debug!("[SqliteStore] Wrote '{}'", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .context("Failed to delete key")?;
        tracing::debug!("[SqliteStore] Removed '{}'", key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .context("Failed to prepare key listing")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("Failed to list keys")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read key row")?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", json!([1, 2])).await.unwrap();
        store.set("k", json!([3])).await.unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(json!([3])));
        assert_eq!(store.keys().await.unwrap(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.remove("absent").await.unwrap();
        assert!(!store.contains("absent").await.unwrap());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("store.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store
                .set("rg_recent_connections", json!([{"name": "API: x"}]))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let loaded = store.get("rg_recent_connections").await.unwrap().unwrap();
        assert_eq!(loaded[0]["name"], "API: x");
    }
}
