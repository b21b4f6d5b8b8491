//! Recent Connections
//!
//! Information Hiding:
//! - Connection list stored newest first under `rg_recent_connections`
//! - Duplicate detection and the size cap are applied on insert
//! - Connection details round-trip as the JSON of the source config

use super::{decode_or_default, KeyValueStore};
use crate::models::{ConnectionHistoryItem, DataSourceConfig, SourceType};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::sync::Arc;

pub const CONNECTIONS_KEY: &str = "rg_recent_connections";
pub const DEFAULT_CONNECTION_LIMIT: usize = 10;

const API_NAME_CHARS: usize = 25;

pub struct ConnectionStore {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl ConnectionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, DEFAULT_CONNECTION_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub async fn recent(&self) -> Result<Vec<ConnectionHistoryItem>> {
        Ok(decode_or_default(
            CONNECTIONS_KEY,
            self.store.get(CONNECTIONS_KEY).await?,
        ))
    }

    pub async fn recent_of(&self, source_type: SourceType) -> Result<Vec<ConnectionHistoryItem>> {
        let mut items = self.recent().await?;
        items.retain(|c| c.source_type == source_type);
        Ok(items)
    }

    /// Insert at the front, replacing any entry with the same name or details
    pub async fn add_connection(&self, connection: ConnectionHistoryItem) -> Result<()> {
        let mut items = self.recent().await?;
        items.retain(|c| c.details != connection.details && c.name != connection.name);

        tracing::info!("[ConnectionStore] Saved connection: {}", connection.name);
        items.insert(0, connection);
        items.truncate(self.limit);

        self.store
            .set(CONNECTIONS_KEY, serde_json::to_value(&items)?)
            .await
    }

    /// Remember a reusable source. Demo and file sources are not recorded.
    pub async fn remember(&self, source: &DataSourceConfig) -> Result<Option<ConnectionHistoryItem>> {
        let Some(item) = describe(source)? else {
            return Ok(None);
        };
        self.add_connection(item.clone()).await?;
        Ok(Some(item))
    }

    /// Rebuild the source config a saved connection was made from
    pub async fn restore(&self, id: &str) -> Result<DataSourceConfig> {
        let Some(item) = self.recent().await?.into_iter().find(|c| c.id == id) else {
            bail!("No saved connection with id {}", id);
        };

        let config = match item.source_type {
            SourceType::Api => DataSourceConfig::Api(
                serde_json::from_str(&item.details).context("Corrupt API connection details")?,
            ),
            SourceType::Sql => DataSourceConfig::Sql(
                serde_json::from_str(&item.details).context("Corrupt SQL connection details")?,
            ),
            SourceType::MongoDb => DataSourceConfig::MongoDb(
                serde_json::from_str(&item.details).context("Corrupt MongoDB connection details")?,
            ),
            other => bail!("{} sources are not stored as connections", other),
        };
        Ok(config)
    }
}

/// Display name and serialized details for a reusable source
pub fn describe(source: &DataSourceConfig) -> Result<Option<ConnectionHistoryItem>> {
    let (name, details) = match source {
        DataSourceConfig::Api(api) => {
            let prefix: String = api.url.chars().take(API_NAME_CHARS).collect();
            let ellipsis = if api.url.chars().count() > API_NAME_CHARS {
                "..."
            } else {
                ""
            };
            (
                format!("API: {}{}", prefix, ellipsis),
                serde_json::to_string(api)?,
            )
        }
        DataSourceConfig::Sql(db) | DataSourceConfig::MongoDb(db) => {
            let target = if db.use_proxy {
                "Connection String"
            } else {
                db.host.as_deref().unwrap_or("")
            };
            (
                format!(
                    "{} DB: {}",
                    source.source_type().as_str().to_uppercase(),
                    target
                ),
                serde_json::to_string(db)?,
            )
        }
        DataSourceConfig::Demo { .. } | DataSourceConfig::File { .. } => return Ok(None),
    };

    Ok(Some(ConnectionHistoryItem {
        id: Utc::now().timestamp_millis().to_string(),
        source_type: source.source_type(),
        name,
        last_used: Utc::now(),
        details,
    }))
}
