//! User Settings Persistence
//!
//! Information Hiding:
//! - Settings are a single document under `rg_user_settings`
//! - Missing or unreadable documents yield defaults

use super::{decode_or_default, KeyValueStore};
use crate::models::UserSettings;
use anyhow::Result;
use std::sync::Arc;

pub const SETTINGS_KEY: &str = "rg_user_settings";

pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<UserSettings> {
        Ok(decode_or_default(SETTINGS_KEY, self.store.get(SETTINGS_KEY).await?))
    }

    /// Replaces the whole document
    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        self.store
            .set(SETTINGS_KEY, serde_json::to_value(settings)?)
            .await?;
        tracing::info!("[SettingsStore] Settings saved");
        Ok(())
    }

    /// Load, apply `change`, save
    pub async fn update<F>(&self, change: F) -> Result<UserSettings>
    where
        F: FnOnce(&mut UserSettings) + Send,
    {
        let mut settings = self.load().await?;
        change(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn api_key(&self) -> Result<Option<String>> {
        Ok(self.load().await?.api_key().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceType, Theme};
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_load_defaults_when_empty() {
        let store = SettingsStore::new(Arc::new(InMemoryStore::new()));
        let settings = store.load().await.unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.auto_save);
        assert_eq!(settings.default_data_source, SourceType::Demo);
    }

    #[tokio::test]
    async fn test_update_persists_changes() {
        let store = SettingsStore::new(Arc::new(InMemoryStore::new()));
        store
            .update(|s| {
                s.api_key = Some("key-123".to_string());
                s.auto_save = false;
            })
            .await
            .unwrap();

        assert_eq!(store.api_key().await.unwrap().as_deref(), Some("key-123"));
        assert!(!store.load().await.unwrap().auto_save);
    }
}
