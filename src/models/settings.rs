use super::source::SourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub email: bool,
    pub browser: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

/// User preferences persisted as a single blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub theme: Theme,
    pub language: String,
    pub notifications: NotificationSettings,
    pub auto_save: bool,
    pub default_data_source: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub onboarding_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            language: "en".to_string(),
            notifications: NotificationSettings {
                email: true,
                browser: true,
            },
            auto_save: true,
            default_data_source: SourceType::Demo,
            api_key: None,
            onboarding_complete: false,
            branding: None,
        }
    }
}

impl UserSettings {
    /// Configured key, ignoring blanks
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Previously used API or database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHistoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: String,
    pub last_used: DateTime<Utc>,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    ReportGenerated,
    DataConnected,
    ViewedReport,
    SystemUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_older_settings_blob_gets_new_fields_defaulted() {
        let settings: UserSettings =
            serde_json::from_str(r#"{"theme": "light", "autoSave": false}"#).unwrap();
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.auto_save);
        assert_eq!(settings.default_data_source, SourceType::Demo);
        assert!(settings.api_key().is_none());
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let settings = UserSettings {
            api_key: Some("   ".to_string()),
            ..UserSettings::default()
        };
        assert!(settings.api_key().is_none());
    }
}
