//! Data Source Configuration
//!
//! A tagged union: each source kind carries only the fields it needs, so a
//! file source can never arrive holding a database query.

use crate::core::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Demo,
    File,
    Api,
    Sql,
    MongoDb,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Demo,
        SourceType::File,
        SourceType::Api,
        SourceType::Sql,
        SourceType::MongoDb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Demo => "demo",
            SourceType::File => "file",
            SourceType::Api => "api",
            SourceType::Sql => "sql",
            SourceType::MongoDb => "mongodb",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Raw JSON object of request headers as entered by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConfig {
    #[serde(default)]
    pub use_proxy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataSourceConfig {
    Demo {
        #[serde(rename = "demoId", default, skip_serializing_if = "Option::is_none")]
        demo_id: Option<String>,
    },
    File {
        #[serde(rename = "fileName")]
        name: String,
        #[serde(rename = "fileContent")]
        content: String,
        #[serde(rename = "fileSize", default)]
        size: u64,
    },
    Api(ApiConfig),
    Sql(DbConfig),
    MongoDb(DbConfig),
}

impl DataSourceConfig {
    pub fn demo(demo_id: impl Into<String>) -> Self {
        DataSourceConfig::Demo {
            demo_id: Some(demo_id.into()),
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            DataSourceConfig::Demo { .. } => SourceType::Demo,
            DataSourceConfig::File { .. } => SourceType::File,
            DataSourceConfig::Api(_) => SourceType::Api,
            DataSourceConfig::Sql(_) => SourceType::Sql,
            DataSourceConfig::MongoDb(_) => SourceType::MongoDb,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, DataSourceConfig::Demo { .. })
    }

    /// Parse a config received as raw JSON, reporting an unknown `type` tag
    /// by name instead of as a generic decode failure.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ReportError::InvalidInput(format!("source config is not JSON: {}", e)))?;

        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ReportError::InvalidInput("source config has no 'type'".to_string()))?;

        if SourceType::parse(&tag).is_none() {
            return Err(ReportError::UnsupportedSource(tag));
        }

        serde_json::from_value(value)
            .map_err(|e| ReportError::InvalidInput(format!("invalid {} source: {}", tag, e)))
    }

    /// Data-entry checks that must pass before the pipeline is started
    pub fn validate(&self) -> Result<()> {
        match self {
            DataSourceConfig::Demo { .. } => Ok(()),
            DataSourceConfig::File { content, .. } => {
                if content.is_empty() {
                    return Err(ReportError::MissingField {
                        source_type: "file",
                        field: "content",
                    });
                }
                Ok(())
            }
            DataSourceConfig::Api(api) => {
                if api.url.trim().is_empty() {
                    return Err(ReportError::MissingField {
                        source_type: "api",
                        field: "url",
                    });
                }
                if let Some(headers) = api.headers.as_deref().filter(|h| !h.trim().is_empty()) {
                    match serde_json::from_str::<serde_json::Value>(headers) {
                        Ok(serde_json::Value::Object(_)) => {}
                        _ => {
                            return Err(ReportError::InvalidInput(
                                "API headers must be a JSON object".to_string(),
                            ))
                        }
                    }
                }
                Ok(())
            }
            DataSourceConfig::Sql(db) | DataSourceConfig::MongoDb(db) => {
                if db.query.trim().is_empty() {
                    return Err(ReportError::MissingField {
                        source_type: if self.source_type() == SourceType::Sql {
                            "sql"
                        } else {
                            "mongodb"
                        },
                        field: "query",
                    });
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_rejects_unknown_type_by_name() {
        let err = DataSourceConfig::from_json(r#"{"type": "graphql", "url": "x"}"#).unwrap_err();
        match err {
            ReportError::UnsupportedSource(tag) => assert_eq!(tag, "graphql"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_names_tag_on_bad_body() {
        let err = DataSourceConfig::from_json(r#"{"type": "api", "method": "GET"}"#).unwrap_err();
        match err {
            ReportError::InvalidInput(message) => {
                assert!(message.starts_with("invalid api source"), "{message}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_json_reads_tagged_variants() {
        let config =
            DataSourceConfig::from_json(r#"{"type": "mongodb", "query": "db.sales.find()"}"#)
                .unwrap();
        assert_eq!(config.source_type(), SourceType::MongoDb);

        let config = DataSourceConfig::from_json(r#"{"type": "demo", "demoId": "sales"}"#).unwrap();
        assert_eq!(config, DataSourceConfig::demo("sales"));
    }

    #[test]
    fn test_validate_rejects_malformed_headers() {
        let config = DataSourceConfig::Api(ApiConfig {
            url: "https://api.example.com/sales".to_string(),
            method: HttpMethod::Get,
            headers: Some("[1, 2]".to_string()),
        });
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_requires_query() {
        let config = DataSourceConfig::Sql(DbConfig::default());
        assert!(matches!(
            config.validate(),
            Err(ReportError::MissingField { field: "query", .. })
        ));
    }
}
