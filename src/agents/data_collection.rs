//! Data Collection Agent
//!
//! Information Hiding:
//! - Per-source formatting of the analysis context hidden behind `collect_data`
//! - Truncation limit and data delimiters owned here
//! - API and database sources are described, never contacted

use crate::config::PipelineConfig;
use crate::core::error::Result;
use crate::models::{ApiConfig, DataSourceConfig, DbConfig, SourceType};
use tokio::time::Instant;

/// Marker the analysis stage looks for to switch into strict mode
pub const RAW_DATA_MARKER: &str = "RAW DATA";
pub const RAW_DATA_START: &str = "=== RAW DATA CONTENT START";
pub const RAW_DATA_END: &str = "=== RAW DATA CONTENT END ===";

pub struct DataCollectionAgent {
    char_limit: usize,
}

impl DataCollectionAgent {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_char_limit(config.file_char_limit)
    }

    pub fn with_char_limit(char_limit: usize) -> Self {
        Self { char_limit }
    }

    /// Turn a source descriptor into the text context the analysis stage reads
    pub async fn collect_data(&self, config: &DataSourceConfig) -> Result<String> {
        let start = Instant::now();
        let source = config.source_type();
        tracing::info!(
            "[DataCollectionAgent] [START] Collecting data from source: {}",
            source.as_str().to_uppercase()
        );

        let result = match config {
            DataSourceConfig::Demo { demo_id } => Ok(self.load_demo(demo_id.as_deref())),
            DataSourceConfig::File {
                name,
                content,
                size,
            } => {
                config.validate().map(|_| self.load_file(name, content, *size))
            }
            DataSourceConfig::Api(api) => Ok(self.describe_api(api)),
            DataSourceConfig::Sql(db) | DataSourceConfig::MongoDb(db) => {
                Ok(self.describe_database(source, db))
            }
        };

        match &result {
            Ok(context) => tracing::info!(
                "[DataCollectionAgent] [COMPLETED] Data collection finished in {:.2}ms (source: {}, chars: {})",
                start.elapsed().as_secs_f64() * 1000.0,
                source,
                context.chars().count()
            ),
            Err(e) => tracing::error!("[DataCollectionAgent] [FAILED] Error during data collection: {}", e),
        }
        result
    }

    /// Entry point for configs that arrive as raw JSON
    pub async fn collect_raw(&self, raw: &str) -> Result<String> {
        let config = DataSourceConfig::from_json(raw).inspect_err(|e| {
            tracing::error!("[DataCollectionAgent] [FAILED] Rejected source config: {}", e)
        })?;
        self.collect_data(&config).await
    }

    fn load_demo(&self, demo_id: Option<&str>) -> String {
        tracing::info!(
            "[DataCollectionAgent] Loading demo scenario: {}",
            demo_id.unwrap_or("default")
        );
        format!(
            "Source Type: Demo Scenario ({}).\nUsing predefined demo data for simulation.",
            demo_id.unwrap_or("General")
        )
    }

    fn load_file(&self, name: &str, content: &str, size: u64) -> String {
        let (body, truncated) = truncate_chars(content, self.char_limit);
        tracing::info!(
            "[DataCollectionAgent] Processing file: {} (original size: {}, truncated: {})",
            name,
            size,
            truncated
        );

        let start_marker = if truncated {
            format!("{} (Truncated) ===", RAW_DATA_START)
        } else {
            format!("{} ===", RAW_DATA_START)
        };

        format!(
            "Source Type: File Upload\n\
             Filename: {}\n\
             Original Size: {} bytes\n\n\
             {}\n\
             {}\n\
             {}\n\n\
             Task: Parse the data above. Calculate Total Volume, Trends, and Key Metrics.",
            name, size, start_marker, body, RAW_DATA_END
        )
    }

    fn describe_api(&self, api: &ApiConfig) -> String {
        tracing::info!("[DataCollectionAgent] Connecting to REST API: {}", api.url);
        format!(
            "Source Type: REST API\n\
             Endpoint: {}\n\
             Method: {}\n\
             Task: Simulate a response from this endpoint and analyze it based on typical schema for this kind of data.",
            api.url, api.method
        )
    }

    fn describe_database(&self, source: SourceType, db: &DbConfig) -> String {
        tracing::info!("[DataCollectionAgent] Connecting to Database: {}", source);
        let host = db
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or("Local");
        format!(
            "Source Type: {} Database\n\
             Query: {}\n\
             HostContext: {}\n\
             Task: Simulate the result of this query and analyze it.",
            source.as_str().to_uppercase(),
            db.query,
            host
        )
    }
}

/// Keep at most `limit` characters without splitting a code point
fn truncate_chars(content: &str, limit: usize) -> (&str, bool) {
    match content.char_indices().nth(limit) {
        Some((byte_index, _)) => (&content[..byte_index], true),
        None => (content, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ReportError;
    use crate::models::HttpMethod;

    fn agent() -> DataCollectionAgent {
        DataCollectionAgent::new(&PipelineConfig::default())
    }

    #[tokio::test]
    async fn test_demo_context() {
        let context = agent()
            .collect_data(&DataSourceConfig::demo("sales"))
            .await
            .unwrap();
        assert_eq!(
            context,
            "Source Type: Demo Scenario (sales).\nUsing predefined demo data for simulation."
        );

        let context = agent()
            .collect_data(&DataSourceConfig::Demo { demo_id: None })
            .await
            .unwrap();
        assert!(context.contains("(General)"));
    }

    #[tokio::test]
    async fn test_file_within_limit_is_not_truncated() {
        let config = DataSourceConfig::File {
            name: "sales.csv".to_string(),
            content: "region,total\nNorth,10".to_string(),
            size: 21,
        };
        let context = agent().collect_data(&config).await.unwrap();

        assert!(context.contains("Filename: sales.csv"));
        assert!(context.contains("Original Size: 21 bytes"));
        assert!(context.contains("=== RAW DATA CONTENT START ===\nregion,total\nNorth,10\n=== RAW DATA CONTENT END ==="));
        assert!(!context.contains("(Truncated)"));
    }

    #[tokio::test]
    async fn test_file_over_limit_is_truncated_on_char_boundary() {
        let content = "é".repeat(100_001);
        let config = DataSourceConfig::File {
            name: "big.json".to_string(),
            content,
            size: 200_002,
        };
        let context = agent().collect_data(&config).await.unwrap();

        assert!(context.contains("(Truncated)"));
        let body_chars = context.matches('é').count();
        assert_eq!(body_chars, 100_000);
    }

    #[tokio::test]
    async fn test_empty_file_fails_with_missing_field() {
        let config = DataSourceConfig::File {
            name: "empty.csv".to_string(),
            content: String::new(),
            size: 0,
        };
        let err = agent().collect_data(&config).await.unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingField {
                field: "content",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_api_and_database_are_described() {
        let api = DataSourceConfig::Api(ApiConfig {
            url: "https://api.example.com/sales".to_string(),
            method: HttpMethod::Post,
            headers: None,
        });
        let context = agent().collect_data(&api).await.unwrap();
        assert!(context.contains("Endpoint: https://api.example.com/sales"));
        assert!(context.contains("Method: POST"));
        assert!(!context.contains(RAW_DATA_MARKER));

        let mongo = DataSourceConfig::MongoDb(DbConfig {
            query: "db.orders.find()".to_string(),
            ..DbConfig::default()
        });
        let context = agent().collect_data(&mongo).await.unwrap();
        assert!(context.starts_with("Source Type: MONGODB Database"));
        assert!(context.contains("HostContext: Local"));
    }

    #[tokio::test]
    async fn test_collect_raw_rejects_unknown_type() {
        let err = agent()
            .collect_raw(r#"{"type": "graphql"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedSource(t) if t == "graphql"));
    }
}
