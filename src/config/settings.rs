use anyhow::Result;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LLMConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Thinking tokens granted when the context carries uploaded data
    pub raw_data_thinking_budget: u32,
    pub simulated_thinking_budget: u32,
    /// 0 disables the client-side timeout
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub demo_delay_ms: u64,
    pub file_char_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Filesystem,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub history_limit: usize,
    pub connection_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            raw_data_thinking_budget: 8192,
            simulated_thinking_budget: 4096,
            request_timeout_secs: 0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            demo_delay_ms: 1500,
            file_char_limit: 100_000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            path: PathBuf::from("./.reportforge"),
            history_limit: 20,
            connection_limit: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Inference credential from the environment, if any.
    ///
    /// A missing key is not an error here: it routes the pipeline into the
    /// demo fallback or a credential-missing failure later on.
    pub fn api_key() -> Option<String> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}
