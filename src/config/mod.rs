mod settings;

pub use settings::{
    LLMConfig, LoggingConfig, PipelineConfig, Settings, StorageBackend, StorageConfig,
};
