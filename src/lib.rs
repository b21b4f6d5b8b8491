//! ReportForge - multi-stage AI business report generation
//!
//! A report request flows through data collection, model analysis (or a
//! randomized demo fallback when no credential is configured), visualization
//! enrichment and final assembly. Finished reports are kept in a bounded
//! history and can be exported, simulated against what-if scenarios, or
//! discussed with the data assistant.

pub mod agents;
pub mod config;
pub mod core;
pub mod export;
pub mod models;
pub mod simulation;
pub mod storage;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::{ExportedFile, ReportForge};
pub use config::Settings;
pub use core::error::{ReportError, Result};
