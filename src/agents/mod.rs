//! Report pipeline agents
//!
//! Each stage of report generation lives in its own agent; the orchestrator
//! sequences them and owns the demo fallback.

pub mod analysis;
pub mod assistant;
pub mod data_collection;
pub mod demo;
pub mod messages;
pub mod orchestrator;
pub mod report_generation;
pub mod schema;
pub mod visualization;

pub use analysis::{clean_json_string, repair_report, AnalysisAgent};
pub use assistant::{ChatContext, ChatMessage, ChatReply, ChatRole, DataAssistant};
pub use data_collection::DataCollectionAgent;
pub use demo::{demo_sales_report, perturb_demo_report, RandomSource, SeededRandom, ThreadRandom};
pub use messages::{CancelHandle, PipelineControl, PipelineEvent, PipelineStage};
pub use orchestrator::ReportOrchestrator;
pub use report_generation::{Clock, FixedClock, ReportGenerationAgent, SystemClock};
pub use visualization::VisualizationAgent;
