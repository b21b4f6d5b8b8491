//! Report Generation Agent
//!
//! Information Hiding:
//! - Id, date and version stamping hidden behind `generate_final_report`
//! - Time comes from an injected `Clock` so assembly is reproducible in tests

use crate::models::{ReportData, ReportVersion};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::sync::Arc;
use tokio::time::Instant;

pub const REPORT_AUTHOR: &str = "ReportForge AI";
pub const INITIAL_VERSION_ID: &str = "v1.0";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date shown on the report
    fn local_date(&self) -> String {
        self.now()
            .with_timezone(&Local)
            .format("%m/%d/%Y")
            .to_string()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant, rendered in UTC
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn local_date(&self) -> String {
        self.0.format("%m/%d/%Y").to_string()
    }
}

pub struct ReportGenerationAgent {
    clock: Arc<dyn Clock>,
}

impl ReportGenerationAgent {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Stamp id, date and a fresh version history onto the report.
    ///
    /// Any version history already on `data` is discarded.
    pub fn generate_final_report(&self, mut data: ReportData, template_id: &str) -> ReportData {
        let start = Instant::now();
        tracing::info!(
            "[ReportGenerationAgent] [START] Generating final report assembly for template: {}",
            template_id
        );

        let now = self.clock.now();
        if data.id.trim().is_empty() {
            data.id = format!("RPT-{}", now.timestamp_millis());
        }
        data.date = self.clock.local_date();
        data.versions = vec![ReportVersion {
            id: INITIAL_VERSION_ID.to_string(),
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            author: REPORT_AUTHOR.to_string(),
            changes: "Initial Generation".to_string(),
        }];

        tracing::info!(
            "[ReportGenerationAgent] [COMPLETED] Report Generated in {:.2}ms: {}",
            start.elapsed().as_secs_f64() * 1000.0,
            data.id
        );
        data
    }
}

impl Default for ReportGenerationAgent {
    fn default() -> Self {
        Self::new()
    }
}
