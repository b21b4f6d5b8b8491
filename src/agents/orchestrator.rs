//! Report Orchestrator
//!
//! Information Hiding:
//! - Stage sequencing (collection, analysis, visualization, assembly) hidden
//!   behind `generate_report`
//! - Demo fallback and credential gating decided here, not by callers
//! - Progress and cancellation flow through `PipelineControl`

use super::data_collection::DataCollectionAgent;
use super::demo::{perturb_demo_report_at, RandomSource, ThreadRandom};
use super::messages::{PipelineControl, PipelineStage};
use super::analysis::AnalysisAgent;
use super::report_generation::{Clock, ReportGenerationAgent};
use super::visualization::VisualizationAgent;
use crate::config::Settings;
use crate::core::error::{ReportError, Result};
use crate::core::llm::InferenceClient;
use crate::models::{AnalysisContext, DataSourceConfig, ReportData, ReportTemplate};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const BANNER: &str = "==========================================";

pub struct ReportOrchestrator {
    data_agent: DataCollectionAgent,
    analysis_agent: AnalysisAgent,
    viz_agent: VisualizationAgent,
    report_agent: ReportGenerationAgent,
    demo_delay: Duration,
    random: Mutex<Box<dyn RandomSource>>,
}

impl ReportOrchestrator {
    /// `client` is `None` when no credential is configured; only demo
    /// sources can be served in that case.
    pub fn new(client: Option<Arc<dyn InferenceClient>>, settings: &Settings) -> Self {
        if client.is_none() {
            tracing::warn!(
                "[ReportOrchestrator] No API Key provided. Orchestrator will run in limited mode (Demo only)."
            );
        }
        Self {
            data_agent: DataCollectionAgent::new(&settings.pipeline),
            analysis_agent: AnalysisAgent::new(client, settings.llm.clone()),
            viz_agent: VisualizationAgent::new(),
            report_agent: ReportGenerationAgent::new(),
            demo_delay: Duration::from_millis(settings.pipeline.demo_delay_ms),
            random: Mutex::new(Box::new(ThreadRandom)),
        }
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> Self {
        self.random = Mutex::new(random);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.report_agent = ReportGenerationAgent::with_clock(clock);
        self
    }

    pub fn with_demo_delay(mut self, delay: Duration) -> Self {
        self.demo_delay = delay;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.analysis_agent.has_credential()
    }

    pub async fn generate_report(
        &self,
        context: &AnalysisContext,
        source: &DataSourceConfig,
        template: &ReportTemplate,
    ) -> Result<ReportData> {
        self.generate_report_with(context, source, template, &PipelineControl::detached())
            .await
    }

    pub async fn generate_report_with(
        &self,
        context: &AnalysisContext,
        source: &DataSourceConfig,
        template: &ReportTemplate,
        control: &PipelineControl,
    ) -> Result<ReportData> {
        let start = Instant::now();
        tracing::info!("[ReportOrchestrator] {}", BANNER);
        tracing::info!("[ReportOrchestrator] REPORT GENERATION WORKFLOW STARTED");
        tracing::info!("[ReportOrchestrator] {}", BANNER);

        let result = self.run_pipeline(context, source, template, control).await;

        match &result {
            Ok(report) => {
                tracing::info!("[ReportOrchestrator] {}", BANNER);
                tracing::info!(
                    "[ReportOrchestrator] REPORT GENERATION WORKFLOW COMPLETED in {:.2}s ({})",
                    start.elapsed().as_secs_f64(),
                    report.id
                );
                tracing::info!("[ReportOrchestrator] {}", BANNER);
            }
            Err(ReportError::Cancelled) => {
                tracing::warn!("[ReportOrchestrator] Workflow cancelled by caller")
            }
            Err(e) => tracing::error!("[ReportOrchestrator] [FAILED] Workflow Failed: {}", e),
        }
        result
    }

    async fn run_pipeline(
        &self,
        context: &AnalysisContext,
        source: &DataSourceConfig,
        template: &ReportTemplate,
        control: &PipelineControl,
    ) -> Result<ReportData> {
        checkpoint(control)?;
        tracing::info!("[ReportOrchestrator] --- Step 1: Data Collection ---");
        control.emit(PipelineStage::Collection).await;
        let data_context = self.data_agent.collect_data(source).await?;

        checkpoint(control)?;
        tracing::info!("[ReportOrchestrator] --- Step 2: Analysis ---");
        control.emit(PipelineStage::Analysis).await;
        let raw_report = if self.analysis_agent.has_credential() {
            tokio::select! {
                biased;
                _ = control.cancelled() => return Err(ReportError::Cancelled),
                result = self.analysis_agent.analyze_data(&data_context, context) => result?,
            }
        } else if source.is_demo() {
            self.demo_fallback(context, control).await?
        } else {
            return Err(ReportError::CredentialMissing);
        };

        checkpoint(control)?;
        tracing::info!("[ReportOrchestrator] --- Step 3: Visualization Processing ---");
        control.emit(PipelineStage::Visualization).await;
        let mut visualized = self.viz_agent.process_visualizations(raw_report);
        reconcile_title(&mut visualized, &context.period);

        checkpoint(control)?;
        tracing::info!("[ReportOrchestrator] --- Step 4: Report Assembly ---");
        control.emit(PipelineStage::ReportGen).await;
        let report = self
            .report_agent
            .generate_final_report(visualized, &template.id);

        control.emit(PipelineStage::Delivery).await;
        control.emit(PipelineStage::Complete).await;
        Ok(report)
    }

    async fn demo_fallback(
        &self,
        context: &AnalysisContext,
        control: &PipelineControl,
    ) -> Result<ReportData> {
        tracing::warn!(
            "[ReportOrchestrator] Skipping AI Analysis (No Key), utilizing static demo dataset."
        );

        tokio::select! {
            biased;
            _ = control.cancelled() => return Err(ReportError::Cancelled),
            _ = tokio::time::sleep(self.demo_delay) => {}
        }

        let now = self.report_agent.clock().now();
        let mut random = self
            .random
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(perturb_demo_report_at(context, random.as_mut(), now))
    }
}

fn checkpoint(control: &PipelineControl) -> Result<()> {
    if control.is_cancelled() {
        Err(ReportError::Cancelled)
    } else {
        Ok(())
    }
}

/// Keep the model's title only if it names the requested period
pub fn reconcile_title(report: &mut ReportData, period: &str) {
    if !report.title.is_empty() && report.title.contains(period) {
        return;
    }
    let focus = if report.report_type.trim().is_empty() {
        "Analysis"
    } else {
        report.report_type.as_str()
    };
    let title = format!("{} {} Report", period, focus);
    tracing::info!(
        "[ReportOrchestrator] Title '{}' does not mention period, using '{}'",
        report.title,
        title
    );
    report.title = title;
}
