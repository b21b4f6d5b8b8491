//! Application facade
//!
//! Wires configuration, storage, repositories and the report pipeline
//! together once, and exposes the operations the CLI (or any embedding
//! application) needs.
//!
//! Information Hiding:
//! - Credential resolution (user settings first, then environment) happens here
//! - Callers never touch the key-value backend directly
//! - Generated reports are recorded in history as the delivery step

use crate::agents::{
    ChatContext, ChatMessage, ChatReply, DataAssistant, PipelineControl, ReportOrchestrator,
};
use crate::config::Settings;
use crate::core::llm::{GeminiClient, InferenceClient};
use crate::export::{export, export_file_name, ExportFormat};
use crate::models::{AnalysisContext, DataSourceConfig, ReportData, ReportTemplate};
use crate::simulation::WhatIfSimulator;
use crate::storage::templates::DEFAULT_TEMPLATE_ID;
use crate::storage::{
    open_store, ConnectionStore, KeyValueStore, ReportHistory, SettingsStore, TemplateStore,
};
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;

/// Owner of user templates created from this installation
pub const LOCAL_USER_ID: &str = "local";

/// A rendered export ready to be written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content: String,
}

pub struct ReportForge {
    settings: Settings,
    orchestrator: ReportOrchestrator,
    assistant: DataAssistant,
    history: Arc<ReportHistory>,
    templates: Arc<TemplateStore>,
    user_settings: Arc<SettingsStore>,
    connections: Arc<ConnectionStore>,
}

impl ReportForge {
    /// Open the configured store and resolve the inference credential
    pub async fn open(settings: Settings) -> Result<Self> {
        let store = open_store(&settings.storage)
            .await
            .context("Failed to open report storage")?;

        let user_settings = SettingsStore::new(store.clone());
        let api_key = match user_settings.api_key().await? {
            Some(key) => Some(key),
            None => Settings::api_key(),
        };

        let client: Option<Arc<dyn InferenceClient>> = match api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(key, settings.llm.clone())?)),
            None => None,
        };

        Ok(Self::with_client(settings, store, client))
    }

    /// Assemble from parts; used by `open` and by tests with stub clients
    pub fn with_client(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        client: Option<Arc<dyn InferenceClient>>,
    ) -> Self {
        let orchestrator = ReportOrchestrator::new(client.clone(), &settings);
        Self::with_orchestrator(settings, store, client, orchestrator)
    }

    pub fn with_orchestrator(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        client: Option<Arc<dyn InferenceClient>>,
        orchestrator: ReportOrchestrator,
    ) -> Self {
        let history = ReportHistory::with_limit(store.clone(), settings.storage.history_limit);
        let connections =
            ConnectionStore::with_limit(store.clone(), settings.storage.connection_limit);

        Self {
            orchestrator,
            assistant: DataAssistant::new(client),
            history: Arc::new(history),
            templates: Arc::new(TemplateStore::new(store.clone())),
            user_settings: Arc::new(SettingsStore::new(store)),
            connections: Arc::new(connections),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_credential(&self) -> bool {
        self.orchestrator.has_credential()
    }

    pub fn history(&self) -> Arc<ReportHistory> {
        self.history.clone()
    }

    pub fn templates(&self) -> Arc<TemplateStore> {
        self.templates.clone()
    }

    pub fn user_settings(&self) -> Arc<SettingsStore> {
        self.user_settings.clone()
    }

    pub fn connections(&self) -> Arc<ConnectionStore> {
        self.connections.clone()
    }

    /// Template by id, falling back to the standard layout
    pub async fn template(&self, template_id: Option<&str>) -> Result<ReportTemplate> {
        let id = template_id.unwrap_or(DEFAULT_TEMPLATE_ID);
        match self.templates.find(id, Some(LOCAL_USER_ID)).await? {
            Some(template) => Ok(template),
            None if template_id.is_none() => Err(anyhow!("Standard template is unavailable")),
            None => Err(anyhow!("Unknown template: {}", id)),
        }
    }

    pub async fn generate(
        &self,
        context: &AnalysisContext,
        source: &DataSourceConfig,
        template_id: Option<&str>,
    ) -> Result<ReportData> {
        self.generate_with(context, source, template_id, &PipelineControl::detached())
            .await
    }

    /// Run the pipeline, then record the source it came from and, when
    /// auto-save is on, the report itself
    pub async fn generate_with(
        &self,
        context: &AnalysisContext,
        source: &DataSourceConfig,
        template_id: Option<&str>,
        control: &PipelineControl,
    ) -> Result<ReportData> {
        let template = self.template(template_id).await?;
        let report = self
            .orchestrator
            .generate_report_with(context, source, &template, control)
            .await?;

        if self.user_settings.load().await?.auto_save {
            self.history.add_to_history(&report).await?;
        }
        if let Err(e) = self.connections.remember(source).await {
            tracing::warn!("[ReportForge] Could not record connection: {}", e);
        }
        Ok(report)
    }

    pub async fn report(&self, id: &str) -> Result<ReportData> {
        self.history
            .load(id)
            .await?
            .ok_or_else(|| anyhow!("No saved report with id {}", id))
    }

    /// Ask about one saved report, or compare it against a second one
    pub async fn chat(
        &self,
        message: &str,
        report_id: Option<&str>,
        compare_id: Option<&str>,
        history: &[ChatMessage],
    ) -> Result<ChatReply> {
        let current = match report_id {
            Some(id) => Some(self.report(id).await?),
            None => None,
        };
        let comparison = match compare_id {
            Some(id) => Some(self.report(id).await?),
            None => None,
        };

        if current.is_none() && comparison.is_some() {
            bail!("A comparison needs a current report to compare against");
        }

        let context = match (&current, &comparison) {
            (Some(current), Some(comparison)) => ChatContext::Comparison {
                current,
                comparison,
            },
            (Some(current), None) => ChatContext::Single(current),
            _ => ChatContext::None,
        };
        Ok(self.assistant.chat(message, context, history).await)
    }

    pub async fn simulator(&self, report_id: &str) -> Result<(ReportData, WhatIfSimulator)> {
        let report = self.report(report_id).await?;
        let simulator = WhatIfSimulator::new(report.scenarios.clone());
        Ok((report, simulator))
    }

    pub async fn export(&self, report_id: &str, format: ExportFormat) -> Result<ExportedFile> {
        let report = self.report(report_id).await?;
        Ok(ExportedFile {
            file_name: export_file_name(&report, format),
            content: export(&report, format)?,
        })
    }
}
