//! Integration tests for ReportForge
//!
//! These run the whole pipeline against an in-memory store; the live path
//! talks to a mock generateContent endpoint, so no API key is needed.

use chrono::{TimeZone, Utc};
use reportforge::agents::{FixedClock, PipelineControl, ReportOrchestrator, SeededRandom};
use reportforge::config::{LLMConfig, Settings};
use reportforge::core::{GeminiClient, InferenceClient};
use reportforge::export::ExportFormat;
use reportforge::models::{AnalysisContext, AnalysisType, DataSourceConfig, DbConfig};
use reportforge::storage::{InMemoryStore, KeyValueStore};
use reportforge::{ReportError, ReportForge};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forge_with(settings: Settings, client: Option<Arc<dyn InferenceClient>>) -> ReportForge {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let instant = Utc.with_ymd_and_hms(2024, 9, 30, 12, 0, 0).unwrap();
    let orchestrator = ReportOrchestrator::new(client.clone(), &settings)
        .with_demo_delay(Duration::ZERO)
        .with_random(Box::new(SeededRandom::new(2024)))
        .with_clock(Arc::new(FixedClock(instant)));
    ReportForge::with_orchestrator(settings, store, client, orchestrator)
}

fn demo_forge() -> ReportForge {
    forge_with(Settings::default(), None)
}

fn sql_source() -> DataSourceConfig {
    DataSourceConfig::Sql(DbConfig {
        host: Some("db.internal".to_string()),
        query: "SELECT region, revenue FROM sales".to_string(),
        ..DbConfig::default()
    })
}

#[tokio::test]
async fn test_demo_report_end_to_end() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);

    let report = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    assert!(report.title.contains("Q3 2024"));
    assert_eq!(report.versions.len(), 1);
    assert_eq!(report.versions[0].id, "v1.0");
    assert_eq!(report.versions[0].changes, "Initial Generation");
    assert_eq!(report.chart_data.len(), 6);
    assert!(report
        .table_data
        .iter()
        .all(|row| row.growth.map(|g| g.is_finite()).unwrap_or(false)));

    let saved = forge.history().list().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, report.id);
    assert_eq!(saved[0].thumbnail_data.len(), 4);

    // Demo sources are not remembered as connections
    assert!(forge.connections().recent().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_is_capped_newest_first() {
    let mut settings = Settings::default();
    settings.storage.history_limit = 3;
    let forge = forge_with(settings, None);

    for quarter in 1..=5 {
        let ctx = AnalysisContext::new(format!("Q{} 2024", quarter), AnalysisType::Trends);
        forge
            .generate(&ctx, &DataSourceConfig::demo("sales"), None)
            .await
            .unwrap();
    }

    let saved = forge.history().list().await.unwrap();
    assert_eq!(saved.len(), 3);
    assert!(saved[0].title.contains("Q5 2024"));
    assert!(saved[2].title.contains("Q3 2024"));
}

#[tokio::test]
async fn test_auto_save_off_skips_history() {
    let forge = demo_forge();
    forge
        .user_settings()
        .update(|s| s.auto_save = false)
        .await
        .unwrap();

    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
    forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    assert!(forge.history().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_demo_source_requires_credential() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);

    let err = forge.generate(&ctx, &sql_source(), None).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::CredentialMissing)
    ));
    assert!(forge.history().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_template_is_rejected() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);

    let err = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), Some("sys_missing"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sys_missing"));
}

#[tokio::test]
async fn test_live_analysis_against_mock_endpoint() {
    let mock_server = MockServer::start().await;
    let report_json = json!({
        "title": "Regional Revenue Review",
        "type": "Revenue",
        "summary": "Revenue rose in every region.",
        "metrics": [{ "label": "Revenue", "value": "1,200", "trend": 4.5, "iconType": "volume" }],
        "insights": null,
        "chartData": [
            { "name": "Jul", "primary": 300, "secondary": 250 },
            { "name": "Aug", "primary": 400, "secondary": 0 }
        ],
        "tableData": [{ "category": "North", "primary": 150, "secondary": 100, "contribution": 60 }]
    });

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": format!("```json\n{}\n```", report_json) }]
                }
            }]
        })))
        .mount(&mock_server)
        .await;

    let llm = LLMConfig {
        base_url: mock_server.uri(),
        ..LLMConfig::default()
    };
    let client: Arc<dyn InferenceClient> =
        Arc::new(GeminiClient::new("test-key".to_string(), llm).unwrap());
    let forge = forge_with(Settings::default(), Some(client));
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Benchmarks);

    let report = forge.generate(&ctx, &sql_source(), None).await.unwrap();

    assert_eq!(report.title, "Q3 2024 Revenue Report");
    assert!(report.insights.is_empty());
    assert_eq!(report.chart_data[0].total, Some(550.0));
    assert_eq!(report.table_data[0].growth, Some(50.0));
    assert_eq!(report.versions.len(), 1);

    let connections = forge.connections().recent().await.unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].name, "SQL DB: db.internal");
}

#[tokio::test]
async fn test_endpoint_failure_propagates() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;

    let llm = LLMConfig {
        base_url: mock_server.uri(),
        ..LLMConfig::default()
    };
    let client: Arc<dyn InferenceClient> =
        Arc::new(GeminiClient::new("test-key".to_string(), llm).unwrap());
    let forge = forge_with(Settings::default(), Some(client));
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);

    let err = forge.generate(&ctx, &sql_source(), None).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::Api { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_cancelled_run_saves_nothing() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
    let (control, cancel) = PipelineControl::new();
    cancel.cancel();

    let err = forge
        .generate_with(&ctx, &DataSourceConfig::demo("sales"), None, &control)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::Cancelled)
    ));
    assert!(forge.history().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_simulation_over_saved_report() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Forecast);
    let report = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    let (saved, mut simulator) = forge.simulator(&report.id).await.unwrap();
    assert_eq!(simulator.scenarios().len(), 3);

    let baseline = simulator.project(&saved.chart_data);
    assert_eq!(baseline.summary.growth, 0.0);
    assert_eq!(baseline.summary.revenue, 0.0);

    assert!(simulator.set_value("price_increase", 10.0));
    let projection = simulator.project(&saved.chart_data);
    assert_eq!(projection.summary.growth, 12.0);
    assert!(projection.summary.revenue > 0.0);

    simulator.reset();
    assert_eq!(simulator.project(&saved.chart_data), baseline);
}

#[tokio::test]
async fn test_export_saved_report() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
    let report = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    let slides = forge.export(&report.id, ExportFormat::Slides).await.unwrap();
    assert_eq!(slides.file_name, "Q3_2024_Sales_Performance_Review_presentation.txt");
    assert!(slides.content.starts_with("SLIDE 1: Title"));

    let bi = forge.export(&report.id, ExportFormat::Tableau).await.unwrap();
    assert_eq!(bi.content.lines().count(), 5);
    assert!(bi.content.lines().nth(1).unwrap().ends_with(",09/30/2024,ReportForge_AI"));
}

#[tokio::test]
async fn test_chat_without_credential_is_demo_reply() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
    let report = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    let reply = forge
        .chat("What drove growth?", Some(&report.id), None, &[])
        .await
        .unwrap();
    assert!(reply.text.contains("demo mode"));
}

#[tokio::test]
async fn test_comparison_requires_current_report() {
    let forge = demo_forge();
    let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
    let report = forge
        .generate(&ctx, &DataSourceConfig::demo("sales"), None)
        .await
        .unwrap();

    let err = forge
        .chat("How do these differ?", None, Some(&report.id), &[])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("current report"));
}
