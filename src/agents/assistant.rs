//! Data Assistant
//!
//! Conversational Q&A over one report, or over two reports side by side.
//!
//! Information Hiding:
//! - Report trimming and prompt layout hidden behind `chat`
//! - Inference failures are turned into a reply; callers always get text back

use crate::core::llm::{ChatTurn, GenerationRequest, InferenceClient, Source};
use crate::models::ReportData;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

pub const DEMO_MODE_REPLY: &str =
    "I am currently in demo mode. Please configure an API Key in Settings to chat with your data dynamically.";
pub const NO_REPORT_REPLY: &str = "Please generate a report first so I can analyze the data for you.";
pub const INCOMPLETE_REPORT_REPLY: &str = "The report data seems incomplete. I cannot analyze it.";
pub const EMPTY_REPLY: &str = "I couldn't generate a response.";
pub const SERVICE_ERROR_REPLY: &str =
    "I encountered an error connecting to the AI service. Please check your connection or API key.";

/// Rows of chart and table data sent for a single report
const SINGLE_REPORT_ROWS: usize = 20;
/// Table rows kept per report in comparison mode
const COMPARISON_TABLE_ROWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// What the assistant is allowed to look at
#[derive(Debug, Clone, Copy)]
pub enum ChatContext<'a> {
    None,
    Single(&'a ReportData),
    Comparison {
        current: &'a ReportData,
        comparison: &'a ReportData,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<Source>,
}

impl ChatReply {
    fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sources: Vec::new(),
        }
    }
}

pub struct DataAssistant {
    client: Option<Arc<dyn InferenceClient>>,
}

impl DataAssistant {
    pub fn new(client: Option<Arc<dyn InferenceClient>>) -> Self {
        Self { client }
    }

    /// Answer `message` given the prior conversation in `history`
    pub async fn chat(
        &self,
        message: &str,
        context: ChatContext<'_>,
        history: &[ChatMessage],
    ) -> ChatReply {
        let Some(client) = &self.client else {
            return ChatReply::text(DEMO_MODE_REPLY);
        };

        let data_section = match context {
            ChatContext::None => return ChatReply::text(NO_REPORT_REPLY),
            ChatContext::Single(report) => {
                if report.title.is_empty() && report.metrics.is_empty() {
                    return ChatReply::text(INCOMPLETE_REPORT_REPLY);
                }
                single_report_section(report)
            }
            ChatContext::Comparison {
                current,
                comparison,
            } => comparison_section(current, comparison),
        };

        let mut contents = conversation_turns(history);
        contents.push(ChatTurn::user(message));

        let request = GenerationRequest {
            system_instruction: Some(build_chat_instruction(&data_section)),
            contents,
            web_search: true,
            ..GenerationRequest::default()
        };

        let start = Instant::now();
        tracing::info!(
            "[DataAssistant] [START] Chat request ({} prior turns)",
            request.contents.len() - 1
        );

        match client.generate(request).await {
            Ok(response) => {
                tracing::info!(
                    "[DataAssistant] [COMPLETED] Chat answered in {:.2}ms (sources: {})",
                    start.elapsed().as_secs_f64() * 1000.0,
                    response.sources.len()
                );
                ChatReply {
                    text: response
                        .text
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| EMPTY_REPLY.to_string()),
                    sources: response.sources,
                }
            }
            Err(e) => {
                tracing::error!("[DataAssistant] [FAILED] Chat API Error: {}", e);
                ChatReply::text(SERVICE_ERROR_REPLY)
            }
        }
    }
}

/// Prior turns the model should see: system notices and error echoes are dropped
pub fn conversation_turns(history: &[ChatMessage]) -> Vec<ChatTurn> {
    history
        .iter()
        .filter(|m| m.role != ChatRole::System && !m.content.contains("error"))
        .map(|m| {
            let text = if m.content.is_empty() {
                "...".to_string()
            } else {
                m.content.clone()
            };
            match m.role {
                ChatRole::User => ChatTurn::user(text),
                _ => ChatTurn::model(text),
            }
        })
        .collect()
}

fn single_report_section(report: &ReportData) -> String {
    let mut lite = report.clone();
    lite.chart_data.truncate(SINGLE_REPORT_ROWS);
    lite.table_data.truncate(SINGLE_REPORT_ROWS);

    format!(
        "REPORT DATA:\n{}",
        serde_json::to_string(&lite).unwrap_or_default()
    )
}

fn lite_summary(report: &ReportData) -> serde_json::Value {
    let rows = report.table_data.len().min(COMPARISON_TABLE_ROWS);
    json!({
        "title": report.title,
        "date": report.date,
        "metrics": report.metrics,
        "summary": report.summary,
        "insights": report.insights,
        "tableData": &report.table_data[..rows],
    })
}

fn comparison_section(current: &ReportData, comparison: &ReportData) -> String {
    format!(
        "MODE: COMPARISON ANALYSIS\n\n\
         CURRENT REPORT:\n{}\n\n\
         HISTORICAL REPORT FOR COMPARISON:\n{}\n\n\
         INSTRUCTIONS:\n\
         - Compare the two reports.\n\
         - Analyze growth/decline in key metrics (Current vs Historical).\n\
         - Highlight new risks or insights that appeared in the current report.\n\
         - If the user asks about specific numbers, calculate the difference.",
        lite_summary(current),
        lite_summary(comparison)
    )
}

fn build_chat_instruction(data_section: &str) -> String {
    format!(
        "You are an expert Senior Data Analyst.\n\n\
         CONTEXT:\n\
         User is asking questions about a business intelligence report.\n\n\
         {}\n\n\
         INSTRUCTIONS:\n\
         - Answer strictly based on the report data provided.\n\
         - Be concise, professional, and insightful.\n\
         - Use Markdown formatting (bold, bullet points, lists) to make your answer easy to read.\n\
         - If asked for calculations, perform them based on the metrics available.\n\
         - You have access to Google Search to fetch external benchmarks or clarify industry terms if asked.",
        data_section
    )
}
