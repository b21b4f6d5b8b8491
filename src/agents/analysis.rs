//! Analysis Agent
//!
//! Information Hiding:
//! - Prompt construction and data-mode switching hidden behind `analyze_data`
//! - Response cleanup (code fences, missing collections) applied before callers see the report
//! - The inference backend is injected; no credential means no client

use super::data_collection::RAW_DATA_MARKER;
use super::schema::report_schema;
use crate::config::LLMConfig;
use crate::core::error::{ReportError, Result};
use crate::core::llm::{GenerationRequest, InferenceClient};
use crate::models::{AnalysisContext, ReportData};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::Instant;

static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A```(?:json)?").expect("fence pattern is valid"));
static FENCE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```\z").expect("fence pattern is valid"));

/// Collection fields the model is allowed to omit or null out
pub const COLLECTION_FIELDS: [&str; 11] = [
    "metrics",
    "insights",
    "risks",
    "recommendations",
    "chartData",
    "tableData",
    "scenarios",
    "forecastData",
    "strategicMap",
    "competitors",
    "versions",
];

const DEFAULT_INSTRUCTIONS: &str = "General performance review";

pub struct AnalysisAgent {
    client: Option<Arc<dyn InferenceClient>>,
    config: LLMConfig,
}

impl AnalysisAgent {
    pub fn new(client: Option<Arc<dyn InferenceClient>>, config: LLMConfig) -> Self {
        if client.is_none() {
            tracing::warn!("[AnalysisAgent] Initialized without a credential (demo mode)");
        }
        Self { client, config }
    }

    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }

    pub fn thinking_budget(&self, data_context: &str) -> u32 {
        if is_raw_data(data_context) {
            self.config.raw_data_thinking_budget
        } else {
            self.config.simulated_thinking_budget
        }
    }

    /// Ask the model for a structured report over `data_context`
    pub async fn analyze_data(
        &self,
        data_context: &str,
        context: &AnalysisContext,
    ) -> Result<ReportData> {
        let Some(client) = &self.client else {
            return Err(ReportError::CredentialMissing);
        };

        let start = Instant::now();
        tracing::info!(
            "[AnalysisAgent] [START] Analyzing data for period: {} (focus: {})",
            context.period,
            context.focus
        );

        let budget = self.thinking_budget(data_context);
        tracing::info!(
            "[AnalysisAgent] Sending request to model: {} (thinking budget: {})",
            self.config.model,
            budget
        );

        let request = GenerationRequest::json(
            build_system_prompt(data_context, context),
            build_user_prompt(data_context, context),
            report_schema(),
        )
        .with_thinking_budget(budget);

        let result: Result<ReportData> = async {
            let response = client.generate(request).await?;
            let text = response.text.ok_or(ReportError::EmptyResponse)?;
            let value: Value = serde_json::from_str(clean_json_string(&text))
                .map_err(ReportError::MalformedResponse)?;
            repair_report(value)
        }
        .await;

        match &result {
            Ok(report) => tracing::info!(
                "[AnalysisAgent] [COMPLETED] AI Analysis finished in {:.2}ms (insights: {}, risks: {})",
                start.elapsed().as_secs_f64() * 1000.0,
                report.insights.len(),
                report.risks.len()
            ),
            Err(e) => tracing::error!("[AnalysisAgent] [FAILED] Gemini Analysis Failed: {}", e),
        }
        result
    }
}

pub fn is_raw_data(data_context: &str) -> bool {
    data_context.contains(RAW_DATA_MARKER)
}

/// Strip a surrounding markdown code fence, if any
pub fn clean_json_string(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_open = match FENCE_OPEN.find(trimmed) {
        Some(m) => &trimmed[m.end()..],
        None => trimmed,
    };
    let without_close = match FENCE_CLOSE.find(without_open) {
        Some(m) => &without_open[..m.start()],
        None => without_open,
    };
    without_close.trim()
}

/// Normalise a decoded model response into a report.
///
/// Every collection field that is absent, `null` or not an array becomes an
/// empty array, so no later stage has to check for them.
pub fn repair_report(mut value: Value) -> Result<ReportData> {
    let Some(object) = value.as_object_mut() else {
        return Err(ReportError::MalformedResponse(
            <serde_json::Error as serde::de::Error>::custom("report JSON is not an object"),
        ));
    };

    for field in COLLECTION_FIELDS {
        let needs_repair = !matches!(object.get(field), Some(Value::Array(_)));
        if needs_repair {
            if let Some(bad) = object.get(field).filter(|v| !v.is_null()) {
                tracing::warn!(
                    "[AnalysisAgent] Replacing non-array '{}' ({}) with []",
                    field,
                    bad
                );
            }
            object.insert(field.to_string(), Value::Array(Vec::new()));
        }
    }

    serde_json::from_value(value).map_err(ReportError::MalformedResponse)
}

pub fn build_system_prompt(data_context: &str, context: &AnalysisContext) -> String {
    let data_mode = if is_raw_data(data_context) {
        "DATA MODE: **STRICT ANALYSIS**\n\
         You have been provided with raw data.\n\
         1. Use ONLY the provided data for calculations. Do not hallucinate new numbers.\n\
         2. If the data is a list of transactions, aggregate them to form the metrics.\n\
         3. Identify outliers and explain *why* they might be happening based on the context.\n\
         4. **CRITICAL:** Before generating the JSON, THINK about the key trends. Identify the biggest riser and faller."
            .to_string()
    } else {
        format!(
            "DATA MODE: **SIMULATION / GENERATIVE**\n\
             You are simulating a realistic business scenario based on the user instructions: \"{}\".\n\
             1. Generate consistent, realistic, and HIGHLY DETAILED business data.\n\
             2. Ensure the numbers mathematically align (e.g., individual regional sales sum up to total sales).\n\
             3. Create a cohesive narrative (e.g., if you say Q2 was bad in the summary, the charts must show a dip).",
            context.instructions
        )
    };

    format!(
        "You are acting as a Strategic C-Suite Advisor for a high-growth enterprise.\n\
         Your goal is to generate a highly detailed, professional, JSON-structured business report (ReportForge).\n\n\
         OUTPUT RULES:\n\
         - Return ONLY valid JSON matching the schema.\n\
         - **CRITICAL: DETAIL LEVEL = HIGH.** Do not be brief. Be verbose, analytical, and professional in all text fields.\n\
         - **MATH SAFETY:** When calculating metrics from raw data, double-check your arithmetic.\n\n\
         SPECIAL INSTRUCTIONS FOR ENTERPRISE FEATURES:\n\
         1. **Multi-Persona Brief:** In the 'executiveBrief' section, provide 3 distinct, detailed paragraphs (at least 3-4 sentences each) written in the voice of a CFO (Financial), CRO (Sales/Revenue), and COO (Operations). Do not summarize; analyze.\n\
         2. **Key Insights:** Provide 6-8 deep insights. Each 'text' field should be a full paragraph explaining the \"what\", \"why\", and \"impact\". Include specific numbers and % changes.\n\
         3. **Future Outlook:** The 'outlook' field must be a comprehensive forecast (at least 2 paragraphs) including potential headwinds, tailwinds, and strategic pivot points.\n\
         4. **Recommendations:** For each recommendation, the 'description' must be detailed and actionable (e.g., specific steps, expected outcome), not just generic advice.\n\
         5. **Market Context:** Use your expert knowledge to provide detailed current market trends relevant to the data/industry. Add detailed context to 'marketContext'.\n\
         6. **Competitors:** If you can infer the industry, generate a 'competitors' array benchmarking the company against 3 likely competitors.\n\n\
         {}\n",
        data_mode
    )
}

pub fn build_user_prompt(data_context: &str, context: &AnalysisContext) -> String {
    let instructions = if context.instructions.trim().is_empty() {
        DEFAULT_INSTRUCTIONS
    } else {
        context.instructions.as_str()
    };

    format!(
        "GENERATE REPORT JSON.\n\n\
         ANALYSIS CONTEXT:\n\
         Period: {}\n\
         Analysis Focus: {}\n\
         User Instructions: {}\n\n\
         DATA SOURCE:\n\
         {}\n\n\
         REQUIREMENTS:\n\
         1. **Metrics**: Provide 4 distinct \"metrics\" for the dashboard header. Ensure 'trend' is a percentage (e.g., 12.5).\n\
         2. **Table**: \"tableData\" must have at least 8-10 rows of categorical breakdown.\n\
         3. **Chart**: \"chartData\" must have 12 data points for time-series trends (e.g., monthly).\n\
         4. **Radar Map**: Populate \"strategicMap\" with 6 key qualitative dimensions.\n\
         5. **Competitors**: Benchmarking data against 3 competitors.\n\
         6. **Executive Brief**: Distinct CFO/CRO/COO summaries (Detailed paragraphs).\n\
         7. **Insights**: Generate 6-8 deep insights explaining key drivers.\n\
         8. **Risks**: Identify 4 specific risks with impact/priority.\n\
         9. **Recommendations**: 4 Actionable steps with Effort/Impact ratings.\n",
        context.period, context.focus, instructions, data_context
    )
}
