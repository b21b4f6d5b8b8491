//! Report Data Model
//!
//! `ReportData` is the artifact every pipeline stage passes along. All
//! collection fields deserialize to an empty vector when the field is
//! absent or `null`, so consumers can index into them without checks
//! regardless of what the model returned.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treats an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    Volume,
    Trend,
    Growth,
    #[default]
    Chart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::Text(String::new())
    }
}

/// KPI card shown at the top of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: MetricValue,
    /// Percentage change against the previous period
    #[serde(default, deserialize_with = "null_as_default")]
    pub trend: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon_type: IconType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Impact {
    #[serde(alias = "high")]
    High,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        };
        write!(f, "{}", s)
    }
}

/// Effort uses the same three-level scale as impact
pub type Effort = Impact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    #[serde(alias = "critical")]
    Critical,
    #[default]
    #[serde(alias = "monitor")]
    Monitor,
    #[serde(alias = "low")]
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact: Impact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationStatus {
    Pending,
    Synced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact: Impact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effort: Effort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecommendationStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Time-series point; `primary` is usually the current period and
/// `secondary` the previous one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartDataPoint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// Category breakdown row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secondary: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contribution: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth: Option<f64>,
}

/// What-if slider definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParam {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub step: f64,
    /// One of `%`, `$` or `x`
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact_factor: f64,
}

impl ScenarioParam {
    /// Bound a user-entered value to the slider range; an inverted range
    /// leaves the value untouched
    pub fn clamp(&self, value: f64) -> f64 {
        if self.max >= self.min {
            value.clamp(self.min, self.max)
        } else {
            value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lower_bound: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upper_bound: f64,
}

/// Radar chart dimension: `a` is the current score, `b` the benchmark
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategicMapPoint {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dim: String,
    #[serde(rename = "A", default, deserialize_with = "null_as_default")]
    pub a: f64,
    #[serde(rename = "B", default, deserialize_with = "null_as_default")]
    pub b: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub full_mark: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorMetric {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_share: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub growth: f64,
    /// 0-100
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentiment: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportVersion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub changes: String,
}

/// Three-persona narrative bundled with the summary
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutiveBrief {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cfo_view: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cro_view: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coo_view: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SourceIntegrity {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_integrity: SourceIntegrity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues_found: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub report_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub audience: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outlook: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executive_brief: Option<ExecutiveBrief>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Vec<Metric>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub insights: Vec<InsightItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risks: Vec<Risk>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<RecommendationItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chart_data: Vec<ChartDataPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub table_data: Vec<TableRow>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scenarios: Vec<ScenarioParam>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub forecast_data: Vec<ForecastPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strategic_map: Vec<StrategicMapPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub competitors: Vec<CompetitorMetric>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: Vec<ReportVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQualityReport>,
}

/// History listing entry; keeps only the metrics for previews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReportMetadata {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub thumbnail_data: Vec<Metric>,
}

impl From<&ReportData> for SavedReportMetadata {
    fn from(report: &ReportData) -> Self {
        Self {
            id: report.id.clone(),
            title: report.title.clone(),
            date: report.date.clone(),
            report_type: report.report_type.clone(),
            thumbnail_data: report.metrics.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisType {
    #[serde(alias = "trends")]
    Trends,
    #[serde(alias = "anomalies")]
    Anomalies,
    #[serde(alias = "forecast")]
    Forecast,
    #[serde(alias = "benchmarks")]
    Benchmarks,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Trends => "Trends",
            AnalysisType::Anomalies => "Anomalies",
            AnalysisType::Forecast => "Forecast",
            AnalysisType::Benchmarks => "Benchmarks",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the user asked for. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub period: String,
    #[serde(rename = "type")]
    pub focus: AnalysisType,
    #[serde(default)]
    pub instructions: String,
}

impl AnalysisContext {
    pub fn new(period: impl Into<String>, focus: AnalysisType) -> Self {
        Self {
            period: period.into(),
            focus,
            instructions: String::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_null_arrays_deserialize_empty() {
        let report: ReportData = serde_json::from_value(json!({
            "title": "Partial",
            "insights": null,
            "chartData": [{ "name": "Jan", "primary": 10 }]
        }))
        .unwrap();

        assert!(report.insights.is_empty());
        assert!(report.risks.is_empty());
        assert!(report.versions.is_empty());
        assert_eq!(report.chart_data[0].secondary, 0.0);
    }

    #[test]
    fn test_scenario_clamp_bounds_to_range() {
        let scenario: ScenarioParam =
            serde_json::from_value(json!({ "id": "price", "min": 0, "max": 20 })).unwrap();
        assert_eq!(scenario.clamp(50.0), 20.0);
        assert_eq!(scenario.clamp(-3.0), 0.0);
        assert_eq!(scenario.clamp(7.5), 7.5);
    }

    #[test]
    fn test_metric_value_accepts_text_and_numbers() {
        let metrics: Vec<Metric> = serde_json::from_value(json!([
            { "label": "Revenue", "value": "97,240", "trend": 12.5, "iconType": "volume" },
            { "label": "Deals", "value": 42, "trend": -1, "iconType": "chart" }
        ]))
        .unwrap();

        assert_eq!(metrics[0].value, MetricValue::Text("97,240".to_string()));
        assert_eq!(metrics[1].value, MetricValue::Number(42.0));
        assert_eq!(metrics[1].value.to_string(), "42");
    }

    #[test]
    fn test_radar_fields_use_single_letter_keys() {
        let point = StrategicMapPoint {
            dim: "Speed".to_string(),
            a: 65.0,
            b: 70.0,
            full_mark: 100.0,
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(value["A"], 65.0);
        assert_eq!(value["fullMark"], 100.0);
    }

    #[test]
    fn test_analysis_context_uses_type_key() {
        let ctx: AnalysisContext =
            serde_json::from_value(json!({ "period": "Q3 2024", "type": "forecast" })).unwrap();
        assert_eq!(ctx.focus, AnalysisType::Forecast);
        assert!(ctx.instructions.is_empty());
    }
}
