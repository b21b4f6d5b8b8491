use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Header,
    Metrics,
    Summary,
    Charts,
    Predictive,
    Competitors,
    Outlook,
    Table,
    Insights,
    Risks,
    Recommendations,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Forecast,
    Radar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionWidth {
    Full,
    Half,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    pub id: SectionId,
    pub label: String,
    pub is_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<SectionWidth>,
}

impl ReportSection {
    pub fn new(id: SectionId, label: impl Into<String>, is_visible: bool) -> Self {
        Self {
            id,
            label: label.into(),
            is_visible,
            chart_type: None,
            width: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateCategory {
    General,
    Sales,
    HR,
    Marketing,
    Financial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTheme {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub font: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    /// `None` for built-in system templates
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TemplateCategory>,
    pub sections: Vec<ReportSection>,
    pub theme: TemplateTheme,
}

impl ReportTemplate {
    pub fn is_system(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn visible_sections(&self) -> impl Iterator<Item = &ReportSection> {
        self.sections.iter().filter(|s| s.is_visible)
    }
}
