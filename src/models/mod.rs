//! Domain types shared by the pipeline, storage and export layers

pub mod report;
pub mod settings;
pub mod source;
pub mod template;

pub use report::{
    AnalysisContext, AnalysisType, ChartDataPoint, CompetitorMetric, DataQualityReport, Effort,
    ExecutiveBrief, ForecastPoint, IconType, Impact, InsightItem, Metric, MetricValue, Priority,
    RecommendationItem, RecommendationStatus, ReportData, ReportVersion, Risk,
    SavedReportMetadata, ScenarioParam, SourceIntegrity, StrategicMapPoint, TableRow,
};
pub use settings::{
    ActivityItem, ActivityType, Branding, ConnectionHistoryItem, NotificationSettings, Theme,
    UserSettings,
};
pub use source::{ApiConfig, DataSourceConfig, DbConfig, HttpMethod, SourceType};
pub use template::{
    ChartType, ReportSection, ReportTemplate, SectionId, SectionWidth, TemplateCategory,
    TemplateTheme,
};
