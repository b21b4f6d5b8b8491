//! Report Export
//!
//! Renders a finished report as spreadsheet CSV, BI-tool CSV, pretty JSON or
//! a plain-text slide deck.

use crate::models::ReportData;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label written into the `Source` column of BI exports
pub const BI_SOURCE_LABEL: &str = "ReportForge_AI";
pub const SLIDE_DELIMITER: &str = "\n\n---------------------------------\n\n";
const SLIDE_RULE: &str = "=================================";

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet CSV of the category table
    Excel,
    Tableau,
    #[value(name = "powerbi")]
    PowerBi,
    /// Plain-text slide deck
    Slides,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "Excel",
            ExportFormat::Tableau => "Tableau",
            ExportFormat::PowerBi => "PowerBI",
            ExportFormat::Slides => "PPT",
            ExportFormat::Json => "JSON",
        }
    }

    pub fn is_bi(&self) -> bool {
        matches!(self, ExportFormat::Tableau | ExportFormat::PowerBi)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quote a CSV field when it contains a comma, quote or newline
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| escape_csv(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn to_csv(report: &ReportData) -> String {
    let mut lines = vec![csv_line([
        "Category",
        "Primary_Metric",
        "Secondary_Metric",
        "Contribution_Pct",
    ])];
    lines.extend(report.table_data.iter().map(|row| {
        csv_line([
            row.category.clone(),
            row.primary.to_string(),
            row.secondary.to_string(),
            row.contribution.to_string(),
        ])
    }));
    lines.join("\n")
}

pub fn to_bi_csv(report: &ReportData) -> String {
    let mut lines = vec![csv_line([
        "Region/Segment",
        "Current_Period_Value",
        "Previous_Period_Value",
        "Growth_Contribution",
        "Report_Date",
        "Source",
    ])];
    lines.extend(report.table_data.iter().map(|row| {
        csv_line([
            row.category.clone(),
            row.primary.to_string(),
            row.secondary.to_string(),
            row.contribution.to_string(),
            report.date.clone(),
            BI_SOURCE_LABEL.to_string(),
        ])
    }));
    lines.join("\n")
}

pub fn to_json(report: &ReportData) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

fn slide(number: usize, title: &str, body: &str) -> String {
    format!("SLIDE {}: {}\n{}\n{}\n", number, title, SLIDE_RULE, body)
}

fn bullets<I: IntoIterator<Item = String>>(items: I) -> String {
    items
        .into_iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_slides(report: &ReportData) -> String {
    let metrics = bullets(report.metrics.iter().map(|m| {
        let sign = if m.trend > 0.0 { "+" } else { "" };
        format!("{}: {} ({}{}%)", m.label, m.value, sign, m.trend)
    }));
    let insights = bullets(report.insights.iter().map(|i| i.text.clone()));
    let recommendations = bullets(
        report
            .recommendations
            .iter()
            .map(|r| format!("{}: {}", r.title, r.description)),
    );

    [
        slide(
            1,
            "Title",
            &format!("{}\n{}\n{}", report.title, report.audience, report.date),
        ),
        slide(2, "Executive Summary", &report.summary),
        slide(3, "Key Metrics", &metrics),
        slide(4, "Top Insights", &insights),
        slide(5, "Strategic Recommendations", &recommendations),
    ]
    .join(SLIDE_DELIMITER)
}

pub fn export(report: &ReportData, format: ExportFormat) -> serde_json::Result<String> {
    Ok(match format {
        ExportFormat::Excel => to_csv(report),
        ExportFormat::Tableau | ExportFormat::PowerBi => to_bi_csv(report),
        ExportFormat::Slides => to_slides(report),
        ExportFormat::Json => to_json(report)?,
    })
}

pub fn export_file_name(report: &ReportData, format: ExportFormat) -> String {
    let stem = WHITESPACE.replace_all(&report.title, "_");
    match format {
        ExportFormat::Excel => format!("{}_{}.csv", stem, format),
        ExportFormat::Tableau | ExportFormat::PowerBi => format!("{}_{}.txt", stem, format),
        ExportFormat::Slides => format!("{}_presentation.txt", stem),
        ExportFormat::Json => format!("{}_full.json", report.id),
    }
}
