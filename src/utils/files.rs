//! Upload Handling
//!
//! Information Hiding:
//! - Size and extension limits for uploads live here
//! - CSV files are normalised to JSON before they reach the pipeline
//! - Raw bytes are decoded lossily so spreadsheets never abort an upload

use crate::core::error::{ReportError, Result};
use crate::models::DataSourceConfig;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::path::Path;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "json", "xlsx"];
const CSV_PREVIEW_ROWS: usize = 100;
const PROFILE_PREVIEW_ROWS: usize = 5;
const WIDE_TABLE_COLUMNS: usize = 15;

/// Boundary check run before a file is read
pub fn validate_upload(name: &str, size: u64) -> Result<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ReportError::InvalidInput(
            "File size exceeds 10MB limit.".to_string(),
        ));
    }

    let extension = extension_of(name);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ReportError::InvalidInput(
            "Invalid file type. Please upload CSV, JSON, or Excel.".to_string(),
        ));
    }
    Ok(())
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Read an upload from disk into a file source
pub async fn load_upload(path: &Path) -> Result<DataSourceConfig> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let size = tokio::fs::metadata(path).await?.len();
    validate_upload(&name, size)?;

    let bytes = tokio::fs::read(path).await?;
    let mut content = String::from_utf8_lossy(&bytes).into_owned();

    if extension_of(&name) == "csv" {
        match render_csv_preview(&content) {
            Some(rendered) => content = rendered,
            None => tracing::warn!("[Upload] CSV parse failed for {}, using raw text", name),
        }
    }

    tracing::info!(
        "[Upload] Loaded {} ({})",
        name,
        format_file_size(size)
    );
    Ok(DataSourceConfig::File {
        name,
        content,
        size,
    })
}

/// Pretty JSON of the first rows, with a note on how many were left out
fn render_csv_preview(text: &str) -> Option<String> {
    let rows = parse_csv(text);
    if rows.is_empty() {
        return None;
    }

    let shown: Vec<&Value> = rows.iter().take(CSV_PREVIEW_ROWS).collect();
    let mut rendered = serde_json::to_string_pretty(&shown).ok()?;
    if rows.len() > CSV_PREVIEW_ROWS {
        rendered.push_str(&format!(
            "\n...and {} more rows.",
            rows.len() - CSV_PREVIEW_ROWS
        ));
    }
    Some(rendered)
}

/// Parse CSV text into one JSON object per data row, keyed by the header row.
///
/// Blank lines are skipped, missing cells become empty strings and numeric
/// cells become JSON numbers.
pub fn parse_csv(text: &str) -> Vec<Value> {
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .split(',')
        .map(|h| strip_quotes(h.trim()).to_string())
        .collect();

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let cells = split_csv_line(line);
            let mut row = Map::new();
            for (i, header) in headers.iter().enumerate() {
                let raw = cells
                    .get(i)
                    .map(|c| strip_quotes(c.trim()))
                    .unwrap_or("");
                row.insert(header.clone(), coerce_cell(raw));
            }
            Value::Object(row)
        })
        .collect()
}

/// Split on commas that are not inside double quotes
fn split_csv_line(line: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    cells.push(&line[start..]);
    cells
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

fn coerce_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => {
            if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                Value::Number(Number::from(n as i64))
            } else {
                Number::from_f64(n)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(raw.to_string()))
            }
        }
        _ => Value::String(raw.to_string()),
    }
}

/// Human-readable size using 1024-based units
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

/// Structural summary of an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProfile {
    pub score: u32,
    pub row_count: usize,
    pub column_count: usize,
    /// Percentage of non-empty cells
    pub completeness: u32,
    pub issues: Vec<String>,
    pub preview: Vec<Vec<String>>,
}

pub fn profile_data(content: &str) -> DataProfile {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let column_count = lines.first().map(|l| split_csv_line(l).len()).unwrap_or(0);

    let mut total_cells = 0usize;
    let mut empty_cells = 0usize;
    for line in lines.iter().skip(1) {
        let cells = split_csv_line(line);
        for i in 0..column_count {
            total_cells += 1;
            if cells.get(i).map(|c| strip_quotes(c.trim()).is_empty()).unwrap_or(true) {
                empty_cells += 1;
            }
        }
    }
    let completeness = if total_cells == 0 {
        100
    } else {
        (100.0 * (total_cells - empty_cells) as f64 / total_cells as f64).floor() as u32
    };

    let mut seen = HashSet::new();
    let duplicates = lines
        .iter()
        .skip(1)
        .filter(|l| !seen.insert(l.trim().to_string()))
        .count();

    let mut issues = Vec::new();
    if duplicates > 0 {
        issues.push(format!("Found {} potential duplicate records", duplicates));
    }
    if completeness < 100 {
        issues.push(format!(
            "{}% of cells contain null values",
            100 - completeness
        ));
    }
    if column_count > WIDE_TABLE_COLUMNS {
        issues.push("High dimensionality detected (15+ columns)".to_string());
    }

    let data_rows = lines.len().saturating_sub(1).max(1);
    let duplicate_penalty = (duplicates * 100 / data_rows) as u32;
    let score = completeness.saturating_sub(duplicate_penalty);

    let preview = lines
        .iter()
        .take(PROFILE_PREVIEW_ROWS)
        .map(|l| split_csv_line(l).into_iter().map(str::to_string).collect())
        .collect();

    DataProfile {
        score,
        row_count: lines.len(),
        column_count,
        completeness,
        issues,
        preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_csv_handles_quotes_and_numbers() {
        let rows = parse_csv("Region,Revenue,Note\nNorth,1200,\"big, growing\"\n\nSouth,87.5\n");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({"Region": "North", "Revenue": 1200, "Note": "big, growing"}));
        assert_eq!(rows[1]["Revenue"], json!(87.5));
        assert_eq!(rows[1]["Note"], json!(""));
    }

    #[test]
    fn test_parse_csv_keeps_header_order() {
        let rows = parse_csv("zeta,alpha\n1,2\n");
        let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(10 * 1024 * 1024), "10 MB");
    }

    #[test]
    fn test_validate_upload_limits() {
        assert!(validate_upload("sales.CSV", 1024).is_ok());
        assert!(validate_upload("book.xlsx", MAX_UPLOAD_BYTES).is_ok());
        assert!(matches!(
            validate_upload("sales.csv", MAX_UPLOAD_BYTES + 1),
            Err(ReportError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_upload("notes.txt", 10),
            Err(ReportError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_load_upload_renders_csv_as_json_preview() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("orders.csv");
        let mut csv = String::from("id,amount\n");
        for i in 0..105 {
            csv.push_str(&format!("{},{}\n", i, i * 10));
        }
        tokio::fs::write(&path, &csv).await.unwrap();

        let source = load_upload(&path).await.unwrap();
        match source {
            DataSourceConfig::File { name, content, size } => {
                assert_eq!(name, "orders.csv");
                assert_eq!(size, csv.len() as u64);
                assert!(content.starts_with('['));
                assert!(content.ends_with("\n...and 5 more rows."));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_profile_data_counts_gaps_and_duplicates() {
        let profile = profile_data("a,b\n1,2\n1,2\n3,\n");

        assert_eq!(profile.row_count, 4);
        assert_eq!(profile.column_count, 2);
        assert_eq!(profile.completeness, 83);
        assert_eq!(profile.issues.len(), 2);
        assert_eq!(profile.preview[0], vec!["a", "b"]);
        assert!(profile.score < profile.completeness);
    }
}
