use crate::models::{AnalysisType, HttpMethod};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::export::ExportFormat;

#[derive(Parser)]
#[command(name = "reportforge")]
#[command(author, version, about = "AI-generated business reports from demo, file, API or database sources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the report pipeline against a data source
    Generate {
        /// Reporting period, e.g. "Q3 2024"
        #[arg(short, long, default_value = "Q3 2024")]
        period: String,

        #[arg(short, long, value_enum, default_value = "trends")]
        focus: FocusArg,

        /// Free-text guidance passed to the analysis
        #[arg(short, long)]
        instructions: Option<String>,

        #[command(flatten)]
        source: SourceArgs,

        /// Template id (default: sys_standard)
        #[arg(long)]
        template: Option<String>,

        /// Save to history even when auto-save is off
        #[arg(long)]
        save: bool,
    },

    /// List saved reports
    History {
        /// Show recent activity instead of the report list
        #[arg(short, long)]
        activity: bool,
    },

    /// Print a saved report
    Show { id: String },

    /// Remove a saved report
    Delete { id: String },

    /// Export a saved report
    Export {
        id: String,

        #[arg(short, long, value_enum, default_value = "excel")]
        format: ExportFormat,

        /// Output path (default: generated file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the what-if simulator over a saved report's chart data
    Simulate {
        id: String,

        /// Slider assignment, e.g. --set price_increase=5
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(String, f64)>,
    },

    /// Ask the data assistant about a saved report (interactive without a message)
    Chat {
        id: String,

        message: Option<String>,

        /// Second report id for a side-by-side comparison
        #[arg(short, long)]
        compare: Option<String>,
    },

    /// Score the completeness of a local data file
    Profile { file: PathBuf },

    /// List available report templates
    Templates,

    /// List recently used connections
    Connections {
        /// Only show one source type (api, sql, mongodb)
        #[arg(short = 't', long = "type")]
        source_type: Option<String>,
    },

    /// Show or change persisted user settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    Show,

    /// Store the Gemini API key
    SetKey { key: String },

    ClearKey,

    SetAutosave {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// demo, file, api, sql or mongodb
    SetDefaultSource { source: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FocusArg {
    Trends,
    Anomalies,
    Forecast,
    Benchmarks,
}

impl From<FocusArg> for AnalysisType {
    fn from(arg: FocusArg) -> Self {
        match arg {
            FocusArg::Trends => AnalysisType::Trends,
            FocusArg::Anomalies => AnalysisType::Anomalies,
            FocusArg::Forecast => AnalysisType::Forecast,
            FocusArg::Benchmarks => AnalysisType::Benchmarks,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Get,
    Post,
}

impl From<MethodArg> for HttpMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Get => HttpMethod::Get,
            MethodArg::Post => HttpMethod::Post,
        }
    }
}

/// Exactly one source selector may be given; none means the saved default
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Built-in demo scenario
    #[arg(long, group = "source")]
    pub demo: Option<String>,

    /// CSV, JSON or Excel upload
    #[arg(long, group = "source")]
    pub file: Option<PathBuf>,

    #[arg(long, group = "source")]
    pub api_url: Option<String>,

    #[arg(long, value_enum, default_value = "get")]
    pub api_method: MethodArg,

    /// Request headers as a JSON object
    #[arg(long)]
    pub api_headers: Option<String>,

    #[arg(long, group = "source")]
    pub sql: bool,

    #[arg(long, group = "source")]
    pub mongodb: bool,

    /// Reuse a recent connection by id
    #[arg(long, group = "source")]
    pub connection: Option<String>,

    #[arg(long)]
    pub query: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub db_name: Option<String>,

    #[arg(long)]
    pub collection: Option<String>,

    /// Connect through a proxy connection string instead of host fields
    #[arg(long)]
    pub connection_string: Option<String>,
}

fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <scenario>=<value>, got '{}'", raw))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {}: {}", id, e))?;
    Ok((id.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("price_increase=5").unwrap(),
            ("price_increase".to_string(), 5.0)
        );
        assert!(parse_assignment("price").is_err());
        assert!(parse_assignment("price=abc").is_err());
    }

    #[test]
    fn test_generate_parses_sources() {
        let cli = Cli::try_parse_from([
            "reportforge",
            "generate",
            "--period",
            "FY 2024",
            "--sql",
            "--query",
            "SELECT * FROM sales",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate { period, source, .. } => {
                assert_eq!(period, "FY 2024");
                assert!(source.sql);
                assert_eq!(source.query.as_deref(), Some("SELECT * FROM sales"));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_only_one_source_selector() {
        let result = Cli::try_parse_from([
            "reportforge",
            "generate",
            "--demo",
            "sales",
            "--api-url",
            "https://api.example.com",
        ]);
        assert!(result.is_err());
    }
}
