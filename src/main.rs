use anyhow::{bail, Context, Result};
use clap::Parser;
use reportforge::agents::{ChatMessage, PipelineControl};
use reportforge::cli::{Cli, Commands, SettingsAction, SourceArgs};
use reportforge::models::{AnalysisContext, ApiConfig, DataSourceConfig, DbConfig, SourceType};
use reportforge::utils::files::{load_upload, profile_data};
use reportforge::{utils, ReportError, ReportForge, Settings};
use std::path::PathBuf;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let forge = ReportForge::open(settings).await?;

    let result = match cli.command {
        Commands::Generate {
            period,
            focus,
            instructions,
            source,
            template,
            save,
        } => {
            let context = AnalysisContext::new(period, focus.into())
                .with_instructions(instructions.unwrap_or_default());
            handle_generate(&forge, context, source, template, save).await
        }
        Commands::History { activity } => handle_history(&forge, activity).await,
        Commands::Show { id } => handle_show(&forge, &id).await,
        Commands::Delete { id } => handle_delete(&forge, &id).await,
        Commands::Export { id, format, output } => {
            handle_export(&forge, &id, format, output).await
        }
        Commands::Simulate { id, assignments } => handle_simulate(&forge, &id, assignments).await,
        Commands::Chat {
            id,
            message,
            compare,
        } => handle_chat(&forge, &id, message, compare).await,
        Commands::Profile { file } => handle_profile(file).await,
        Commands::Templates => handle_templates(&forge).await,
        Commands::Connections { source_type } => handle_connections(&forge, source_type).await,
        Commands::Settings { action } => handle_settings(&forge, action).await,
    };

    if let Err(e) = &result {
        if matches!(e.downcast_ref::<ReportError>(), Some(ReportError::CredentialMissing)) {
            utils::print_warning(
                "Hint: run `reportforge settings set-key <KEY>` or set GEMINI_API_KEY, or use --demo.",
            );
        }
    }
    result
}

async fn resolve_source(forge: &ReportForge, args: SourceArgs) -> Result<DataSourceConfig> {
    if let Some(id) = args.connection {
        return forge.connections().restore(&id).await;
    }
    if let Some(demo_id) = args.demo {
        return Ok(DataSourceConfig::demo(demo_id));
    }
    if let Some(path) = args.file {
        return Ok(load_upload(&path).await?);
    }
    if let Some(url) = args.api_url {
        let config = DataSourceConfig::Api(ApiConfig {
            url,
            method: args.api_method.into(),
            headers: args.api_headers,
        });
        config.validate()?;
        return Ok(config);
    }
    if args.sql || args.mongodb {
        let db = DbConfig {
            use_proxy: args.connection_string.is_some(),
            connection_string: args.connection_string,
            host: args.host,
            port: args.port,
            user: args.user,
            password: args.password,
            query: args.query.unwrap_or_default(),
            db_name: args.db_name,
            collection: args.collection,
        };
        let config = if args.sql {
            DataSourceConfig::Sql(db)
        } else {
            DataSourceConfig::MongoDb(db)
        };
        config.validate()?;
        return Ok(config);
    }

    let default = forge.user_settings().load().await?.default_data_source;
    match default {
        SourceType::Demo => Ok(DataSourceConfig::Demo { demo_id: None }),
        other => bail!(
            "No data source given and the default source ({}) needs connection details",
            other
        ),
    }
}

async fn handle_generate(
    forge: &ReportForge,
    context: AnalysisContext,
    source: SourceArgs,
    template: Option<String>,
    save: bool,
) -> Result<()> {
    let source = resolve_source(forge, source).await?;
    utils::print_header(&format!("Generating {} report", context.period));
    utils::print_info(&format!(
        "Source: {} | Focus: {}",
        source.source_type(),
        context.focus
    ));
    if !forge.has_credential() && source.is_demo() {
        utils::print_warning("No API key configured, using the demo dataset.");
    }

    let (control, cancel) = PipelineControl::new();
    let (control, mut events) = control.with_progress(16);

    let run = async move {
        let generation = forge.generate_with(&context, &source, template.as_deref(), &control);
        tokio::pin!(generation);
        loop {
            tokio::select! {
                result = &mut generation => break result,
                _ = tokio::signal::ctrl_c() => {
                    utils::print_warning("Cancelling...");
                    cancel.cancel();
                }
            }
        }
    };
    let progress = async {
        while let Some(event) = events.recv().await {
            utils::print_stage(event.stage.label(), event.elapsed_ms);
        }
    };

    let (report, _) = tokio::join!(run, progress);
    let report = report?;

    if save && !forge.user_settings().load().await?.auto_save {
        forge.history().save_report(&report).await?;
    }

    utils::print_report(&report);
    utils::print_success(&format!("Report {} ready", report.id));
    Ok(())
}

async fn handle_history(forge: &ReportForge, activity: bool) -> Result<()> {
    if activity {
        utils::print_header("Recent Activity");
        for item in forge.history().recent_activity().await? {
            println!(
                "  {}  {}",
                item.timestamp.format("%Y-%m-%d"),
                item.description
            );
        }
        return Ok(());
    }

    let reports = forge.history().list().await?;
    utils::print_header("Saved Reports");
    if reports.is_empty() {
        utils::print_info("No saved reports yet.");
    }
    for report in reports {
        println!(
            "  {:<32} {:<12} {:<16} {}",
            report.id, report.date, report.report_type, report.title
        );
    }
    Ok(())
}

async fn handle_show(forge: &ReportForge, id: &str) -> Result<()> {
    let report = forge.report(id).await?;
    utils::print_report(&report);
    Ok(())
}

async fn handle_delete(forge: &ReportForge, id: &str) -> Result<()> {
    if forge.history().delete(id).await? {
        utils::print_success(&format!("Deleted {}", id));
    } else {
        utils::print_error(&format!("No saved report with id {}", id));
    }
    Ok(())
}

async fn handle_export(
    forge: &ReportForge,
    id: &str,
    format: reportforge::export::ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let exported = forge.export(id, format).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(&exported.file_name));
    tokio::fs::write(&path, exported.content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    utils::print_success(&format!("{} export written to {}", format, path.display()));
    Ok(())
}

async fn handle_simulate(
    forge: &ReportForge,
    id: &str,
    assignments: Vec<(String, f64)>,
) -> Result<()> {
    let (report, mut simulator) = forge.simulator(id).await?;
    for (id, value) in &assignments {
        let Some(scenario) = simulator.scenarios().iter().find(|s| &s.id == id) else {
            bail!("Unknown scenario '{}'", id);
        };
        let bounded = scenario.clamp(*value);
        if bounded != *value {
            utils::print_warning(&format!(
                "{} limited to {}{}",
                scenario.label, bounded, scenario.unit
            ));
        }
        simulator.set_value(id, bounded);
    }

    utils::print_header("What-If Analysis & Simulation");
    for scenario in simulator.scenarios() {
        println!(
            "  {:<24} {}{}",
            scenario.label,
            simulator.value(&scenario.id).unwrap_or_default(),
            scenario.unit
        );
    }

    let projection = simulator.project(&report.chart_data);
    println!();
    for point in &projection.points {
        println!(
            "  {:<12} {:>12} {:>12} {:>+10}",
            point.name, point.actual, point.projected, point.delta
        );
    }
    println!();
    utils::print_info(&format!(
        "Projected growth: {}{}% | Revenue impact: {}{}",
        if projection.summary.growth > 0.0 { "+" } else { "" },
        projection.summary.growth,
        if projection.summary.revenue > 0.0 { "+" } else { "" },
        projection.summary.revenue
    ));
    Ok(())
}

async fn handle_chat(
    forge: &ReportForge,
    id: &str,
    message: Option<String>,
    compare: Option<String>,
) -> Result<()> {
    if let Some(message) = message {
        let reply = forge.chat(&message, Some(id), compare.as_deref(), &[]).await?;
        print_reply(&reply);
        return Ok(());
    }

    utils::print_header("Data Assistant");
    utils::print_info("Type your questions (empty line or Ctrl+D to exit)\n");

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut reader = BufReader::new(io::stdin());

    loop {
        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            break;
        }

        let reply = forge.chat(input, Some(id), compare.as_deref(), &history).await?;
        print_reply(&reply);

        history.push(ChatMessage::user(input));
        history.push(ChatMessage::assistant(reply.text));
    }
    Ok(())
}

fn print_reply(reply: &reportforge::agents::ChatReply) {
    utils::print_info("Assistant: ");
    println!("{}\n", reply.text);
    for source in &reply.sources {
        println!("  [{}] {}", source.title, source.uri);
    }
}

async fn handle_profile(file: PathBuf) -> Result<()> {
    let source = load_upload(&file).await?;
    let DataSourceConfig::File { name, content, size } = source else {
        bail!("{} is not a file upload", file.display());
    };

    let profile = profile_data(&content);
    utils::print_header(&format!("Data Quality: {}", name));
    utils::print_info(&format!(
        "{} | {} rows x {} columns",
        utils::files::format_file_size(size),
        profile.row_count,
        profile.column_count
    ));
    println!("  Score:        {}", profile.score);
    println!("  Completeness: {}%", profile.completeness);
    if profile.issues.is_empty() {
        utils::print_success("No issues found");
    }
    for issue in &profile.issues {
        utils::print_warning(&format!("  - {}", issue));
    }
    Ok(())
}

async fn handle_templates(forge: &ReportForge) -> Result<()> {
    utils::print_header("Templates");
    let templates = forge
        .templates()
        .templates(Some(reportforge::api::LOCAL_USER_ID))
        .await?;
    for template in templates {
        let owner = if template.is_system() { "system" } else { "custom" };
        println!(
            "  {:<16} {:<32} {} ({} sections)",
            template.id,
            template.name,
            owner,
            template.visible_sections().count()
        );
    }
    Ok(())
}

async fn handle_connections(forge: &ReportForge, source_type: Option<String>) -> Result<()> {
    let connections = match source_type {
        Some(tag) => {
            let Some(source_type) = SourceType::parse(&tag) else {
                bail!("Unknown source type: {}", tag);
            };
            forge.connections().recent_of(source_type).await?
        }
        None => forge.connections().recent().await?,
    };

    utils::print_header("Recent Connections");
    if connections.is_empty() {
        utils::print_info("No saved connections.");
    }
    for item in connections {
        println!(
            "  {:<20} {:<8} {:<40} {}",
            item.id,
            item.source_type,
            item.name,
            item.last_used.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn handle_settings(forge: &ReportForge, action: SettingsAction) -> Result<()> {
    let store = forge.user_settings();
    match action {
        SettingsAction::Show => {
            let settings = store.load().await?;
            utils::print_header("Settings");
            println!("  Theme:          {:?}", settings.theme);
            println!("  Language:       {}", settings.language);
            println!("  Auto-save:      {}", settings.auto_save);
            println!("  Default source: {}", settings.default_data_source);
            println!(
                "  API key:        {}",
                if settings.api_key().is_some() { "configured" } else { "not set" }
            );
        }
        SettingsAction::SetKey { key } => {
            store.update(|s| s.api_key = Some(key.trim().to_string())).await?;
            utils::print_success("API key saved");
        }
        SettingsAction::ClearKey => {
            store.update(|s| s.api_key = None).await?;
            utils::print_success("API key removed");
        }
        SettingsAction::SetAutosave { enabled } => {
            store.update(|s| s.auto_save = enabled).await?;
            utils::print_success(&format!("Auto-save {}", if enabled { "on" } else { "off" }));
        }
        SettingsAction::SetDefaultSource { source } => {
            let Some(source_type) = SourceType::parse(&source) else {
                bail!("Unknown source type: {}", source);
            };
            store.update(|s| s.default_data_source = source_type).await?;
            utils::print_success(&format!("Default source set to {}", source_type));
        }
    }
    Ok(())
}
