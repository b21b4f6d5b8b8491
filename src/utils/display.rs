use crate::models::{Impact, Metric, ReportData};
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_warning(text: &str) {
    eprintln!("{}", text.yellow());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
}

pub fn print_stage(label: &str, elapsed_ms: u64) {
    println!("  {} {} {}", "▸".bright_magenta(), label, format!("({}ms)", elapsed_ms).dimmed());
}

fn trend(metric: &Metric) -> ColoredString {
    let text = format!("{}{}%", if metric.trend > 0.0 { "+" } else { "" }, metric.trend);
    if metric.trend >= 0.0 {
        text.green()
    } else {
        text.red()
    }
}

fn impact(level: Impact) -> ColoredString {
    match level {
        Impact::High => level.to_string().red().bold(),
        Impact::Medium => level.to_string().yellow(),
        Impact::Low => level.to_string().green(),
    }
}

/// Terminal rendering of a finished report
pub fn print_report(report: &ReportData) {
    print_header(&report.title);
    println!(
        "{}  {}  {}",
        report.id.dimmed(),
        report.date,
        report.audience.italic()
    );

    if !report.metrics.is_empty() {
        println!("\n{}", "Key Metrics".bold());
        for metric in &report.metrics {
            println!("  {:<28} {:>12}  {}", metric.label, metric.value.to_string(), trend(metric));
        }
    }

    if !report.summary.is_empty() {
        println!("\n{}", "Executive Summary".bold());
        println!("{}", report.summary);
    }

    if !report.insights.is_empty() {
        println!("\n{}", "Insights".bold());
        for insight in &report.insights {
            match &insight.source {
                Some(source) => println!("  • {} {}", insight.text, format!("[{}]", source).dimmed()),
                None => println!("  • {}", insight.text),
            }
        }
    }

    if !report.risks.is_empty() {
        println!("\n{}", "Risks".bold());
        for risk in &report.risks {
            println!("  • [{}] {}", impact(risk.impact), risk.description);
        }
    }

    if !report.recommendations.is_empty() {
        println!("\n{}", "Recommendations".bold());
        for rec in &report.recommendations {
            println!(
                "  • {} (impact {}, effort {})",
                rec.title.bold(),
                impact(rec.impact),
                rec.effort
            );
            println!("    {}", rec.description);
        }
    }

    if !report.table_data.is_empty() {
        println!("\n{}", "Breakdown".bold());
        for row in &report.table_data {
            let growth = row.growth.map(|g| format!("{:+.1}%", g)).unwrap_or_default();
            println!(
                "  {:<24} {:>12} {:>12} {:>9}",
                row.category, row.primary, row.secondary, growth
            );
        }
    }

    if !report.outlook.is_empty() {
        println!("\n{}", "Outlook".bold());
        println!("{}", report.outlook);
    }
    println!();
}
