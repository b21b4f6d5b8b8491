//! Visualization Agent
//!
//! Derives the chart totals and table growth figures the renderers display,
//! so consumers never recompute them.

use crate::models::{ChartDataPoint, ReportData, TableRow};
use tokio::time::Instant;

pub struct VisualizationAgent;

impl VisualizationAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn process_visualizations(&self, mut data: ReportData) -> ReportData {
        let start = Instant::now();
        tracing::info!("[VisualizationAgent] [START] Processing visualizations");

        data.chart_data.iter_mut().for_each(enrich_point);
        data.table_data.iter_mut().for_each(enrich_row);

        tracing::info!(
            "[VisualizationAgent] [COMPLETED] Visualizations processed in {:.2}ms (chart points: {}, table rows: {})",
            start.elapsed().as_secs_f64() * 1000.0,
            data.chart_data.len(),
            data.table_data.len()
        );
        data
    }
}

impl Default for VisualizationAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn enrich_point(point: &mut ChartDataPoint) {
    point.total = Some(point.primary + point.secondary);
}

/// Period-over-period growth in percent; a zero or negative baseline yields 0
pub fn growth_percent(primary: f64, secondary: f64) -> f64 {
    if secondary > 0.0 {
        (primary - secondary) / secondary * 100.0
    } else {
        0.0
    }
}

fn enrich_row(row: &mut TableRow) {
    row.growth = Some(growth_percent(row.primary, row.secondary));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(primary: f64, secondary: f64) -> TableRow {
        TableRow {
            category: "North".to_string(),
            primary,
            secondary,
            contribution: 10.0,
            growth: None,
        }
    }

    #[test]
    fn test_chart_totals() {
        let data = ReportData {
            chart_data: vec![
                ChartDataPoint {
                    name: "Jan".to_string(),
                    primary: 4000.0,
                    secondary: 2400.0,
                    ..ChartDataPoint::default()
                },
                ChartDataPoint {
                    name: "Feb".to_string(),
                    primary: 3000.0,
                    ..ChartDataPoint::default()
                },
            ],
            ..ReportData::default()
        };

        let processed = VisualizationAgent::new().process_visualizations(data);
        assert_eq!(processed.chart_data[0].total, Some(6400.0));
        assert_eq!(processed.chart_data[1].total, Some(3000.0));
    }

    #[test]
    fn test_table_growth_guards_zero_baseline() {
        let data = ReportData {
            table_data: vec![row(150.0, 100.0), row(500.0, 0.0), row(80.0, 100.0)],
            ..ReportData::default()
        };

        let processed = VisualizationAgent::new().process_visualizations(data);
        assert_eq!(processed.table_data[0].growth, Some(50.0));
        assert_eq!(processed.table_data[1].growth, Some(0.0));
        assert_eq!(processed.table_data[2].growth, Some(-20.0));
    }

    #[test]
    fn test_other_fields_pass_through() {
        let data = ReportData {
            title: "Q3 2024 Review".to_string(),
            summary: "Steady quarter".to_string(),
            ..ReportData::default()
        };

        let processed = VisualizationAgent::new().process_visualizations(data.clone());
        assert_eq!(processed, data);
    }
}
