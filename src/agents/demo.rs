//! Demo Fallback
//!
//! Information Hiding:
//! - Canned sales review used when no inference credential is configured
//! - Randomness comes from a `RandomSource` so perturbed reports are
//!   reproducible under a seed

use crate::models::{
    AnalysisContext, ChartDataPoint, CompetitorMetric, DataQualityReport, ExecutiveBrief,
    ForecastPoint, IconType, Impact, InsightItem, Metric, MetricValue, Priority,
    RecommendationItem, ReportData, ReportVersion, Risk, ScenarioParam, SourceIntegrity,
    StrategicMapPoint, TableRow,
};
use chrono::{DateTime, Duration, Local, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform samples in `[0, 1)`
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    fn between(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }
}

/// Draws from the thread-local generator
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

pub fn demo_sales_report() -> ReportData {
    demo_sales_report_at(Utc::now())
}

fn metric(label: &str, value: &str, trend: f64, icon_type: IconType) -> Metric {
    Metric {
        label: label.to_string(),
        value: MetricValue::Text(value.to_string()),
        trend,
        icon_type,
    }
}

fn insight(text: &str, source: &str) -> InsightItem {
    InsightItem {
        text: text.to_string(),
        source: Some(source.to_string()),
    }
}

fn risk(id: &str, description: &str, impact: Impact, priority: Priority) -> Risk {
    Risk {
        id: id.to_string(),
        description: description.to_string(),
        impact,
        priority,
    }
}

fn recommendation(title: &str, description: &str, impact: Impact, effort: Impact) -> RecommendationItem {
    RecommendationItem {
        title: title.to_string(),
        description: description.to_string(),
        impact,
        effort,
        status: None,
    }
}

fn point(name: &str, primary: f64, secondary: f64, amt: f64) -> ChartDataPoint {
    ChartDataPoint {
        name: name.to_string(),
        primary,
        secondary,
        amt,
        total: None,
    }
}

fn row(category: &str, primary: f64, secondary: f64, contribution: f64) -> TableRow {
    TableRow {
        category: category.to_string(),
        primary,
        secondary,
        contribution,
        growth: None,
    }
}

fn scenario(id: &str, label: &str, max: f64, step: f64, unit: &str, impact_factor: f64) -> ScenarioParam {
    ScenarioParam {
        id: id.to_string(),
        label: label.to_string(),
        min: 0.0,
        max,
        default_value: 0.0,
        step,
        unit: unit.to_string(),
        impact_factor,
    }
}

fn forecast(name: &str, value: f64, lower_bound: f64, upper_bound: f64) -> ForecastPoint {
    ForecastPoint {
        name: name.to_string(),
        value,
        lower_bound,
        upper_bound,
    }
}

fn dimension(dim: &str, a: f64, b: f64) -> StrategicMapPoint {
    StrategicMapPoint {
        dim: dim.to_string(),
        a,
        b,
        full_mark: 100.0,
    }
}

fn competitor(name: &str, market_share: f64, growth: f64, sentiment: f64) -> CompetitorMetric {
    CompetitorMetric {
        name: name.to_string(),
        market_share,
        growth,
        sentiment,
    }
}

fn version(now: DateTime<Utc>, id: &str, days_ago: i64, author: &str, changes: &str) -> ReportVersion {
    ReportVersion {
        id: id.to_string(),
        date: (now - Duration::days(days_ago)).to_rfc3339_opts(SecondsFormat::Millis, true),
        author: author.to_string(),
        changes: changes.to_string(),
    }
}

/// The canned Q2 2024 sales review, with its timestamps relative to `now`
pub fn demo_sales_report_at(now: DateTime<Utc>) -> ReportData {
    let local = now.with_timezone(&Local);

    ReportData {
        id: "RPT-2024-Q2-001".to_string(),
        title: "Q2 2024 Comprehensive Sales Performance Review".to_string(),
        report_type: "SALES REPORT".to_string(),
        date: local.format("%m/%d/%Y").to_string(),
        audience: "Executive Leadership Team (ELT)".to_string(),
        summary: "Q2 2024 has served as a pivotal quarter for the organization, demonstrating exceptional resilience in our core markets despite continuing global economic headwinds. The sales team achieved a 56% year-over-year growth trend, well ahead of the initial fiscal projection of 40%. The surge was driven by the launch and rapid adoption of the 'Enterprise Plus' tier, which lifted total transaction volume past 97,000 units and raised the Average Deal Size by 5.2% to $16,167.\n\n\
North America remains the strongest region, beating targets by 18% on the back of channel partnerships in technology and healthcare. Europe (EMEA) has stabilized after a volatile Q1 with an 8% quarter-over-quarter recovery. APAC adoption of new product lines still trails the global average by 15%, which points to a need for localized pricing and targeted marketing in Q3.\n\n\
CRM automation cut the average sales cycle from 45 days to 31 days and accelerated revenue realization. Retention holds at 92%, although churn in the SMB segment is ticking up as competitors cut prices."
            .to_string(),
        outlook: "Heading into Q3 2024, predictive models project continued growth that normalizes to roughly 15% quarter-over-quarter. The Q3 pipeline is robust, with 40% of forecasted deals already in the 'Negotiation' or 'Commit' phases.\n\n\
Strategic themes for the next period are scaling the Enterprise motion into new verticals and stabilizing APAC through localization, while keeping marketing spend disciplined to protect CAC. Currency movements in EMEA are a headwind; holiday pre-buying in retail is a tailwind."
            .to_string(),
        market_context: "The global SaaS market is consolidating and valuations are returning to fundamentals. Competitors are discounting aggressively to hold SMB share. Our 56% growth compares with an industry average of 12% for the quarter, which indicates the value-based differentiation strategy is working."
            .to_string(),
        executive_brief: Some(ExecutiveBrief {
            cfo_view: "The quarter beat expectations with a 12.5% increase in total volume. Gross margin improved by 150 basis points as mix shifted toward 'Enterprise Plus'. Customer Acquisition Cost in APAC sits 20% above target, so regional marketing spend needs tighter controls until unit economics improve."
                .to_string(),
            cro_view: "Sales velocity is at an all-time high. The 14-day reduction in the sales cycle lets representatives close two additional deals per month on average. Q3 should double down on the North American partnership strategy, which produced 35% of the Q2 pipeline, and target the under-penetrated Financial Services vertical."
                .to_string(),
            coo_view: "The hardware supply chain is stabilizing but the single-source dependency for Series-X chips remains a critical exposure. Onboarding a secondary supplier should be fast-tracked ahead of Q3. Support capacity is near its limit and headcount planning has to track the 56% sales growth."
                .to_string(),
        }),
        metrics: vec![
            metric("Total Revenue Volume", "97,240", 12.5, IconType::Volume),
            metric("Avg Deal Size", "16,167", 5.2, IconType::Trend),
            metric("Peak Monthly Sales", "21,450", 8.4, IconType::Growth),
            metric("YoY Growth Rate", "56%", 15.0, IconType::Chart),
        ],
        insights: vec![
            insight(
                "'Enterprise Plus' adoption grew 34% month-over-month and accounts for 60% of the quarter's margin expansion.",
                "SalesForce Data",
            ),
            insight(
                "Retention held at 92%, but churn in the SMB cohort (<50 employees) rose 2.5%, tracking competitor discount campaigns.",
                "Churn Analysis",
            ),
            insight(
                "Average sales cycle fell from 45 to 31 days, coinciding with the rollout of AI-driven lead scoring in mid-April.",
                "Ops Metrics",
            ),
            insight(
                "Mobile acquisition cost dropped 12% while conversion improved after the 'Mobile-First' redesign.",
                "Marketing Analytics",
            ),
        ],
        risks: vec![
            risk(
                "r1",
                "Supply chain volatility affecting hardware delivery timelines. Single-source dependency for Series-X chips leaves us exposed to geopolitical delays.",
                Impact::High,
                Priority::Critical,
            ),
            risk(
                "r2",
                "Price undercutting by 'Competitor A' in the SMB segment could cost 10-15% of the low-end market if unaddressed.",
                Impact::Medium,
                Priority::Monitor,
            ),
            risk(
                "r3",
                "EUR/USD exposure in EMEA may move reported Q3 revenue by +/- 3% without adjusted hedging.",
                Impact::Low,
                Priority::Monitor,
            ),
        ],
        recommendations: vec![
            recommendation(
                "Accelerate Enterprise Hiring",
                "Unfreeze Enterprise Sales headcount and hire 5 Senior Account Executives in Q3 to capture 'Enterprise Plus' momentum.",
                Impact::High,
                Impact::Medium,
            ),
            recommendation(
                "APAC Localization Strategy",
                "Launch localized APAC pricing tiers (about 15% below global list) with translated marketing assets.",
                Impact::Medium,
                Impact::High,
            ),
            recommendation(
                "Supply Chain Diversification",
                "Qualify a secondary Series-X chip supplier and target a 70/30 split by Q4.",
                Impact::High,
                Impact::High,
            ),
            recommendation(
                "SMB Loyalty Program Pilot",
                "Answer competitor discounting with a value-add loyalty program for SMBs instead of a price war.",
                Impact::Medium,
                Impact::Low,
            ),
        ],
        chart_data: vec![
            point("Jan", 4000.0, 2400.0, 2400.0),
            point("Feb", 3000.0, 1398.0, 2210.0),
            point("Mar", 2000.0, 9800.0, 2290.0),
            point("Apr", 2780.0, 3908.0, 2000.0),
            point("May", 1890.0, 4800.0, 2181.0),
            point("Jun", 2390.0, 3800.0, 2500.0),
        ],
        table_data: vec![
            row("North America", 45000.0, 2200.0, 85.0),
            row("Europe (EMEA)", 32000.0, 1800.0, 65.0),
            row("Asia Pacific", 15000.0, 900.0, 40.0),
            row("Latin America", 5240.0, 400.0, 25.0),
        ],
        scenarios: vec![
            scenario("price_increase", "Price Increase", 20.0, 1.0, "%", 1.2),
            scenario("churn_reduction", "Churn Reduction", 10.0, 0.5, "%", 1.5),
            scenario("market_expansion", "New Market Entry", 5.0, 1.0, "x", 2.0),
        ],
        forecast_data: vec![
            forecast("Jul (Est)", 2500.0, 2300.0, 2700.0),
            forecast("Aug (Est)", 2800.0, 2500.0, 3100.0),
            forecast("Sep (Est)", 3200.0, 2800.0, 3600.0),
        ],
        strategic_map: vec![
            dimension("Innovation", 90.0, 60.0),
            dimension("Efficiency", 70.0, 85.0),
            dimension("Scale", 88.0, 75.0),
            dimension("Cust Sat", 92.0, 80.0),
            dimension("Speed", 65.0, 70.0),
            dimension("Quality", 85.0, 85.0),
        ],
        competitors: vec![
            competitor("Our Company", 35.0, 56.0, 88.0),
            competitor("Competitor A", 25.0, 12.0, 65.0),
            competitor("Competitor B", 20.0, -5.0, 70.0),
            competitor("Others", 20.0, 5.0, 50.0),
        ],
        versions: vec![
            version(now, "v1.2", 1, "AI Agent", "Updated Q2 forecast based on new market data"),
            version(now, "v1.1", 2, "John Doe", "Manual adjustment of risk factors"),
            version(now, "v1.0", 3, "System", "Initial generation"),
        ],
        data_quality: Some(DataQualityReport {
            score: 94.0,
            last_updated: local.format("%-I:%M:%S %p").to_string(),
            source_integrity: SourceIntegrity::High,
            issues_found: 0,
        }),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Render an integer with comma thousands separators
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

/// Scale the leading integer of a display value, keeping any suffix such as `%`.
/// Values without a leading integer come back unchanged.
fn rescale_display_value(value: &MetricValue, factor: f64) -> MetricValue {
    let text = value.to_string().replace(',', "");
    let trimmed = text.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());

    match trimmed[..digits_end].parse::<i64>() {
        Ok(number) => {
            let scaled = (number as f64 * factor).floor() as i64;
            MetricValue::Text(format!("{}{}", format_thousands(scaled), &trimmed[digits_end..]))
        }
        Err(_) => value.clone(),
    }
}

/// Demo report retitled for the requested period with randomized figures
pub fn perturb_demo_report(context: &AnalysisContext, rng: &mut dyn RandomSource) -> ReportData {
    perturb_demo_report_at(context, rng, Utc::now())
}

pub fn perturb_demo_report_at(
    context: &AnalysisContext,
    rng: &mut dyn RandomSource,
    now: DateTime<Utc>,
) -> ReportData {
    let mut report = demo_sales_report_at(now);
    let factor = rng.between(0.75, 1.25);

    for point in &mut report.chart_data {
        point.primary = (point.primary * factor).floor();
        point.secondary = (point.secondary * factor).floor();
        point.amt = (point.amt * factor).floor();
    }
    for row in &mut report.table_data {
        row.primary = (row.primary * factor).floor();
        row.secondary = (row.secondary * factor).floor();
    }
    for competitor in &mut report.competitors {
        competitor.market_share = (competitor.market_share + rng.between(-5.0, 5.0)).clamp(0.0, 100.0);
        competitor.growth = round1(competitor.growth + rng.between(-5.0, 5.0));
    }
    for dim in &mut report.strategic_map {
        dim.a = (dim.a + rng.between(-10.0, 10.0)).clamp(0.0, 100.0);
    }
    for metric in &mut report.metrics {
        if matches!(metric.icon_type, IconType::Volume | IconType::Chart) {
            let scale = rng.between(0.8, 1.2);
            metric.value = rescale_display_value(&metric.value, scale);
        }
        metric.trend = round1(metric.trend + rng.between(-2.5, 2.5));
    }

    report.title = format!("{} Sales Performance Review", context.period);
    let dashed: String = context
        .period
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    report.id = format!("RPT-{}-{}", dashed, now.timestamp_millis()).to_uppercase();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisType;
    use chrono::TimeZone;

    struct Constant(f64);

    impl RandomSource for Constant {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_baseline_cardinalities() {
        let report = demo_sales_report();
        assert_eq!(report.metrics.len(), 4);
        assert_eq!(report.insights.len(), 4);
        assert_eq!(report.risks.len(), 3);
        assert_eq!(report.recommendations.len(), 4);
        assert_eq!(report.chart_data.len(), 6);
        assert_eq!(report.table_data.len(), 4);
        assert_eq!(report.scenarios.len(), 3);
        assert_eq!(report.forecast_data.len(), 3);
        assert_eq!(report.strategic_map.len(), 6);
        assert_eq!(report.competitors.len(), 4);
        assert_eq!(report.versions.len(), 3);
        assert_eq!(report.data_quality.as_ref().map(|q| q.score), Some(94.0));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(97240), "97,240");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-4500), "-4,500");
    }

    #[test]
    fn test_rescale_keeps_suffix() {
        let scaled = rescale_display_value(&MetricValue::Text("97,240".into()), 1.1);
        assert_eq!(scaled, MetricValue::Text("106,964".into()));

        let scaled = rescale_display_value(&MetricValue::Text("56%".into()), 0.8);
        assert_eq!(scaled, MetricValue::Text("44%".into()));

        let untouched = MetricValue::Text("n/a".into());
        assert_eq!(rescale_display_value(&untouched, 1.1), untouched);
    }

    #[test]
    fn test_identity_follows_period() {
        let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
        let report = perturb_demo_report_at(&ctx, &mut Constant(0.5), now());

        assert_eq!(report.title, "Q3 2024 Sales Performance Review");
        assert_eq!(report.id, "RPT-Q3-2024-1721035800000");
    }

    #[test]
    fn test_series_share_one_scale_factor() {
        let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
        let baseline = demo_sales_report_at(now());
        let report = perturb_demo_report_at(&ctx, &mut Constant(0.9), now());
        let factor: f64 = 0.75 + 0.9 * (1.25 - 0.75);
        assert!((factor - 1.2).abs() < 1e-9);

        for (point, base) in report.chart_data.iter().zip(&baseline.chart_data) {
            assert_eq!(point.primary, (base.primary * factor).floor());
            assert_eq!(point.secondary, (base.secondary * factor).floor());
            assert_eq!(point.amt, (base.amt * factor).floor());
        }
        for (row, base) in report.table_data.iter().zip(&baseline.table_data) {
            assert_eq!(row.primary, (base.primary * factor).floor());
            assert_eq!(row.secondary, (base.secondary * factor).floor());
            assert_eq!(row.contribution, base.contribution);
        }
    }

    #[test]
    fn test_midpoint_draw_leaves_figures_unchanged() {
        let ctx = AnalysisContext::new("FY 2024", AnalysisType::Forecast);
        let baseline = demo_sales_report_at(now());
        let report = perturb_demo_report_at(&ctx, &mut Constant(0.5), now());

        assert_eq!(report.chart_data, baseline.chart_data);
        assert_eq!(report.table_data, baseline.table_data);
        assert_eq!(report.competitors, baseline.competitors);
        assert_eq!(report.strategic_map, baseline.strategic_map);
        assert_eq!(report.metrics[1].value, MetricValue::Text("16,167".into()));
        assert_eq!(report.metrics[1].trend, 5.2);
    }

    #[test]
    fn test_perturbation_bounds_across_seeds() {
        let ctx = AnalysisContext::new("Q1 2025", AnalysisType::Benchmarks);
        let baseline = demo_sales_report_at(now());

        for seed in 0..50 {
            let report = perturb_demo_report_at(&ctx, &mut SeededRandom::new(seed), now());

            for (point, base) in report.chart_data.iter().zip(&baseline.chart_data) {
                assert!(point.primary >= (base.primary * 0.75).floor());
                assert!(point.primary <= (base.primary * 1.25).floor());
                assert_eq!(point.primary, point.primary.floor());
            }
            for (c, base) in report.competitors.iter().zip(&baseline.competitors) {
                assert!((0.0..=100.0).contains(&c.market_share));
                assert!((c.market_share - base.market_share).abs() <= 5.0);
                assert!((c.growth - base.growth).abs() <= 5.05);
            }
            for (d, base) in report.strategic_map.iter().zip(&baseline.strategic_map) {
                assert!((0.0..=100.0).contains(&d.a));
                assert!((d.a - base.a).abs() <= 10.0);
                assert_eq!(d.b, base.b);
            }
            for (m, base) in report.metrics.iter().zip(&baseline.metrics) {
                assert!((m.trend - base.trend).abs() <= 2.55);
            }
            assert_eq!(report.metrics[1].value, baseline.metrics[1].value);
            assert!(report.metrics[3].value.to_string().ends_with('%'));
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let ctx = AnalysisContext::new("Q3 2024", AnalysisType::Trends);
        let a = perturb_demo_report_at(&ctx, &mut SeededRandom::new(7), now());
        let b = perturb_demo_report_at(&ctx, &mut SeededRandom::new(7), now());
        assert_eq!(a, b);
    }
}
