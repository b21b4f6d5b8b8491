//! What-If Simulation
//!
//! Applies scenario slider values to a report's time series and summarizes
//! the projected impact. Pure and synchronous.

use crate::models::{ChartDataPoint, ScenarioParam};
use serde::Serialize;
use std::collections::HashMap;

/// Sliders offered when a report carries no scenarios of its own
pub fn default_scenarios() -> Vec<ScenarioParam> {
    vec![
        ScenarioParam {
            id: "price".to_string(),
            label: "Price Increase".to_string(),
            min: 0.0,
            max: 20.0,
            default_value: 0.0,
            step: 1.0,
            unit: "%".to_string(),
            impact_factor: 1.2,
        },
        ScenarioParam {
            id: "volume".to_string(),
            label: "Volume Growth".to_string(),
            min: 0.0,
            max: 20.0,
            default_value: 0.0,
            step: 1.0,
            unit: "%".to_string(),
            impact_factor: 1.0,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub name: String,
    pub actual: f64,
    pub projected: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ImpactSummary {
    /// Percent, one decimal place
    pub growth: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub points: Vec<ProjectedPoint>,
    pub summary: ImpactSummary,
}

#[derive(Debug, Clone)]
pub struct WhatIfSimulator {
    scenarios: Vec<ScenarioParam>,
    values: HashMap<String, f64>,
}

impl WhatIfSimulator {
    pub fn new(scenarios: Vec<ScenarioParam>) -> Self {
        let scenarios = if scenarios.is_empty() {
            default_scenarios()
        } else {
            scenarios
        };
        let values = defaults_of(&scenarios);
        Self { scenarios, values }
    }

    pub fn scenarios(&self) -> &[ScenarioParam] {
        &self.scenarios
    }

    pub fn values(&self) -> &HashMap<String, f64> {
        &self.values
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }

    /// Set one slider to the value as given; range and step are the caller's
    /// concern. Returns `false` for an unknown id.
    pub fn set_value(&mut self, id: &str, value: f64) -> bool {
        if !self.scenarios.iter().any(|s| s.id == id) {
            return false;
        }
        self.values.insert(id.to_string(), value);
        true
    }

    /// Restore every slider to its default in one step
    pub fn reset(&mut self) {
        self.values = defaults_of(&self.scenarios);
    }

    /// Combined scale applied to each actual value; only positive sliders count
    pub fn multiplier(&self) -> f64 {
        self.scenarios.iter().fold(1.0, |total, s| {
            let value = self.value(&s.id).unwrap_or(0.0);
            if value > 0.0 {
                total + value * s.impact_factor / 100.0
            } else {
                total
            }
        })
    }

    pub fn project(&self, base: &[ChartDataPoint]) -> Projection {
        let multiplier = self.multiplier();
        let points: Vec<ProjectedPoint> = base
            .iter()
            .map(|d| ProjectedPoint {
                name: d.name.clone(),
                actual: d.primary,
                projected: (d.primary * multiplier).round(),
                delta: (d.primary * multiplier - d.primary).round(),
            })
            .collect();

        let total_actual: f64 = points.iter().map(|p| p.actual).sum();
        let total_projected: f64 = points.iter().map(|p| p.projected).sum();
        let growth = if total_actual > 0.0 {
            (total_projected - total_actual) / total_actual * 100.0
        } else {
            0.0
        };

        Projection {
            points,
            summary: ImpactSummary {
                growth: (growth * 10.0).round() / 10.0,
                revenue: total_projected - total_actual,
            },
        }
    }
}

fn defaults_of(scenarios: &[ScenarioParam]) -> HashMap<String, f64> {
    scenarios
        .iter()
        .map(|s| (s.id.clone(), s.default_value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<ChartDataPoint> {
        [("Jan", 1000.0), ("Feb", 2000.0), ("Mar", 1500.0)]
            .into_iter()
            .map(|(name, primary)| ChartDataPoint {
                name: name.to_string(),
                primary,
                ..ChartDataPoint::default()
            })
            .collect()
    }

    #[test]
    fn test_empty_scenarios_use_defaults() {
        let sim = WhatIfSimulator::new(Vec::new());
        let ids: Vec<&str> = sim.scenarios().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["price", "volume"]);
        assert_eq!(sim.value("price"), Some(0.0));
        assert_eq!(sim.multiplier(), 1.0);
    }

    #[test]
    fn test_projection_applies_positive_sliders() {
        let mut sim = WhatIfSimulator::new(Vec::new());
        assert!(sim.set_value("price", 10.0));
        assert!(sim.set_value("volume", 5.0));
        // 1 + 10*1.2/100 + 5*1.0/100
        assert!((sim.multiplier() - 1.17).abs() < 1e-9);

        let projection = sim.project(&base());
        assert_eq!(projection.points[0].projected, 1170.0);
        assert_eq!(projection.points[0].delta, 170.0);
        assert_eq!(projection.points[1].projected, 2340.0);
        assert_eq!(projection.summary.revenue, 765.0);
        assert_eq!(projection.summary.growth, 17.0);
    }

    #[test]
    fn test_unknown_slider_is_rejected() {
        let mut sim = WhatIfSimulator::new(Vec::new());
        assert!(!sim.set_value("discount", 5.0));
        assert!(sim.value("discount").is_none());
    }

    #[test]
    fn test_out_of_range_values_are_used_as_given() {
        let mut sim = WhatIfSimulator::new(Vec::new());
        sim.set_value("price", 50.0);
        assert_eq!(sim.value("price"), Some(50.0));
        // 1 + 50*1.2/100
        assert!((sim.multiplier() - 1.6).abs() < 1e-9);

        sim.set_value("price", -3.0);
        assert_eq!(sim.value("price"), Some(-3.0));
        assert_eq!(sim.multiplier(), 1.0);
    }

    #[test]
    fn test_factors_combine_additively() {
        let scenario = |id: &str, impact_factor: f64| ScenarioParam {
            id: id.to_string(),
            label: id.to_string(),
            min: 0.0,
            max: 20.0,
            default_value: 0.0,
            step: 1.0,
            unit: "%".to_string(),
            impact_factor,
        };
        let mut sim = WhatIfSimulator::new(vec![scenario("a", 1.0), scenario("b", 2.0)]);
        sim.set_value("a", 10.0);
        sim.set_value("b", 5.0);

        let projection = sim.project(&base()[..1]);
        assert_eq!(projection.points[0].projected, 1200.0);
        assert_eq!(projection.points[0].delta, 200.0);
        assert_eq!(projection.summary.growth, 20.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut sim = WhatIfSimulator::new(Vec::new());
        sim.set_value("price", 12.0);
        sim.reset();
        let once = sim.values().clone();
        sim.reset();
        assert_eq!(sim.values(), &once);
        assert_eq!(sim.value("price"), Some(0.0));
        assert_eq!(sim.project(&base()).summary, ImpactSummary::default());
    }

    #[test]
    fn test_zero_actual_total_has_zero_growth() {
        let mut sim = WhatIfSimulator::new(Vec::new());
        sim.set_value("price", 10.0);
        let zero = vec![ChartDataPoint::default()];
        let projection = sim.project(&zero);
        assert_eq!(projection.summary.growth, 0.0);
        assert_eq!(projection.summary.revenue, 0.0);
    }
}
