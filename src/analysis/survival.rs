//! Survival estimator
//!
//! Two estimators share one output shape:
//!
//! - [`SurvivalMethod::Simplified`] (default) walks cases one at a time in
//!   time order. An event multiplies the running probability by
//!   `(n-1)/n`. Every case, event or censored, then leaves the risk set.
//! - [`SurvivalMethod::KaplanMeier`] groups tied times. It applies
//!   `1 - d/n` once per distinct time and removes censored cases after the
//!   events at that time.
//!
//! Only cases with a positive overall survival time take part.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::entities::case::SrccCase;
use crate::entities::staging::StageGroup;

/// Survival estimator variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurvivalMethod {
    /// Per-case actuarial walk
    #[default]
    Simplified,
    /// Tie-aware product-limit estimator
    KaplanMeier,
}

impl FromStr for SurvivalMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "simplified" | "actuarial" => Ok(SurvivalMethod::Simplified),
            "kaplan-meier" | "km" => Ok(SurvivalMethod::KaplanMeier),
            other => Err(format!(
                "unknown survival method '{}' (expected simplified or kaplan-meier)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SurvivalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurvivalMethod::Simplified => write!(f, "simplified"),
            SurvivalMethod::KaplanMeier => write!(f, "kaplan-meier"),
        }
    }
}

/// One step of a survival curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalPoint {
    pub time: f64,
    pub survival_probability: f64,
    /// Risk set size before this step
    pub n_at_risk: usize,
    /// Whether at least one event occurred at this step
    pub event: bool,
    /// Events at this time (tie-aware estimator only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<usize>,
    /// Censored cases at this time (tie-aware estimator only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub censored: Option<usize>,
}

/// Survival curve over one cohort or stratum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    pub method: SurvivalMethod,
    pub estimates: Vec<SurvivalPoint>,
    /// First time at which survival probability drops to 0.5 or below
    pub median_survival: Option<f64>,
    pub total_cases: usize,
    pub events: usize,
}

impl SurvivalCurve {
    fn empty(method: SurvivalMethod) -> Self {
        Self {
            method,
            estimates: Vec::new(),
            median_survival: None,
            total_cases: 0,
            events: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Survival probability at `time` (step function, 1.0 before the first step)
    pub fn probability_at(&self, time: f64) -> f64 {
        self.estimates
            .iter()
            .take_while(|p| p.time <= time)
            .last()
            .map_or(1.0, |p| p.survival_probability)
    }
}

/// Estimate survival over a cohort with the default method
pub fn estimate_survival(cases: &[SrccCase]) -> SurvivalCurve {
    estimate_survival_with(cases, SurvivalMethod::default())
}

pub fn estimate_survival_with(cases: &[SrccCase], method: SurvivalMethod) -> SurvivalCurve {
    curve_from_observations(observations(cases.iter()), method)
}

/// Estimate survival separately for each stage group present in the cohort
pub fn estimate_survival_by_stage(cases: &[SrccCase]) -> BTreeMap<StageGroup, SurvivalCurve> {
    estimate_survival_by_stage_with(cases, SurvivalMethod::default())
}

pub fn estimate_survival_by_stage_with(
    cases: &[SrccCase],
    method: SurvivalMethod,
) -> BTreeMap<StageGroup, SurvivalCurve> {
    let mut groups: BTreeMap<StageGroup, Vec<&SrccCase>> = BTreeMap::new();
    for case in cases {
        groups
            .entry(case.tnm_staging.stage_group())
            .or_default()
            .push(case);
    }

    groups
        .into_par_iter()
        .map(|(group, members)| {
            let curve = curve_from_observations(observations(members.into_iter()), method);
            debug!(stage = %group, cases = curve.total_cases, "stratum estimated");
            (group, curve)
        })
        .collect()
}

/// (time, event) pairs for cases with a positive survival time
fn observations<'a>(cases: impl Iterator<Item = &'a SrccCase>) -> Vec<(f64, bool)> {
    cases
        .filter_map(|case| {
            let metrics = case.survival_metrics.as_ref()?;
            let time = metrics.overall_survival_months?;
            (time.is_finite() && time > 0.0).then_some((time, metrics.event_occurred))
        })
        .collect()
}

fn curve_from_observations(mut data: Vec<(f64, bool)>, method: SurvivalMethod) -> SurvivalCurve {
    if data.is_empty() {
        return SurvivalCurve::empty(method);
    }

    // Stable sort keeps input order among tied times
    data.sort_by(|a, b| a.0.total_cmp(&b.0));

    let estimates = match method {
        SurvivalMethod::Simplified => simplified_steps(&data),
        SurvivalMethod::KaplanMeier => product_limit_steps(&data),
    };

    let median_survival = estimates
        .iter()
        .find(|p| p.survival_probability <= 0.5)
        .map(|p| p.time);

    SurvivalCurve {
        method,
        estimates,
        median_survival,
        total_cases: data.len(),
        events: data.iter().filter(|(_, event)| *event).count(),
    }
}

fn simplified_steps(data: &[(f64, bool)]) -> Vec<SurvivalPoint> {
    let mut n_at_risk = data.len();
    let mut probability = 1.0;
    let mut steps = Vec::with_capacity(data.len());

    for &(time, event) in data {
        if event {
            probability *= (n_at_risk as f64 - 1.0) / n_at_risk as f64;
        }
        steps.push(SurvivalPoint {
            time,
            survival_probability: probability,
            n_at_risk,
            event,
            events: None,
            censored: None,
        });
        n_at_risk -= 1;
    }

    steps
}

fn product_limit_steps(data: &[(f64, bool)]) -> Vec<SurvivalPoint> {
    let mut n_at_risk = data.len();
    let mut probability = 1.0;
    let mut steps = Vec::new();

    for tied in data.chunk_by(|a, b| a.0 == b.0) {
        let time = tied[0].0;
        let events = tied.iter().filter(|(_, event)| *event).count();
        let censored = tied.len() - events;

        if events > 0 {
            probability *= 1.0 - events as f64 / n_at_risk as f64;
        }
        steps.push(SurvivalPoint {
            time,
            survival_probability: probability,
            n_at_risk,
            event: events > 0,
            events: Some(events),
            censored: Some(censored),
        });
        n_at_risk -= tied.len();
    }

    steps
}
