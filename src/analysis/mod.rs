//! Clinical analytics engine
//!
//! Every analyzer is a pure function of its input records. Cohort-level
//! functions score cases in parallel and return results in cohort order.

pub mod cohort;
pub mod decision;
pub mod effectiveness;
pub mod flot;
pub mod stage_parser;
pub mod surgery;
pub mod survival;
pub mod tables;

use serde::{Deserialize, Serialize};

pub use cohort::CohortAnalysis;
pub use decision::{decide, PrecisionDecision};
pub use effectiveness::{analyze_protocol_outcomes, EffectivenessSummary};
pub use flot::{score_flot_case, FlotAnalysis};
pub use stage_parser::{parse_stage, parse_stage_fields, parse_stage_or};
pub use surgery::{score_surgical_case, SurgicalAnalysis};
pub use survival::{estimate_survival, estimate_survival_by_stage, SurvivalCurve, SurvivalMethod};

/// Strength of the evidence behind a component recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceGrade {
    High,
    Moderate,
    Limited,
}

impl std::fmt::Display for EvidenceGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceGrade::High => write!(f, "High"),
            EvidenceGrade::Moderate => write!(f, "Moderate"),
            EvidenceGrade::Limited => write!(f, "Limited"),
        }
    }
}

/// Three-band risk used by the probability models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}
