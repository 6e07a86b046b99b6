//! Descriptive analytics over an SRCC cohort

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::analysis::tables::{mean, median};
use crate::entities::case::{FrenchSymptom, Gender, SrccCase};
use crate::entities::staging::StageGroup;

/// Composite risk of one case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRisk {
    pub case_id: String,
    pub stage: String,
    pub risk_score: f64,
    pub high_risk: bool,
}

/// Demographics, staging, survival and presentation of a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortAnalysis {
    pub total_cases: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_age: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,

    /// Always lists both genders
    pub gender_distribution: BTreeMap<Gender, usize>,

    pub stage_distribution: BTreeMap<StageGroup, usize>,

    /// Over cases with a positive survival time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_survival: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_risk_score: Option<f64>,

    pub high_risk_cases: usize,

    pub cases_with_french_symptoms: usize,

    pub total_french_symptoms: usize,

    pub symptom_counts: BTreeMap<FrenchSymptom, usize>,

    /// Per-case risk in cohort order
    pub case_risks: Vec<CaseRisk>,
}

impl CohortAnalysis {
    pub fn from_cases(cases: &[SrccCase]) -> Self {
        let case_risks: Vec<CaseRisk> = cases
            .par_iter()
            .map(|case| CaseRisk {
                case_id: case.case_id(),
                stage: case.stage_summary(),
                risk_score: case.risk_score(),
                high_risk: case.is_high_risk(),
            })
            .collect();

        let ages: Vec<f64> = cases.iter().map(|c| c.age as f64).collect();
        let survivals: Vec<f64> = cases
            .iter()
            .filter_map(SrccCase::survival_months)
            .filter(|t| *t > 0.0)
            .collect();
        let risks: Vec<f64> = case_risks.iter().map(|r| r.risk_score).collect();

        let mut gender_distribution: BTreeMap<Gender, usize> =
            [(Gender::M, 0), (Gender::F, 0)].into_iter().collect();
        let mut stage_distribution = BTreeMap::new();
        let mut symptom_counts = BTreeMap::new();
        for case in cases {
            *gender_distribution.entry(case.gender).or_insert(0) += 1;
            *stage_distribution
                .entry(case.tnm_staging.stage_group())
                .or_insert(0) += 1;
            for symptom in &case.symptoms_french {
                *symptom_counts.entry(*symptom).or_insert(0) += 1;
            }
        }

        let analysis = Self {
            total_cases: cases.len(),
            median_age: median(&ages),
            min_age: cases.iter().map(|c| c.age).min(),
            max_age: cases.iter().map(|c| c.age).max(),
            gender_distribution,
            stage_distribution,
            median_survival: median(&survivals),
            mean_risk_score: mean(&risks),
            high_risk_cases: case_risks.iter().filter(|r| r.high_risk).count(),
            cases_with_french_symptoms: cases.iter().filter(|c| !c.symptoms_french.is_empty()).count(),
            total_french_symptoms: cases.iter().map(|c| c.symptoms_french.len()).sum(),
            symptom_counts,
            case_risks,
        };

        info!(
            cases = analysis.total_cases,
            high_risk = analysis.high_risk_cases,
            "cohort analyzed"
        );
        analysis
    }

    /// Share of high-risk cases (0-1); 0 for an empty cohort
    pub fn high_risk_rate(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.high_risk_cases as f64 / self.total_cases as f64
        }
    }
}
