//! FLOT chemotherapy case entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{check_range, InputError};
use crate::entities::case::HistologyType;
use crate::entities::staging::{MetastasisCategory, NodeCategory, TnmStaging, TumorCategory};

/// Treatment phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FlotPhase {
    #[default]
    Preoperative,
    Postoperative,
    Complete,
    Interrupted,
}

impl std::fmt::Display for FlotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlotPhase::Preoperative => write!(f, "preoperative"),
            FlotPhase::Postoperative => write!(f, "postoperative"),
            FlotPhase::Complete => write!(f, "complete"),
            FlotPhase::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Tumor response grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResponseGrade {
    /// Complete response (pCR when pathological)
    #[serde(rename = "complete_response")]
    Complete,
    /// More than 90% regression
    #[serde(rename = "major_response")]
    Major,
    /// 50-90% regression
    #[serde(rename = "partial_response")]
    Partial,
    /// 10-50% regression
    #[serde(rename = "minimal_response")]
    Minimal,
    /// Less than 10% change
    #[serde(rename = "stable_disease")]
    Stable,
    #[serde(rename = "progressive_disease")]
    Progressive,
}

impl ResponseGrade {
    /// Response score on a 0-100 scale
    pub fn score(self) -> f64 {
        match self {
            ResponseGrade::Complete => 100.0,
            ResponseGrade::Major => 80.0,
            ResponseGrade::Partial => 60.0,
            ResponseGrade::Minimal => 30.0,
            ResponseGrade::Stable => 10.0,
            ResponseGrade::Progressive => 0.0,
        }
    }

    /// Position in the best-response hierarchy; higher is better
    pub fn rank(self) -> u8 {
        match self {
            ResponseGrade::Complete => 5,
            ResponseGrade::Major => 4,
            ResponseGrade::Partial => 3,
            ResponseGrade::Minimal => 2,
            ResponseGrade::Stable => 1,
            ResponseGrade::Progressive => 0,
        }
    }

    /// Complete, major or partial response
    pub fn is_objective(self) -> bool {
        matches!(
            self,
            ResponseGrade::Complete | ResponseGrade::Major | ResponseGrade::Partial
        )
    }
}

impl std::fmt::Display for ResponseGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseGrade::Complete => write!(f, "complete_response"),
            ResponseGrade::Major => write!(f, "major_response"),
            ResponseGrade::Partial => write!(f, "partial_response"),
            ResponseGrade::Minimal => write!(f, "minimal_response"),
            ResponseGrade::Stable => write!(f, "stable_disease"),
            ResponseGrade::Progressive => write!(f, "progressive_disease"),
        }
    }
}

/// CTCAE toxicity grade, written as a bare integer 0-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ToxicityGrade {
    G0,
    /// Mild
    G1,
    /// Moderate
    G2,
    /// Severe
    G3,
    /// Life-threatening
    G4,
    /// Death
    G5,
}

impl ToxicityGrade {
    pub fn value(self) -> u8 {
        match self {
            ToxicityGrade::G0 => 0,
            ToxicityGrade::G1 => 1,
            ToxicityGrade::G2 => 2,
            ToxicityGrade::G3 => 3,
            ToxicityGrade::G4 => 4,
            ToxicityGrade::G5 => 5,
        }
    }

    /// Contribution to the toxicity burden score
    pub fn burden_points(self) -> f64 {
        match self {
            ToxicityGrade::G0 => 0.0,
            ToxicityGrade::G1 => 10.0,
            ToxicityGrade::G2 => 25.0,
            ToxicityGrade::G3 => 50.0,
            ToxicityGrade::G4 => 80.0,
            ToxicityGrade::G5 => 100.0,
        }
    }

    /// Grade 3 or worse
    pub fn is_severe(self) -> bool {
        self.value() >= 3
    }
}

impl TryFrom<u8> for ToxicityGrade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ToxicityGrade::G0),
            1 => Ok(ToxicityGrade::G1),
            2 => Ok(ToxicityGrade::G2),
            3 => Ok(ToxicityGrade::G3),
            4 => Ok(ToxicityGrade::G4),
            5 => Ok(ToxicityGrade::G5),
            other => Err(format!("toxicity grade {} is outside CTCAE 0-5", other)),
        }
    }
}

impl From<ToxicityGrade> for u8 {
    fn from(grade: ToxicityGrade) -> Self {
        grade.value()
    }
}

impl std::fmt::Display for ToxicityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// A patient receiving perioperative FLOT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlotCase {
    pub patient_id: String,
    pub case_id: String,

    // Pre-treatment staging
    pub initial_t_stage: TumorCategory,
    pub initial_n_stage: NodeCategory,
    pub initial_m_stage: MetastasisCategory,

    // Restaging after chemotherapy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_t_stage: Option<TumorCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_n_stage: Option<NodeCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_m_stage: Option<MetastasisCategory>,

    /// Planned cycles (1-8)
    pub planned_cycles: u32,

    pub completed_cycles: u32,

    #[serde(default)]
    pub phase: FlotPhase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flot_start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flot_end_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgery_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_response: Option<ResponseGrade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiological_response: Option<ResponseGrade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathological_response: Option<ResponseGrade>,

    /// Tumor regression grade (0-5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_regression_grade: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_toxicity_grade: Option<ToxicityGrade>,

    /// Grade of each recorded toxicity event
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toxicity_grades: Vec<ToxicityGrade>,

    /// Named toxicities, e.g. "neutropenia", "peripheral neuropathy"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_toxicities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_limiting_toxicity: Option<bool>,

    #[serde(default)]
    pub dose_reductions: u32,

    /// Size of each dose reduction in percent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dose_reduction_percentages: Vec<f64>,

    #[serde(default)]
    pub treatment_delays: u32,

    // Laboratory values (g/dL unless noted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_albumin: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_flot_albumin: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_hemoglobin: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_flot_hemoglobin: Option<f64>,

    /// mg/dL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_creatinine: Option<f64>,

    /// mg/dL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_bilirubin: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_ecog: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_flot_ecog: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_weight_kg: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_flot_weight_kg: Option<f64>,

    #[serde(default)]
    pub hospitalizations: u32,

    #[serde(default)]
    pub infections: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histology: Option<HistologyType>,
}

impl FlotCase {
    /// Case with staging and cycle counts; all optional data empty
    pub fn new(
        patient_id: impl Into<String>,
        case_id: impl Into<String>,
        initial: TnmStaging,
        planned_cycles: u32,
        completed_cycles: u32,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            case_id: case_id.into(),
            initial_t_stage: initial.tumor,
            initial_n_stage: initial.node,
            initial_m_stage: initial.metastasis,
            post_t_stage: None,
            post_n_stage: None,
            post_m_stage: None,
            planned_cycles,
            completed_cycles,
            phase: FlotPhase::default(),
            flot_start_date: None,
            flot_end_date: None,
            surgery_date: None,
            clinical_response: None,
            radiological_response: None,
            pathological_response: None,
            tumor_regression_grade: None,
            max_toxicity_grade: None,
            toxicity_grades: Vec::new(),
            specific_toxicities: Vec::new(),
            dose_limiting_toxicity: None,
            dose_reductions: 0,
            dose_reduction_percentages: Vec::new(),
            treatment_delays: 0,
            baseline_albumin: None,
            post_flot_albumin: None,
            baseline_hemoglobin: None,
            post_flot_hemoglobin: None,
            baseline_creatinine: None,
            baseline_bilirubin: None,
            baseline_ecog: None,
            post_flot_ecog: None,
            baseline_weight_kg: None,
            post_flot_weight_kg: None,
            hospitalizations: 0,
            infections: 0,
            age: None,
            histology: None,
        }
    }

    pub fn initial_staging(&self) -> TnmStaging {
        TnmStaging::new(self.initial_t_stage, self.initial_n_stage, self.initial_m_stage)
    }

    /// Restaging triple; missing N or M components carry over from the
    /// initial staging. `None` until a post-treatment T stage is recorded.
    pub fn post_staging(&self) -> Option<TnmStaging> {
        self.post_t_stage.map(|tumor| {
            TnmStaging::new(
                tumor,
                self.post_n_stage.unwrap_or(self.initial_n_stage),
                self.post_m_stage.unwrap_or(self.initial_m_stage),
            )
        })
    }

    /// Percent body weight lost between baseline and post-treatment
    pub fn weight_loss_pct(&self) -> Option<f64> {
        match (self.baseline_weight_kg, self.post_flot_weight_kg) {
            (Some(before), Some(after)) if before > 0.0 => Some((before - after) / before * 100.0),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        check_range("planned_cycles", Some(self.planned_cycles as f64), 1.0, 8.0, "1-8 cycles")?;
        if self.completed_cycles > self.planned_cycles {
            return Err(InputError::Inconsistent(format!(
                "{}: {} cycles completed exceeds {} planned",
                self.case_id, self.completed_cycles, self.planned_cycles
            )));
        }
        check_range(
            "tumor_regression_grade",
            self.tumor_regression_grade.map(f64::from),
            0.0,
            5.0,
            "0-5",
        )?;
        check_range("baseline_albumin", self.baseline_albumin, 1.0, 6.0, "1.0-6.0 g/dL")?;
        check_range("post_flot_albumin", self.post_flot_albumin, 1.0, 6.0, "1.0-6.0 g/dL")?;
        check_range("baseline_hemoglobin", self.baseline_hemoglobin, 5.0, 18.0, "5-18 g/dL")?;
        check_range("post_flot_hemoglobin", self.post_flot_hemoglobin, 5.0, 18.0, "5-18 g/dL")?;
        check_range("baseline_creatinine", self.baseline_creatinine, 0.0, f64::MAX, "non-negative")?;
        check_range("baseline_bilirubin", self.baseline_bilirubin, 0.0, f64::MAX, "non-negative")?;
        check_range("baseline_ecog", self.baseline_ecog.map(f64::from), 0.0, 4.0, "ECOG 0-4")?;
        check_range("post_flot_ecog", self.post_flot_ecog.map(f64::from), 0.0, 4.0, "ECOG 0-4")?;
        check_range("baseline_weight_kg", self.baseline_weight_kg, 30.0, 200.0, "30-200 kg")?;
        check_range("post_flot_weight_kg", self.post_flot_weight_kg, 30.0, 200.0, "30-200 kg")?;
        check_range("age", self.age.map(f64::from), 0.0, 120.0, "0-120 years")?;
        for pct in &self.dose_reduction_percentages {
            check_range("dose_reduction_percentages", Some(*pct), 0.0, 100.0, "0-100%")?;
        }
        Ok(())
    }
}
