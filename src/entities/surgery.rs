//! Gastric surgery case entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{check_range, InputError};
use crate::entities::case::HistologyType;
use crate::entities::staging::{MetastasisCategory, NodeCategory, TnmStaging, TumorCategory};

/// Gastrectomy procedure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GastrectomyType {
    #[serde(alias = "total_gastrectomy")]
    Total,
    #[serde(alias = "subtotal_gastrectomy")]
    Subtotal,
    #[serde(alias = "proximal_gastrectomy")]
    Proximal,
    #[serde(alias = "pylorus_preserving_gastrectomy")]
    PylorusPreserving,
    /// Endoscopic mucosal or submucosal resection
    #[serde(alias = "endoscopic_resection")]
    Endoscopic,
    /// Palliative bypass without resection
    #[serde(alias = "palliative_bypass")]
    Palliative,
}

impl std::fmt::Display for GastrectomyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GastrectomyType::Total => write!(f, "total gastrectomy"),
            GastrectomyType::Subtotal => write!(f, "subtotal gastrectomy"),
            GastrectomyType::Proximal => write!(f, "proximal gastrectomy"),
            GastrectomyType::PylorusPreserving => write!(f, "pylorus-preserving gastrectomy"),
            GastrectomyType::Endoscopic => write!(f, "endoscopic resection"),
            GastrectomyType::Palliative => write!(f, "palliative bypass"),
        }
    }
}

/// Operative access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurgicalApproach {
    Open,
    Laparoscopic,
    Robotic,
    Endoscopic,
}

impl SurgicalApproach {
    /// Laparoscopic or robotic
    pub fn is_minimally_invasive(self) -> bool {
        matches!(self, SurgicalApproach::Laparoscopic | SurgicalApproach::Robotic)
    }
}

impl std::fmt::Display for SurgicalApproach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurgicalApproach::Open => write!(f, "open"),
            SurgicalApproach::Laparoscopic => write!(f, "laparoscopic"),
            SurgicalApproach::Robotic => write!(f, "robotic"),
            SurgicalApproach::Endoscopic => write!(f, "endoscopic"),
        }
    }
}

/// Residual tumor classification after resection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResectionStatus {
    /// No residual tumor
    R0,
    /// Microscopic residual
    R1,
    /// Macroscopic residual
    R2,
}

impl std::fmt::Display for ResectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResectionStatus::R0 => write!(f, "R0"),
            ResectionStatus::R1 => write!(f, "R1"),
            ResectionStatus::R2 => write!(f, "R2"),
        }
    }
}

/// A planned or completed gastrectomy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GastricSurgeryCase {
    pub patient_id: String,
    pub case_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// ASA physical status (1-5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asa_score: Option<u8>,

    pub tumor_stage: TumorCategory,
    pub node_stage: NodeCategory,
    pub metastasis_stage: MetastasisCategory,
    pub histology: HistologyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_size_mm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_location: Option<String>,

    pub gastrectomy_type: GastrectomyType,
    pub surgical_approach: SurgicalApproach,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgery_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgeon: Option<String>,

    // Outcomes, present once the operation has happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resection_status: Option<ResectionStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lymph_nodes_harvested: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lymph_nodes_positive: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lymph_nodes_examined: Option<u32>,

    /// e.g. "D1", "D1+", "D2"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lymphadenectomy_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operative_time_minutes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_loss_ml: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complications: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clavien_dindo_grade: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_stay_days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathology_report: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximal_margin_cm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distal_margin_cm: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub major_comorbidities: Vec<String>,

    /// Adequate support at home after discharge; unknown when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_support: Option<bool>,
}

impl GastricSurgeryCase {
    /// Planned case with staging and procedure; no outcome data yet
    pub fn new(
        patient_id: impl Into<String>,
        case_id: impl Into<String>,
        staging: TnmStaging,
        histology: HistologyType,
        gastrectomy_type: GastrectomyType,
        surgical_approach: SurgicalApproach,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            case_id: case_id.into(),
            age: None,
            asa_score: None,
            tumor_stage: staging.tumor,
            node_stage: staging.node,
            metastasis_stage: staging.metastasis,
            histology,
            tumor_size_mm: None,
            tumor_location: None,
            gastrectomy_type,
            surgical_approach,
            surgery_date: None,
            surgeon: None,
            resection_status: None,
            lymph_nodes_harvested: None,
            lymph_nodes_positive: None,
            lymph_nodes_examined: None,
            lymphadenectomy_type: None,
            operative_time_minutes: None,
            blood_loss_ml: None,
            complications: Vec::new(),
            clavien_dindo_grade: None,
            hospital_stay_days: None,
            pathology_report: None,
            proximal_margin_cm: None,
            distal_margin_cm: None,
            major_comorbidities: Vec::new(),
            social_support: None,
        }
    }

    pub fn staging(&self) -> TnmStaging {
        TnmStaging::new(self.tumor_stage, self.node_stage, self.metastasis_stage)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        check_range("age", self.age.map(f64::from), 0.0, 120.0, "0-120 years")?;
        check_range("asa_score", self.asa_score.map(f64::from), 1.0, 5.0, "1-5")?;
        check_range(
            "clavien_dindo_grade",
            self.clavien_dindo_grade.map(f64::from),
            0.0,
            5.0,
            "0-5",
        )?;
        check_range("tumor_size_mm", self.tumor_size_mm, 0.0, f64::MAX, "non-negative")?;
        check_range("blood_loss_ml", self.blood_loss_ml, 0.0, f64::MAX, "non-negative")?;
        check_range("proximal_margin_cm", self.proximal_margin_cm, 0.0, f64::MAX, "non-negative")?;
        check_range("distal_margin_cm", self.distal_margin_cm, 0.0, f64::MAX, "non-negative")?;

        if let (Some(positive), Some(examined)) =
            (self.lymph_nodes_positive, self.lymph_nodes_examined)
        {
            if positive > examined {
                return Err(InputError::Inconsistent(format!(
                    "{}: {} positive lymph nodes exceeds {} examined",
                    self.case_id, positive, examined
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gastrectomy_type_accepts_long_names() {
        let t: GastrectomyType = serde_yml::from_str("total_gastrectomy").unwrap();
        assert_eq!(t, GastrectomyType::Total);
        let t: GastrectomyType = serde_yml::from_str("pylorus_preserving").unwrap();
        assert_eq!(t, GastrectomyType::PylorusPreserving);
        let t: GastrectomyType = serde_yml::from_str("endoscopic_resection").unwrap();
        assert_eq!(t, GastrectomyType::Endoscopic);
    }

    #[test]
    fn test_minimally_invasive() {
        assert!(SurgicalApproach::Robotic.is_minimally_invasive());
        assert!(!SurgicalApproach::Endoscopic.is_minimally_invasive());
    }

    #[test]
    fn test_deserialize_case() {
        let yaml = r#"
patient_id: P001
case_id: C001
age: 45
tumor_stage: T1
node_stage: N0
metastasis_stage: M0
histology: Adenocarcinoma
gastrectomy_type: subtotal_gastrectomy
surgical_approach: laparoscopic
resection_status: R0
lymph_nodes_harvested: 15
"#;
        let case: GastricSurgeryCase = serde_yml::from_str(yaml).unwrap();
        assert_eq!(case.staging().to_string(), "T1N0M0");
        assert_eq!(case.resection_status, Some(ResectionStatus::R0));
        assert!(case.validate().is_ok());
    }

    #[test]
    fn test_validate_asa_and_nodes() {
        let mut case = GastricSurgeryCase::new(
            "P1",
            "C1",
            "T2N1M0".parse().unwrap(),
            HistologyType::SignetRing,
            GastrectomyType::Total,
            SurgicalApproach::Open,
        );
        case.asa_score = Some(6);
        assert!(case.validate().is_err());
        case.asa_score = Some(3);
        case.lymph_nodes_examined = Some(10);
        case.lymph_nodes_positive = Some(12);
        assert!(matches!(case.validate(), Err(InputError::Inconsistent(_))));
    }
}
