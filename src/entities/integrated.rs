//! Integrated case: the input to the precision decision engine

use serde::{Deserialize, Serialize};

use crate::core::error::{check_range, InputError};
use crate::entities::flot::FlotCase;
use crate::entities::staging::TnmStaging;
use crate::entities::surgery::GastricSurgeryCase;

/// Surgery and chemotherapy data for one patient plus multidisciplinary input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratedCase {
    pub patient_id: String,
    pub case_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gastric_surgery_case: Option<GastricSurgeryCase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flot_case: Option<FlotCase>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,

    /// ECOG performance status (0-4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_status: Option<u8>,

    /// Major comorbidities, e.g. "heart_failure", "renal failure"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comorbidities: Vec<String>,

    // Tumor biology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histology_subtype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub her2_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msi_status: Option<String>,

    /// PD-L1 expression (percent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdl1_expression: Option<f64>,

    // Multidisciplinary input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgeon_preference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oncologist_recommendation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_preference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institutional_protocol: Option<String>,
}

impl IntegratedCase {
    pub fn new(patient_id: impl Into<String>, case_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            case_id: case_id.into(),
            gastric_surgery_case: None,
            flot_case: None,
            age: None,
            performance_status: None,
            comorbidities: Vec::new(),
            histology_subtype: None,
            her2_status: None,
            msi_status: None,
            pdl1_expression: None,
            surgeon_preference: None,
            oncologist_recommendation: None,
            patient_preference: None,
            institutional_protocol: None,
        }
    }

    /// Staging used for decisions: surgery staging first, then FLOT
    /// pre-treatment staging
    pub fn staging(&self) -> Option<TnmStaging> {
        self.gastric_surgery_case
            .as_ref()
            .map(GastricSurgeryCase::staging)
            .or_else(|| self.flot_case.as_ref().map(FlotCase::initial_staging))
    }

    /// Comorbidity names lowercased with spaces as underscores
    pub fn normalized_comorbidities(&self) -> Vec<String> {
        self.comorbidities
            .iter()
            .map(|c| c.trim().to_lowercase().replace([' ', '-'], "_"))
            .collect()
    }

    pub fn validate(&self) -> Result<(), InputError> {
        check_range("age", self.age.map(f64::from), 0.0, 120.0, "0-120 years")?;
        check_range(
            "performance_status",
            self.performance_status.map(f64::from),
            0.0,
            4.0,
            "ECOG 0-4",
        )?;
        check_range("pdl1_expression", self.pdl1_expression, 0.0, 100.0, "0-100%")?;
        if let Some(surgery) = &self.gastric_surgery_case {
            surgery.validate()?;
        }
        if let Some(flot) = &self.flot_case {
            flot.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::case::HistologyType;
    use crate::entities::surgery::{GastrectomyType, SurgicalApproach};

    #[test]
    fn test_staging_prefers_surgery_case() {
        let mut case = IntegratedCase::new("P1", "I1");
        assert!(case.staging().is_none());

        case.flot_case = Some(FlotCase::new("P1", "F1", "T3N2M0".parse().unwrap(), 8, 8));
        assert_eq!(case.staging().unwrap().to_string(), "T3N2M0");

        case.gastric_surgery_case = Some(GastricSurgeryCase::new(
            "P1",
            "S1",
            "T2N0M0".parse().unwrap(),
            HistologyType::SignetRing,
            GastrectomyType::Subtotal,
            SurgicalApproach::Laparoscopic,
        ));
        assert_eq!(case.staging().unwrap().to_string(), "T2N0M0");
    }

    #[test]
    fn test_normalized_comorbidities() {
        let mut case = IntegratedCase::new("P1", "I1");
        case.comorbidities = vec!["Heart Failure".into(), "renal-failure".into()];
        assert_eq!(
            case.normalized_comorbidities(),
            vec!["heart_failure".to_string(), "renal_failure".to_string()]
        );
    }

    #[test]
    fn test_validate_nested() {
        let mut case = IntegratedCase::new("P1", "I1");
        case.performance_status = Some(5);
        assert!(case.validate().is_err());
        case.performance_status = Some(1);
        let mut flot = FlotCase::new("P1", "F1", "T3N1M0".parse().unwrap(), 4, 4);
        flot.baseline_albumin = Some(9.0);
        case.flot_case = Some(flot);
        assert!(case.validate().is_err());
    }
}
