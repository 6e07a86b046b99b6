//! SRCC case entity (one patient record in an outcomes cohort)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{check_range, InputError};
use crate::entities::staging::TnmStaging;

/// Patient gender as recorded in registry exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "m", alias = "male", alias = "Male")]
    M,
    #[serde(alias = "f", alias = "female", alias = "Female")]
    F,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::M => write!(f, "M"),
            Gender::F => write!(f, "F"),
        }
    }
}

/// Histological classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Default)]
pub enum HistologyType {
    #[default]
    #[serde(rename = "Adenocarcinoma", alias = "adenocarcinoma")]
    Adenocarcinoma,
    #[serde(rename = "Signet Ring Cell Carcinoma", alias = "signet_ring")]
    SignetRing,
    #[serde(rename = "Mucinous Adenocarcinoma", alias = "mucinous")]
    Mucinous,
    #[serde(rename = "Poorly Differentiated", alias = "poorly_differentiated")]
    PoorlyDifferentiated,
    #[serde(rename = "Well Differentiated", alias = "well_differentiated")]
    WellDifferentiated,
    #[serde(rename = "Moderately Differentiated", alias = "moderately_differentiated")]
    ModeratelyDifferentiated,
}

impl std::fmt::Display for HistologyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistologyType::Adenocarcinoma => write!(f, "Adenocarcinoma"),
            HistologyType::SignetRing => write!(f, "Signet Ring Cell Carcinoma"),
            HistologyType::Mucinous => write!(f, "Mucinous Adenocarcinoma"),
            HistologyType::PoorlyDifferentiated => write!(f, "Poorly Differentiated"),
            HistologyType::WellDifferentiated => write!(f, "Well Differentiated"),
            HistologyType::ModeratelyDifferentiated => write!(f, "Moderately Differentiated"),
        }
    }
}

/// Treatment protocol administered to a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TreatmentProtocol {
    /// Fluorouracil, leucovorin, oxaliplatin, docetaxel
    #[serde(rename = "FLOT", alias = "flot")]
    Flot,
    /// Capecitabine, oxaliplatin
    #[serde(rename = "XELOX", alias = "xelox")]
    Xelox,
    /// Epirubicin, cisplatin, fluorouracil
    #[serde(rename = "ECF", alias = "ecf")]
    Ecf,
    /// Epirubicin, cisplatin, capecitabine
    #[serde(rename = "ECX", alias = "ecx")]
    Ecx,
    /// Fluorouracil, leucovorin, oxaliplatin
    #[serde(rename = "FOLFOX", alias = "folfox")]
    Folfox,
    #[serde(rename = "Surgery Only", alias = "surgery_only")]
    SurgeryOnly,
    #[serde(rename = "Neoadjuvant", alias = "neoadjuvant")]
    Neoadjuvant,
    #[serde(rename = "Adjuvant", alias = "adjuvant")]
    Adjuvant,
}

impl std::fmt::Display for TreatmentProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreatmentProtocol::Flot => write!(f, "FLOT"),
            TreatmentProtocol::Xelox => write!(f, "XELOX"),
            TreatmentProtocol::Ecf => write!(f, "ECF"),
            TreatmentProtocol::Ecx => write!(f, "ECX"),
            TreatmentProtocol::Folfox => write!(f, "FOLFOX"),
            TreatmentProtocol::SurgeryOnly => write!(f, "Surgery Only"),
            TreatmentProtocol::Neoadjuvant => write!(f, "Neoadjuvant"),
            TreatmentProtocol::Adjuvant => write!(f, "Adjuvant"),
        }
    }
}

/// Surgical outcome, either descriptive or as a residual-tumor class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurgicalOutcome {
    #[serde(alias = "complete")]
    Complete,
    #[serde(alias = "partial")]
    Partial,
    #[serde(alias = "incomplete")]
    Incomplete,
    R0,
    R1,
    R2,
}

impl std::fmt::Display for SurgicalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurgicalOutcome::Complete => write!(f, "Complete"),
            SurgicalOutcome::Partial => write!(f, "Partial"),
            SurgicalOutcome::Incomplete => write!(f, "Incomplete"),
            SurgicalOutcome::R0 => write!(f, "R0"),
            SurgicalOutcome::R1 => write!(f, "R1"),
            SurgicalOutcome::R2 => write!(f, "R2"),
        }
    }
}

/// Vital status at last follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalStatus {
    #[serde(alias = "alive")]
    Alive,
    #[serde(alias = "dead", alias = "Deceased")]
    Dead,
    #[serde(rename = "Lost to follow-up", alias = "lost")]
    Lost,
}

/// Presenting symptoms in French clinical terminology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrenchSymptom {
    #[serde(rename = "Épigastralgie", alias = "Epigastralgie")]
    Epigastralgie,
    #[serde(rename = "Vomissement")]
    Vomissement,
    #[serde(rename = "Dysphagie")]
    Dysphagie,
    #[serde(rename = "Amaigrissement")]
    Amaigrissement,
    #[serde(rename = "Asthénie", alias = "Asthenie")]
    Asthenie,
    #[serde(rename = "Anorexie")]
    Anorexie,
    #[serde(rename = "Hématémèse", alias = "Hematemese")]
    Hematemese,
    #[serde(rename = "Méléna", alias = "Melena")]
    Melena,
    #[serde(rename = "Dyspepsie")]
    Dyspepsie,
}

impl FrenchSymptom {
    pub const ALL: [FrenchSymptom; 9] = [
        FrenchSymptom::Epigastralgie,
        FrenchSymptom::Vomissement,
        FrenchSymptom::Dysphagie,
        FrenchSymptom::Amaigrissement,
        FrenchSymptom::Asthenie,
        FrenchSymptom::Anorexie,
        FrenchSymptom::Hematemese,
        FrenchSymptom::Melena,
        FrenchSymptom::Dyspepsie,
    ];

    /// French term as written in clinical notes
    pub fn term(self) -> &'static str {
        match self {
            FrenchSymptom::Epigastralgie => "Épigastralgie",
            FrenchSymptom::Vomissement => "Vomissement",
            FrenchSymptom::Dysphagie => "Dysphagie",
            FrenchSymptom::Amaigrissement => "Amaigrissement",
            FrenchSymptom::Asthenie => "Asthénie",
            FrenchSymptom::Anorexie => "Anorexie",
            FrenchSymptom::Hematemese => "Hématémèse",
            FrenchSymptom::Melena => "Méléna",
            FrenchSymptom::Dyspepsie => "Dyspepsie",
        }
    }

    pub fn english(self) -> &'static str {
        match self {
            FrenchSymptom::Epigastralgie => "Epigastric pain",
            FrenchSymptom::Vomissement => "Vomiting",
            FrenchSymptom::Dysphagie => "Dysphagia",
            FrenchSymptom::Amaigrissement => "Weight loss",
            FrenchSymptom::Asthenie => "Fatigue",
            FrenchSymptom::Anorexie => "Loss of appetite",
            FrenchSymptom::Hematemese => "Hematemesis",
            FrenchSymptom::Melena => "Melena",
            FrenchSymptom::Dyspepsie => "Dyspepsia",
        }
    }
}

impl std::fmt::Display for FrenchSymptom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.term())
    }
}

/// One course of treatment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentProtocolRecord {
    pub protocol: TreatmentProtocol,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles_planned: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles_completed: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Free-text response assessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Worst CTCAE grade observed (0-5)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toxicity_grade: Option<u8>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dose_modifications: Vec<String>,
}

impl TreatmentProtocolRecord {
    pub fn new(protocol: TreatmentProtocol) -> Self {
        Self {
            protocol,
            cycles_planned: None,
            cycles_completed: None,
            start_date: None,
            end_date: None,
            response: None,
            toxicity_grade: None,
            dose_modifications: Vec::new(),
        }
    }

    /// Fraction of planned cycles completed, in [0, 1]
    ///
    /// `None` when either count is missing or nothing was planned. Zero
    /// completed cycles is a valid 0.0.
    pub fn completion_rate(&self) -> Option<f64> {
        match (self.cycles_planned, self.cycles_completed) {
            (Some(planned), Some(completed)) if planned > 0 => {
                Some(completed as f64 / planned as f64)
            }
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        check_range(
            "toxicity_grade",
            self.toxicity_grade.map(f64::from),
            0.0,
            5.0,
            "0-5",
        )?;
        if let (Some(planned), Some(completed)) = (self.cycles_planned, self.cycles_completed) {
            if completed > planned {
                return Err(InputError::Inconsistent(format!(
                    "{}: {} cycles completed exceeds {} planned",
                    self.protocol, completed, planned
                )));
            }
        }
        Ok(())
    }
}

/// Time-to-event data for survival analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurvivalMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_survival_months: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression_free_survival_months: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease_free_survival_months: Option<f64>,

    /// True when the event (typically death) was observed; false means censored
    #[serde(default)]
    pub event_occurred: bool,

    /// Death, Progression or Recurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_follow_up: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vital_status: Option<VitalStatus>,
}

impl SurvivalMetrics {
    pub fn validate(&self) -> Result<(), InputError> {
        let nonneg = "non-negative months";
        check_range("overall_survival_months", self.overall_survival_months, 0.0, f64::MAX, nonneg)?;
        check_range(
            "progression_free_survival_months",
            self.progression_free_survival_months,
            0.0,
            f64::MAX,
            nonneg,
        )?;
        check_range(
            "disease_free_survival_months",
            self.disease_free_survival_months,
            0.0,
            f64::MAX,
            nonneg,
        )
    }
}

/// A signet-ring-cell carcinoma case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrccCase {
    pub patient_id: String,

    /// Derived as `CASE_<patient_id>` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,

    pub age: u32,

    pub gender: Gender,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms_french: Vec<FrenchSymptom>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms_english: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_date: Option<NaiveDate>,

    pub tnm_staging: TnmStaging,

    pub histology: HistologyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_size_mm: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumor_location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiation_grade: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lymphovascular_invasion: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perineural_invasion: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub treatment_protocols: Vec<TreatmentProtocolRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgical_procedure: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgical_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgical_outcome: Option<SurgicalOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resection_margins: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survival_metrics: Option<SurvivalMetrics>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub complications: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_of_life_score: Option<f64>,
}

impl SrccCase {
    /// Minimal case with the required fields; everything else empty
    pub fn new(
        patient_id: impl Into<String>,
        age: u32,
        gender: Gender,
        tnm_staging: TnmStaging,
        histology: HistologyType,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            case_id: None,
            age,
            gender,
            bmi: None,
            symptoms_french: Vec::new(),
            symptoms_english: Vec::new(),
            presentation_date: None,
            diagnosis_date: None,
            tnm_staging,
            histology,
            tumor_size_mm: None,
            tumor_location: None,
            differentiation_grade: None,
            lymphovascular_invasion: None,
            perineural_invasion: None,
            treatment_protocols: Vec::new(),
            surgical_procedure: None,
            surgical_date: None,
            surgical_outcome: None,
            resection_margins: None,
            survival_metrics: None,
            complications: Vec::new(),
            quality_of_life_score: None,
        }
    }

    pub fn case_id(&self) -> String {
        self.case_id
            .clone()
            .unwrap_or_else(|| format!("CASE_{}", self.patient_id))
    }

    /// e.g. `T3N1M0 (Stage II)`
    pub fn stage_summary(&self) -> String {
        format!("{} ({})", self.tnm_staging, self.tnm_staging.stage_group())
    }

    pub fn primary_treatment(&self) -> Option<&TreatmentProtocolRecord> {
        self.treatment_protocols.first()
    }

    /// Overall survival time, if recorded
    pub fn survival_months(&self) -> Option<f64> {
        self.survival_metrics
            .as_ref()
            .and_then(|m| m.overall_survival_months)
    }

    /// Locally advanced or metastatic disease
    pub fn is_high_risk(&self) -> bool {
        let s = &self.tnm_staging;
        s.tumor.is_advanced() || s.node.is_extensive() || s.metastasis.is_metastatic()
    }

    /// Composite 0-100 risk score from age, stage, histology and complications
    ///
    /// Only the single worst staging factor contributes.
    pub fn risk_score(&self) -> f64 {
        use crate::entities::staging::{NodeCategory, TumorCategory};

        let mut score: f64 = 0.0;

        if self.age > 70 {
            score += 20.0;
        } else if self.age > 60 {
            score += 10.0;
        }

        let s = &self.tnm_staging;
        if s.metastasis.is_metastatic() {
            score += 40.0;
        } else if s.tumor.is_t4_class() {
            score += 30.0;
        } else if s.node.is_n3_class() {
            score += 25.0;
        } else if s.tumor == TumorCategory::T3 {
            score += 20.0;
        } else if matches!(s.node, NodeCategory::N1 | NodeCategory::N2) {
            score += 15.0;
        }

        match self.histology {
            HistologyType::SignetRing => score += 15.0,
            HistologyType::PoorlyDifferentiated => score += 10.0,
            _ => {}
        }

        score += self.complications.len() as f64 * 5.0;

        score.min(100.0)
    }

    /// Reject values outside their clinical range
    pub fn validate(&self) -> Result<(), InputError> {
        if self.patient_id.trim().is_empty() {
            return Err(InputError::Inconsistent("patient_id is empty".to_string()));
        }
        check_range("age", Some(self.age as f64), 0.0, 120.0, "0-120 years")?;
        check_range("bmi", self.bmi, 10.0, 60.0, "10-60")?;
        check_range("tumor_size_mm", self.tumor_size_mm, 0.0, f64::MAX, "non-negative")?;
        check_range(
            "quality_of_life_score",
            self.quality_of_life_score,
            0.0,
            100.0,
            "0-100",
        )?;
        for protocol in &self.treatment_protocols {
            protocol.validate()?;
        }
        if let Some(metrics) = &self.survival_metrics {
            metrics.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_case() -> SrccCase {
        let mut case = SrccCase::new(
            "SRCC001",
            65,
            Gender::M,
            "T3N1M0".parse().unwrap(),
            HistologyType::SignetRing,
        );
        let mut flot = TreatmentProtocolRecord::new(TreatmentProtocol::Flot);
        flot.cycles_planned = Some(8);
        flot.cycles_completed = Some(8);
        case.treatment_protocols.push(flot);
        case.surgical_outcome = Some(SurgicalOutcome::Complete);
        case
    }

    #[test]
    fn test_case_id_derivation() {
        let mut case = sample_case();
        assert_eq!(case.case_id(), "CASE_SRCC001");
        case.case_id = Some("C-9".to_string());
        assert_eq!(case.case_id(), "C-9");
    }

    #[test]
    fn test_stage_summary() {
        assert_eq!(sample_case().stage_summary(), "T3N1M0 (Stage II)");
    }

    #[test]
    fn test_completion_rate_is_fraction() {
        let mut record = TreatmentProtocolRecord::new(TreatmentProtocol::Flot);
        record.cycles_planned = Some(8);
        record.cycles_completed = Some(6);
        assert_eq!(record.completion_rate(), Some(0.75));
        record.cycles_completed = Some(0);
        assert_eq!(record.completion_rate(), Some(0.0));
        record.cycles_planned = Some(0);
        assert_eq!(record.completion_rate(), None);
    }

    #[test]
    fn test_risk_score() {
        // age 65 (+10), T3 (+20), signet ring (+15)
        assert_eq!(sample_case().risk_score(), 45.0);

        let mut case = sample_case();
        case.age = 80;
        case.tnm_staging = "T4aN3M1".parse().unwrap();
        case.complications = vec!["anastomotic_leak".to_string(); 10];
        assert_eq!(case.risk_score(), 100.0);
    }

    #[test]
    fn test_is_high_risk() {
        assert!(sample_case().is_high_risk());
        let mut case = sample_case();
        case.tnm_staging = "T1N1M0".parse().unwrap();
        assert!(!case.is_high_risk());
        case.tnm_staging = "T1N2M0".parse().unwrap();
        assert!(case.is_high_risk());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut case = sample_case();
        assert!(case.validate().is_ok());
        case.age = 130;
        assert!(case.validate().is_err());

        let mut case = sample_case();
        case.treatment_protocols[0].cycles_completed = Some(9);
        assert!(matches!(case.validate(), Err(InputError::Inconsistent(_))));

        let mut case = sample_case();
        case.survival_metrics = Some(SurvivalMetrics {
            overall_survival_months: Some(-1.0),
            ..Default::default()
        });
        assert!(case.validate().is_err());
    }

    #[test]
    fn test_deserialize_yaml_record() {
        let yaml = r#"
patient_id: SRCC002
age: 58
gender: F
tnm_staging: T2N0M0
histology: Signet Ring Cell Carcinoma
symptoms_french: [Épigastralgie, Dysphagie]
treatment_protocols:
  - protocol: FLOT
    cycles_planned: 4
    cycles_completed: 4
survival_metrics:
  overall_survival_months: 30.5
  event_occurred: false
  vital_status: Alive
"#;
        let case: SrccCase = serde_yml::from_str(yaml).unwrap();
        assert_eq!(case.histology, HistologyType::SignetRing);
        assert_eq!(case.symptoms_french.len(), 2);
        assert_eq!(case.survival_months(), Some(30.5));
        assert_eq!(case.primary_treatment().unwrap().protocol, TreatmentProtocol::Flot);
    }

    #[test]
    fn test_french_symptom_translation() {
        assert_eq!(FrenchSymptom::Asthenie.english(), "Fatigue");
        assert_eq!(FrenchSymptom::Melena.term(), "Méléna");
    }
}
