//! Gastric surgery analytics
//!
//! Pre-operative risk scoring and recommendations ([`score_surgical_case`]),
//! post-operative quality indicators ([`analyze_gastrectomy_case`]), and
//! cohort-level description and operating-room scheduling.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analysis::tables::round_to;
use crate::analysis::{EvidenceGrade, RiskLevel};
use crate::core::error::InputError;
use crate::entities::case::HistologyType;
use crate::entities::staging::{MetastasisCategory, NodeCategory, TumorCategory};
use crate::entities::surgery::{
    GastrectomyType, GastricSurgeryCase, ResectionStatus, SurgicalApproach,
};

/// Four-band surgical risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskCategory {
    /// ≤25 Low, ≤50 Moderate, ≤75 High, otherwise Very High
    pub fn from_score(score: f64) -> Self {
        if score <= 25.0 {
            RiskCategory::Low
        } else if score <= 50.0 {
            RiskCategory::Moderate
        } else if score <= 75.0 {
            RiskCategory::High
        } else {
            RiskCategory::VeryHigh
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskCategory::Low => write!(f, "Low"),
            RiskCategory::Moderate => write!(f, "Moderate"),
            RiskCategory::High => write!(f, "High"),
            RiskCategory::VeryHigh => write!(f, "Very High"),
        }
    }
}

/// Pre-operative analysis of one surgery case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgicalAnalysis {
    pub case_id: String,

    /// Composite staging and histology risk (0-100)
    pub surgical_risk_score: f64,

    pub risk_category: RiskCategory,

    /// Human-readable drivers of the risk score
    pub risk_factors: Vec<String>,

    pub recommended_approach: SurgicalApproach,

    pub recommended_gastrectomy: GastrectomyType,

    pub alternative_approaches: Vec<String>,

    /// Minutes, for the planned approach
    pub predicted_operative_time: u32,

    /// Millilitres, for the planned approach
    pub predicted_blood_loss: f64,

    /// Days, for the planned approach
    pub predicted_hospital_stay: u32,

    /// Minimum lymph node harvest for an adequate dissection
    pub lymph_node_target: u32,

    /// Resection quality (0-100); requires a resection status and node count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resection_quality_score: Option<f64>,

    /// Confidence in the analysis (0-1)
    pub confidence_score: f64,

    pub evidence_level: EvidenceGrade,
}

/// T1 class or T2
fn is_early_tumor(t: TumorCategory) -> bool {
    t.is_t1_class() || t == TumorCategory::T2
}

fn surgical_risk_score(case: &GastricSurgeryCase) -> f64 {
    let mut score = case.tumor_stage.surgical_risk_points() + case.node_stage.surgical_risk_points();
    if case.metastasis_stage.is_metastatic() {
        score += 40.0;
    }
    if case.histology == HistologyType::SignetRing {
        score += 15.0;
    }
    match case.tumor_size_mm {
        Some(size) if size > 50.0 => score += 10.0,
        Some(size) if size > 30.0 => score += 5.0,
        _ => {}
    }
    score.min(100.0)
}

fn risk_factors(case: &GastricSurgeryCase) -> Vec<String> {
    let mut factors = Vec::new();
    if case.tumor_stage.is_advanced() {
        factors.push("Advanced T stage".to_string());
    }
    if case.node_stage.is_extensive() {
        factors.push("Extensive nodal involvement".to_string());
    }
    if case.metastasis_stage.is_metastatic() {
        factors.push("Distant metastases".to_string());
    }
    if case.histology == HistologyType::SignetRing {
        factors.push("Signet ring cell histology".to_string());
    }
    if case.tumor_size_mm.is_some_and(|size| size > 50.0) {
        factors.push("Large tumor size (>5cm)".to_string());
    }
    factors
}

fn recommend_approach(case: &GastricSurgeryCase) -> SurgicalApproach {
    if is_early_tumor(case.tumor_stage) && case.node_stage.is_limited() {
        SurgicalApproach::Laparoscopic
    } else if case.tumor_stage.is_t4_class() {
        SurgicalApproach::Open
    } else {
        SurgicalApproach::Laparoscopic
    }
}

fn recommend_gastrectomy(case: &GastricSurgeryCase) -> GastrectomyType {
    let small = case.tumor_size_mm.is_some_and(|size| size <= 20.0);
    if case.tumor_stage == TumorCategory::T1a && case.node_stage == NodeCategory::N0 && small {
        GastrectomyType::Endoscopic
    } else if is_early_tumor(case.tumor_stage) && case.node_stage.is_limited() {
        GastrectomyType::Subtotal
    } else {
        GastrectomyType::Total
    }
}

/// Only the unsubdivided T1 to T4 categories have listed alternatives
fn alternative_approaches(case: &GastricSurgeryCase) -> Vec<String> {
    let options: &[&str] = match case.tumor_stage {
        TumorCategory::T1 | TumorCategory::T2 => &["Robotic-assisted", "Single-port laparoscopy"],
        TumorCategory::T3 | TumorCategory::T4 => &["Neoadjuvant therapy + surgery", "Open conversion"],
        _ => &[],
    };
    options.iter().map(|s| s.to_string()).collect()
}

fn predict_operative_time(case: &GastricSurgeryCase) -> u32 {
    let mut minutes = 180;
    match case.surgical_approach {
        SurgicalApproach::Laparoscopic => minutes += 30,
        SurgicalApproach::Robotic => minutes += 60,
        SurgicalApproach::Open | SurgicalApproach::Endoscopic => {}
    }
    if case.tumor_stage.is_advanced() {
        minutes += 60;
    }
    if case.node_stage.is_extensive() {
        minutes += 30;
    }
    minutes
}

fn predict_blood_loss(case: &GastricSurgeryCase) -> f64 {
    let mut ml = 200.0;
    match case.surgical_approach {
        SurgicalApproach::Open => ml += 150.0,
        SurgicalApproach::Laparoscopic => ml += 50.0,
        SurgicalApproach::Robotic | SurgicalApproach::Endoscopic => {}
    }
    if case.tumor_stage.is_advanced() {
        ml += 200.0;
    }
    ml
}

fn predict_hospital_stay(case: &GastricSurgeryCase) -> u32 {
    let mut days: i32 = 7;
    match case.surgical_approach {
        SurgicalApproach::Laparoscopic => days -= 2,
        SurgicalApproach::Open => days += 2,
        SurgicalApproach::Robotic | SurgicalApproach::Endoscopic => {}
    }
    if case.tumor_stage.is_advanced() {
        days += 3;
    }
    days.max(3) as u32
}

fn lymph_node_target(case: &GastricSurgeryCase) -> u32 {
    if case.tumor_stage.is_advanced() {
        20
    } else {
        15
    }
}

fn resection_quality(case: &GastricSurgeryCase) -> Option<f64> {
    let status = case.resection_status?;
    let harvested = case.lymph_nodes_harvested?;
    let status_points = match status {
        ResectionStatus::R0 => 50.0,
        ResectionStatus::R1 => 30.0,
        ResectionStatus::R2 => 10.0,
    };
    let target = lymph_node_target(case) as f64;
    let harvest_points = (harvested as f64 / target).min(1.0) * 50.0;
    Some((status_points + harvest_points).min(100.0))
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn confidence(case: &GastricSurgeryCase) -> f64 {
    let mut confidence = 0.8;
    if case.tumor_size_mm.is_some_and(|size| size > 0.0) {
        confidence += 0.05;
    }
    if has_text(&case.tumor_location) {
        confidence += 0.05;
    }
    if has_text(&case.pathology_report) {
        confidence += 0.1;
    }
    f64::min(confidence, 1.0)
}

/// Guideline evidence is graded on the unsubdivided T categories; T1a, T1b
/// and T4a/T4b fall through to Limited
fn evidence_level(case: &GastricSurgeryCase) -> EvidenceGrade {
    let t = case.tumor_stage;
    let n = case.node_stage;
    if matches!(t, TumorCategory::T1 | TumorCategory::T2) && n.is_limited() {
        EvidenceGrade::High
    } else if t == TumorCategory::T3 && matches!(n, NodeCategory::N1 | NodeCategory::N2) {
        EvidenceGrade::Moderate
    } else {
        EvidenceGrade::Limited
    }
}

/// Score one surgery case
///
/// Predictions use the case's planned approach, not the recommended one.
pub fn score_surgical_case(case: &GastricSurgeryCase) -> Result<SurgicalAnalysis, InputError> {
    case.validate()?;

    let score = surgical_risk_score(case);
    let analysis = SurgicalAnalysis {
        case_id: case.case_id.clone(),
        surgical_risk_score: score,
        risk_category: RiskCategory::from_score(score),
        risk_factors: risk_factors(case),
        recommended_approach: recommend_approach(case),
        recommended_gastrectomy: recommend_gastrectomy(case),
        alternative_approaches: alternative_approaches(case),
        predicted_operative_time: predict_operative_time(case),
        predicted_blood_loss: predict_blood_loss(case),
        predicted_hospital_stay: predict_hospital_stay(case),
        lymph_node_target: lymph_node_target(case),
        resection_quality_score: resection_quality(case),
        confidence_score: confidence(case),
        evidence_level: evidence_level(case),
    };

    debug!(
        case_id = %case.case_id,
        score,
        category = %analysis.risk_category,
        "surgical case scored"
    );
    Ok(analysis)
}

// ============================================================================
// Post-operative KPIs
// ============================================================================

/// Clavien-Dindo complication grade; `None` when no complication occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ClavienDindo {
    #[default]
    #[serde(rename = "0")]
    None,
    I,
    II,
    III,
    IV,
    V,
}

impl ClavienDindo {
    /// Grade III or above
    pub fn is_major(self) -> bool {
        self >= ClavienDindo::III
    }
}

impl std::fmt::Display for ClavienDindo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClavienDindo::None => "0",
            ClavienDindo::I => "I",
            ClavienDindo::II => "II",
            ClavienDindo::III => "III",
            ClavienDindo::IV => "IV",
            ClavienDindo::V => "V",
        };
        write!(f, "{}", s)
    }
}

const HIGH_GRADE_COMPLICATIONS: [&str; 7] = [
    "anastomotic_leak",
    "bleeding_requiring_surgery",
    "organ_failure",
    "sepsis",
    "pulmonary_embolism",
    "stroke",
    "cardiac_arrest",
];

const MODERATE_COMPLICATIONS: [&str; 5] = [
    "pneumonia",
    "wound_infection",
    "urinary_retention",
    "ileus",
    "bleeding_requiring_transfusion",
];

/// Grade a free-text complication by keyword
pub fn classify_complication(complication: &str) -> ClavienDindo {
    let text = complication.to_lowercase();
    if HIGH_GRADE_COMPLICATIONS.iter().any(|k| text.contains(k)) {
        if text.contains("death") || text.contains("mortality") {
            ClavienDindo::V
        } else if text.contains("icu") || text.contains("ventilator") {
            ClavienDindo::IV
        } else {
            ClavienDindo::III
        }
    } else if MODERATE_COMPLICATIONS.iter().any(|k| text.contains(k)) {
        ClavienDindo::II
    } else {
        ClavienDindo::I
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResectionAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resection_status: Option<ResectionStatus>,
    pub r0_achieved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximal_margin_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distal_margin_cm: Option<f64>,
    /// Proximal ≥5cm and distal ≥2cm; unknown unless both are measured
    pub adequate_margins: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LymphNodeAnalysis {
    pub total_nodes_examined: Option<u32>,
    pub positive_nodes: Option<u32>,
    /// At least 15 nodes examined
    pub adequate_harvest: Option<bool>,
    pub d2_dissection_performed: bool,
    /// Positive over examined nodes
    pub nodal_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthOfStay {
    pub predicted_los_days: u32,
    pub base_procedure: u32,
    pub approach_modifier: i32,
    pub complication_modifier: u32,
    /// Enhanced recovery pathway applies to minimally invasive access
    pub eras_eligible: bool,
}

/// Complication counts per Clavien-Dindo grade
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClavienDindoCounts {
    #[serde(rename = "I")]
    pub grade_i: usize,
    #[serde(rename = "II")]
    pub grade_ii: usize,
    #[serde(rename = "III")]
    pub grade_iii: usize,
    #[serde(rename = "IV")]
    pub grade_iv: usize,
    #[serde(rename = "V")]
    pub grade_v: usize,
}

impl ClavienDindoCounts {
    fn add(&mut self, grade: ClavienDindo) {
        match grade {
            ClavienDindo::None => {}
            ClavienDindo::I => self.grade_i += 1,
            ClavienDindo::II => self.grade_ii += 1,
            ClavienDindo::III => self.grade_iii += 1,
            ClavienDindo::IV => self.grade_iv += 1,
            ClavienDindo::V => self.grade_v += 1,
        }
    }

    pub fn major(&self) -> usize {
        self.grade_iii + self.grade_iv + self.grade_v
    }

    pub fn total(&self) -> usize {
        self.grade_i + self.grade_ii + self.major()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplicationAnalysis {
    pub classification: ClavienDindoCounts,
    /// Highest grade present
    pub overall_grade: ClavienDindo,
    pub major_complications: usize,
    pub any_complication: bool,
    pub complication_details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRisk {
    pub risk_30_day: f64,
    pub risk_90_day: f64,
    pub risk_category: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadmissionRisk {
    pub readmission_risk_30_day: f64,
    pub risk_factors: Vec<String>,
    pub risk_category: RiskLevel,
    pub mitigation_strategies: Vec<String>,
}

/// Overall surgical quality grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityGrade {
    Excellent,
    Good,
    Acceptable,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl QualityGrade {
    /// ≥85 Excellent, ≥70 Good, ≥55 Acceptable
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 85.0 {
            QualityGrade::Excellent
        } else if pct >= 70.0 {
            QualityGrade::Good
        } else if pct >= 55.0 {
            QualityGrade::Acceptable
        } else {
            QualityGrade::NeedsImprovement
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityGrade::Excellent => write!(f, "Excellent"),
            QualityGrade::Good => write!(f, "Good"),
            QualityGrade::Acceptable => write!(f, "Acceptable"),
            QualityGrade::NeedsImprovement => write!(f, "Needs Improvement"),
        }
    }
}

/// Six binary quality indicators and their composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub r0_resection_achieved: bool,
    /// Unknown when no node count was recorded; excluded from the total
    pub adequate_lymphadenectomy: Option<bool>,
    pub minimally_invasive_approach: bool,
    pub no_major_complications: bool,
    pub low_mortality_risk: bool,
    pub low_readmission_risk: bool,
    /// Indicators met
    pub composite_score: usize,
    /// Indicators with a known value
    pub total_possible: usize,
    pub quality_percentage: f64,
    pub quality_grade: QualityGrade,
}

/// Post-operative quality indicators for one gastrectomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GastrectomyKpis {
    pub case_id: String,
    pub procedure_type: GastrectomyType,
    pub surgical_approach: SurgicalApproach,
    pub r0_analysis: ResectionAnalysis,
    pub lymph_node_analysis: LymphNodeAnalysis,
    pub length_of_stay: LengthOfStay,
    pub complications: ComplicationAnalysis,
    pub mortality_risk: MortalityRisk,
    pub readmission_risk: ReadmissionRisk,
    pub quality_metrics: QualityMetrics,
    pub recommendations: Vec<String>,
}

fn resection_analysis(case: &GastricSurgeryCase) -> ResectionAnalysis {
    let adequate_margins = match (case.proximal_margin_cm, case.distal_margin_cm) {
        (Some(proximal), Some(distal)) => Some(proximal >= 5.0 && distal >= 2.0),
        _ => None,
    };
    ResectionAnalysis {
        resection_status: case.resection_status,
        r0_achieved: case.resection_status == Some(ResectionStatus::R0),
        proximal_margin_cm: case.proximal_margin_cm,
        distal_margin_cm: case.distal_margin_cm,
        adequate_margins,
    }
}

fn lymph_node_analysis(case: &GastricSurgeryCase) -> LymphNodeAnalysis {
    let examined = case.lymph_nodes_examined;
    let nodal_ratio = match (case.lymph_nodes_positive, examined) {
        (Some(positive), Some(total)) if total > 0 => Some(positive as f64 / total as f64),
        _ => None,
    };
    LymphNodeAnalysis {
        total_nodes_examined: examined,
        positive_nodes: case.lymph_nodes_positive,
        adequate_harvest: examined.map(|n| n >= 15),
        d2_dissection_performed: case
            .lymphadenectomy_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("D2")),
        nodal_ratio,
    }
}

fn length_of_stay(case: &GastricSurgeryCase) -> LengthOfStay {
    let base: u32 = match case.gastrectomy_type {
        GastrectomyType::Total => 8,
        GastrectomyType::Subtotal => 6,
        GastrectomyType::Proximal | GastrectomyType::PylorusPreserving => 5,
        GastrectomyType::Endoscopic => 2,
        GastrectomyType::Palliative => 7,
    };
    let approach_modifier: i32 = match case.surgical_approach {
        SurgicalApproach::Laparoscopic | SurgicalApproach::Robotic => -1,
        SurgicalApproach::Open => 0,
        SurgicalApproach::Endoscopic => -3,
    };
    let mut complication_modifier = case.complications.len() as u32;
    if case.clavien_dindo_grade.is_some_and(|g| g >= 3) {
        complication_modifier += 2;
    }
    let predicted = (base as i32 + approach_modifier + complication_modifier as i32).max(1);

    LengthOfStay {
        predicted_los_days: predicted as u32,
        base_procedure: base,
        approach_modifier,
        complication_modifier,
        eras_eligible: case.surgical_approach.is_minimally_invasive(),
    }
}

fn complication_analysis(case: &GastricSurgeryCase) -> ComplicationAnalysis {
    let mut counts = ClavienDindoCounts::default();
    let mut overall = ClavienDindo::None;
    for complication in &case.complications {
        let grade = classify_complication(complication);
        counts.add(grade);
        overall = overall.max(grade);
    }
    ComplicationAnalysis {
        major_complications: counts.major(),
        any_complication: counts.total() > 0,
        classification: counts,
        overall_grade: overall,
        complication_details: case.complications.clone(),
    }
}

fn mortality_risk(case: &GastricSurgeryCase) -> MortalityRisk {
    let base = match case.gastrectomy_type {
        GastrectomyType::Total => 0.05,
        GastrectomyType::Subtotal | GastrectomyType::PylorusPreserving => 0.02,
        GastrectomyType::Proximal => 0.03,
        GastrectomyType::Endoscopic => 0.001,
        GastrectomyType::Palliative => 0.08,
    };

    let mut multiplier = 1.0;
    match case.age {
        Some(age) if age > 75 => multiplier *= 2.0,
        Some(age) if age > 65 => multiplier *= 1.5,
        _ => {}
    }
    match case.asa_score {
        Some(asa) if asa >= 4 => multiplier *= 3.0,
        Some(asa) if asa >= 3 => multiplier *= 1.8,
        _ => {}
    }
    match case.surgical_approach {
        SurgicalApproach::Open => multiplier *= 1.3,
        SurgicalApproach::Laparoscopic | SurgicalApproach::Robotic => multiplier *= 0.8,
        SurgicalApproach::Endoscopic => {}
    }
    match case.major_comorbidities.len() {
        n if n >= 3 => multiplier *= 2.0,
        n if n >= 1 => multiplier *= 1.4,
        _ => {}
    }

    let risk_30: f64 = f64::min(base * multiplier, 0.3);
    let risk_90 = f64::min(risk_30 * 1.8, 0.5);
    let risk_category = if risk_30 < 0.02 {
        RiskLevel::Low
    } else if risk_30 < 0.08 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    };

    MortalityRisk {
        risk_30_day: round_to(risk_30, 4),
        risk_90_day: round_to(risk_90, 4),
        risk_category,
    }
}

fn readmission_risk(case: &GastricSurgeryCase) -> ReadmissionRisk {
    let mut factors = Vec::new();
    let mut multiplier = 1.0;

    if case.age.is_some_and(|age| age > 70) {
        factors.push("advanced_age".to_string());
        multiplier *= 1.3;
    }
    if !case.complications.is_empty() {
        factors.push("postoperative_complications".to_string());
        multiplier *= 1.5;
    }
    if case.major_comorbidities.len() >= 2 {
        factors.push("multiple_comorbidities".to_string());
        multiplier *= 1.4;
    }
    if case.gastrectomy_type == GastrectomyType::Total {
        factors.push("total_gastrectomy".to_string());
        multiplier *= 1.2;
    }
    if case.social_support == Some(false) {
        factors.push("limited_social_support".to_string());
        multiplier *= 1.3;
    }

    let risk: f64 = f64::min(0.15 * multiplier, 0.6);
    let risk_category = if risk < 0.1 {
        RiskLevel::Low
    } else if risk < 0.25 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    };
    let mitigation: &[&str] = if risk > 0.2 {
        &[
            "Enhanced discharge planning",
            "Early post-op follow-up",
            "Patient education reinforcement",
            "Home health services consideration",
        ]
    } else {
        &["Standard discharge planning"]
    };

    ReadmissionRisk {
        readmission_risk_30_day: round_to(risk, 3),
        risk_factors: factors,
        risk_category,
        mitigation_strategies: mitigation.iter().map(|s| s.to_string()).collect(),
    }
}

/// Post-operative quality indicators for one case
pub fn analyze_gastrectomy_case(case: &GastricSurgeryCase) -> Result<GastrectomyKpis, InputError> {
    case.validate()?;

    let r0 = resection_analysis(case);
    let nodes = lymph_node_analysis(case);
    let complications = complication_analysis(case);
    let mortality = mortality_risk(case);
    let readmission = readmission_risk(case);

    let indicators = [
        Some(r0.r0_achieved),
        nodes.adequate_harvest,
        Some(case.surgical_approach.is_minimally_invasive()),
        Some(complications.major_complications == 0),
        Some(mortality.risk_category == RiskLevel::Low),
        Some(readmission.risk_category == RiskLevel::Low),
    ];
    let composite = indicators.iter().filter(|m| **m == Some(true)).count();
    let total = indicators.iter().filter(|m| m.is_some()).count();
    let percentage = if total > 0 {
        composite as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let quality = QualityMetrics {
        r0_resection_achieved: r0.r0_achieved,
        adequate_lymphadenectomy: nodes.adequate_harvest,
        minimally_invasive_approach: case.surgical_approach.is_minimally_invasive(),
        no_major_complications: complications.major_complications == 0,
        low_mortality_risk: mortality.risk_category == RiskLevel::Low,
        low_readmission_risk: readmission.risk_category == RiskLevel::Low,
        composite_score: composite,
        total_possible: total,
        quality_percentage: round_to(percentage, 1),
        quality_grade: QualityGrade::from_percentage(percentage),
    };

    let mut recommendations = Vec::new();
    if !r0.r0_achieved {
        recommendations.push("Consider adjuvant therapy consultation".to_string());
    }
    if nodes.adequate_harvest != Some(true) {
        recommendations.push("Review lymphadenectomy technique for future cases".to_string());
    }
    if complications.major_complications > 0 {
        recommendations.push("Multidisciplinary review of complications".to_string());
    }
    if mortality.risk_category == RiskLevel::High {
        recommendations.push("Enhanced perioperative monitoring".to_string());
    }
    if readmission.risk_category == RiskLevel::High {
        recommendations
            .push("Consider extended observation or enhanced discharge planning".to_string());
    }

    debug!(
        case_id = %case.case_id,
        quality = quality.quality_percentage,
        "gastrectomy KPIs computed"
    );

    Ok(GastrectomyKpis {
        case_id: case.case_id.clone(),
        procedure_type: case.gastrectomy_type,
        surgical_approach: case.surgical_approach,
        length_of_stay: length_of_stay(case),
        r0_analysis: r0,
        lymph_node_analysis: nodes,
        complications,
        mortality_risk: mortality,
        readmission_risk: readmission,
        quality_metrics: quality,
        recommendations,
    })
}

// ============================================================================
// Cohort analytics
// ============================================================================

/// Descriptive statistics over a surgery cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeryCohortSummary {
    pub total_cases: usize,
    /// Cases with a recorded resection status
    pub completed_surgeries: usize,
    pub t_stages: BTreeMap<TumorCategory, usize>,
    pub n_stages: BTreeMap<NodeCategory, usize>,
    pub m_stages: BTreeMap<MetastasisCategory, usize>,
    pub histology: BTreeMap<HistologyType, usize>,
    pub surgical_approaches: BTreeMap<SurgicalApproach, usize>,
    pub gastrectomy_types: BTreeMap<GastrectomyType, usize>,
    /// R0 over completed surgeries (0-1); 0 when none are completed
    pub r0_resection_rate: f64,
    /// Cases with at least one complication (0-1)
    pub complication_rate: f64,
    /// Occurrences of each complication
    pub complications: BTreeMap<String, usize>,
}

fn count<K: Ord>(map: &mut BTreeMap<K, usize>, key: K) {
    *map.entry(key).or_insert(0) += 1;
}

/// Describe a surgery cohort; `None` for an empty cohort
pub fn analyze_surgery_cohort(cases: &[GastricSurgeryCase]) -> Option<SurgeryCohortSummary> {
    if cases.is_empty() {
        return None;
    }

    let mut summary = SurgeryCohortSummary {
        total_cases: cases.len(),
        completed_surgeries: 0,
        t_stages: BTreeMap::new(),
        n_stages: BTreeMap::new(),
        m_stages: BTreeMap::new(),
        histology: BTreeMap::new(),
        surgical_approaches: BTreeMap::new(),
        gastrectomy_types: BTreeMap::new(),
        r0_resection_rate: 0.0,
        complication_rate: 0.0,
        complications: BTreeMap::new(),
    };

    let mut r0 = 0;
    let mut with_complications = 0;
    for case in cases {
        count(&mut summary.t_stages, case.tumor_stage);
        count(&mut summary.n_stages, case.node_stage);
        count(&mut summary.m_stages, case.metastasis_stage);
        count(&mut summary.histology, case.histology);
        count(&mut summary.surgical_approaches, case.surgical_approach);
        count(&mut summary.gastrectomy_types, case.gastrectomy_type);

        if let Some(status) = case.resection_status {
            summary.completed_surgeries += 1;
            if status == ResectionStatus::R0 {
                r0 += 1;
            }
        }
        if !case.complications.is_empty() {
            with_complications += 1;
        }
        for complication in &case.complications {
            count(&mut summary.complications, complication.clone());
        }
    }

    if summary.completed_surgeries > 0 {
        summary.r0_resection_rate = r0 as f64 / summary.completed_surgeries as f64;
    }
    summary.complication_rate = with_complications as f64 / cases.len() as f64;

    info!(
        cases = summary.total_cases,
        completed = summary.completed_surgeries,
        "surgery cohort analyzed"
    );
    Some(summary)
}

/// Scheduling complexity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    High,
    Moderate,
    Low,
}

impl Complexity {
    /// ≤30 Low, ≤60 Moderate, otherwise High
    pub fn from_risk(score: f64) -> Self {
        if score <= 30.0 {
            Complexity::Low
        } else if score <= 60.0 {
            Complexity::Moderate
        } else {
            Complexity::High
        }
    }

    fn recommended_day(self) -> &'static str {
        match self {
            Complexity::High => "Monday/Tuesday",
            Complexity::Moderate => "Wednesday/Thursday",
            Complexity::Low => "Any day",
        }
    }

    fn team_requirement(self) -> &'static str {
        match self {
            Complexity::High => "Senior surgeon + full team",
            Complexity::Moderate => "Experienced surgeon",
            Complexity::Low => "Standard team",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::High => write!(f, "High"),
            Complexity::Moderate => write!(f, "Moderate"),
            Complexity::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub case_id: String,
    pub recommended_day: String,
    /// Predicted operative time in minutes
    pub estimated_duration: u32,
    pub priority: Complexity,
    pub team_requirement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecommendations {
    pub peak_or_utilization: String,
    pub optimal_case_mix: String,
    pub team_planning: String,
}

/// Complexity-ordered operating-room plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePlan {
    /// High complexity first, then moderate, then low; cohort order within a band
    pub schedule: Vec<ScheduleEntry>,
    pub low_complexity: usize,
    pub moderate_complexity: usize,
    pub high_complexity: usize,
    pub resource_recommendations: ResourceRecommendations,
}

/// Order cases for the operating list by surgical complexity
pub fn plan_surgical_schedule(cases: &[GastricSurgeryCase]) -> Result<SchedulePlan, InputError> {
    let analyses: Vec<SurgicalAnalysis> = cases
        .par_iter()
        .map(score_surgical_case)
        .collect::<Result<_, _>>()?;

    let mut schedule: Vec<ScheduleEntry> = analyses
        .iter()
        .map(|analysis| {
            let complexity = Complexity::from_risk(analysis.surgical_risk_score);
            ScheduleEntry {
                case_id: analysis.case_id.clone(),
                recommended_day: complexity.recommended_day().to_string(),
                estimated_duration: analysis.predicted_operative_time,
                priority: complexity,
                team_requirement: complexity.team_requirement().to_string(),
            }
        })
        .collect();
    // Stable sort keeps cohort order within each band
    schedule.sort_by_key(|entry| entry.priority);

    let band = |c: Complexity| schedule.iter().filter(|e| e.priority == c).count();
    let (low, moderate, high) = (
        band(Complexity::Low),
        band(Complexity::Moderate),
        band(Complexity::High),
    );
    let plan = SchedulePlan {
        low_complexity: low,
        moderate_complexity: moderate,
        high_complexity: high,
        resource_recommendations: ResourceRecommendations {
            peak_or_utilization: "Monday-Tuesday".to_string(),
            optimal_case_mix: "Mix high/low complexity daily".to_string(),
            team_planning: "Ensure senior coverage early week".to_string(),
        },
        schedule,
    };

    info!(
        cases = cases.len(),
        high = plan.high_complexity,
        "surgical schedule planned"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(staging: &str, histology: HistologyType, approach: SurgicalApproach) -> GastricSurgeryCase {
        GastricSurgeryCase::new(
            "P1",
            format!("C-{}", staging),
            staging.parse().unwrap(),
            histology,
            GastrectomyType::Subtotal,
            approach,
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_intermediate_case_scores_60_high() {
        let mut c = case("T3N1M0", HistologyType::Adenocarcinoma, SurgicalApproach::Open);
        c.tumor_size_mm = Some(40.0);
        let analysis = score_surgical_case(&c).unwrap();

        assert_eq!(analysis.surgical_risk_score, 60.0);
        assert_eq!(analysis.risk_category, RiskCategory::High);
        assert_eq!(analysis.risk_factors, vec!["Advanced T stage"]);
        assert_eq!(analysis.recommended_approach, SurgicalApproach::Laparoscopic);
        assert_eq!(analysis.recommended_gastrectomy, GastrectomyType::Total);
        assert_eq!(
            analysis.alternative_approaches,
            vec!["Neoadjuvant therapy + surgery", "Open conversion"]
        );
        // Predictions follow the planned open approach
        assert_eq!(analysis.predicted_operative_time, 240);
        assert_eq!(analysis.predicted_blood_loss, 550.0);
        assert_eq!(analysis.predicted_hospital_stay, 12);
        assert_eq!(analysis.lymph_node_target, 20);
        assert_eq!(analysis.resection_quality_score, None);
        assert!(approx(analysis.confidence_score, 0.85));
        assert_eq!(analysis.evidence_level, EvidenceGrade::Moderate);
    }

    #[test]
    fn test_early_small_tumor_goes_endoscopic() {
        let mut c = case("T1aN0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        c.tumor_size_mm = Some(15.0);
        let analysis = score_surgical_case(&c).unwrap();

        assert_eq!(analysis.surgical_risk_score, 10.0);
        assert_eq!(analysis.risk_category, RiskCategory::Low);
        assert_eq!(analysis.recommended_gastrectomy, GastrectomyType::Endoscopic);
        assert_eq!(analysis.recommended_approach, SurgicalApproach::Laparoscopic);
        assert_eq!(analysis.evidence_level, EvidenceGrade::Limited);
        assert!(analysis.alternative_approaches.is_empty());
        assert_eq!(analysis.predicted_operative_time, 210);
        assert_eq!(analysis.predicted_blood_loss, 250.0);
        assert_eq!(analysis.predicted_hospital_stay, 5);
        assert_eq!(analysis.lymph_node_target, 15);
    }

    #[test]
    fn test_evidence_and_alternatives_use_exact_t_category() {
        let t1 = score_surgical_case(&case("T1N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic)).unwrap();
        assert_eq!(t1.evidence_level, EvidenceGrade::High);
        assert_eq!(t1.alternative_approaches, vec!["Robotic-assisted", "Single-port laparoscopy"]);

        let t1b = score_surgical_case(&case("T1bN0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic)).unwrap();
        assert_eq!(t1b.evidence_level, EvidenceGrade::Limited);
        assert!(t1b.alternative_approaches.is_empty());

        let t4a = score_surgical_case(&case("T4aN1M0", HistologyType::Adenocarcinoma, SurgicalApproach::Open)).unwrap();
        assert!(t4a.alternative_approaches.is_empty());
        let t4 = score_surgical_case(&case("T4N1M0", HistologyType::Adenocarcinoma, SurgicalApproach::Open)).unwrap();
        assert_eq!(t4.alternative_approaches, vec!["Neoadjuvant therapy + surgery", "Open conversion"]);
    }

    #[test]
    fn test_t4_recommends_open_and_score_caps() {
        let mut c = case("T4bN3bM1", HistologyType::SignetRing, SurgicalApproach::Open);
        c.tumor_size_mm = Some(60.0);
        let analysis = score_surgical_case(&c).unwrap();

        assert_eq!(analysis.surgical_risk_score, 100.0);
        assert_eq!(analysis.risk_category, RiskCategory::VeryHigh);
        assert_eq!(analysis.recommended_approach, SurgicalApproach::Open);
        assert_eq!(analysis.risk_factors.len(), 5);
        assert_eq!(analysis.evidence_level, EvidenceGrade::Limited);
    }

    #[test]
    fn test_resection_quality_partial_harvest() {
        let mut c = case("T2N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        c.resection_status = Some(ResectionStatus::R0);
        c.lymph_nodes_harvested = Some(10);
        let quality = score_surgical_case(&c).unwrap().resection_quality_score.unwrap();
        assert!(approx(quality, 50.0 + 10.0 / 15.0 * 50.0));

        c.resection_status = Some(ResectionStatus::R2);
        c.lymph_nodes_harvested = Some(40);
        let quality = score_surgical_case(&c).unwrap().resection_quality_score.unwrap();
        assert_eq!(quality, 60.0);
    }

    #[test]
    fn test_confidence_caps_at_one() {
        let mut c = case("T2N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        c.tumor_size_mm = Some(25.0);
        c.tumor_location = Some("antrum".into());
        c.pathology_report = Some("poorly cohesive carcinoma".into());
        assert_eq!(score_surgical_case(&c).unwrap().confidence_score, 1.0);
    }

    #[test]
    fn test_invalid_case_is_rejected() {
        let mut c = case("T2N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Open);
        c.asa_score = Some(6);
        assert!(score_surgical_case(&c).is_err());
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let mut c = case("T3N2M0", HistologyType::SignetRing, SurgicalApproach::Robotic);
        c.tumor_size_mm = Some(55.0);
        assert_eq!(score_surgical_case(&c).unwrap(), score_surgical_case(&c).unwrap());
    }

    #[test]
    fn test_classify_complication_keywords() {
        assert_eq!(classify_complication("Anastomotic_leak"), ClavienDindo::III);
        assert_eq!(classify_complication("sepsis requiring ICU"), ClavienDindo::IV);
        assert_eq!(classify_complication("cardiac_arrest with death"), ClavienDindo::V);
        assert_eq!(classify_complication("ileus"), ClavienDindo::II);
        assert_eq!(classify_complication("nausea"), ClavienDindo::I);
    }

    #[test]
    fn test_kpis_complicated_open_total() {
        let mut c = case("T3N2M0", HistologyType::SignetRing, SurgicalApproach::Open);
        c.gastrectomy_type = GastrectomyType::Total;
        c.age = Some(68);
        c.asa_score = Some(3);
        c.resection_status = Some(ResectionStatus::R0);
        c.lymph_nodes_examined = Some(20);
        c.lymph_nodes_positive = Some(4);
        c.lymphadenectomy_type = Some("D2".into());
        c.proximal_margin_cm = Some(6.0);
        c.distal_margin_cm = Some(3.0);
        c.complications = vec!["anastomotic_leak requiring ICU".into(), "pneumonia".into()];
        c.clavien_dindo_grade = Some(3);
        c.major_comorbidities = vec!["diabetes".into(), "copd".into()];
        c.social_support = Some(false);

        let kpis = analyze_gastrectomy_case(&c).unwrap();

        assert_eq!(kpis.r0_analysis.adequate_margins, Some(true));
        assert_eq!(kpis.lymph_node_analysis.adequate_harvest, Some(true));
        assert!(kpis.lymph_node_analysis.d2_dissection_performed);
        assert!(approx(kpis.lymph_node_analysis.nodal_ratio.unwrap(), 0.2));

        assert_eq!(kpis.length_of_stay.predicted_los_days, 12);
        assert_eq!(kpis.length_of_stay.complication_modifier, 4);
        assert!(!kpis.length_of_stay.eras_eligible);

        assert_eq!(kpis.complications.classification.grade_iv, 1);
        assert_eq!(kpis.complications.classification.grade_ii, 1);
        assert_eq!(kpis.complications.overall_grade, ClavienDindo::IV);
        assert_eq!(kpis.complications.major_complications, 1);

        assert_eq!(kpis.mortality_risk.risk_30_day, 0.2457);
        assert_eq!(kpis.mortality_risk.risk_90_day, 0.4423);
        assert_eq!(kpis.mortality_risk.risk_category, RiskLevel::High);

        assert_eq!(kpis.readmission_risk.readmission_risk_30_day, 0.491);
        assert_eq!(
            kpis.readmission_risk.risk_factors,
            vec![
                "postoperative_complications",
                "multiple_comorbidities",
                "total_gastrectomy",
                "limited_social_support"
            ]
        );
        assert_eq!(kpis.readmission_risk.mitigation_strategies.len(), 4);

        assert_eq!(kpis.quality_metrics.composite_score, 2);
        assert_eq!(kpis.quality_metrics.total_possible, 6);
        assert_eq!(kpis.quality_metrics.quality_percentage, 33.3);
        assert_eq!(kpis.quality_metrics.quality_grade, QualityGrade::NeedsImprovement);
        assert_eq!(
            kpis.recommendations,
            vec![
                "Multidisciplinary review of complications",
                "Enhanced perioperative monitoring",
                "Consider extended observation or enhanced discharge planning"
            ]
        );
    }

    #[test]
    fn test_kpis_uncomplicated_laparoscopic_subtotal() {
        let mut c = case("T1N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        c.age = Some(45);
        c.asa_score = Some(1);
        c.resection_status = Some(ResectionStatus::R0);
        c.lymph_nodes_examined = Some(16);
        c.lymph_nodes_positive = Some(0);

        let kpis = analyze_gastrectomy_case(&c).unwrap();

        assert_eq!(kpis.length_of_stay.predicted_los_days, 5);
        assert!(kpis.length_of_stay.eras_eligible);
        assert_eq!(kpis.complications.overall_grade, ClavienDindo::None);
        assert!(!kpis.complications.any_complication);
        assert_eq!(kpis.lymph_node_analysis.nodal_ratio, Some(0.0));
        assert_eq!(kpis.r0_analysis.adequate_margins, None);
        assert_eq!(kpis.mortality_risk.risk_30_day, 0.016);
        assert_eq!(kpis.mortality_risk.risk_category, RiskLevel::Low);
        assert_eq!(kpis.readmission_risk.readmission_risk_30_day, 0.15);
        assert_eq!(kpis.readmission_risk.risk_category, RiskLevel::Moderate);
        assert_eq!(
            kpis.readmission_risk.mitigation_strategies,
            vec!["Standard discharge planning"]
        );
        assert_eq!(kpis.quality_metrics.composite_score, 5);
        assert_eq!(kpis.quality_metrics.quality_percentage, 83.3);
        assert_eq!(kpis.quality_metrics.quality_grade, QualityGrade::Good);
        assert!(kpis.recommendations.is_empty());
    }

    #[test]
    fn test_kpis_unknown_harvest_excluded_from_total() {
        let c = case("T2N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        let kpis = analyze_gastrectomy_case(&c).unwrap();
        assert_eq!(kpis.quality_metrics.adequate_lymphadenectomy, None);
        assert_eq!(kpis.quality_metrics.total_possible, 5);
        assert!(kpis
            .recommendations
            .contains(&"Consider adjuvant therapy consultation".to_string()));
    }

    #[test]
    fn test_surgery_cohort_summary() {
        assert!(analyze_surgery_cohort(&[]).is_none());

        let mut a = case("T1N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        a.resection_status = Some(ResectionStatus::R0);
        let mut b = case("T3N1M0", HistologyType::SignetRing, SurgicalApproach::Open);
        b.resection_status = Some(ResectionStatus::R1);
        b.complications = vec!["ileus".into(), "pneumonia".into()];
        let c = case("T3N2M0", HistologyType::SignetRing, SurgicalApproach::Open);

        let summary = analyze_surgery_cohort(&[a, b, c]).unwrap();
        assert_eq!(summary.total_cases, 3);
        assert_eq!(summary.completed_surgeries, 2);
        assert_eq!(summary.r0_resection_rate, 0.5);
        assert!(approx(summary.complication_rate, 1.0 / 3.0));
        assert_eq!(summary.t_stages[&TumorCategory::T3], 2);
        assert_eq!(summary.histology[&HistologyType::SignetRing], 2);
        assert_eq!(summary.surgical_approaches[&SurgicalApproach::Open], 2);
        assert_eq!(summary.complications["ileus"], 1);
    }

    #[test]
    fn test_schedule_orders_by_complexity() {
        let low = case("T1N0M0", HistologyType::Adenocarcinoma, SurgicalApproach::Laparoscopic);
        let mut moderate = case("T3N1M0", HistologyType::Adenocarcinoma, SurgicalApproach::Open);
        moderate.tumor_size_mm = Some(40.0);
        let high = case("T4aN2M0", HistologyType::SignetRing, SurgicalApproach::Open);

        let plan = plan_surgical_schedule(&[low, moderate, high]).unwrap();
        let ids: Vec<&str> = plan.schedule.iter().map(|e| e.case_id.as_str()).collect();
        assert_eq!(ids, vec!["C-T4aN2M0", "C-T3N1M0", "C-T1N0M0"]);
        assert_eq!(plan.schedule[0].recommended_day, "Monday/Tuesday");
        assert_eq!(plan.schedule[1].team_requirement, "Experienced surgeon");
        assert_eq!(plan.schedule[2].estimated_duration, 210);
        assert_eq!(
            (plan.low_complexity, plan.moderate_complexity, plan.high_complexity),
            (1, 1, 1)
        );
    }

    #[test]
    fn test_empty_schedule() {
        let plan = plan_surgical_schedule(&[]).unwrap();
        assert!(plan.schedule.is_empty());
        assert_eq!(plan.high_complexity, 0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn tumor() -> impl Strategy<Value = TumorCategory> {
            prop::sample::select(vec![
                TumorCategory::T0,
                TumorCategory::Tis,
                TumorCategory::T1,
                TumorCategory::T1a,
                TumorCategory::T1b,
                TumorCategory::T2,
                TumorCategory::T3,
                TumorCategory::T4,
                TumorCategory::T4a,
                TumorCategory::T4b,
                TumorCategory::Tx,
            ])
        }

        fn node() -> impl Strategy<Value = NodeCategory> {
            prop::sample::select(vec![
                NodeCategory::N0,
                NodeCategory::N1,
                NodeCategory::N2,
                NodeCategory::N3,
                NodeCategory::N3a,
                NodeCategory::N3b,
                NodeCategory::Nx,
            ])
        }

        fn metastasis() -> impl Strategy<Value = MetastasisCategory> {
            prop::sample::select(vec![
                MetastasisCategory::M0,
                MetastasisCategory::M1,
                MetastasisCategory::M1a,
                MetastasisCategory::M1b,
                MetastasisCategory::Mx,
            ])
        }

        proptest! {
            #[test]
            fn risk_score_stays_in_range(
                t in tumor(),
                n in node(),
                m in metastasis(),
                signet in any::<bool>(),
                size in prop::option::of(0.0f64..200.0),
            ) {
                let histology = if signet {
                    HistologyType::SignetRing
                } else {
                    HistologyType::Adenocarcinoma
                };
                let mut c = GastricSurgeryCase::new(
                    "P",
                    "C",
                    crate::entities::staging::TnmStaging::new(t, n, m),
                    histology,
                    GastrectomyType::Total,
                    SurgicalApproach::Open,
                );
                c.tumor_size_mm = size;
                let analysis = score_surgical_case(&c).unwrap();
                prop_assert!((0.0..=100.0).contains(&analysis.surgical_risk_score));
                prop_assert!((0.0..=1.0).contains(&analysis.confidence_score));
            }
        }
    }
}
