//! Precision decision engine
//!
//! Composes the surgical and FLOT analyzers into one treatment-pathway
//! decision per [`IntegratedCase`]. Class and sequence come from exhaustive
//! rule tables over the staging; the numeric outputs are clamped to their
//! documented ranges.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analysis::flot::{score_flot_case, FlotAnalysis};
use crate::analysis::surgery::{score_surgical_case, SurgicalAnalysis};
use crate::analysis::tables::{mean, round_to};
use crate::analysis::EvidenceGrade;
use crate::core::error::InputError;
use crate::entities::integrated::IntegratedCase;
use crate::entities::staging::{NodeCategory, TnmStaging, TumorCategory};
use crate::entities::surgery::SurgicalApproach;

/// Top-level treatment pathway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionClass {
    SurgicalOnly,
    NeoadjuvantSurgery,
    Perioperative,
    Palliative,
    Surveillance,
}

impl std::fmt::Display for DecisionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionClass::SurgicalOnly => write!(f, "SURGICAL_ONLY"),
            DecisionClass::NeoadjuvantSurgery => write!(f, "NEOADJUVANT_SURGERY"),
            DecisionClass::Perioperative => write!(f, "PERIOPERATIVE"),
            DecisionClass::Palliative => write!(f, "PALLIATIVE"),
            DecisionClass::Surveillance => write!(f, "SURVEILLANCE"),
        }
    }
}

/// Order in which treatments are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreatmentSequence {
    SurgeryFirst,
    FlotThenSurgery,
    FlotSurgeryFlot,
    FlotOnly,
    BestSupportiveCare,
}

impl TreatmentSequence {
    /// Sequences that start with neoadjuvant FLOT and end in surgery
    pub fn is_neoadjuvant(self) -> bool {
        matches!(
            self,
            TreatmentSequence::FlotThenSurgery | TreatmentSequence::FlotSurgeryFlot
        )
    }

    pub fn includes_surgery(self) -> bool {
        self == TreatmentSequence::SurgeryFirst || self.is_neoadjuvant()
    }
}

impl std::fmt::Display for TreatmentSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreatmentSequence::SurgeryFirst => write!(f, "SURGERY_FIRST"),
            TreatmentSequence::FlotThenSurgery => write!(f, "FLOT_THEN_SURGERY"),
            TreatmentSequence::FlotSurgeryFlot => write!(f, "FLOT_SURGERY_FLOT"),
            TreatmentSequence::FlotOnly => write!(f, "FLOT_ONLY"),
            TreatmentSequence::BestSupportiveCare => write!(f, "BEST_SUPPORTIVE_CARE"),
        }
    }
}

/// Quality of the evidence behind an integrated decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionEvidence {
    High,
    Moderate,
    Low,
    /// Reserved for manually entered decisions
    ExpertOpinion,
}

impl DecisionEvidence {
    pub const ALL: [DecisionEvidence; 4] = [
        DecisionEvidence::High,
        DecisionEvidence::Moderate,
        DecisionEvidence::Low,
        DecisionEvidence::ExpertOpinion,
    ];
}

impl std::fmt::Display for DecisionEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionEvidence::High => write!(f, "high"),
            DecisionEvidence::Moderate => write!(f, "moderate"),
            DecisionEvidence::Low => write!(f, "low"),
            DecisionEvidence::ExpertOpinion => write!(f, "expert_opinion"),
        }
    }
}

/// Integrated treatment decision for one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionDecision {
    pub case_id: String,

    pub decision_class: DecisionClass,

    pub recommended_sequence: TreatmentSequence,

    pub treatment_rationale: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgery_recommendation: Option<String>,

    pub chemotherapy_recommendation: String,

    /// Treatment phase to timing guidance
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub timing_recommendations: BTreeMap<String, String>,

    /// Mean of the available risk components (0-100)
    pub overall_risk_score: f64,

    /// Surgical risk score, 50 without a surgery case
    pub surgical_risk: f64,

    /// FLOT toxicity burden, 50 without a FLOT case
    pub chemotherapy_risk: f64,

    /// Months; requires staging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_survival_months: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_pfs_months: Option<f64>,

    /// 20-100
    pub predicted_quality_of_life: f64,

    pub alternative_approaches: Vec<String>,

    pub contraindications: Vec<String>,

    /// 0-1
    pub confidence_score: f64,

    pub evidence_level: DecisionEvidence,

    /// Multidisciplinary agreement (0-1)
    pub consensus_score: f64,

    pub monitoring_recommendations: Vec<String>,

    pub decision_review_triggers: Vec<String>,
}

/// Component analyses a decision is built from
struct Components {
    surgery: Option<SurgicalAnalysis>,
    flot: Option<FlotAnalysis>,
}

fn decision_class(case: &IntegratedCase, staging: Option<TnmStaging>) -> DecisionClass {
    let Some(staging) = staging else {
        return DecisionClass::Surveillance;
    };
    let (t, n) = (staging.tumor, staging.node);

    if staging.metastasis.is_metastatic() {
        return DecisionClass::Palliative;
    }
    if matches!(t, TumorCategory::T1 | TumorCategory::T1a) && n == NodeCategory::N0 {
        return DecisionClass::SurgicalOnly;
    }
    if matches!(t, TumorCategory::T1b | TumorCategory::T2) && n.is_limited() {
        let frail = case.age.is_some_and(|age| age > 75)
            && case.performance_status.is_some_and(|ecog| ecog >= 2);
        return if frail {
            DecisionClass::SurgicalOnly
        } else {
            DecisionClass::NeoadjuvantSurgery
        };
    }
    if t.is_advanced() || n.is_extensive() {
        return DecisionClass::Perioperative;
    }
    DecisionClass::NeoadjuvantSurgery
}

fn treatment_sequence(class: DecisionClass, surgery: Option<&SurgicalAnalysis>) -> TreatmentSequence {
    match class {
        DecisionClass::SurgicalOnly => TreatmentSequence::SurgeryFirst,
        DecisionClass::NeoadjuvantSurgery => TreatmentSequence::FlotThenSurgery,
        DecisionClass::Perioperative => TreatmentSequence::FlotSurgeryFlot,
        DecisionClass::Palliative => {
            if surgery.is_some_and(|s| s.surgical_risk_score < 60.0) {
                TreatmentSequence::FlotThenSurgery
            } else {
                TreatmentSequence::FlotOnly
            }
        }
        DecisionClass::Surveillance => TreatmentSequence::BestSupportiveCare,
    }
}

fn rationale(staging: Option<TnmStaging>, class: DecisionClass) -> String {
    let basis = match staging {
        Some(staging) => format!("Based on staging ({})", staging),
        None => "Without staging information".to_string(),
    };
    let reason = match class {
        DecisionClass::SurgicalOnly => "early-stage disease is best treated with upfront surgery",
        DecisionClass::NeoadjuvantSurgery => "neoadjuvant therapy may improve surgical outcomes",
        DecisionClass::Perioperative => {
            "perioperative therapy is standard for locally advanced disease"
        }
        DecisionClass::Palliative => "metastatic disease requires systemic therapy approach",
        DecisionClass::Surveillance => "surveillance is appropriate for current disease status",
    };
    format!("{}, {}", basis, reason)
}

fn surgery_recommendation(surgery: Option<&SurgicalAnalysis>) -> Option<String> {
    surgery.map(|s| {
        format!(
            "Recommended: {} via {} approach",
            s.recommended_gastrectomy, s.recommended_approach
        )
    })
}

fn chemotherapy_recommendation(case: &IntegratedCase, flot: Option<&FlotAnalysis>) -> String {
    if case.flot_case.is_none() {
        return "FLOT protocol (4 cycles preoperative, 4 cycles postoperative)".to_string();
    }
    match flot {
        Some(f) if f.additional_therapy_needed => {
            "Modified FLOT protocol with dose adjustments based on toxicity profile".to_string()
        }
        Some(_) => "Standard FLOT protocol as per analysis".to_string(),
        None => "FLOT protocol with monitoring".to_string(),
    }
}

fn timing_recommendations(sequence: TreatmentSequence) -> BTreeMap<String, String> {
    let entries: &[(&str, &str)] = match sequence {
        TreatmentSequence::SurgeryFirst => &[
            ("surgery", "Within 4-6 weeks"),
            ("adjuvant", "Within 8-12 weeks post-surgery if indicated"),
        ],
        TreatmentSequence::FlotThenSurgery => &[
            ("neoadjuvant", "4 cycles FLOT (12 weeks)"),
            ("surgery", "4-6 weeks after completion of neoadjuvant therapy"),
        ],
        TreatmentSequence::FlotSurgeryFlot => &[
            ("preoperative", "4 cycles FLOT (12 weeks)"),
            ("surgery", "4-6 weeks after preoperative therapy"),
            ("postoperative", "6-8 weeks after surgery (4 cycles FLOT)"),
        ],
        TreatmentSequence::FlotOnly => &[
            ("chemotherapy", "Initiate within 2-4 weeks"),
            ("restaging", "Every 2-3 cycles"),
        ],
        TreatmentSequence::BestSupportiveCare => &[],
    };
    entries
        .iter()
        .map(|(phase, timing)| (phase.to_string(), timing.to_string()))
        .collect()
}

/// Age, ECOG and comorbidity risk; `None` when none of them is recorded
fn patient_factor_risk(case: &IntegratedCase) -> Option<f64> {
    if case.age.is_none() && case.performance_status.is_none() && case.comorbidities.is_empty() {
        return None;
    }
    let mut risk: f64 = 0.0;
    if case.age.is_some_and(|age| age > 70) {
        risk += 20.0;
    }
    if case.performance_status.is_some_and(|ecog| ecog >= 2) {
        risk += 30.0;
    }
    if case.comorbidities.len() > 2 {
        risk += 15.0;
    }
    Some(risk.min(100.0))
}

fn overall_risk(case: &IntegratedCase, parts: &Components) -> f64 {
    let components: Vec<f64> = [
        parts.surgery.as_ref().map(|s| s.surgical_risk_score),
        parts.flot.as_ref().map(|f| f.toxicity_burden_score),
        patient_factor_risk(case),
    ]
    .into_iter()
    .flatten()
    .collect();
    mean(&components).map_or(50.0, |risk| risk.clamp(0.0, 100.0))
}

fn predicted_survival(case: &IntegratedCase, staging: Option<TnmStaging>, parts: &Components) -> Option<f64> {
    let staging = staging?;
    let mut months = if staging.metastasis.is_metastatic() {
        15.0
    } else if staging.tumor.is_t4_class() {
        36.0
    } else if matches!(staging.tumor, TumorCategory::T2 | TumorCategory::T3) {
        60.0
    } else {
        84.0
    };

    if let Some(response) = parts.flot.as_ref().and_then(|f| f.response_score) {
        if response >= 80.0 {
            months *= 1.3;
        } else if response >= 60.0 {
            months *= 1.2;
        } else if response < 40.0 {
            months *= 0.8;
        }
    }

    if let Some(quality) = parts.surgery.as_ref().and_then(|s| s.resection_quality_score) {
        if quality >= 80.0 {
            months *= 1.2;
        } else if quality < 60.0 {
            months *= 0.9;
        }
    }

    if case.age.is_some_and(|age| age > 75) {
        months *= 0.85;
    }
    if case.performance_status.is_some_and(|ecog| ecog >= 2) {
        months *= 0.8;
    }
    Some(round_to(months, 1))
}

fn predicted_quality_of_life(case: &IntegratedCase, parts: &Components) -> f64 {
    let mut qol: f64 = 70.0;

    if let Some(flot) = &parts.flot {
        if flot.toxicity_burden_score > 60.0 {
            qol -= 20.0;
        } else if flot.toxicity_burden_score < 30.0 {
            qol += 10.0;
        }
    }

    if let Some(surgery) = &parts.surgery {
        match surgery.recommended_approach {
            SurgicalApproach::Laparoscopic => qol += 10.0,
            SurgicalApproach::Open => qol -= 5.0,
            SurgicalApproach::Robotic | SurgicalApproach::Endoscopic => {}
        }
    }

    match case.performance_status {
        Some(0) => qol += 15.0,
        Some(ecog) if ecog >= 2 => qol -= 25.0,
        _ => {}
    }

    qol.clamp(20.0, 100.0)
}

fn alternatives(class: DecisionClass) -> Vec<String> {
    let options: &[&str] = match class {
        DecisionClass::SurgicalOnly => &[
            "Surveillance with delayed surgery",
            "Adjuvant chemotherapy post-surgery",
        ],
        DecisionClass::NeoadjuvantSurgery => &["Upfront surgery", "Perioperative chemotherapy"],
        DecisionClass::Perioperative => &["Neoadjuvant therapy only", "Modified chemotherapy regimen"],
        DecisionClass::Palliative => &[
            "Best supportive care",
            "Palliative surgery",
            "Immunotherapy if MSI-H",
        ],
        DecisionClass::Surveillance => &[],
    };
    options.iter().map(|s| s.to_string()).collect()
}

fn contraindications(case: &IntegratedCase) -> Vec<String> {
    let mut found = Vec::new();
    if case.performance_status.is_some_and(|ecog| ecog >= 3) {
        found.push("Poor performance status limits aggressive therapy".to_string());
    }
    if case.age.is_some_and(|age| age > 80) && case.comorbidities.len() > 2 {
        found.push("Advanced age with multiple comorbidities".to_string());
    }

    let comorbidities = case.normalized_comorbidities();
    let has = |name: &str| comorbidities.iter().any(|c| c == name);
    if has("heart_failure") {
        found.push("Heart failure may contraindicate anthracycline-based therapy".to_string());
    }
    if has("renal_failure") {
        found.push("Renal dysfunction may limit platinum-based therapy".to_string());
    }
    found
}

fn confidence(case: &IntegratedCase, parts: &Components) -> f64 {
    let mut completeness = 0.5;
    if case.gastric_surgery_case.is_some() {
        completeness += 0.2;
    }
    if case.flot_case.is_some() {
        completeness += 0.2;
    }
    if case.age.is_some() && case.performance_status.is_some() {
        completeness += 0.1;
    }

    let components: Vec<f64> = [
        parts.surgery.as_ref().map(|s| s.confidence_score),
        parts.flot.as_ref().map(|f| f.confidence_score),
        Some(completeness),
    ]
    .into_iter()
    .flatten()
    .collect();
    mean(&components).map_or(completeness, |c| c.clamp(0.0, 1.0))
}

fn evidence_level(parts: &Components) -> DecisionEvidence {
    let surgery = parts.surgery.as_ref().map(|s| s.evidence_level);
    let flot = parts.flot.as_ref().map(|f| f.evidence_level);
    let supported = |grade: Option<EvidenceGrade>| {
        matches!(grade, Some(EvidenceGrade::High) | Some(EvidenceGrade::Moderate))
    };

    if surgery == Some(EvidenceGrade::High) && flot == Some(EvidenceGrade::High) {
        DecisionEvidence::High
    } else if supported(surgery) || supported(flot) {
        DecisionEvidence::Moderate
    } else {
        DecisionEvidence::Low
    }
}

fn mentions_surgery(text: &Option<String>) -> bool {
    text.as_deref()
        .is_some_and(|t| t.to_lowercase().contains("surgery"))
}

fn consensus(case: &IntegratedCase) -> f64 {
    let mut consensus: f64 = 0.7;
    if mentions_surgery(&case.surgeon_preference) && mentions_surgery(&case.oncologist_recommendation) {
        consensus += 0.2;
    }
    if case.patient_preference.is_some() {
        consensus += 0.1;
    }
    consensus.min(1.0)
}

fn monitoring(sequence: TreatmentSequence) -> Vec<String> {
    let mut items = Vec::new();
    if sequence.is_neoadjuvant() {
        items.extend([
            "Complete blood count before each cycle",
            "Comprehensive metabolic panel every 2 cycles",
            "Performance status assessment before each cycle",
            "Restaging imaging after neoadjuvant therapy",
        ]);
    }
    if sequence.includes_surgery() {
        items.extend([
            "Post-operative complications monitoring",
            "Nutritional status assessment",
            "Regular imaging for recurrence surveillance",
        ]);
    }
    items.push("Quality of life assessments");
    items.into_iter().map(String::from).collect()
}

fn review_triggers(sequence: TreatmentSequence) -> Vec<String> {
    let mut triggers = vec![
        "Disease progression on imaging",
        "Unacceptable toxicity (Grade 3+ persistent)",
        "Significant performance status decline",
        "Patient preference change",
    ];
    if sequence.is_neoadjuvant() {
        triggers.extend([
            "Poor response to neoadjuvant therapy",
            "Surgical complications affecting adjuvant therapy timing",
        ]);
    }
    triggers.into_iter().map(String::from).collect()
}

/// Produce the integrated decision for one case
///
/// Nested surgery and FLOT cases are scored with their own analyzers; an
/// invalid nested case fails the whole decision.
pub fn decide(case: &IntegratedCase) -> Result<PrecisionDecision, InputError> {
    case.validate()?;

    let parts = Components {
        surgery: case.gastric_surgery_case.as_ref().map(score_surgical_case).transpose()?,
        flot: case.flot_case.as_ref().map(score_flot_case).transpose()?,
    };
    let staging = case.staging();

    let class = decision_class(case, staging);
    let sequence = treatment_sequence(class, parts.surgery.as_ref());
    let survival = predicted_survival(case, staging, &parts);

    let decision = PrecisionDecision {
        case_id: case.case_id.clone(),
        decision_class: class,
        recommended_sequence: sequence,
        treatment_rationale: rationale(staging, class),
        surgery_recommendation: surgery_recommendation(parts.surgery.as_ref()),
        chemotherapy_recommendation: chemotherapy_recommendation(case, parts.flot.as_ref()),
        timing_recommendations: timing_recommendations(sequence),
        overall_risk_score: overall_risk(case, &parts),
        surgical_risk: parts.surgery.as_ref().map_or(50.0, |s| s.surgical_risk_score),
        chemotherapy_risk: parts.flot.as_ref().map_or(50.0, |f| f.toxicity_burden_score),
        predicted_survival_months: survival,
        predicted_pfs_months: survival.map(|os| round_to(os * 0.7, 1)),
        predicted_quality_of_life: predicted_quality_of_life(case, &parts),
        alternative_approaches: alternatives(class),
        contraindications: contraindications(case),
        confidence_score: confidence(case, &parts),
        evidence_level: evidence_level(&parts),
        consensus_score: consensus(case),
        monitoring_recommendations: monitoring(sequence),
        decision_review_triggers: review_triggers(sequence),
    };

    debug!(
        case_id = %case.case_id,
        class = %decision.decision_class,
        sequence = %decision.recommended_sequence,
        risk = decision.overall_risk_score,
        "decision made"
    );
    Ok(decision)
}

/// Decide every case in parallel, in cohort order
pub fn decide_all(cases: &[IntegratedCase]) -> Result<Vec<PrecisionDecision>, InputError> {
    cases.par_iter().map(decide).collect()
}

fn fraction(decisions: &[PrecisionDecision], pred: impl Fn(&PrecisionDecision) -> bool) -> f64 {
    if decisions.is_empty() {
        return 0.0;
    }
    decisions.iter().filter(|d| pred(d)).count() as f64 / decisions.len() as f64
}

/// Count per evidence level, listing every level even when unused
fn evidence_distribution<'a>(
    decisions: impl IntoIterator<Item = &'a PrecisionDecision>,
) -> BTreeMap<DecisionEvidence, usize> {
    let mut counts: BTreeMap<DecisionEvidence, usize> =
        DecisionEvidence::ALL.iter().map(|level| (*level, 0)).collect();
    for d in decisions {
        *counts.entry(d.evidence_level).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Cohort analytics
// ============================================================================

/// Decisions across a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionCohortSummary {
    pub total_cases: usize,
    pub average_risk_score: f64,
    pub average_confidence: f64,
    pub decision_classes: BTreeMap<DecisionClass, usize>,
    pub treatment_sequences: BTreeMap<TreatmentSequence, usize>,
    /// Overall risk ≤30
    pub low_risk_cases: usize,
    pub moderate_risk_cases: usize,
    /// Overall risk >60
    pub high_risk_cases: usize,
    /// Share of decisions with confidence ≥0.8
    pub high_confidence_rate: f64,
    /// Share of decisions with consensus ≥0.8
    pub consensus_achievement_rate: f64,
    pub evidence_level_distribution: BTreeMap<DecisionEvidence, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_predicted_survival: Option<f64>,
    pub average_predicted_qol: f64,
}

/// Decide every case and summarize; `None` for an empty cohort
pub fn analyze_decision_cohort(
    cases: &[IntegratedCase],
) -> Result<Option<DecisionCohortSummary>, InputError> {
    if cases.is_empty() {
        return Ok(None);
    }
    let decisions = decide_all(cases)?;

    let risks: Vec<f64> = decisions.iter().map(|d| d.overall_risk_score).collect();
    let confidences: Vec<f64> = decisions.iter().map(|d| d.confidence_score).collect();
    let survivals: Vec<f64> = decisions
        .iter()
        .filter_map(|d| d.predicted_survival_months)
        .collect();
    let qols: Vec<f64> = decisions.iter().map(|d| d.predicted_quality_of_life).collect();

    let mut decision_classes = BTreeMap::new();
    let mut treatment_sequences = BTreeMap::new();
    for d in &decisions {
        *decision_classes.entry(d.decision_class).or_insert(0) += 1;
        *treatment_sequences.entry(d.recommended_sequence).or_insert(0) += 1;
    }

    let summary = DecisionCohortSummary {
        total_cases: decisions.len(),
        average_risk_score: mean(&risks).unwrap_or_default(),
        average_confidence: mean(&confidences).unwrap_or_default(),
        decision_classes,
        treatment_sequences,
        low_risk_cases: risks.iter().filter(|r| **r <= 30.0).count(),
        moderate_risk_cases: risks.iter().filter(|r| **r > 30.0 && **r <= 60.0).count(),
        high_risk_cases: risks.iter().filter(|r| **r > 60.0).count(),
        high_confidence_rate: fraction(&decisions, |d| d.confidence_score >= 0.8),
        consensus_achievement_rate: fraction(&decisions, |d| d.consensus_score >= 0.8),
        evidence_level_distribution: evidence_distribution(&decisions),
        average_predicted_survival: mean(&survivals),
        average_predicted_qol: mean(&qols).unwrap_or_default(),
    };

    info!(
        cases = summary.total_cases,
        high_risk = summary.high_risk_cases,
        "decision cohort analyzed"
    );
    Ok(Some(summary))
}

/// Shared traits of a group of decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPattern {
    pub decisions: usize,
    /// Ties go to the earlier sequence in pathway order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_common_sequence: Option<TreatmentSequence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_risk_score: Option<f64>,
    pub evidence_levels: BTreeMap<DecisionEvidence, usize>,
}

impl DecisionPattern {
    fn of(decisions: &[&PrecisionDecision]) -> Self {
        let mut sequences: BTreeMap<TreatmentSequence, usize> = BTreeMap::new();
        for d in decisions {
            *sequences.entry(d.recommended_sequence).or_insert(0) += 1;
        }
        let mut most_common: Option<(TreatmentSequence, usize)> = None;
        for (sequence, count) in sequences {
            if most_common.map_or(true, |(_, best)| count > best) {
                most_common = Some((sequence, count));
            }
        }

        let risks: Vec<f64> = decisions.iter().map(|d| d.overall_risk_score).collect();
        Self {
            decisions: decisions.len(),
            most_common_sequence: most_common.map(|(sequence, _)| sequence),
            average_risk_score: mean(&risks),
            evidence_levels: evidence_distribution(decisions.iter().copied()),
        }
    }
}

/// Mean confidence of two complementary groups of decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSplit {
    /// Cases with the attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<f64>,
    /// Cases without it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub without: Option<f64>,
}

impl ConfidenceSplit {
    fn by(
        cases: &[IntegratedCase],
        decisions: &[PrecisionDecision],
        has: impl Fn(&IntegratedCase) -> bool,
    ) -> Self {
        let (mut with, mut without) = (Vec::new(), Vec::new());
        for (case, decision) in cases.iter().zip(decisions) {
            if has(case) {
                with.push(decision.confidence_score);
            } else {
                without.push(decision.confidence_score);
            }
        }
        Self {
            with: mean(&with),
            without: mean(&without),
        }
    }

    /// Confidence gained by the attribute; a missing group counts as 0
    pub fn benefit(&self) -> f64 {
        self.with.unwrap_or(0.0) - self.without.unwrap_or(0.0)
    }
}

/// Diagnostics on how the decision rules behave over a cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOptimization {
    pub high_confidence_rate: f64,
    /// Decisions with confidence ≥0.8
    pub high_confidence_patterns: DecisionPattern,
    /// Decisions with confidence <0.6
    pub low_confidence_patterns: DecisionPattern,
    /// Split on having both a surgery and a FLOT case
    pub data_completeness: ConfidenceSplit,
    /// Split on having any staged component case
    pub staging_clarity: ConfidenceSplit,
    pub recommendations: Vec<String>,
}

fn optimization_recommendations(decisions: &[PrecisionDecision]) -> Vec<String> {
    let mut recommendations = Vec::new();
    let confidences: Vec<f64> = decisions.iter().map(|d| d.confidence_score).collect();
    if mean(&confidences).is_some_and(|c| c < 0.7) {
        recommendations.push("Improve data collection protocols to increase decision confidence".to_string());
    }
    if fraction(decisions, |d| d.overall_risk_score > 70.0) > 0.3 {
        recommendations.push(
            "Consider risk mitigation strategies for high-risk patient population".to_string(),
        );
    }
    if fraction(decisions, |d| d.consensus_score < 0.6) > 0.2 {
        recommendations.push("Improve multidisciplinary communication and decision protocols".to_string());
    }
    recommendations
}

/// Decide every case and report where the rules are least certain
pub fn optimize_decision_algorithms(
    cases: &[IntegratedCase],
) -> Result<Option<DecisionOptimization>, InputError> {
    if cases.is_empty() {
        return Ok(None);
    }
    let decisions = decide_all(cases)?;

    let high: Vec<&PrecisionDecision> = decisions.iter().filter(|d| d.confidence_score >= 0.8).collect();
    let low: Vec<&PrecisionDecision> = decisions.iter().filter(|d| d.confidence_score < 0.6).collect();

    let optimization = DecisionOptimization {
        high_confidence_rate: high.len() as f64 / decisions.len() as f64,
        high_confidence_patterns: DecisionPattern::of(&high),
        low_confidence_patterns: DecisionPattern::of(&low),
        data_completeness: ConfidenceSplit::by(cases, &decisions, |c| {
            c.gastric_surgery_case.is_some() && c.flot_case.is_some()
        }),
        staging_clarity: ConfidenceSplit::by(cases, &decisions, |c| c.staging().is_some()),
        recommendations: optimization_recommendations(&decisions),
    };

    info!(
        cases = decisions.len(),
        recommendations = optimization.recommendations.len(),
        "decision algorithms reviewed"
    );
    Ok(Some(optimization))
}
