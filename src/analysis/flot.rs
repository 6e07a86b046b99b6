//! FLOT chemotherapy analytics
//!
//! [`score_flot_case`] measures treatment delivery, response, toxicity and
//! readiness for surgery after perioperative FLOT. [`analyze_flot_regimen`]
//! adds regimen-level detail: applicability, relative dose intensity, CTCAE
//! toxicity buckets and best response. The cohort functions describe a
//! treated population and look for protocol-level patterns.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analysis::tables::{mean, round_to};
use crate::analysis::EvidenceGrade;
use crate::core::error::InputError;
use crate::entities::case::HistologyType;
use crate::entities::flot::{FlotCase, FlotPhase, ResponseGrade, ToxicityGrade};

/// How well treatment was tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tolerability {
    Excellent,
    Good,
    Acceptable,
    Poor,
    Severe,
    Unknown,
}

impl std::fmt::Display for Tolerability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tolerability::Excellent => "Excellent",
            Tolerability::Good => "Good",
            Tolerability::Acceptable => "Acceptable",
            Tolerability::Poor => "Poor",
            Tolerability::Severe => "Severe",
            Tolerability::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Per-case FLOT assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlotAnalysis {
    pub case_id: String,

    /// Completed over planned cycles (0-1)
    pub completion_rate: f64,

    /// Completion percent less dose-reduction and delay penalties (0-100)
    pub adherence_score: f64,

    /// Pathological response, else radiological (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_score: Option<f64>,

    pub staging_improvement: bool,

    pub downstaging_success: bool,

    /// Grade, hospitalization, infection and dose-reduction burden (0-100)
    pub toxicity_burden_score: f64,

    pub tolerability_rating: Tolerability,

    /// Post-treatment fitness for surgery (0-100); needs post-FLOT ECOG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surgical_fitness_score: Option<f64>,

    /// Post-treatment nutrition (0-100); needs post-FLOT albumin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutritional_status_score: Option<f64>,

    pub surgery_recommendation: String,

    pub timing_recommendation: String,

    pub additional_therapy_needed: bool,

    pub treatment_quality_score: f64,

    pub outcome_prediction: String,

    pub confidence_score: f64,

    pub evidence_level: EvidenceGrade,
}

fn completion_rate(case: &FlotCase) -> f64 {
    case.completed_cycles as f64 / case.planned_cycles as f64
}

fn adherence_score(case: &FlotCase) -> f64 {
    let penalty = case.dose_reductions as f64 * 5.0 + case.treatment_delays as f64 * 3.0;
    (completion_rate(case) * 100.0 - penalty).max(0.0)
}

fn response_score(case: &FlotCase) -> Option<f64> {
    case.pathological_response
        .or(case.radiological_response)
        .map(ResponseGrade::score)
}

fn downstaging_success(case: &FlotCase) -> bool {
    let Some(post_t) = case.post_t_stage else {
        return false;
    };
    let t_down = post_t.numeric_order() < case.initial_t_stage.numeric_order();
    let n_down = case
        .post_n_stage
        .is_some_and(|post_n| post_n.numeric_order() < case.initial_n_stage.numeric_order());
    t_down || n_down
}

fn staging_improvement(case: &FlotCase) -> bool {
    if downstaging_success(case) {
        return true;
    }
    let Some(post) = case.post_staging() else {
        return false;
    };
    match (post.stage_group().rank(), case.initial_staging().stage_group().rank()) {
        (Some(after), Some(before)) => after < before,
        _ => false,
    }
}

fn toxicity_burden(case: &FlotCase) -> f64 {
    let grade_points = case.max_toxicity_grade.map_or(0.0, ToxicityGrade::burden_points);
    let score = grade_points
        + case.hospitalizations as f64 * 10.0
        + case.infections as f64 * 15.0
        + case.dose_reductions as f64 * 5.0;
    score.min(100.0)
}

fn tolerability(toxicity: f64, completion: f64) -> Tolerability {
    if toxicity <= 20.0 && completion >= 0.8 {
        Tolerability::Excellent
    } else if toxicity <= 40.0 && completion >= 0.6 {
        Tolerability::Good
    } else if toxicity <= 60.0 && completion >= 0.4 {
        Tolerability::Acceptable
    } else {
        Tolerability::Poor
    }
}

fn surgical_fitness(case: &FlotCase) -> Option<f64> {
    let ecog = case.post_flot_ecog?;
    let mut score = 80.0;
    score += match ecog {
        0 => 20.0,
        1 => 10.0,
        _ => -30.0,
    };
    match case.weight_loss_pct() {
        Some(loss) if loss > 15.0 => score -= 25.0,
        Some(loss) if loss > 10.0 => score -= 15.0,
        Some(loss) if loss > 5.0 => score -= 5.0,
        _ => {}
    }
    match case.post_flot_albumin {
        Some(albumin) if albumin >= 3.5 => score += 10.0,
        Some(albumin) if albumin < 2.5 => score -= 20.0,
        _ => {}
    }
    Some(f64::clamp(score, 0.0, 100.0))
}

fn nutritional_status(case: &FlotCase) -> Option<f64> {
    let albumin = case.post_flot_albumin?;
    let mut score = 50.0;
    if albumin >= 4.0 {
        score += 30.0;
    } else if albumin >= 3.5 {
        score += 20.0;
    } else if albumin >= 3.0 {
        score += 10.0;
    } else if albumin < 2.5 {
        score -= 30.0;
    }
    match case.weight_loss_pct() {
        Some(loss) if loss <= 5.0 => score += 20.0,
        Some(loss) if loss <= 10.0 => score += 10.0,
        Some(loss) if loss > 15.0 => score -= 30.0,
        _ => {}
    }
    Some(f64::clamp(score, 0.0, 100.0))
}

fn surgery_recommendation(case: &FlotCase, response: Option<f64>, fitness: Option<f64>) -> &'static str {
    let good_response = response.is_some_and(|r| r >= 50.0);
    let good_fitness = fitness.is_some_and(|f| f >= 60.0);
    let completed = case.completed_cycles as f64 >= case.planned_cycles as f64 * 0.75;

    if good_response && good_fitness && completed {
        "Proceed with surgery"
    } else if fitness.is_some_and(|f| f < 40.0) {
        "Delay surgery - optimize fitness"
    } else if response.is_some_and(|r| r < 30.0) {
        "Consider alternative therapy"
    } else {
        "Surgery feasible with optimization"
    }
}

fn timing_recommendation(fitness: Option<f64>) -> &'static str {
    match fitness {
        Some(f) if f >= 80.0 => "Surgery within 4-6 weeks",
        Some(f) if f >= 60.0 => "Surgery within 6-8 weeks with optimization",
        _ => "Delay surgery - nutritional optimization needed",
    }
}

fn treatment_quality(completion: f64, adherence: f64, response: Option<f64>, toxicity: f64) -> f64 {
    let quality = completion * 30.0
        + adherence / 100.0 * 25.0
        + response.unwrap_or(50.0) / 100.0 * 30.0
        + (100.0 - toxicity) / 100.0 * 15.0;
    quality.min(100.0)
}

fn outcome_prediction(quality: f64) -> &'static str {
    if quality >= 80.0 {
        "Excellent prognosis"
    } else if quality >= 60.0 {
        "Good prognosis"
    } else if quality >= 40.0 {
        "Moderate prognosis"
    } else {
        "Guarded prognosis"
    }
}

fn confidence(case: &FlotCase) -> f64 {
    let mut confidence = 0.7;
    if case.radiological_response.is_some() || case.pathological_response.is_some() {
        confidence += 0.1;
    }
    if case.post_flot_albumin.is_some() {
        confidence += 0.05;
    }
    if case.post_flot_ecog.is_some() {
        confidence += 0.05;
    }
    if case.baseline_weight_kg.is_some() && case.post_flot_weight_kg.is_some() {
        confidence += 0.05;
    }
    if case.max_toxicity_grade.is_some() {
        confidence += 0.05;
    }
    f64::min(confidence, 1.0)
}

fn evidence_level(case: &FlotCase, completion: f64) -> EvidenceGrade {
    if completion >= 0.8 && case.pathological_response.is_some() {
        EvidenceGrade::High
    } else if completion >= 0.6 && case.radiological_response.is_some() {
        EvidenceGrade::Moderate
    } else {
        EvidenceGrade::Limited
    }
}

/// Score one FLOT case
pub fn score_flot_case(case: &FlotCase) -> Result<FlotAnalysis, InputError> {
    case.validate()?;

    let completion = completion_rate(case);
    let adherence = adherence_score(case);
    let response = response_score(case);
    let toxicity = toxicity_burden(case);
    let fitness = surgical_fitness(case);
    let quality = treatment_quality(completion, adherence, response, toxicity);

    let analysis = FlotAnalysis {
        case_id: case.case_id.clone(),
        completion_rate: completion,
        adherence_score: adherence,
        response_score: response,
        staging_improvement: staging_improvement(case),
        downstaging_success: downstaging_success(case),
        toxicity_burden_score: toxicity,
        tolerability_rating: tolerability(toxicity, completion),
        surgical_fitness_score: fitness,
        nutritional_status_score: nutritional_status(case),
        surgery_recommendation: surgery_recommendation(case, response, fitness).to_string(),
        timing_recommendation: timing_recommendation(fitness).to_string(),
        additional_therapy_needed: response.is_some_and(|r| r < 40.0) || completion < 0.6,
        treatment_quality_score: quality,
        outcome_prediction: outcome_prediction(quality).to_string(),
        confidence_score: confidence(case),
        evidence_level: evidence_level(case, completion),
    };

    debug!(
        case_id = %case.case_id,
        completion,
        toxicity,
        quality,
        "FLOT case scored"
    );
    Ok(analysis)
}

// ============================================================================
// Regimen analysis
// ============================================================================

/// FLOT candidacy band from the applicability percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateRating {
    #[serde(rename = "Excellent candidate")]
    Excellent,
    #[serde(rename = "Good candidate")]
    Good,
    #[serde(rename = "Marginal candidate")]
    Marginal,
    #[serde(rename = "Poor candidate")]
    Poor,
}

impl CandidateRating {
    fn from_percentage(pct: f64) -> Self {
        if pct >= 80.0 {
            CandidateRating::Excellent
        } else if pct >= 65.0 {
            CandidateRating::Good
        } else if pct >= 50.0 {
            CandidateRating::Marginal
        } else {
            CandidateRating::Poor
        }
    }
}

impl std::fmt::Display for CandidateRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateRating::Excellent => write!(f, "Excellent candidate"),
            CandidateRating::Good => write!(f, "Good candidate"),
            CandidateRating::Marginal => write!(f, "Marginal candidate"),
            CandidateRating::Poor => write!(f, "Poor candidate"),
        }
    }
}

/// Per-criterion wording; criteria without data stay empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicabilityCriteria {
    pub performance_status: Option<String>,
    pub organ_function: String,
    pub tumor_stage: String,
    pub histology: Option<String>,
    pub age_fitness: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicability {
    /// Points earned over points available, percent
    pub applicability_score: f64,
    pub criteria_assessment: ApplicabilityCriteria,
    pub recommendation: CandidateRating,
    /// "earned/available"
    pub raw_score: String,
}

/// Relative dose intensity band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RdiCategory {
    Optimal,
    Adequate,
    Suboptimal,
    Poor,
}

impl std::fmt::Display for RdiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RdiCategory::Optimal => write!(f, "Optimal"),
            RdiCategory::Adequate => write!(f, "Adequate"),
            RdiCategory::Suboptimal => write!(f, "Suboptimal"),
            RdiCategory::Poor => write!(f, "Poor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseIntensity {
    /// Estimated relative dose intensity, percent
    pub relative_dose_intensity: f64,
    pub cycles_planned: u32,
    pub cycles_completed: u32,
    /// Cycle completion, percent
    pub completion_rate: f64,
    pub dose_reduction_percentages: Vec<f64>,
    pub treatment_delays: u32,
    pub total_modifications: u32,
    pub rdi_category: RdiCategory,
}

/// Specific toxicities sorted into CTCAE system buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToxicityBuckets {
    pub hematologic: Vec<String>,
    pub gastrointestinal: Vec<String>,
    pub neurologic: Vec<String>,
    pub constitutional: Vec<String>,
    pub other: Vec<String>,
}

const HEMATOLOGIC: [&str; 4] = ["neutropenia", "anemia", "thrombocytopenia", "leukopenia"];
const GASTROINTESTINAL: [&str; 5] = ["nausea", "vomiting", "diarrhea", "mucositis", "stomatitis"];
const NEUROLOGIC: [&str; 3] = ["neuropathy", "peripheral", "sensory"];
const CONSTITUTIONAL: [&str; 4] = ["fatigue", "asthenia", "weakness", "fever"];

impl ToxicityBuckets {
    /// Bucket each toxicity by its first matching keyword group
    pub fn classify<'a>(toxicities: impl IntoIterator<Item = &'a String>) -> Self {
        let mut buckets = Self::default();
        for toxicity in toxicities {
            let text = toxicity.to_lowercase();
            let has = |terms: &[&str]| terms.iter().any(|t| text.contains(t));
            let bucket = if has(&HEMATOLOGIC) {
                &mut buckets.hematologic
            } else if has(&GASTROINTESTINAL) {
                &mut buckets.gastrointestinal
            } else if has(&NEUROLOGIC) {
                &mut buckets.neurologic
            } else if has(&CONSTITUTIONAL) {
                &mut buckets.constitutional
            } else {
                &mut buckets.other
            };
            bucket.push(toxicity.clone());
        }
        buckets
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityProfile {
    pub toxicity_buckets: ToxicityBuckets,
    pub max_grade: Option<ToxicityGrade>,
    /// Count of each recorded per-event grade
    pub grade_distribution: BTreeMap<ToxicityGrade, usize>,
    pub severe_toxicity: bool,
    pub dose_limiting: Option<bool>,
    /// Any grade 4 or 5 event
    pub hospitalization_required: bool,
    pub tolerability_assessment: Tolerability,
}

/// Qualitative band of the best response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseQuality {
    Excellent,
    Good,
    Minimal,
    Stable,
    Poor,
    Unknown,
}

impl ResponseQuality {
    fn from_best(best: Option<ResponseGrade>) -> Self {
        match best {
            Some(ResponseGrade::Complete | ResponseGrade::Major) => ResponseQuality::Excellent,
            Some(ResponseGrade::Partial) => ResponseQuality::Good,
            Some(ResponseGrade::Minimal) => ResponseQuality::Minimal,
            Some(ResponseGrade::Stable) => ResponseQuality::Stable,
            Some(ResponseGrade::Progressive) => ResponseQuality::Poor,
            None => ResponseQuality::Unknown,
        }
    }

    /// Component score in the overall assessment
    fn points(self) -> f64 {
        match self {
            ResponseQuality::Excellent => 80.0,
            ResponseQuality::Good => 60.0,
            ResponseQuality::Minimal => 50.0,
            ResponseQuality::Stable => 40.0,
            ResponseQuality::Poor => 20.0,
            ResponseQuality::Unknown => 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    pub clinical_response: Option<ResponseGrade>,
    pub radiological_response: Option<ResponseGrade>,
    pub pathological_response: Option<ResponseGrade>,
    /// Best of the clinical, radiological and pathological assessments
    pub best_response: Option<ResponseGrade>,
    /// Objective response; unknown without any assessment
    pub clinical_benefit: Option<bool>,
    /// Objective response or stable disease
    pub disease_control: Option<bool>,
    pub pathologic_complete_response: bool,
    pub response_quality: ResponseQuality,
    pub tumor_regression_grade: Option<u8>,
}

/// Letter grade of the overall assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentGrade {
    A,
    B,
    C,
    D,
}

impl std::fmt::Display for AssessmentGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessmentGrade::A => write!(f, "A"),
            AssessmentGrade::B => write!(f, "B"),
            AssessmentGrade::C => write!(f, "C"),
            AssessmentGrade::D => write!(f, "D"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub composite_score: f64,
    pub grade: AssessmentGrade,
    pub applicability: f64,
    pub dose_intensity: f64,
    pub toxicity_tolerance: f64,
    pub response_quality: f64,
}

/// Regimen-level analysis of one FLOT case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlotRegimenAnalysis {
    pub case_id: String,
    pub flot_phase: FlotPhase,
    pub protocol_version: String,
    pub applicability: Applicability,
    pub dose_intensity: DoseIntensity,
    pub toxicity: ToxicityProfile,
    pub response: ResponseAnalysis,
    pub overall_assessment: OverallAssessment,
}

fn applicability(case: &FlotCase) -> Applicability {
    let mut criteria = ApplicabilityCriteria::default();
    let mut earned: u32 = 0;
    let mut available: u32 = 0;

    if let Some(ecog) = case.baseline_ecog {
        available += 20;
        let (text, points) = match ecog {
            0 | 1 => ("Excellent (ECOG 0-1)", 20),
            2 => ("Marginal (ECOG 2)", 10),
            _ => ("Poor (ECOG >2)", 0),
        };
        criteria.performance_status = Some(text.to_string());
        earned += points;
    }

    let mut organ: u32 = 0;
    organ += match case.baseline_creatinine {
        Some(c) if c <= 1.5 => 8,
        Some(c) if c <= 2.0 => 4,
        _ => 0,
    };
    organ += match case.baseline_bilirubin {
        Some(b) if b <= 1.5 => 8,
        Some(b) if b <= 2.0 => 4,
        _ => 0,
    };
    organ += match case.baseline_albumin {
        Some(a) if a >= 3.0 => 9,
        Some(a) if a >= 2.5 => 4,
        _ => 0,
    };
    available += 25;
    earned += organ;
    criteria.organ_function = format!("Score: {}/25", organ);

    available += 25;
    let t_major = case.initial_t_stage.major().unwrap_or(0);
    let (text, points) = if t_major >= 3 || case.initial_n_stage.is_positive() {
        ("Optimal indication (≥T3 or N+)", 25)
    } else if t_major == 2 {
        ("Reasonable indication (T2)", 15)
    } else {
        ("Questionable indication (T1N0)", 5)
    };
    criteria.tumor_stage = text.to_string();
    earned += points;

    if let Some(histology) = case.histology {
        available += 15;
        if matches!(histology, HistologyType::Adenocarcinoma | HistologyType::Mucinous) {
            criteria.histology = Some("Optimal (Adenocarcinoma)".to_string());
            earned += 15;
        } else {
            criteria.histology = Some(format!("Acceptable ({})", histology));
            earned += 10;
        }
    }

    if let Some(age) = case.age {
        available += 15;
        let (text, points) = if age <= 70 {
            ("Optimal (≤70 years)", 15)
        } else if age <= 75 {
            ("Good (70-75 years)", 12)
        } else if age <= 80 {
            ("Caution (75-80 years)", 8)
        } else {
            ("High risk (>80 years)", 3)
        };
        criteria.age_fitness = Some(text.to_string());
        earned += points;
    }

    let pct = earned as f64 / available as f64 * 100.0;
    Applicability {
        applicability_score: round_to(pct, 1),
        criteria_assessment: criteria,
        recommendation: CandidateRating::from_percentage(pct),
        raw_score: format!("{}/{}", earned, available),
    }
}

fn dose_intensity(case: &FlotCase) -> DoseIntensity {
    let mut rdi = 100.0;
    if let Some(avg) = mean(&case.dose_reduction_percentages) {
        rdi -= avg;
    }
    rdi -= f64::min(case.treatment_delays as f64 * 5.0, 20.0);
    let completion_pct = completion_rate(case) * 100.0;
    let rdi: f64 = f64::min(rdi, completion_pct);

    let category = if rdi >= 85.0 {
        RdiCategory::Optimal
    } else if rdi >= 70.0 {
        RdiCategory::Adequate
    } else if rdi >= 50.0 {
        RdiCategory::Suboptimal
    } else {
        RdiCategory::Poor
    };

    DoseIntensity {
        relative_dose_intensity: round_to(rdi.max(0.0), 1),
        cycles_planned: case.planned_cycles,
        cycles_completed: case.completed_cycles,
        completion_rate: round_to(completion_pct, 1),
        dose_reduction_percentages: case.dose_reduction_percentages.clone(),
        treatment_delays: case.treatment_delays,
        total_modifications: case.dose_reductions + case.treatment_delays,
        rdi_category: category,
    }
}

fn toxicity_profile(case: &FlotCase) -> ToxicityProfile {
    let mut distribution = BTreeMap::new();
    for grade in &case.toxicity_grades {
        *distribution.entry(*grade).or_insert(0) += 1;
    }
    let hospitalization_required = distribution.keys().any(|g| g.value() >= 4);
    let tolerability = match case.max_toxicity_grade.map(ToxicityGrade::value) {
        Some(0 | 1) => Tolerability::Excellent,
        Some(2) => Tolerability::Good,
        Some(3) => Tolerability::Poor,
        Some(_) => Tolerability::Severe,
        None => Tolerability::Unknown,
    };

    ToxicityProfile {
        toxicity_buckets: ToxicityBuckets::classify(&case.specific_toxicities),
        max_grade: case.max_toxicity_grade,
        grade_distribution: distribution,
        severe_toxicity: case.max_toxicity_grade.is_some_and(ToxicityGrade::is_severe),
        dose_limiting: case.dose_limiting_toxicity,
        hospitalization_required,
        tolerability_assessment: tolerability,
    }
}

fn response_analysis(case: &FlotCase) -> ResponseAnalysis {
    let mut best: Option<ResponseGrade> = None;
    for response in [
        case.clinical_response,
        case.radiological_response,
        case.pathological_response,
    ]
    .into_iter()
    .flatten()
    {
        if best.map_or(true, |b| response.rank() > b.rank()) {
            best = Some(response);
        }
    }

    ResponseAnalysis {
        clinical_response: case.clinical_response,
        radiological_response: case.radiological_response,
        pathological_response: case.pathological_response,
        best_response: best,
        clinical_benefit: best.map(ResponseGrade::is_objective),
        disease_control: best.map(|b| b.is_objective() || b == ResponseGrade::Stable),
        pathologic_complete_response: case.pathological_response == Some(ResponseGrade::Complete),
        response_quality: ResponseQuality::from_best(best),
        tumor_regression_grade: case.tumor_regression_grade,
    }
}

/// Regimen-level analysis of one FLOT case
pub fn analyze_flot_regimen(case: &FlotCase) -> Result<FlotRegimenAnalysis, InputError> {
    case.validate()?;

    let applicability = applicability(case);
    let dose_intensity = dose_intensity(case);
    let toxicity = toxicity_profile(case);
    let response = response_analysis(case);

    let toxicity_tolerance = toxicity
        .max_grade
        .map_or(80.0, |g| 100.0 - g.value() as f64 * 20.0);
    let components = [
        applicability.applicability_score,
        dose_intensity.relative_dose_intensity,
        toxicity_tolerance,
        response.response_quality.points(),
    ];
    let overall = components.iter().sum::<f64>() / components.len() as f64;
    let grade = if overall >= 85.0 {
        AssessmentGrade::A
    } else if overall >= 70.0 {
        AssessmentGrade::B
    } else if overall >= 55.0 {
        AssessmentGrade::C
    } else {
        AssessmentGrade::D
    };

    debug!(case_id = %case.case_id, overall, %grade, "FLOT regimen analyzed");

    Ok(FlotRegimenAnalysis {
        case_id: case.case_id.clone(),
        flot_phase: case.phase,
        protocol_version: "FLOT4 Standard".to_string(),
        overall_assessment: OverallAssessment {
            composite_score: round_to(overall, 1),
            grade,
            applicability: components[0],
            dose_intensity: components[1],
            toxicity_tolerance,
            response_quality: components[3],
        },
        applicability,
        dose_intensity,
        toxicity,
        response,
    })
}

// ============================================================================
// Cohort analytics
// ============================================================================

/// Descriptive metrics over a FLOT cohort; rates are fractions (0-1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlotCohortSummary {
    pub total_cases: usize,
    /// Cases in the complete or postoperative phase
    pub completed_treatment: usize,
    pub average_completion_rate: f64,
    /// Cases with a pathological or radiological response
    pub response_evaluable_cases: usize,
    pub objective_response_rate: f64,
    pub complete_response_rate: f64,
    pub high_grade_toxicity_rate: f64,
    pub dose_reduction_rate: f64,
    pub treatment_delay_rate: f64,
    pub hospitalization_rate: f64,
    pub average_dose_reductions: f64,
    pub average_treatment_delays: f64,
}

fn fraction(cases: &[FlotCase], pred: impl Fn(&FlotCase) -> bool) -> f64 {
    cases.iter().filter(|c| pred(c)).count() as f64 / cases.len() as f64
}

/// Describe a FLOT cohort; `None` for an empty cohort
pub fn analyze_flot_cohort(cases: &[FlotCase]) -> Result<Option<FlotCohortSummary>, InputError> {
    if cases.is_empty() {
        return Ok(None);
    }
    cases.iter().try_for_each(FlotCase::validate)?;

    let n = cases.len() as f64;

    let evaluable: Vec<ResponseGrade> = cases
        .iter()
        .filter_map(|c| c.pathological_response.or(c.radiological_response))
        .collect();
    let evaluable_rate = |pred: fn(ResponseGrade) -> bool| {
        if evaluable.is_empty() {
            0.0
        } else {
            evaluable.iter().filter(|r| pred(**r)).count() as f64 / evaluable.len() as f64
        }
    };
    let completion: Vec<f64> = cases.iter().map(completion_rate).collect();

    let summary = FlotCohortSummary {
        total_cases: cases.len(),
        completed_treatment: cases
            .iter()
            .filter(|c| matches!(c.phase, FlotPhase::Complete | FlotPhase::Postoperative))
            .count(),
        average_completion_rate: round_to(mean(&completion).unwrap_or(0.0), 3),
        response_evaluable_cases: evaluable.len(),
        objective_response_rate: evaluable_rate(ResponseGrade::is_objective),
        complete_response_rate: evaluable_rate(|r| r == ResponseGrade::Complete),
        high_grade_toxicity_rate: fraction(cases, |c| {
            c.max_toxicity_grade.is_some_and(ToxicityGrade::is_severe)
        }),
        dose_reduction_rate: fraction(cases, |c| c.dose_reductions > 0),
        treatment_delay_rate: fraction(cases, |c| c.treatment_delays > 0),
        hospitalization_rate: fraction(cases, |c| c.hospitalizations > 0),
        average_dose_reductions: cases.iter().map(|c| c.dose_reductions as f64).sum::<f64>() / n,
        average_treatment_delays: cases.iter().map(|c| c.treatment_delays as f64).sum::<f64>() / n,
    };

    info!(cases = summary.total_cases, "FLOT cohort analyzed");
    Ok(Some(summary))
}

/// A patient flagged for poor expected FLOT outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskPatient {
    pub patient_id: String,
    pub case_id: String,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityPatterns {
    /// Cases per maximum toxicity grade
    pub toxicity_distribution: BTreeMap<ToxicityGrade, usize>,
    /// Cases with grade 3 or worse
    pub severe_toxicity_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderProfile {
    pub cases: usize,
    pub average_baseline_albumin: Option<f64>,
    /// Fraction with a T4-class primary
    pub t4_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficacyPredictors {
    /// Response score of 60 or more
    pub good_responders: ResponderProfile,
    /// Response score below 40
    pub poor_responders: ResponderProfile,
}

/// Protocol-level findings across a scored FLOT cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlotOptimization {
    /// Completed-cycle count with the best mean treatment quality
    pub optimal_cycle_number: u32,
    pub high_risk_patient_rate: f64,
    pub average_quality_score: f64,
    pub high_risk_patients: Vec<HighRiskPatient>,
    pub optimization_recommendations: Vec<String>,
    pub toxicity_patterns: ToxicityPatterns,
    pub efficacy_predictors: EfficacyPredictors,
}

fn flot_risk_factors(case: &FlotCase) -> Vec<String> {
    let mut factors = Vec::new();
    if case.baseline_ecog.is_some_and(|e| e >= 2) {
        factors.push("Poor baseline performance status".to_string());
    }
    if case.baseline_albumin.is_some_and(|a| a < 3.0) {
        factors.push("Low baseline albumin".to_string());
    }
    if case.initial_t_stage.is_t4_class() {
        factors.push("Advanced T stage".to_string());
    }
    if case.initial_m_stage.is_metastatic() {
        factors.push("Metastatic disease".to_string());
    }
    factors
}

fn case_recommendations(analysis: &FlotAnalysis) -> Vec<String> {
    let mut recommendations = Vec::new();
    if analysis.toxicity_burden_score > 60.0 {
        recommendations.push("Consider dose reduction or alternative regimen".to_string());
    }
    if analysis.surgical_fitness_score.is_some_and(|f| f < 50.0) {
        recommendations.push("Intensive nutritional support and fitness optimization".to_string());
    }
    if analysis.completion_rate < 0.6 {
        recommendations.push("Early intervention for treatment adherence".to_string());
    }
    recommendations
}

fn responder_profile(cases: &[&FlotCase]) -> ResponderProfile {
    let albumin: Vec<f64> = cases.iter().filter_map(|c| c.baseline_albumin).collect();
    let t4 = cases.iter().filter(|c| c.initial_t_stage.is_t4_class()).count();
    ResponderProfile {
        cases: cases.len(),
        average_baseline_albumin: mean(&albumin),
        t4_rate: if cases.is_empty() {
            0.0
        } else {
            t4 as f64 / cases.len() as f64
        },
    }
}

/// Score a cohort and derive protocol-level optimizations; `None` for an
/// empty cohort
pub fn optimize_flot_protocol(cases: &[FlotCase]) -> Result<Option<FlotOptimization>, InputError> {
    if cases.is_empty() {
        return Ok(None);
    }
    let analyses: Vec<FlotAnalysis> = cases
        .par_iter()
        .map(score_flot_case)
        .collect::<Result<_, _>>()?;
    let n = cases.len() as f64;

    let mut by_cycles: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for (case, analysis) in cases.iter().zip(&analyses) {
        by_cycles
            .entry(case.completed_cycles)
            .or_default()
            .push(analysis.treatment_quality_score);
    }
    // Ties resolve to the smaller cycle count
    let mut optimal_cycles = 0;
    let mut best_quality = f64::NEG_INFINITY;
    for (cycles, qualities) in &by_cycles {
        let quality = mean(qualities).unwrap_or(0.0);
        if quality > best_quality {
            best_quality = quality;
            optimal_cycles = *cycles;
        }
    }

    let high_risk_patients: Vec<HighRiskPatient> = cases
        .iter()
        .zip(&analyses)
        .filter(|(_, a)| a.toxicity_burden_score > 60.0 || a.treatment_quality_score < 40.0)
        .map(|(case, analysis)| HighRiskPatient {
            patient_id: case.patient_id.clone(),
            case_id: case.case_id.clone(),
            risk_factors: flot_risk_factors(case),
            recommendations: case_recommendations(analysis),
        })
        .collect();

    let mut recommendations = vec![format!(
        "Optimal cycle number appears to be {} based on quality outcomes",
        optimal_cycles
    )];
    if high_risk_patients.len() as f64 > n * 0.3 {
        recommendations.push("Consider dose reduction protocols for high-risk patients".to_string());
    }
    let hospitalizations: u32 = cases.iter().map(|c| c.hospitalizations).sum();
    if hospitalizations as f64 > n * 0.2 {
        recommendations.push("Enhance monitoring protocols to reduce hospitalizations".to_string());
    }

    let mut distribution = BTreeMap::new();
    for grade in cases.iter().filter_map(|c| c.max_toxicity_grade) {
        *distribution.entry(grade).or_insert(0) += 1;
    }
    let severe = cases
        .iter()
        .filter(|c| c.max_toxicity_grade.is_some_and(ToxicityGrade::is_severe))
        .count();

    let mut good = Vec::new();
    let mut poor = Vec::new();
    for (case, analysis) in cases.iter().zip(&analyses) {
        match analysis.response_score {
            Some(r) if r >= 60.0 => good.push(case),
            Some(r) if r < 40.0 => poor.push(case),
            _ => {}
        }
    }

    let qualities: Vec<f64> = analyses.iter().map(|a| a.treatment_quality_score).collect();
    let optimization = FlotOptimization {
        optimal_cycle_number: optimal_cycles,
        high_risk_patient_rate: high_risk_patients.len() as f64 / n,
        average_quality_score: mean(&qualities).unwrap_or(0.0),
        high_risk_patients,
        optimization_recommendations: recommendations,
        toxicity_patterns: ToxicityPatterns {
            toxicity_distribution: distribution,
            severe_toxicity_rate: severe as f64 / n,
        },
        efficacy_predictors: EfficacyPredictors {
            good_responders: responder_profile(&good),
            poor_responders: responder_profile(&poor),
        },
    };

    info!(
        cases = cases.len(),
        optimal_cycles,
        high_risk = optimization.high_risk_patients.len(),
        "FLOT protocol optimized"
    );
    Ok(Some(optimization))
}
