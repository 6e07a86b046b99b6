//! Treatment effectiveness analyzer
//!
//! Aggregates outcomes per treatment protocol. A case listing several
//! protocols contributes to each of them.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::analysis::tables::{mean, median};
use crate::entities::case::{SrccCase, SurgicalOutcome, TreatmentProtocol};

/// Outcome summary for one protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessSummary {
    pub protocol: TreatmentProtocol,
    /// Case identifiers in cohort order
    pub case_ids: Vec<String>,
    pub cases: usize,
    pub complete_responses: usize,
    /// Total complications across all cases
    pub complications: usize,
    pub survival_times: Vec<f64>,
    /// Completion fractions of the protocol records (0-1)
    pub completion_rates: Vec<f64>,
    /// Complete surgical outcomes per case, percent
    pub response_rate: f64,
    /// Complications per case, percent
    pub complication_rate: f64,
    pub median_survival: Option<f64>,
    pub mean_survival: Option<f64>,
    pub mean_completion_rate: Option<f64>,
}

impl EffectivenessSummary {
    fn new(protocol: TreatmentProtocol) -> Self {
        Self {
            protocol,
            case_ids: Vec::new(),
            cases: 0,
            complete_responses: 0,
            complications: 0,
            survival_times: Vec::new(),
            completion_rates: Vec::new(),
            response_rate: 0.0,
            complication_rate: 0.0,
            median_survival: None,
            mean_survival: None,
            mean_completion_rate: None,
        }
    }

    fn finalize(&mut self) {
        self.cases = self.case_ids.len();
        if self.cases > 0 {
            self.response_rate = self.complete_responses as f64 / self.cases as f64 * 100.0;
            self.complication_rate = self.complications as f64 / self.cases as f64 * 100.0;
        }
        self.median_survival = median(&self.survival_times);
        self.mean_survival = mean(&self.survival_times);
        self.mean_completion_rate = mean(&self.completion_rates);
    }
}

/// What one (case, protocol) pair adds to its protocol's summary
struct Contribution {
    protocol: TreatmentProtocol,
    case_id: String,
    complete: bool,
    complications: usize,
    survival: Option<f64>,
    completion: Option<f64>,
}

/// Summarize outcomes per protocol; an empty cohort yields an empty map
pub fn analyze_protocol_outcomes(
    cases: &[SrccCase],
) -> BTreeMap<TreatmentProtocol, EffectivenessSummary> {
    let contributions: Vec<Contribution> = cases
        .par_iter()
        .flat_map_iter(|case| {
            let case_id = case.case_id();
            let complete = case.surgical_outcome == Some(SurgicalOutcome::Complete);
            let survival = case.survival_months().filter(|t| *t > 0.0);
            case.treatment_protocols.iter().map(move |record| Contribution {
                protocol: record.protocol,
                case_id: case_id.clone(),
                complete,
                complications: case.complications.len(),
                survival,
                completion: record.completion_rate(),
            })
        })
        .collect();

    let mut summaries: BTreeMap<TreatmentProtocol, EffectivenessSummary> = BTreeMap::new();
    for c in contributions {
        let summary = summaries
            .entry(c.protocol)
            .or_insert_with(|| EffectivenessSummary::new(c.protocol));
        summary.case_ids.push(c.case_id);
        if c.complete {
            summary.complete_responses += 1;
        }
        summary.complications += c.complications;
        summary.survival_times.extend(c.survival);
        summary.completion_rates.extend(c.completion);
    }

    for summary in summaries.values_mut() {
        summary.finalize();
    }

    info!(
        cases = cases.len(),
        protocols = summaries.len(),
        "protocol outcomes analyzed"
    );
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::case::{
        Gender, HistologyType, SurvivalMetrics, TreatmentProtocolRecord,
    };

    fn case_with(
        id: &str,
        protocols: &[(TreatmentProtocol, Option<u32>, Option<u32>)],
        outcome: Option<SurgicalOutcome>,
        complications: usize,
        survival: Option<f64>,
    ) -> SrccCase {
        let mut case = SrccCase::new(
            id,
            62,
            Gender::M,
            "T3N1M0".parse().unwrap(),
            HistologyType::SignetRing,
        );
        for (protocol, planned, completed) in protocols {
            let mut record = TreatmentProtocolRecord::new(*protocol);
            record.cycles_planned = *planned;
            record.cycles_completed = *completed;
            case.treatment_protocols.push(record);
        }
        case.surgical_outcome = outcome;
        case.complications = vec!["ileus".to_string(); complications];
        case.survival_metrics = survival.map(|months| SurvivalMetrics {
            overall_survival_months: Some(months),
            ..Default::default()
        });
        case
    }

    #[test]
    fn test_empty_cohort_yields_empty_map() {
        assert!(analyze_protocol_outcomes(&[]).is_empty());
    }

    #[test]
    fn test_single_protocol_aggregates() {
        use TreatmentProtocol::Flot;
        let cases = vec![
            case_with("a", &[(Flot, Some(8), Some(8))], Some(SurgicalOutcome::Complete), 0, Some(30.0)),
            case_with("b", &[(Flot, Some(8), Some(4))], Some(SurgicalOutcome::Partial), 2, Some(10.0)),
            case_with("c", &[(Flot, Some(8), Some(0))], None, 1, None),
            case_with("d", &[(Flot, None, None)], Some(SurgicalOutcome::Complete), 1, Some(20.0)),
        ];
        let result = analyze_protocol_outcomes(&cases);
        let flot = &result[&Flot];

        assert_eq!(flot.cases, 4);
        assert_eq!(flot.case_ids, vec!["CASE_a", "CASE_b", "CASE_c", "CASE_d"]);
        assert_eq!(flot.complete_responses, 2);
        assert_eq!(flot.response_rate, 50.0);
        assert_eq!(flot.complications, 4);
        assert_eq!(flot.complication_rate, 100.0);
        assert_eq!(flot.median_survival, Some(20.0));
        assert_eq!(flot.mean_survival, Some(20.0));
        // 1.0, 0.5 and 0.0; the record without counts is skipped
        assert_eq!(flot.completion_rates, vec![1.0, 0.5, 0.0]);
        assert_eq!(flot.mean_completion_rate, Some(0.5));
    }

    #[test]
    fn test_case_contributes_to_each_protocol() {
        use TreatmentProtocol::{Adjuvant, Flot};
        let cases = vec![case_with(
            "a",
            &[(Flot, Some(4), Some(4)), (Adjuvant, Some(6), Some(3))],
            Some(SurgicalOutcome::Complete),
            0,
            Some(12.0),
        )];
        let result = analyze_protocol_outcomes(&cases);
        assert_eq!(result.len(), 2);
        assert_eq!(result[&Adjuvant].mean_completion_rate, Some(0.5));
        assert_eq!(result[&Flot].response_rate, 100.0);
    }

    #[test]
    fn test_missing_survival_gives_none() {
        let cases = vec![case_with(
            "a",
            &[(TreatmentProtocol::Xelox, Some(8), Some(8))],
            None,
            0,
            None,
        )];
        let result = analyze_protocol_outcomes(&cases);
        let xelox = &result[&TreatmentProtocol::Xelox];
        assert_eq!(xelox.median_survival, None);
        assert_eq!(xelox.mean_survival, None);
        assert_eq!(xelox.response_rate, 0.0);
    }

    #[test]
    fn test_even_count_median() {
        use TreatmentProtocol::Folfox;
        let cases = vec![
            case_with("a", &[(Folfox, None, None)], None, 0, Some(10.0)),
            case_with("b", &[(Folfox, None, None)], None, 0, Some(16.0)),
        ];
        let result = analyze_protocol_outcomes(&cases);
        assert_eq!(result[&Folfox].median_survival, Some(13.0));
    }
}
