//! Column profiling for tabular exports

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::tables::round_to;

/// Clinical meaning inferred from a column name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    #[serde(rename = "Patient Identifier")]
    PatientIdentifier,
    Demographics,
    #[serde(rename = "TNM Staging")]
    TnmStaging,
    Histology,
    #[serde(rename = "Treatment Protocol")]
    TreatmentProtocol,
    #[serde(rename = "Survival/Outcome")]
    SurvivalOutcome,
    #[serde(rename = "Clinical Symptoms")]
    ClinicalSymptoms,
    Other,
}

impl ColumnKind {
    /// Classify a column by keywords in its name; the first rule that
    /// matches wins
    pub fn infer(column: &str) -> Self {
        let name = column.to_lowercase();
        let any = |terms: &[&str]| terms.iter().any(|t| name.contains(t));

        if any(&["patient", "id"]) {
            ColumnKind::PatientIdentifier
        } else if any(&["age"]) {
            ColumnKind::Demographics
        } else if any(&["tnm", "stage", "tumor"]) {
            ColumnKind::TnmStaging
        } else if any(&["histolog", "adenocarcinoma", "signet"]) {
            ColumnKind::Histology
        } else if any(&["treatment", "protocol", "flot", "xelox"]) {
            ColumnKind::TreatmentProtocol
        } else if any(&["survival", "outcome", "follow"]) {
            ColumnKind::SurvivalOutcome
        } else if any(&["symptom", "épigastralgie", "vomissement"]) {
            ColumnKind::ClinicalSymptoms
        } else {
            ColumnKind::Other
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::PatientIdentifier => write!(f, "Patient Identifier"),
            ColumnKind::Demographics => write!(f, "Demographics"),
            ColumnKind::TnmStaging => write!(f, "TNM Staging"),
            ColumnKind::Histology => write!(f, "Histology"),
            ColumnKind::TreatmentProtocol => write!(f, "Treatment Protocol"),
            ColumnKind::SurvivalOutcome => write!(f, "Survival/Outcome"),
            ColumnKind::ClinicalSymptoms => write!(f, "Clinical Symptoms"),
            ColumnKind::Other => write!(f, "Other"),
        }
    }
}

/// Fill rate and sample of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    #[serde(rename = "type")]
    pub kind: ColumnKind,

    /// Percentage of non-empty cells, one decimal
    pub completeness: f64,

    /// Distinct non-empty values
    pub unique_values: usize,

    /// First three non-empty values
    pub sample_values: Vec<String>,
}

/// Profile every column of a table given its header and rows
pub fn profile_columns(headers: &[String], rows: &[Vec<String>]) -> BTreeMap<String, ColumnProfile> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let values: Vec<&str> = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();

            let completeness = if rows.is_empty() {
                0.0
            } else {
                round_to(values.len() as f64 / rows.len() as f64 * 100.0, 1)
            };
            let unique_values = values.iter().collect::<BTreeSet<_>>().len();

            let profile = ColumnProfile {
                kind: ColumnKind::infer(header),
                completeness,
                unique_values,
                sample_values: values.iter().take(3).map(|v| v.to_string()).collect(),
            };
            (header.clone(), profile)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_kind() {
        assert_eq!(ColumnKind::infer("patient_id"), ColumnKind::PatientIdentifier);
        assert_eq!(ColumnKind::infer("Age"), ColumnKind::Demographics);
        assert_eq!(ColumnKind::infer("tumor_stage"), ColumnKind::TnmStaging);
        assert_eq!(ColumnKind::infer("histology"), ColumnKind::Histology);
        assert_eq!(ColumnKind::infer("flot_cycles"), ColumnKind::TreatmentProtocol);
        assert_eq!(ColumnKind::infer("survival_months"), ColumnKind::SurvivalOutcome);
        assert_eq!(ColumnKind::infer("symptoms"), ColumnKind::ClinicalSymptoms);
        assert_eq!(ColumnKind::infer("gender"), ColumnKind::Other);
    }

    #[test]
    fn test_profile_counts_non_empty_cells() {
        let headers = vec!["age".to_string(), "symptoms".to_string()];
        let rows = vec![
            vec!["61".to_string(), "".to_string()],
            vec!["70".to_string(), "Dysphagie".to_string()],
            vec!["61".to_string(), " ".to_string()],
        ];
        let profile = profile_columns(&headers, &rows);

        let age = &profile["age"];
        assert_eq!(age.kind, ColumnKind::Demographics);
        assert_eq!(age.completeness, 100.0);
        assert_eq!(age.unique_values, 2);
        assert_eq!(age.sample_values, vec!["61", "70", "61"]);

        let symptoms = &profile["symptoms"];
        assert_eq!(symptoms.completeness, 33.3);
        assert_eq!(symptoms.unique_values, 1);
    }

    #[test]
    fn test_profile_of_empty_table() {
        let profile = profile_columns(&["stage".to_string()], &[]);
        assert_eq!(profile["stage"].completeness, 0.0);
        assert!(profile["stage"].sample_values.is_empty());
    }
}
