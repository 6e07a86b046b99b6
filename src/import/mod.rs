//! CSV ingestion of SRCC registry exports
//!
//! Each data row becomes one [`SrccCase`]. Column names are matched
//! case-insensitively. Rows that cannot be mapped are collected as
//! [`RowError`]s instead of aborting the import; the caller decides
//! whether a partial import is acceptable.

pub mod profile;
pub mod terminology;

use miette::Diagnostic;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::stage_parser::parse_stage_or;
use crate::entities::case::{
    Gender, HistologyType, SrccCase, SurgicalOutcome, SurvivalMetrics, TreatmentProtocol,
    TreatmentProtocolRecord, VitalStatus,
};
use crate::entities::staging::TnmStaging;

pub use profile::{profile_columns, ColumnKind, ColumnProfile};
pub use terminology::{detect_french_symptoms, translate_term};

/// Staging columns, in lookup order
const STAGING_COLUMNS: [&str; 3] = ["tumor_stage", "tnm_stage", "stage"];

/// The file as a whole could not be read
#[derive(Debug, Error, Diagnostic)]
pub enum ImportError {
    #[error("failed to read CSV {}", path.display())]
    #[diagnostic(code(srcc::import::read))]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("CSV has no header row")]
    #[diagnostic(
        code(srcc::import::header),
        help("the first line must name the columns, e.g. patient_id,age,gender,tumor_stage")
    )]
    MissingHeader,
}

/// One data row that could not be turned into a case
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("row {row}: {message}")]
pub struct RowError {
    /// 1-based data row, header excluded
    pub row: usize,
    pub message: String,
}

/// Cases, row failures and the column profile of one import
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub total_rows: usize,
    pub cases: Vec<SrccCase>,
    pub errors: Vec<RowError>,
    pub schema: BTreeMap<String, ColumnProfile>,
}

impl ImportResult {
    pub fn successful(&self) -> usize {
        self.cases.len()
    }
}

/// Import SRCC cases from a CSV file
///
/// `default_stage` replaces unparsable or missing staging; without it such
/// rows are reported as errors.
pub fn import_csv(path: &Path, default_stage: Option<TnmStaging>) -> Result<ImportResult, ImportError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), "importing SRCC dataset");
    import_from(reader, default_stage).map_err(|err| match err {
        ImportError::Read { source, .. } => ImportError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Import SRCC cases from any CSV source
pub fn import_reader<R: Read>(
    input: R,
    default_stage: Option<TnmStaging>,
) -> Result<ImportResult, ImportError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    import_from(reader, default_stage)
}

fn import_from<R: Read>(
    mut reader: csv::Reader<R>,
    default_stage: Option<TnmStaging>,
) -> Result<ImportResult, ImportError> {
    let read_err = |source| ImportError::Read {
        path: PathBuf::from("<input>"),
        source,
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeader);
    }
    let header_map = build_header_map(&headers);

    let mut rows = Vec::new();
    let mut cases = Vec::new();
    let mut errors = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(row, error = %err, "skipping unreadable CSV row");
                errors.push(RowError {
                    row,
                    message: err.to_string(),
                });
                continue;
            }
        };
        let values: Vec<String> = record.iter().map(str::to_string).collect();

        match case_from_row(&RowView::new(&values, &header_map), default_stage) {
            Ok(case) => cases.push(case),
            Err(message) => {
                warn!(row, error = %message, "row not imported");
                errors.push(RowError { row, message });
            }
        }
        rows.push(values);
    }

    let result = ImportResult {
        total_rows: rows.len(),
        cases,
        errors,
        schema: profile_columns(&headers, &rows),
    };
    info!(
        rows = result.total_rows,
        imported = result.successful(),
        failed = result.errors.len(),
        "import finished"
    );
    Ok(result)
}

/// Map from lowercase header name to column index
fn build_header_map(headers: &[String]) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect()
}

/// One row addressed by column name
struct RowView<'a> {
    values: &'a [String],
    header_map: &'a HashMap<String, usize>,
}

impl<'a> RowView<'a> {
    fn new(values: &'a [String], header_map: &'a HashMap<String, usize>) -> Self {
        Self { values, header_map }
    }

    /// Non-empty trimmed value of a column
    fn get(&self, column: &str) -> Option<&'a str> {
        self.header_map
            .get(column)
            .and_then(|&idx| self.values.get(idx))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn number(&self, column: &str) -> Result<Option<f64>, String> {
        self.get(column)
            .map(|raw| {
                raw.replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| format!("{column}: '{raw}' is not a number"))
            })
            .transpose()
    }

    /// Values of every column whose name contains `fragment`
    fn matching(&self, fragment: &str) -> Vec<&'a str> {
        let mut columns: Vec<(&String, &usize)> = self
            .header_map
            .iter()
            .filter(|(name, _)| name.contains(fragment))
            .collect();
        columns.sort_by_key(|(_, idx)| **idx);
        columns
            .into_iter()
            .filter_map(|(_, &idx)| self.values.get(idx))
            .map(String::as_str)
            .collect()
    }
}

fn case_from_row(row: &RowView<'_>, default_stage: Option<TnmStaging>) -> Result<SrccCase, String> {
    let patient_id = row
        .get("patient_id")
        .map(str::to_string)
        .unwrap_or_else(|| format!("PAT_{}", ulid::Ulid::new()));

    let age = match row.number("age")? {
        Some(age) if age >= 0.0 => age.trunc() as u32,
        Some(age) => return Err(format!("age: {age} is negative")),
        None => return Err("age is missing".to_string()),
    };

    let gender = parse_gender(row.get("gender"))?;

    let raw_stage = STAGING_COLUMNS
        .iter()
        .find_map(|column| row.get(column))
        .unwrap_or("");
    let staging = parse_stage_or(raw_stage, default_stage).map_err(|err| format!("staging: {err}"))?;

    let histology = parse_histology(row.get("histology"));

    let mut case = SrccCase::new(patient_id, age, gender, staging, histology);

    let cycles = match row.number("flot_cycles")? {
        Some(cycles) => Some(cycles),
        None => row.number("cycles")?,
    };
    if let Some(cycles) = cycles.filter(|c| *c > 0.0) {
        let mut record = TreatmentProtocolRecord::new(TreatmentProtocol::Flot);
        record.cycles_planned = Some(cycles.trunc() as u32);
        record.cycles_completed = Some(cycles.trunc() as u32);
        case.treatment_protocols.push(record);
    }

    case.surgical_outcome = row.get("surgical_outcome").map(parse_surgical_outcome);

    if let Some(months) = row.number("survival_months")?.filter(|m| *m > 0.0) {
        case.survival_metrics = Some(SurvivalMetrics {
            overall_survival_months: Some(months),
            vital_status: Some(VitalStatus::Alive),
            ..Default::default()
        });
    }

    for text in row.matching("symptom") {
        for symptom in detect_french_symptoms(text) {
            if !case.symptoms_french.contains(&symptom) {
                case.symptoms_french.push(symptom);
                case.symptoms_english.push(symptom.english().to_string());
            }
        }
    }

    case.validate().map_err(|err| err.to_string())?;
    Ok(case)
}

fn parse_gender(raw: Option<&str>) -> Result<Gender, String> {
    match raw.map(str::to_uppercase).as_deref() {
        None | Some("M") | Some("MALE") | Some("H") | Some("HOMME") => Ok(Gender::M),
        Some("F") | Some("FEMALE") | Some("FEMME") => Ok(Gender::F),
        Some(other) => Err(format!("gender: unrecognized value '{other}'")),
    }
}

/// French histology terms are translated before matching
fn parse_histology(raw: Option<&str>) -> HistologyType {
    let text = raw.map(|r| translate_term(r).to_lowercase()).unwrap_or_default();
    if text.contains("signet") || text.contains("ring") {
        HistologyType::SignetRing
    } else {
        HistologyType::Adenocarcinoma
    }
}

fn parse_surgical_outcome(raw: &str) -> SurgicalOutcome {
    let text = translate_term(raw).to_lowercase();
    if text.contains("incomplete") {
        SurgicalOutcome::Incomplete
    } else if text.contains("partial") {
        SurgicalOutcome::Partial
    } else {
        SurgicalOutcome::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::case::FrenchSymptom;
    use crate::entities::staging::StageGroup;

    const SAMPLE: &str = "\
patient_id,age,gender,tumor_stage,histology,flot_cycles,surgical_outcome,survival_months,symptoms
P1,62,F,T3N1M0,Signet ring cell,8,Complete,24.5,Épigastralgie et vomissement
P2,71,m,T4aN2M0,cellules en bague à chaton,,incomplet,,
P3,55,M,garbage,Adenocarcinoma,4,,12,
";

    #[test]
    fn test_import_maps_rows() {
        let result = import_reader(SAMPLE.as_bytes(), None).unwrap();
        assert_eq!(result.total_rows, 3);
        assert_eq!(result.successful(), 2);

        let first = &result.cases[0];
        assert_eq!(first.patient_id, "P1");
        assert_eq!(first.gender, Gender::F);
        assert_eq!(first.tnm_staging.stage_group(), StageGroup::II);
        assert_eq!(first.histology, HistologyType::SignetRing);
        assert_eq!(first.treatment_protocols[0].cycles_completed, Some(8));
        assert_eq!(first.survival_months(), Some(24.5));
        assert_eq!(
            first.symptoms_french,
            vec![FrenchSymptom::Epigastralgie, FrenchSymptom::Vomissement]
        );
        assert_eq!(first.symptoms_english, vec!["Epigastric pain", "Vomiting"]);

        let second = &result.cases[1];
        assert_eq!(second.gender, Gender::M);
        assert_eq!(second.histology, HistologyType::SignetRing);
        assert_eq!(second.surgical_outcome, Some(SurgicalOutcome::Incomplete));
        assert!(second.treatment_protocols.is_empty());
        assert!(second.survival_metrics.is_none());
    }

    #[test]
    fn test_bad_staging_is_row_error() {
        let result = import_reader(SAMPLE.as_bytes(), None).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert!(result.errors[0].message.starts_with("staging"));
    }

    #[test]
    fn test_default_stage_opt_in() {
        let fallback: TnmStaging = "T1N0M0".parse().unwrap();
        let result = import_reader(SAMPLE.as_bytes(), Some(fallback)).unwrap();
        assert!(result.errors.is_empty());
        assert_eq!(result.cases[2].tnm_staging, fallback);
        assert_eq!(result.cases[2].histology, HistologyType::Adenocarcinoma);
        assert_eq!(result.cases[2].surgical_outcome, None);
    }

    #[test]
    fn test_generated_patient_id_and_missing_age() {
        let csv = "age,stage\n60,T2N0M0\n,T2N0M0\n";
        let result = import_reader(csv.as_bytes(), None).unwrap();
        assert_eq!(result.successful(), 1);
        assert!(result.cases[0].patient_id.starts_with("PAT_"));
        assert_eq!(result.errors[0].message, "age is missing");
    }

    #[test]
    fn test_out_of_range_row_rejected() {
        let csv = "patient_id,age,stage\nX,140,T2N0M0\n";
        let result = import_reader(csv.as_bytes(), None).unwrap();
        assert!(result.cases.is_empty());
        assert!(result.errors[0].message.contains("age"));
    }

    #[test]
    fn test_schema_profile_attached() {
        let result = import_reader(SAMPLE.as_bytes(), None).unwrap();
        assert_eq!(result.schema["tumor_stage"].kind, ColumnKind::TnmStaging);
        assert_eq!(result.schema["flot_cycles"].completeness, 66.7);
    }

    #[test]
    fn test_import_csv_missing_file() {
        let err = import_csv(Path::new("/nonexistent/srcc.csv"), None).unwrap_err();
        assert!(matches!(err, ImportError::Read { .. }));
    }
}
