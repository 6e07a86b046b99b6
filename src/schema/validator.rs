//! Schema validation with detailed error reporting

use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::core::loader::FileFormat;
use crate::schema::registry::{RecordKind, SchemaRegistry};

/// Validation error with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(srcc::schema::validation))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    pub fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// A file that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub kind: RecordKind,
    /// Records in the file; a single-record file counts as one
    pub records: usize,
}

/// Why a file could not be validated at all
#[derive(Debug, Error, Diagnostic)]
pub enum ValidateFileError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(srcc::schema::io))]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot tell what kind of record {} holds", path.display())]
    #[diagnostic(
        code(srcc::schema::unknown_kind),
        help("pass --kind srcc|surgery|flot|integrated")
    )]
    UnknownKind { path: std::path::PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] ValidationError),
}

/// Schema validator with compiled schemas
pub struct Validator {
    compiled: HashMap<RecordKind, JsonValidator>,
}

impl Validator {
    /// Create a new validator with schemas from the registry
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for kind in RecordKind::all() {
            if let Some(schema_str) = registry.get(*kind) {
                if let Ok(schema_json) = serde_json::from_str::<JsonValue>(schema_str) {
                    if let Ok(compiled_schema) = validator_for(&schema_json) {
                        compiled.insert(*kind, compiled_schema);
                    }
                }
            }
        }

        Self { compiled }
    }

    /// Validate record content, reporting every violation
    ///
    /// `filename` picks the parser by extension (JSON for `.json`, YAML
    /// otherwise). A list is validated record by record, and integrated
    /// records have their nested surgery and FLOT cases checked as well.
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        kind: RecordKind,
    ) -> Result<ValidationResult, ValidationError> {
        let doc = parse_document(content, filename)?;

        let records: Vec<(String, &JsonValue)> = match &doc {
            JsonValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (format!("/{}", i), item))
                .collect(),
            other => vec![(String::new(), other)],
        };

        let mut violations = Vec::new();
        for (prefix, record) in &records {
            self.collect_violations(content, prefix, record, kind, &mut violations);
        }

        if violations.is_empty() {
            Ok(ValidationResult {
                kind,
                records: records.len(),
            })
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }

    fn collect_violations(
        &self,
        content: &str,
        prefix: &str,
        record: &JsonValue,
        kind: RecordKind,
        out: &mut Vec<SchemaViolation>,
    ) {
        // No schema available - nothing to check
        let Some(schema) = self.compiled.get(&kind) else {
            return;
        };
        out.extend(
            schema
                .iter_errors(record)
                .map(|e| error_to_violation(content, prefix, &e)),
        );

        if kind == RecordKind::Integrated {
            for (key, nested_kind) in [
                ("gastric_surgery_case", RecordKind::Surgery),
                ("flot_case", RecordKind::Flot),
            ] {
                if let Some(nested) = record.get(key).filter(|v| v.is_object()) {
                    let nested_prefix = format!("{}/{}", prefix, key);
                    self.collect_violations(content, &nested_prefix, nested, nested_kind, out);
                }
            }
        }
    }

    /// Validate a file, inferring the record kind unless one is given
    pub fn validate_file(
        &self,
        path: &Path,
        kind: Option<RecordKind>,
    ) -> Result<ValidationResult, ValidateFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ValidateFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path.display().to_string();

        let kind = match kind {
            Some(kind) => kind,
            None => parse_document(&content, &filename)
                .ok()
                .and_then(|doc| RecordKind::from_document(&doc))
                .or_else(|| RecordKind::from_path(path))
                .ok_or_else(|| ValidateFileError::UnknownKind {
                    path: path.to_path_buf(),
                })?,
        };

        Ok(self.validate(&content, &filename, kind)?)
    }
}

impl Default for Validator {
    fn default() -> Self {
        let registry = SchemaRegistry::default();
        Self::new(&registry)
    }
}

/// Parse YAML or JSON into a JSON value, mapping syntax errors to a violation
fn parse_document(content: &str, filename: &str) -> Result<JsonValue, ValidationError> {
    let parse_failure = |message: String, hint: &str, span: SourceSpan, help: &str| {
        let violation = SchemaViolation::new(message, hint.to_string(), span, Some(help.to_string()));
        ValidationError::new(filename, content, vec![violation])
    };

    if FileFormat::from_path(Path::new(filename)) == Some(FileFormat::Json) {
        return serde_json::from_str(content).map_err(|e| {
            parse_failure(
                format!("JSON parse error: {}", e),
                "invalid JSON",
                line_span(content, e.line(), e.column()),
                "Check JSON syntax - commas, braces, quotes",
            )
        });
    }

    let yaml_value: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
        let span = match e.location() {
            Some(loc) => line_span(content, loc.line(), loc.column()),
            None => first_line_span(content),
        };
        parse_failure(
            format!("YAML parse error: {}", e),
            "invalid YAML",
            span,
            "Check YAML syntax - proper indentation, colons, quotes",
        )
    })?;

    serde_json::to_value(&yaml_value).map_err(|e| {
        parse_failure(
            format!("Failed to convert YAML to JSON: {}", e),
            "conversion error",
            (0, content.len()).into(),
            "Mapping keys must be plain strings",
        )
    })
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(content: &str, prefix: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = format!("{}{}", prefix, error.instance_path);
    let message = format_schema_error(&path, error);
    let hint = format_error_hint(error);
    let help = generate_help_message(error);

    let span = find_path_span(content, &path);

    SchemaViolation::new(message, hint, span, help)
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(path: &str, error: &JsonSchemaError) -> String {
    use jsonschema::error::ValidationErrorKind as Kind;

    let path = if path.is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", path)
    };

    match &error.kind {
        Kind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("Missing required field: {} at {}", prop_str, path)
        }
        Kind::Type { kind } => format!("Wrong type at {}: expected {:?}", path, kind),
        Kind::Enum { options } => {
            format!("Invalid value at {}: must be one of: {}", path, format_enum_options(options))
        }
        Kind::Pattern { pattern } => format!("Value at {} doesn't match pattern: {}", path, pattern),
        Kind::MinLength { limit } => {
            format!("Value at {} is too short: minimum {} characters", path, limit)
        }
        Kind::Minimum { limit } => format!("Value at {} is too small: minimum {}", path, limit),
        Kind::Maximum { limit } => format!("Value at {} is too large: maximum {}", path, limit),
        Kind::AdditionalProperties { unexpected } => {
            format!("Unknown field(s) at {}: {}", path, unexpected.join(", "))
        }
        Kind::OneOfNotValid { .. } => format!("Value at {} matches none of the accepted forms", path),
        _ => format!("Validation error at {}: {}", path, error),
    }
}

/// Format enum options as a string
fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}

/// Generate a short hint for the error label
fn format_error_hint(error: &JsonSchemaError) -> String {
    use jsonschema::error::ValidationErrorKind as Kind;

    match &error.kind {
        Kind::Required { .. } => "required field missing",
        Kind::Type { .. } => "wrong type",
        Kind::Enum { .. } => "invalid value",
        Kind::Pattern { .. } => "pattern mismatch",
        Kind::MinLength { .. } => "too short",
        Kind::Minimum { .. } | Kind::Maximum { .. } => "out of range",
        Kind::AdditionalProperties { .. } => "unknown field",
        _ => "validation error",
    }
    .to_string()
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    use jsonschema::error::ValidationErrorKind as Kind;

    match &error.kind {
        Kind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' field to your file", prop_str))
        }
        Kind::Enum { options } => Some(format!("Valid values: {}", format_enum_options(options))),
        Kind::Pattern { .. } | Kind::OneOfNotValid { .. } => {
            Some("Staging is written as 'T3N1M0' or as tumor/node/metastasis fields".to_string())
        }
        Kind::Type { kind } => Some(format!("Expected value of type: {:?}", kind)),
        Kind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!("Remove the '{}' field or check spelling", unexpected[0]))
            } else {
                Some("Remove unknown fields or check spelling".to_string())
            }
        }
        _ => None,
    }
}

fn first_line_span(content: &str) -> SourceSpan {
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Span from a 1-based line and column to the end of that line
fn line_span(content: &str, line: usize, column: usize) -> SourceSpan {
    let line = line.saturating_sub(1);
    let column = column.saturating_sub(1);

    let mut offset = 0;
    for (i, line_content) in content.lines().enumerate() {
        if i == line {
            offset += column.min(line_content.len());
            break;
        }
        offset += line_content.len() + 1; // +1 for newline
    }
    let offset = offset.min(content.len());

    let rest_of_content = &content[offset..];
    let len = rest_of_content
        .find('\n')
        .unwrap_or(rest_of_content.len())
        .max(1);

    (offset, len).into()
}

/// Find the span for a JSON path in YAML or JSON content
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    // e.g. "/age" or "/2/treatment_protocols/0/protocol"
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    // Innermost named key; array indices point at their parent key
    let key = parts.iter().rev().find(|part| part.parse::<usize>().is_err());

    key.and_then(|key| find_key_span(content, key))
        .unwrap_or_else(|| first_line_span(content))
}

/// Find the span of a `key:` (YAML) or `"key":` (JSON) in the content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    let yaml_pattern = format!("{}:", key);
    let json_pattern = format!("\"{}\"", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start().trim_start_matches("- ");
        if trimmed.starts_with(&yaml_pattern) || trimmed.starts_with(&json_pattern) {
            let key_start = offset + (line.len() - trimmed.len());
            return Some((key_start, trimmed.len()).into());
        }
        offset += line.len() + 1; // +1 for newline
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(&SchemaRegistry::default())
    }

    #[test]
    fn test_validator_creation() {
        let validator = validator();
        for kind in RecordKind::all() {
            assert!(validator.compiled.contains_key(kind), "{kind} schema compiles");
        }
    }

    #[test]
    fn test_valid_srcc_case() {
        let yaml = r#"
patient_id: SRCC001
age: 65
gender: M
tnm_staging: T3N1M0
histology: Signet Ring Cell Carcinoma
symptoms_french: [Épigastralgie, Vomissement]
treatment_protocols:
  - protocol: FLOT
    cycles_planned: 8
    cycles_completed: 6
survival_metrics:
  overall_survival_months: 24.5
  event_occurred: false
  vital_status: Alive
"#;
        let result = validator().validate(yaml, "case.yaml", RecordKind::Srcc);
        assert_eq!(result.unwrap().records, 1);
    }

    #[test]
    fn test_staging_mapping_form() {
        let yaml = r#"
patient_id: SRCC002
age: 58
gender: F
tnm_staging:
  tumor: T4a
  node: N2
  metastasis: M0
histology: signet_ring
"#;
        assert!(validator().validate(yaml, "case.yaml", RecordKind::Srcc).is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = "patient_id: SRCC003\nage: 70\n";
        let err = validator()
            .validate(yaml, "case.yaml", RecordKind::Srcc)
            .unwrap_err();
        // gender, tnm_staging and histology
        assert_eq!(err.violation_count(), 3);
    }

    #[test]
    fn test_out_of_range_age_points_at_key() {
        let yaml = "patient_id: SRCC004\nage: 140\ngender: M\ntnm_staging: T1N0M0\nhistology: Adenocarcinoma\n";
        let err = validator()
            .validate(yaml, "case.yaml", RecordKind::Srcc)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
        let violation = &err.violations()[0];
        assert!(violation.message().contains("'/age'"));
        assert_eq!(violation.span.offset(), yaml.find("age:").unwrap());
    }

    #[test]
    fn test_unknown_field() {
        let yaml = "patient_id: S\nage: 50\ngender: M\ntnm_staging: T1N0M0\nhistology: Adenocarcinoma\nstagging: x\n";
        let err = validator()
            .validate(yaml, "case.yaml", RecordKind::Srcc)
            .unwrap_err();
        assert!(err.violations()[0].message().contains("stagging"));
    }

    #[test]
    fn test_list_is_validated_per_record() {
        let yaml = r#"
- patient_id: A
  age: 50
  gender: M
  tnm_staging: T1N0M0
  histology: Adenocarcinoma
- patient_id: B
  age: 61
  gender: X
  tnm_staging: T2N0M0
  histology: Adenocarcinoma
"#;
        let err = validator()
            .validate(yaml, "cohort.yaml", RecordKind::Srcc)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
        assert!(err.violations()[0].message().contains("'/1/gender'"));
    }

    #[test]
    fn test_flot_cycle_limits() {
        let yaml = r#"
patient_id: P1
case_id: F1
initial_t_stage: T3
initial_n_stage: N1
initial_m_stage: M0
planned_cycles: 9
completed_cycles: 4
max_toxicity_grade: 3
"#;
        let err = validator()
            .validate(yaml, "flot.yaml", RecordKind::Flot)
            .unwrap_err();
        assert!(err.violations()[0].message().contains("planned_cycles"));
    }

    #[test]
    fn test_integrated_checks_nested_cases() {
        let yaml = r#"
patient_id: P1
case_id: I1
performance_status: 1
flot_case:
  patient_id: P1
  case_id: F1
  initial_t_stage: T3
  initial_n_stage: N1
  initial_m_stage: M0
  planned_cycles: 8
  completed_cycles: 8
  pathological_response: excellent
"#;
        let err = validator()
            .validate(yaml, "integrated.yaml", RecordKind::Integrated)
            .unwrap_err();
        assert_eq!(err.violation_count(), 1);
        assert!(err.violations()[0]
            .message()
            .contains("'/flot_case/pathological_response'"));
    }

    #[test]
    fn test_json_content() {
        let json = r#"{"patient_id": "P1", "case_id": "S1", "tumor_stage": "T2", "node_stage": "N0",
            "metastasis_stage": "M0", "histology": "Adenocarcinoma",
            "gastrectomy_type": "subtotal", "surgical_approach": "laparoscopic"}"#;
        assert!(validator().validate(json, "surgery.json", RecordKind::Surgery).is_ok());
    }

    #[test]
    fn test_yaml_syntax_error() {
        let err = validator()
            .validate("age: [1, 2\n", "bad.yaml", RecordKind::Srcc)
            .unwrap_err();
        assert!(err.violations()[0].message().starts_with("YAML parse error"));
    }

    #[test]
    fn test_validate_file_infers_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.yaml");
        std::fs::write(
            &path,
            "patient_id: P\ncase_id: S\ntumor_stage: T2\nnode_stage: N0\nmetastasis_stage: M0\nhistology: Adenocarcinoma\ngastrectomy_type: total\nsurgical_approach: open\n",
        )
        .unwrap();
        let result = validator().validate_file(&path, None).unwrap();
        assert_eq!(result.kind, RecordKind::Surgery);

        let unknown = dir.path().join("notes.yaml");
        std::fs::write(&unknown, "title: hello\n").unwrap();
        assert!(matches!(
            validator().validate_file(&unknown, None),
            Err(ValidateFileError::UnknownKind { .. })
        ));
    }

    #[test]
    fn test_find_key_span() {
        let content = "patient_id: P\nage: 70\n";
        let span = find_key_span(content, "age").unwrap();
        assert_eq!(span.offset(), 14);
        assert!(find_key_span(content, "histology").is_none());
    }
}
