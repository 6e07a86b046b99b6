//! Embedded JSON Schemas, one per record kind

use rust_embed::Embed;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// The record files the toolkit reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum RecordKind {
    /// Outcomes-cohort case (`SrccCase`)
    Srcc,
    /// Gastrectomy case
    Surgery,
    /// FLOT chemotherapy case
    Flot,
    /// Integrated case for the decision engine
    Integrated,
}

impl RecordKind {
    pub fn all() -> &'static [RecordKind] {
        &[
            RecordKind::Srcc,
            RecordKind::Surgery,
            RecordKind::Flot,
            RecordKind::Integrated,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Srcc => "srcc",
            RecordKind::Surgery => "surgery",
            RecordKind::Flot => "flot",
            RecordKind::Integrated => "integrated",
        }
    }

    pub fn schema_file(self) -> &'static str {
        match self {
            RecordKind::Srcc => "srcc_case.schema.json",
            RecordKind::Surgery => "surgery_case.schema.json",
            RecordKind::Flot => "flot_case.schema.json",
            RecordKind::Integrated => "integrated_case.schema.json",
        }
    }

    /// Keys that only this kind of record carries
    fn marker_keys(self) -> &'static [&'static str] {
        match self {
            RecordKind::Srcc => &["tnm_staging", "symptoms_french", "treatment_protocols"],
            RecordKind::Surgery => &["gastrectomy_type", "surgical_approach", "tumor_stage"],
            RecordKind::Flot => &["planned_cycles", "completed_cycles", "initial_t_stage"],
            RecordKind::Integrated => &["gastric_surgery_case", "flot_case", "performance_status"],
        }
    }

    /// Infer the kind of a parsed document from its keys
    ///
    /// A list is judged by its first record.
    pub fn from_document(doc: &JsonValue) -> Option<RecordKind> {
        let record = match doc {
            JsonValue::Array(items) => items.first()?,
            other => other,
        };
        let object = record.as_object()?;
        Self::all()
            .iter()
            .rev()
            .copied()
            .find(|kind| kind.marker_keys().iter().any(|key| object.contains_key(*key)))
    }

    /// Infer the kind from a file name such as `flot_cases.yaml`
    pub fn from_path(path: &Path) -> Option<RecordKind> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.contains("integrated") || name.contains("decision") {
            Some(RecordKind::Integrated)
        } else if name.contains("surgery") || name.contains("gastrectomy") {
            Some(RecordKind::Surgery)
        } else if name.contains("flot") {
            Some(RecordKind::Flot)
        } else if name.contains("srcc") || name.contains("cohort") {
            Some(RecordKind::Srcc)
        } else {
            None
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Schema sources keyed by record kind
pub struct SchemaRegistry {
    schemas: HashMap<RecordKind, String>,
}

impl SchemaRegistry {
    pub fn get(&self, kind: RecordKind) -> Option<&str> {
        self.schemas.get(&kind).map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        let schemas = RecordKind::all()
            .iter()
            .filter_map(|kind| {
                let file = EmbeddedSchemas::get(kind.schema_file())?;
                let text = std::str::from_utf8(&file.data).ok()?.to_string();
                Some((*kind, text))
            })
            .collect();
        Self { schemas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_kind_has_a_schema() {
        let registry = SchemaRegistry::default();
        for kind in RecordKind::all() {
            let schema = registry.get(*kind).expect("schema embedded");
            assert!(serde_json::from_str::<JsonValue>(schema).is_ok(), "{kind} schema is JSON");
        }
    }

    #[test]
    fn test_kind_from_document() {
        let srcc = json!({"patient_id": "P1", "tnm_staging": "T3N1M0"});
        assert_eq!(RecordKind::from_document(&srcc), Some(RecordKind::Srcc));

        let flot = json!([{"case_id": "F1", "planned_cycles": 8}]);
        assert_eq!(RecordKind::from_document(&flot), Some(RecordKind::Flot));

        // A nested surgery case does not make the record a surgery case
        let integrated = json!({"case_id": "I1", "gastric_surgery_case": {"gastrectomy_type": "total"}});
        assert_eq!(RecordKind::from_document(&integrated), Some(RecordKind::Integrated));

        assert_eq!(RecordKind::from_document(&json!({"foo": 1})), None);
        assert_eq!(RecordKind::from_document(&json!([])), None);
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(RecordKind::from_path(Path::new("data/flot_cases.yaml")), Some(RecordKind::Flot));
        assert_eq!(RecordKind::from_path(Path::new("decisions.json")), Some(RecordKind::Integrated));
        assert_eq!(RecordKind::from_path(Path::new("notes.yaml")), None);
    }
}
