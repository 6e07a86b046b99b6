//! Schema system - JSON Schema validation of record files

pub mod registry;
pub mod validator;

pub use registry::{RecordKind, SchemaRegistry};
pub use validator::{ValidateFileError, ValidationError, ValidationResult, Validator};
