//! YAML and JSON source diagnostics

pub mod diagnostics;

pub use diagnostics::YamlSyntaxError;
