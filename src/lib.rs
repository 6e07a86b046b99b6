//! SRCC: gastric signet-ring-cell carcinoma analytics
//!
//! Reads clinical case records from YAML, JSON or CSV and produces staging,
//! survival, treatment-effectiveness, surgical, FLOT and integrated
//! treatment-decision analytics.

pub mod analysis;
pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
pub mod schema;
pub mod yaml;
