//! Core module - errors, configuration, project discovery and record loading

pub mod config;
pub mod error;
pub mod loader;
pub mod project;

pub use config::Config;
pub use error::{InputError, StageParseError};
pub use loader::{load_record, load_records, FileFormat, LoadError};
pub use project::{Project, ProjectError};
