//! CLI command implementations

pub mod cohort;
pub mod completions;
pub mod config;
pub mod decide;
pub mod effectiveness;
pub mod flot;
pub mod import;
pub mod stage;
pub mod surgery;
pub mod survival;
pub mod validate;
