//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    cohort::CohortArgs,
    config::ConfigCommands,
    decide::DecideCommands,
    effectiveness::EffectivenessArgs,
    flot::FlotCommands,
    import::ImportArgs,
    stage::StageArgs,
    surgery::SurgeryCommands,
    survival::SurvivalArgs,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "srcc")]
#[command(author, version, about = "Gastric signet-ring-cell carcinoma analytics")]
#[command(long_about = "A Unix-style toolkit for staging, survival, surgical, FLOT and treatment-decision analytics over clinical case records kept as plain YAML, JSON or CSV files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .srcc/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse TNM staging strings
    Stage(StageArgs),

    /// Survival curve over SRCC cases
    Survival(SurvivalArgs),

    /// Outcome summary per treatment protocol
    Effectiveness(EffectivenessArgs),

    /// Demographics, staging and composite risk of a cohort
    Cohort(CohortArgs),

    /// Gastrectomy risk, KPIs, cohort analytics and scheduling
    #[command(subcommand)]
    Surgery(SurgeryCommands),

    /// Perioperative FLOT chemotherapy analytics
    #[command(subcommand)]
    Flot(FlotCommands),

    /// Integrated treatment decisions
    #[command(subcommand)]
    Decide(DecideCommands),

    /// Import a CSV export as SRCC case files
    Import(ImportArgs),

    /// Validate record files against schemas
    Validate(ValidateArgs),

    /// Show effective configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for one result, tsv for rows)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
