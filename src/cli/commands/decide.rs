//! `srcc decide` command - Integrated treatment decisions

use clap::Subcommand;
use miette::Result;
use std::path::{Path, PathBuf};

use crate::analysis::decision::{
    analyze_decision_cohort, decide, decide_all, optimize_decision_algorithms, PrecisionDecision,
};
use crate::cli::helpers::{
    emit, in_case, is_tabular, load_cohort, load_config, resolve_format, table_config,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::integrated::IntegratedCase;

#[derive(Subcommand, Debug)]
pub enum DecideCommands {
    /// Decision for one integrated case
    Case(CaseArgs),

    /// Decisions summarized across a cohort
    Cohort(CohortArgs),

    /// Where the decision rules are least certain
    Optimize(CohortArgs),
}

#[derive(clap::Args, Debug)]
pub struct CaseArgs {
    /// Integrated case file
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CohortArgs {
    /// Case file or directory of case files
    pub path: PathBuf,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("class", "DECISION", 20),
    ColumnDef::new("sequence", "SEQUENCE", 22),
    ColumnDef::new("risk", "RISK", 7),
    ColumnDef::new("survival", "OS MONTHS", 10),
    ColumnDef::new("qol", "QOL", 6),
    ColumnDef::new("confidence", "CONFIDENCE", 11),
];

pub fn run(cmd: DecideCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DecideCommands::Case(args) => run_case(args, global),
        DecideCommands::Cohort(args) => run_cohort(args, global),
        DecideCommands::Optimize(args) => run_optimize(args, global),
    }
}

fn run_case(args: CaseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<IntegratedCase> = load_cohort(&args.file, "integrated cases")?;
    let decisions = cases
        .iter()
        .map(|case| decide(case).map_err(in_case(&case.case_id)))
        .collect::<Result<Vec<PrecisionDecision>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return match decisions.as_slice() {
            [single] => emit(single, format),
            many => emit(&many, format),
        };
    }
    print_decisions(&decisions, format, global);
    Ok(())
}

fn load_valid_cohort(path: &Path) -> Result<Vec<IntegratedCase>> {
    let cases: Vec<IntegratedCase> = load_cohort(path, "integrated cases")?;
    for case in &cases {
        case.validate().map_err(in_case(&case.case_id))?;
    }
    Ok(cases)
}

/// The summary prints as YAML by default; table formats list every decision
fn run_cohort(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_valid_cohort(&args.path)?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if is_tabular(format) {
        let decisions = decide_all(&cases)?;
        print_decisions(&decisions, format, global);
        return Ok(());
    }
    emit(&analyze_decision_cohort(&cases)?, format)
}

fn run_optimize(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_valid_cohort(&args.path)?;
    let optimization = optimize_decision_algorithms(&cases)?;
    emit(&optimization, resolve_format(global, &config, OutputFormat::Yaml))
}

fn print_decisions(decisions: &[PrecisionDecision], format: OutputFormat, global: &GlobalOpts) {
    let rows = decisions.iter().map(|d| {
        TableRow::new(d.case_id.clone())
            .cell("class", CellValue::Text(d.decision_class.to_string()))
            .cell("sequence", CellValue::Text(d.recommended_sequence.to_string()))
            .cell("risk", CellValue::Float(d.overall_risk_score, 1))
            .cell("survival", CellValue::OptionalFloat(d.predicted_survival_months, 1))
            .cell("qol", CellValue::Float(d.predicted_quality_of_life, 0))
            .cell("confidence", CellValue::Float(d.confidence_score, 2))
    });
    TableFormatter::new(COLUMNS, "CASE", "decision")
        .with_config(table_config(global))
        .output(rows, format);
}
