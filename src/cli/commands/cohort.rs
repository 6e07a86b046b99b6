//! `srcc cohort` command - Cohort demographics, staging and composite risk

use miette::Result;
use std::path::PathBuf;

use crate::analysis::cohort::CohortAnalysis;
use crate::cli::helpers::{emit, is_tabular, load_config, load_srcc_cases, resolve_format, table_config};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct CohortArgs {
    /// Case file or directory of case files
    pub path: PathBuf,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("stage", "STAGE", 10),
    ColumnDef::new("risk", "RISK SCORE", 11),
    ColumnDef::new("high_risk", "HIGH RISK", 10),
];

/// The summary prints as YAML by default; table formats list per-case risk
pub fn run(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_srcc_cases(&args.path)?;
    let analysis = CohortAnalysis::from_cases(&cases);

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return emit(&analysis, format);
    }

    let rows = analysis.case_risks.iter().map(|risk| {
        TableRow::new(risk.case_id.clone())
            .cell("stage", CellValue::Text(risk.stage.clone()))
            .cell("risk", CellValue::Float(risk.risk_score, 1))
            .cell("high_risk", CellValue::Flag(risk.high_risk))
    });
    TableFormatter::new(COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}
