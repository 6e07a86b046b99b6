//! `srcc survival` command - Survival curves over SRCC cases

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::analysis::survival::{
    estimate_survival_by_stage_with, estimate_survival_with, SurvivalCurve, SurvivalMethod,
};
use crate::cli::helpers::{emit, is_tabular, load_config, load_srcc_cases, resolve_format, table_config};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SurvivalArgs {
    /// Case file or directory of case files
    pub path: PathBuf,

    /// One curve per stage group
    #[arg(long)]
    pub by_stage: bool,

    /// Estimator: simplified or kaplan-meier (default: configured survival_method)
    #[arg(long, short = 'm')]
    pub method: Option<SurvivalMethod>,
}

const POINT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("survival", "SURVIVAL", 10),
    ColumnDef::new("at_risk", "AT RISK", 9),
    ColumnDef::new("event", "EVENT", 7),
];

const STAGE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("cases", "CASES", 7),
    ColumnDef::new("events", "EVENTS", 8),
    ColumnDef::new("median", "MEDIAN", 8),
    ColumnDef::new("1y", "1Y", 7),
    ColumnDef::new("3y", "3Y", 7),
    ColumnDef::new("5y", "5Y", 7),
];

pub fn run(args: SurvivalArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let method = args.method.unwrap_or_else(|| config.survival_method());
    let cases = load_srcc_cases(&args.path)?;
    let format = resolve_format(global, &config, OutputFormat::Tsv);

    if args.by_stage {
        let curves = estimate_survival_by_stage_with(&cases, method);
        if !is_tabular(format) {
            return emit(&curves, format);
        }
        let rows = curves.iter().map(|(group, curve)| {
            TableRow::new(group.to_string())
                .cell("cases", CellValue::Number(curve.total_cases as i64))
                .cell("events", CellValue::Number(curve.events as i64))
                .cell("median", CellValue::OptionalFloat(curve.median_survival, 1))
                .cell("1y", landmark(curve, 12.0))
                .cell("3y", landmark(curve, 36.0))
                .cell("5y", landmark(curve, 60.0))
        });
        TableFormatter::new(STAGE_COLUMNS, "STAGE", "stage group")
            .with_config(table_config(global))
            .output(rows, format);
        return Ok(());
    }

    let curve = estimate_survival_with(&cases, method);
    if !is_tabular(format) {
        return emit(&curve, format);
    }

    let rows = curve.estimates.iter().map(|point| {
        TableRow::new(format!("{:.1}", point.time))
            .cell("survival", CellValue::Float(point.survival_probability, 3))
            .cell("at_risk", CellValue::Number(point.n_at_risk as i64))
            .cell("event", CellValue::Flag(point.event))
    });
    TableFormatter::new(POINT_COLUMNS, "MONTHS", "step")
        .with_config(table_config(global))
        .output(rows, format);

    if !global.quiet && format == OutputFormat::Tsv {
        let median = curve
            .median_survival
            .map_or_else(|| "not reached".to_string(), |m| format!("{:.1} months", m));
        println!(
            "{} {} cases, {} events, median survival {} ({})",
            style("→").dim(),
            curve.total_cases,
            curve.events,
            style(median).cyan(),
            method
        );
    }
    Ok(())
}

/// Survival probability at a landmark, blank before any follow-up reaches it
fn landmark(curve: &SurvivalCurve, months: f64) -> CellValue {
    let reached = curve.estimates.last().is_some_and(|p| p.time >= months);
    if reached {
        CellValue::Percent(curve.probability_at(months) * 100.0)
    } else {
        CellValue::Empty
    }
}
