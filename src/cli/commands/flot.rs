//! `srcc flot` command - Perioperative FLOT chemotherapy analytics

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::analysis::flot::{
    analyze_flot_cohort, analyze_flot_regimen, optimize_flot_protocol, score_flot_case,
    FlotAnalysis, FlotRegimenAnalysis,
};
use crate::cli::helpers::{
    emit, in_case, is_tabular, load_cohort, load_config, resolve_format, table_config,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::flot::FlotCase;

#[derive(Subcommand, Debug)]
pub enum FlotCommands {
    /// Adherence, response, toxicity and surgical readiness of one case
    Analyze(CaseArgs),

    /// Regimen applicability, dose intensity and overall assessment
    Regimen(CaseArgs),

    /// Descriptive metrics over a FLOT cohort
    Cohort(CohortArgs),

    /// Protocol-level optimization findings
    Optimize(CohortArgs),
}

#[derive(clap::Args, Debug)]
pub struct CaseArgs {
    /// FLOT case file
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CohortArgs {
    /// Case file or directory of case files
    pub path: PathBuf,
}

const ANALYZE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("completion", "COMPLETION", 11),
    ColumnDef::new("adherence", "ADHERENCE", 10),
    ColumnDef::new("response", "RESPONSE", 9),
    ColumnDef::new("toxicity", "TOXICITY", 9),
    ColumnDef::new("tolerability", "TOLERABILITY", 13),
    ColumnDef::new("quality", "QUALITY", 8),
    ColumnDef::new("surgery", "SURGERY", 40),
];

const REGIMEN_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("phase", "PHASE", 14),
    ColumnDef::new("rdi", "RDI", 7),
    ColumnDef::new("composite", "COMPOSITE", 10),
    ColumnDef::new("grade", "GRADE", 12),
];

pub fn run(cmd: FlotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FlotCommands::Analyze(args) => run_analyze(args, global),
        FlotCommands::Regimen(args) => run_regimen(args, global),
        FlotCommands::Cohort(args) => run_cohort(args, global),
        FlotCommands::Optimize(args) => run_optimize(args, global),
    }
}

fn run_analyze(args: CaseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<FlotCase> = load_cohort(&args.file, "FLOT cases")?;
    let analyses = cases
        .iter()
        .map(|case| score_flot_case(case).map_err(in_case(&case.case_id)))
        .collect::<Result<Vec<FlotAnalysis>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return match analyses.as_slice() {
            [single] => emit(single, format),
            many => emit(&many, format),
        };
    }

    let rows = analyses.iter().map(|a| {
        TableRow::new(a.case_id.clone())
            .cell("completion", CellValue::Percent(a.completion_rate * 100.0))
            .cell("adherence", CellValue::Float(a.adherence_score, 1))
            .cell("response", CellValue::OptionalFloat(a.response_score, 1))
            .cell("toxicity", CellValue::Float(a.toxicity_burden_score, 1))
            .cell("tolerability", CellValue::Text(a.tolerability_rating.to_string()))
            .cell("quality", CellValue::Float(a.treatment_quality_score, 1))
            .cell("surgery", CellValue::Text(a.surgery_recommendation.clone()))
    });
    TableFormatter::new(ANALYZE_COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}

fn run_regimen(args: CaseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<FlotCase> = load_cohort(&args.file, "FLOT cases")?;
    let analyses = cases
        .iter()
        .map(|case| analyze_flot_regimen(case).map_err(in_case(&case.case_id)))
        .collect::<Result<Vec<FlotRegimenAnalysis>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return match analyses.as_slice() {
            [single] => emit(single, format),
            many => emit(&many, format),
        };
    }

    let rows = analyses.iter().map(|a| {
        TableRow::new(a.case_id.clone())
            .cell("phase", CellValue::Text(a.flot_phase.to_string()))
            .cell("rdi", CellValue::Percent(a.dose_intensity.relative_dose_intensity))
            .cell("composite", CellValue::Float(a.overall_assessment.composite_score, 1))
            .cell("grade", CellValue::Text(a.overall_assessment.grade.to_string()))
    });
    TableFormatter::new(REGIMEN_COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}

fn load_valid_cohort(path: &std::path::Path) -> Result<Vec<FlotCase>> {
    let cases: Vec<FlotCase> = load_cohort(path, "FLOT cases")?;
    for case in &cases {
        case.validate().map_err(in_case(&case.case_id))?;
    }
    Ok(cases)
}

fn run_cohort(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_valid_cohort(&args.path)?;
    let summary = analyze_flot_cohort(&cases)?;
    emit(&summary, resolve_format(global, &config, OutputFormat::Yaml))
}

fn run_optimize(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_valid_cohort(&args.path)?;
    let Some(optimization) = optimize_flot_protocol(&cases)? else {
        return Ok(());
    };

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return emit(&optimization, format);
    }

    // Table formats list the flagged patients
    let columns = [
        ColumnDef::new("patient", "PATIENT", 12),
        ColumnDef::new("factors", "RISK FACTORS", 60),
    ];
    let rows = optimization.high_risk_patients.iter().map(|p| {
        TableRow::new(p.case_id.clone())
            .cell("patient", CellValue::Id(p.patient_id.clone()))
            .cell("factors", CellValue::Tags(p.risk_factors.clone()))
    });
    TableFormatter::new(&columns, "CASE", "high-risk case")
        .with_config(table_config(global))
        .output(rows, format);

    if !global.quiet && format == OutputFormat::Tsv {
        println!(
            "{} optimal cycle count: {}",
            style("→").dim(),
            style(optimization.optimal_cycle_number).cyan()
        );
        for recommendation in &optimization.optimization_recommendations {
            println!("  {} {}", style("•").dim(), recommendation);
        }
    }
    Ok(())
}
