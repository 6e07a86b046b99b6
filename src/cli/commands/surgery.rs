//! `srcc surgery` command - Gastrectomy analytics
//!
//! `analyze` and `kpi` accept a single case file or a list; with more than
//! one case they print one result per case.

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::analysis::surgery::{
    analyze_gastrectomy_case, analyze_surgery_cohort, plan_surgical_schedule, score_surgical_case,
    GastrectomyKpis, SurgicalAnalysis,
};
use crate::cli::helpers::{
    emit, in_case, is_tabular, load_cohort, load_config, resolve_format, table_config,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::surgery::GastricSurgeryCase;

#[derive(Subcommand, Debug)]
pub enum SurgeryCommands {
    /// Pre-operative risk, approach and predictions
    Analyze(CaseArgs),

    /// Post-operative quality indicators
    Kpi(CaseArgs),

    /// Descriptive statistics over a surgery cohort
    Cohort(CohortArgs),

    /// Complexity-ordered operating-room plan
    Schedule(CohortArgs),
}

#[derive(clap::Args, Debug)]
pub struct CaseArgs {
    /// Surgery case file
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CohortArgs {
    /// Case file or directory of case files
    pub path: PathBuf,
}

const ANALYZE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("risk", "RISK", 7),
    ColumnDef::new("category", "CATEGORY", 11),
    ColumnDef::new("approach", "APPROACH", 14),
    ColumnDef::new("gastrectomy", "GASTRECTOMY", 14),
    ColumnDef::new("minutes", "OR MIN", 8),
    ColumnDef::new("stay", "LOS", 5),
    ColumnDef::new("nodes", "NODES", 7),
];

const KPI_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("r0", "R0", 5),
    ColumnDef::new("nodes", "NODES", 7),
    ColumnDef::new("major", "MAJOR CX", 9),
    ColumnDef::new("mortality", "30D MORT", 9),
    ColumnDef::new("quality", "QUALITY", 9),
    ColumnDef::new("grade", "GRADE", 18),
];

const SCHEDULE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("day", "DAY", 11),
    ColumnDef::new("minutes", "OR MIN", 8),
    ColumnDef::new("priority", "COMPLEXITY", 11),
    ColumnDef::new("team", "TEAM", 50),
];

pub fn run(cmd: SurgeryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SurgeryCommands::Analyze(args) => run_analyze(args, global),
        SurgeryCommands::Kpi(args) => run_kpi(args, global),
        SurgeryCommands::Cohort(args) => run_cohort(args, global),
        SurgeryCommands::Schedule(args) => run_schedule(args, global),
    }
}

fn run_analyze(args: CaseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<GastricSurgeryCase> = load_cohort(&args.file, "surgery cases")?;
    let analyses = cases
        .iter()
        .map(|case| score_surgical_case(case).map_err(in_case(&case.case_id)))
        .collect::<Result<Vec<SurgicalAnalysis>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return match analyses.as_slice() {
            [single] => emit(single, format),
            many => emit(&many, format),
        };
    }

    let rows = analyses.iter().map(|a| {
        TableRow::new(a.case_id.clone())
            .cell("risk", CellValue::Float(a.surgical_risk_score, 1))
            .cell("category", CellValue::Risk(a.risk_category))
            .cell("approach", CellValue::Text(a.recommended_approach.to_string()))
            .cell("gastrectomy", CellValue::Text(a.recommended_gastrectomy.to_string()))
            .cell("minutes", CellValue::Number(a.predicted_operative_time as i64))
            .cell("stay", CellValue::Number(a.predicted_hospital_stay as i64))
            .cell("nodes", CellValue::Number(a.lymph_node_target as i64))
    });
    TableFormatter::new(ANALYZE_COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}

fn run_kpi(args: CaseArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<GastricSurgeryCase> = load_cohort(&args.file, "surgery cases")?;
    let kpis = cases
        .iter()
        .map(|case| analyze_gastrectomy_case(case).map_err(in_case(&case.case_id)))
        .collect::<Result<Vec<GastrectomyKpis>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Yaml);
    if !is_tabular(format) {
        return match kpis.as_slice() {
            [single] => emit(single, format),
            many => emit(&many, format),
        };
    }

    let rows = kpis.iter().map(|k| {
        let nodes = k
            .lymph_node_analysis
            .total_nodes_examined
            .map_or(CellValue::Empty, |n| CellValue::Number(n as i64));
        TableRow::new(k.case_id.clone())
            .cell("r0", CellValue::Flag(k.r0_analysis.r0_achieved))
            .cell("nodes", nodes)
            .cell("major", CellValue::Flag(k.complications.major_complications > 0))
            .cell(
                "mortality",
                CellValue::Percent(k.mortality_risk.risk_30_day * 100.0),
            )
            .cell("quality", CellValue::Percent(k.quality_metrics.quality_percentage))
            .cell("grade", CellValue::Text(k.quality_metrics.quality_grade.to_string()))
    });
    TableFormatter::new(KPI_COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}

fn run_cohort(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<GastricSurgeryCase> = load_cohort(&args.path, "surgery cases")?;
    for case in &cases {
        case.validate().map_err(in_case(&case.case_id))?;
    }

    let summary = analyze_surgery_cohort(&cases);
    let format = resolve_format(global, &config, OutputFormat::Yaml);
    emit(&summary, format)
}

fn run_schedule(args: CohortArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases: Vec<GastricSurgeryCase> = load_cohort(&args.path, "surgery cases")?;
    for case in &cases {
        case.validate().map_err(in_case(&case.case_id))?;
    }
    let plan = plan_surgical_schedule(&cases)?;

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if !is_tabular(format) {
        return emit(&plan, format);
    }

    let rows = plan.schedule.iter().map(|entry| {
        TableRow::new(entry.case_id.clone())
            .cell("day", CellValue::Text(entry.recommended_day.clone()))
            .cell("minutes", CellValue::Number(entry.estimated_duration as i64))
            .cell("priority", CellValue::Complexity(entry.priority))
            .cell("team", CellValue::Text(entry.team_requirement.clone()))
    });
    TableFormatter::new(SCHEDULE_COLUMNS, "CASE", "case")
        .with_config(table_config(global))
        .output(rows, format);

    if !global.quiet && format == OutputFormat::Tsv {
        let resources = &plan.resource_recommendations;
        println!("{} {}", style("Utilization:").bold(), resources.peak_or_utilization);
        println!("{} {}", style("Case mix:").bold(), resources.optimal_case_mix);
        println!("{} {}", style("Team:").bold(), resources.team_planning);
    }
    Ok(())
}
