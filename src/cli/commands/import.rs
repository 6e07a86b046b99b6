//! `srcc import` command - Import a CSV export as SRCC case files

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::stage_parser::parse_stage;
use crate::cli::helpers::{emit, load_config, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::import::{import_csv, ColumnProfile, ImportResult, RowError};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Directory the case files are written to
    #[arg(long, short = 'o', default_value = "cases")]
    pub output: PathBuf,

    /// Staging to use for rows whose staging is missing or unparsable
    /// (default: the configured default_stage, else the row fails)
    #[arg(long, value_name = "STAGE")]
    pub default_stage: Option<String>,

    /// Map and profile the CSV without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Write the rows that mapped even when others failed
    #[arg(long)]
    pub skip_errors: bool,

    /// Print a CSV header with the recognized columns
    #[arg(long)]
    pub template: bool,
}

/// Columns the importer understands, with an example row
const TEMPLATE: &[(&str, &str)] = &[
    ("patient_id", "P001"),
    ("age", "62"),
    ("gender", "F"),
    ("tumor_stage", "T3N1M0"),
    ("histology", "cellules en bague à chaton"),
    ("symptoms", "épigastralgie; amaigrissement"),
    ("flot_cycles", "4"),
    ("surgical_outcome", "complet"),
    ("survival_months", "18.5"),
];

/// Machine-readable outcome of an import
#[derive(Debug, Serialize)]
struct ImportReport<'a> {
    total_rows: usize,
    imported: usize,
    dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<PathBuf>,
    errors: &'a [RowError],
    schema: &'a BTreeMap<String, ColumnProfile>,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        return print_template();
    }
    let file = args
        .file
        .as_deref()
        .ok_or_else(|| miette::miette!("a CSV file is required"))?;

    let config = load_config(global);
    let default_stage = match args.default_stage.as_deref() {
        Some(raw) => Some(parse_stage(raw)?),
        None => config.default_stage()?,
    };

    let result = import_csv(file, default_stage)?;

    if !result.errors.is_empty() {
        for error in &result.errors {
            eprintln!("{} {}", style("✗").red(), error);
        }
        if !args.skip_errors {
            return Err(miette::miette!(
                help = "fix the rows above, pass --default-stage for staging failures, or --skip-errors to import the rows that mapped",
                "{} of {} rows could not be imported",
                result.errors.len(),
                result.total_rows
            ));
        }
    }

    let files = if args.dry_run {
        Vec::new()
    } else {
        write_cases(&result, &args.output)?
    };

    if matches!(global.format, OutputFormat::Yaml | OutputFormat::Json) {
        let report = ImportReport {
            total_rows: result.total_rows,
            imported: result.successful(),
            dry_run: args.dry_run,
            files,
            errors: &result.errors,
            schema: &result.schema,
        };
        return emit(&report, global.format);
    }

    if global.quiet {
        for path in &files {
            println!("{}", path.display());
        }
        return Ok(());
    }

    print_profile(&result);
    println!();
    if args.dry_run {
        println!(
            "{} Dry run: {} of {} rows would be imported to {}",
            style("○").dim(),
            style(result.successful()).cyan(),
            result.total_rows,
            style(args.output.display()).dim()
        );
    } else {
        println!(
            "{} Imported {} of {} rows to {}",
            style("✓").green(),
            style(result.successful()).cyan(),
            result.total_rows,
            style(args.output.display()).dim()
        );
    }
    Ok(())
}

/// Write one YAML file per case, named after its case identifier
fn write_cases(result: &ImportResult, output: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output).into_diagnostic()?;

    let mut used = HashSet::new();
    let mut files = Vec::with_capacity(result.cases.len());
    for case in &result.cases {
        let stem = file_stem(&case.case_id());
        let mut name = stem.clone();
        let mut n = 1;
        while !used.insert(name.clone()) {
            n += 1;
            name = format!("{}_{}", stem, n);
        }

        let path = output.join(format!("{}.yaml", name));
        let yaml = serde_yml::to_string(case).into_diagnostic()?;
        fs::write(&path, yaml).into_diagnostic()?;
        files.push(path);
    }
    Ok(files)
}

/// Case identifier reduced to characters safe in a file name
fn file_stem(case_id: &str) -> String {
    let stem: String = case_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "case".to_string()
    } else {
        stem
    }
}

fn print_profile(result: &ImportResult) {
    println!("{}", style("Column profile").bold().underlined());
    println!();
    println!(
        "  {:<22} {:<20} {:>9} {:>7}  {}",
        style("COLUMN").bold(),
        style("TYPE").bold(),
        style("FILLED").bold(),
        style("UNIQUE").bold(),
        style("SAMPLES").bold()
    );
    for (column, profile) in &result.schema {
        let filled = format!("{:.1}%", profile.completeness);
        let filled = if profile.completeness < 80.0 {
            style(filled).yellow()
        } else {
            style(filled).green()
        };
        println!(
            "  {:<22} {:<20} {:>9} {:>7}  {}",
            style(truncate_str(column, 22)).cyan(),
            profile.kind.to_string(),
            filled,
            profile.unique_values,
            style(truncate_str(&profile.sample_values.join(", "), 40)).dim()
        );
    }
}

fn print_template() -> Result<()> {
    let headers: Vec<&str> = TEMPLATE.iter().map(|(h, _)| *h).collect();
    let example: Vec<&str> = TEMPLATE.iter().map(|(_, v)| *v).collect();
    println!("{}", headers.join(","));
    println!("{}", example.join(","));

    // Stderr, so the template can be redirected to a file
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: srcc import --template > cohort.csv",
        style("→").blue()
    );
    Ok(())
}
