//! `srcc validate` command - Check record files against the bundled schemas

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::loader::record_files;
use crate::schema::{RecordKind, SchemaRegistry, ValidateFileError, Validator};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Record files or directories to validate
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Record kind for every file (default: inferred per file)
    #[arg(long, short = 'k', value_enum)]
    pub kind: Option<RecordKind>,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    files_skipped: usize,
    records_checked: usize,
    total_errors: usize,
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let mut files = Vec::new();
    for path in &args.paths {
        files.extend(record_files(path)?);
    }

    if files.is_empty() {
        println!("{}", style("No record files found to validate").yellow());
        return Ok(());
    }

    let quiet = global.quiet;
    let verbose = !args.summary && !quiet;
    if verbose {
        println!(
            "{} Validating {} file(s)...\n",
            style("→").blue(),
            style(files.len()).cyan()
        );
    }

    let validator = Validator::new(&SchemaRegistry::default());
    let mut stats = ValidationStats::default();

    for path in &files {
        match validator.validate_file(path, args.kind) {
            Ok(result) => {
                stats.files_checked += 1;
                stats.files_passed += 1;
                stats.records_checked += result.records;
                if verbose {
                    println!(
                        "{} {} ({} {})",
                        style("✓").green(),
                        path.display(),
                        result.records,
                        style(result.kind.as_str()).dim()
                    );
                }
            }
            Err(ValidateFileError::UnknownKind { .. }) => {
                stats.files_skipped += 1;
                if verbose {
                    println!(
                        "{} {} - {}",
                        style("?").yellow(),
                        path.display(),
                        style("unknown record kind, skipped").dim()
                    );
                }
            }
            Err(ValidateFileError::Invalid(e)) => {
                stats.files_checked += 1;
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();
                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        path.display(),
                        e.violation_count()
                    );
                    println!("{:?}", miette::Report::new(e));
                }
            }
            Err(e @ ValidateFileError::Io { .. }) => return Err(e.into()),
        }
    }

    if !quiet {
        print_summary(&stats);
    }

    match stats.files_failed {
        0 => {
            if !quiet {
                println!("{} All files passed validation!", style("✓").green().bold());
            }
            Ok(())
        }
        1 => Err(miette::miette!("Validation failed: 1 file has errors")),
        n => Err(miette::miette!("Validation failed: {} files have errors", n)),
    }
}

fn print_summary(stats: &ValidationStats) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Records:        {}", style(stats.records_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.files_skipped > 0 {
        println!("  Files skipped:  {}", style(stats.files_skipped).yellow());
    }
    println!();
}
