//! `srcc effectiveness` command - Outcomes per treatment protocol

use miette::Result;
use std::path::PathBuf;

use crate::analysis::effectiveness::analyze_protocol_outcomes;
use crate::cli::helpers::{emit, is_tabular, load_config, load_srcc_cases, resolve_format, table_config};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct EffectivenessArgs {
    /// Case file or directory of case files
    pub path: PathBuf,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("cases", "CASES", 7),
    ColumnDef::new("response", "RESPONSE", 10),
    ColumnDef::new("complications", "COMPLICATIONS", 14),
    ColumnDef::new("median", "MEDIAN OS", 10),
    ColumnDef::new("mean", "MEAN OS", 9),
    ColumnDef::new("completion", "COMPLETION", 11),
];

pub fn run(args: EffectivenessArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let cases = load_srcc_cases(&args.path)?;
    let summaries = analyze_protocol_outcomes(&cases);

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if !is_tabular(format) {
        return emit(&summaries, format);
    }

    let rows = summaries.values().map(|s| {
        TableRow::new(s.protocol.to_string())
            .cell("cases", CellValue::Number(s.cases as i64))
            .cell("response", CellValue::Percent(s.response_rate))
            .cell("complications", CellValue::Percent(s.complication_rate))
            .cell("median", CellValue::OptionalFloat(s.median_survival, 1))
            .cell("mean", CellValue::OptionalFloat(s.mean_survival, 1))
            .cell(
                "completion",
                s.mean_completion_rate
                    .map_or(CellValue::Empty, |rate| CellValue::Percent(rate * 100.0)),
            )
    });
    TableFormatter::new(COLUMNS, "PROTOCOL", "protocol")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}
