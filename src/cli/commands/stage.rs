//! `srcc stage` command - Parse TNM staging strings

use miette::Result;
use serde::Serialize;

use crate::analysis::stage_parser::{parse_stage, parse_stage_or};
use crate::cli::helpers::{emit, is_tabular, load_config, resolve_format, table_config};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::staging::TnmStaging;

#[derive(clap::Args, Debug)]
pub struct StageArgs {
    /// Staging strings such as T3N1M0 or "ypT2 N1 M0"
    #[arg(required = true)]
    pub stagings: Vec<String>,

    /// Staging to substitute when a string cannot be parsed
    /// (default: the configured default_stage, else fail)
    #[arg(long, value_name = "STAGE")]
    pub default_stage: Option<String>,
}

#[derive(Debug, Serialize)]
struct ParsedStaging {
    input: String,
    staging: TnmStaging,
    /// The default staging was substituted for an unparsable input
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    fallback: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("tnm", "TNM", 12),
    ColumnDef::new("t", "T", 5),
    ColumnDef::new("n", "N", 5),
    ColumnDef::new("m", "M", 5),
    ColumnDef::new("group", "STAGE GROUP", 15),
    ColumnDef::new("fallback", "FALLBACK", 10),
];

pub fn run(args: StageArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let default = match args.default_stage.as_deref() {
        Some(raw) => Some(parse_stage(raw)?),
        None => config.default_stage()?,
    };

    let parsed = args
        .stagings
        .iter()
        .map(|input| {
            let fallback = parse_stage(input).is_err();
            let staging = parse_stage_or(input, default)?;
            Ok(ParsedStaging {
                input: input.clone(),
                staging,
                fallback,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if !is_tabular(format) {
        return emit(&parsed, format);
    }

    let rows = parsed.iter().map(|p| {
        TableRow::new(p.input.clone())
            .cell("tnm", CellValue::Text(p.staging.to_string()))
            .cell("t", CellValue::Text(p.staging.tumor.to_string()))
            .cell("n", CellValue::Text(p.staging.node.to_string()))
            .cell("m", CellValue::Text(p.staging.metastasis.to_string()))
            .cell("group", CellValue::Stage(p.staging.stage_group()))
            .cell("fallback", CellValue::Flag(p.fallback))
    });
    TableFormatter::new(COLUMNS, "INPUT", "staging")
        .with_config(table_config(global))
        .output(rows, format);
    Ok(())
}
