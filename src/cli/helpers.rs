//! Shared helper functions for CLI commands
//!
//! Record loading, output-format resolution and serialization used by more
//! than one command module.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::cli::table::TableConfig;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{load_records, Config};
use crate::entities::case::SrccCase;

/// Load the effective configuration for this invocation
pub fn load_config(global: &GlobalOpts) -> Config {
    Config::load_from(global.project.as_deref())
}

/// Resolve `auto` against the configured default format, then against
/// `fallback`
pub fn resolve_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|name| <OutputFormat as clap::ValueEnum>::from_str(name, true).ok())
        .filter(|format| *format != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Load every record under `path`, failing on an empty result
pub fn load_cohort<T: DeserializeOwned + 'static>(path: &Path, what: &str) -> Result<Vec<T>> {
    let records: Vec<T> = load_records(path)?;
    if records.is_empty() {
        return Err(miette::miette!("no {} found in {}", what, path.display()));
    }
    Ok(records)
}

/// Load an SRCC cohort and reject any case with out-of-range values
pub fn load_srcc_cases(path: &Path) -> Result<Vec<SrccCase>> {
    let cases: Vec<SrccCase> = load_cohort(path, "SRCC cases")?;
    for case in &cases {
        case.validate().map_err(in_case(&case.case_id()))?;
    }
    Ok(cases)
}

/// Attach the offending case to an engine error
pub fn in_case<E>(case_id: &str) -> impl FnOnce(E) -> miette::Report
where
    E: miette::Diagnostic + Send + Sync + 'static,
{
    let case_id = case_id.to_string();
    move |err| miette::Report::new(err).wrap_err(format!("case {}", case_id))
}

/// Table settings for this invocation; `--quiet` drops the summary line
pub fn table_config(global: &GlobalOpts) -> TableConfig {
    if global.quiet {
        TableConfig::for_pipe()
    } else {
        TableConfig::default()
    }
}

/// Serialize a value as JSON or YAML; table formats fall back to YAML
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value).into_diagnostic()?;
            json.push('\n');
            Ok(json)
        }
        _ => serde_yml::to_string(value).into_diagnostic(),
    }
}

/// Print a structured result in the requested format
pub fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    print!("{}", render(value, format)?);
    Ok(())
}

/// Whether the format is one of the tabular ones
pub fn is_tabular(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Tsv | OutputFormat::Csv | OutputFormat::Md)
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("épigastralgie", 8), "épiga...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_resolve_format() {
        let config = Config {
            default_format: Some("json".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &config, OutputFormat::Yaml),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Csv), &config, OutputFormat::Yaml),
            OutputFormat::Csv
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &Config::default(), OutputFormat::Tsv),
            OutputFormat::Tsv
        );

        let bogus = Config {
            default_format: Some("xml".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &bogus, OutputFormat::Yaml),
            OutputFormat::Yaml
        );
    }

    #[test]
    fn test_render_json_and_yaml() {
        let value: BTreeMap<&str, u32> = [("cases", 3)].into_iter().collect();
        assert_eq!(render(&value, OutputFormat::Json).unwrap().trim(), "{\n  \"cases\": 3\n}");
        assert_eq!(render(&value, OutputFormat::Yaml).unwrap().trim(), "cases: 3");
        assert_eq!(render(&value, OutputFormat::Md).unwrap().trim(), "cases: 3");
    }
}
