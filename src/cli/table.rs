//! Table formatting for CLI commands that print one row per case
//!
//! Every tabular command builds [`TableRow`]s of typed [`CellValue`]s and
//! hands them to a [`TableFormatter`], which renders them as aligned
//! coloured text, CSV or a Markdown table. Text cells longer than their
//! column are truncated in the aligned text output only.

use console::style;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::analysis::surgery::{Complexity, RiskCategory};
use crate::cli::OutputFormat;
use crate::entities::staging::StageGroup;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Show summary line after table (e.g., "5 case(s)")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self { show_summary: true }
    }
}

impl TableConfig {
    /// Config for piped output: rows only, no summary line
    pub fn for_pipe() -> Self {
        Self {
            show_summary: false,
        }
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Case or patient identifier (cyan)
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// TNM stage group, coloured by severity
    Stage(StageGroup),
    /// Surgical risk band, coloured by severity
    Risk(RiskCategory),
    /// Scheduling complexity, coloured like a risk band
    Complexity(Complexity),
    /// Yes/no flag; `yes` is highlighted
    Flag(bool),
    /// Integer count
    Number(i64),
    /// Float with precision
    Float(f64, usize),
    /// Optional float with precision, `-` when absent
    OptionalFloat(Option<f64>, usize),
    /// Percentage already on a 0-100 scale
    Percent(f64),
    /// List as comma-separated text
    Tags(Vec<String>),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(id).cyan(), width = width),
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Stage(group) => {
                let s = group.to_string();
                let styled = match group.rank() {
                    Some(1) | Some(2) => style(s).green(),
                    Some(3) => style(s).yellow(),
                    Some(_) => style(s).red().bold(),
                    None => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Risk(category) => {
                let s = category.to_string();
                let styled = match category {
                    RiskCategory::VeryHigh => style(s).red().bold(),
                    RiskCategory::High => style(s).red(),
                    RiskCategory::Moderate => style(s).yellow(),
                    RiskCategory::Low => style(s).green(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Complexity(complexity) => {
                let s = complexity.to_string();
                let styled = match complexity {
                    Complexity::High => style(s).red(),
                    Complexity::Moderate => style(s).yellow(),
                    Complexity::Low => style(s).green(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Flag(flag) => {
                let styled = if *flag {
                    style("yes").red().bold()
                } else {
                    style("no").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Float(f, precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::OptionalFloat(Some(f), precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::OptionalFloat(None, _) | CellValue::Empty => {
                format!("{:>width$}", style("-").dim(), width = width)
            }
            CellValue::Percent(p) => format!("{:>width$}", format!("{:.1}%", p), width = width),
            CellValue::Tags(tags) => {
                let joined = tags.join(", ");
                format!(
                    "{:<width$}",
                    truncate_str(&joined, width.saturating_sub(2)),
                    width = width
                )
            }
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => escape_csv(s),
            CellValue::Tags(tags) => escape_csv(&tags.join(", ")),
            CellValue::OptionalFloat(None, _) | CellValue::Empty => String::new(),
            CellValue::Percent(p) => format!("{:.1}", p),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Flag(true) => "**yes**".to_string(),
            CellValue::OptionalFloat(None, _) | CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Raw string value, no formatting
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Stage(group) => group.to_string(),
            CellValue::Risk(category) => category.to_string(),
            CellValue::Complexity(complexity) => complexity.to_string(),
            CellValue::Flag(flag) => if *flag { "yes" } else { "no" }.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::OptionalFloat(opt, precision) => opt
                .map(|f| format!("{:.prec$}", f, prec = precision))
                .unwrap_or_default(),
            CellValue::Percent(p) => format!("{:.1}%", p),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::OptionalFloat(None, _) | CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output, keyed by its row identifier
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    /// Header of the leading identifier column
    id_header: &'static str,
    row_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], id_header: &'static str, row_name: &'static str) -> Self {
        Self {
            columns,
            id_header,
            row_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();
        print!("{}", self.render(&rows, format));
    }

    /// Render rows to a string; YAML and JSON fall back to the text table
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            _ => self.render_tsv(rows),
        }
    }

    /// Dynamic column widths based on actual content, capped at each
    /// column's defined width
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.id_header.len());

        let mut widths = vec![id_width];
        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            // +2 for the truncation buffer
            let natural_width = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural_width.min(col.width));
        }
        widths
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let mut header_parts = vec![format!(
            "{:<width$}",
            style(self.id_header).bold().dim(),
            width = widths[0]
        )];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header_parts.push(format!("{:<width$}", style(col.header).bold(), width = *width));
        }
        out.push_str(&header_parts.join(" "));
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let mut row_parts = vec![CellValue::Id(row.id.clone()).format_tsv(widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                let value = row.get(col.key).unwrap_or(&CellValue::Empty);
                row_parts.push(value.format_tsv(*width));
            }
            out.push_str(&row_parts.join(" "));
            out.push('\n');
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s)\n", style(rows.len()).cyan(), self.row_name));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let mut headers = vec!["id"];
        headers.extend(self.columns.iter().map(|c| c.key));
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let mut values = vec![escape_csv(&row.id)];
            for col in self.columns {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut builder = Builder::default();
        let mut headers = vec![self.id_header.to_string()];
        headers.extend(self.columns.iter().map(|c| c.header.to_string()));
        builder.push_record(headers);

        for row in rows {
            let mut values = vec![row.id.replace('|', "\\|")];
            for col in self.columns {
                values.push(
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            builder.push_record(values);
        }
        let mut table = builder.build().with(Style::markdown()).to_string();
        table.push('\n');
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("stage", "STAGE", 14),
        ColumnDef::new("risk", "RISK", 30),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new("P001")
                .cell("stage", CellValue::Stage(StageGroup::II))
                .cell("risk", CellValue::OptionalFloat(Some(42.5), 1)),
            TableRow::new("P002").cell("stage", CellValue::Stage(StageGroup::IV)),
        ]
    }

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_cell_value_optional_float() {
        assert_eq!(CellValue::OptionalFloat(Some(12.345), 1).format_csv(), "12.3");
        assert_eq!(CellValue::OptionalFloat(None, 1).format_csv(), "");
        assert_eq!(CellValue::OptionalFloat(None, 1).format_md(), "-");
    }

    #[test]
    fn test_cell_value_flag_and_percent() {
        assert_eq!(CellValue::Flag(true).format_md(), "**yes**");
        assert_eq!(CellValue::Flag(false).format_csv(), "no");
        assert_eq!(CellValue::Percent(66.666).raw(), "66.7%");
        assert_eq!(CellValue::Percent(66.666).format_csv(), "66.7");
    }

    #[test]
    fn test_cell_value_tags() {
        let cell = CellValue::Tags(vec!["FLOT".to_string(), "XELOX".to_string()]);
        assert_eq!(cell.format_csv(), "\"FLOT, XELOX\"");
        assert_eq!(cell.format_md(), "FLOT, XELOX");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b".to_string());
        assert_eq!(cell.format_md(), "a\\|b");
    }

    #[test]
    fn test_table_row_builder() {
        let row = TableRow::new("P001").cell("stage", CellValue::Stage(StageGroup::I));
        assert_eq!(row.id, "P001");
        assert!(row.get("stage").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_render_csv() {
        let formatter = TableFormatter::new(COLUMNS, "CASE", "case");
        let csv = formatter.render(&rows(), OutputFormat::Csv);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,stage,risk");
        assert_eq!(lines[1], "P001,Stage II,42.5");
        assert_eq!(lines[2], "P002,Stage IV,");
    }

    #[test]
    fn test_render_markdown() {
        let formatter = TableFormatter::new(COLUMNS, "CASE", "case");
        let md = formatter.render(&rows(), OutputFormat::Md);
        assert!(md.lines().next().unwrap().contains("CASE"));
        assert!(md.contains("Stage IV"));
        assert!(md.contains("|-"));
    }

    #[test]
    fn test_render_tsv_summary() {
        let formatter = TableFormatter::new(COLUMNS, "CASE", "case");
        let tsv = formatter.render(&rows(), OutputFormat::Tsv);
        assert!(tsv.contains("P001"));
        assert!(tsv.trim_end().ends_with("case(s)"));

        let piped = formatter
            .with_config(TableConfig::for_pipe())
            .render(&rows(), OutputFormat::Tsv);
        assert!(!piped.contains("case(s)"));
    }

    #[test]
    fn test_table_config_for_pipe() {
        assert!(!TableConfig::for_pipe().show_summary);
        assert!(TableConfig::default().show_summary);
    }

    #[test]
    fn test_typed_risk_cells() {
        let cell = CellValue::Risk(RiskCategory::VeryHigh);
        assert_eq!(cell.raw(), "Very High");
        assert_eq!(cell.format_csv(), "Very High");
        assert!(cell.format_tsv(12).contains("Very High"));
        assert_eq!(CellValue::Risk(RiskCategory::from_score(60.0)).format_md(), "High");

        let cell = CellValue::Complexity(Complexity::Moderate);
        assert_eq!(cell.format_csv(), "Moderate");
        assert_eq!(cell.display_width(), "Moderate".len());
    }

    #[test]
    fn test_long_multibyte_text_truncates_in_tsv_only() {
        let term = "cellules en bague à chaton, épigastralgie persistante";
        let cell = CellValue::Text(term.to_string());
        assert_eq!(cell.format_csv(), format!("\"{}\"", term));
        assert_eq!(cell.format_md(), term);
        let tsv = cell.format_tsv(12);
        assert!(!tsv.contains("persistante"));
    }
}
