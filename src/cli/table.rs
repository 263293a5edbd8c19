//! Table formatting utilities for CLI list and report commands
//!
//! Every tabular command builds [`TableRow`]s of typed [`CellValue`]s and
//! hands them to a [`TableFormatter`], which renders TSV (aligned, colored
//! on a terminal), CSV, Markdown or bare ids.
//!
//! # Text Wrapping
//!
//! - Use `TableConfig::with_wrap(width)` to enable word-wrapped multi-line rows
//! - CSV and ID formats remain single-line for pipability

use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "5 document(s) found")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config optimized for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Break a word that is wider than `max_width` into chunks
fn split_long_word(word: &str, max_width: usize, lines: &mut Vec<String>) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut chunks = chars.chunks(max_width).map(|c| c.iter().collect::<String>());
    let mut last = chunks.next().unwrap_or_default();
    for chunk in chunks {
        lines.push(std::mem::replace(&mut last, chunk));
    }
    last
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_line.is_empty() {
            current_line = if word_len > max_width {
                split_long_word(word, max_width, &mut lines)
            } else {
                word.to_string()
            };
        } else if current_line.chars().count() + 1 + word_len <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = if word_len > max_width {
                split_long_word(word, max_width, &mut lines)
            } else {
                word.to_string()
            };
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Color class of a free-text status label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Done,
    Waiting,
    Rejected,
    Late,
    Neutral,
}

impl StatusTone {
    pub fn of(status: &str) -> Self {
        let s = status.to_lowercase();
        if s.contains("approved") || (s.contains("issue") && !s.contains("not yet")) {
            StatusTone::Done
        } else if s.contains("waiting") || s.contains("comment") || s.contains("cmt") {
            StatusTone::Waiting
        } else if s.contains("reject") || s.contains("revise") {
            StatusTone::Rejected
        } else if s.contains("overdue") {
            StatusTone::Late
        } else {
            StatusTone::Neutral
        }
    }
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Document number (cyan)
    DocNo(String),
    /// Plain text, truncated to the column width
    Text(String),
    /// Status label with color coding
    Status(String),
    /// Opaque date string as found in the sheet ("-" if absent)
    Date(Option<String>),
    /// Boolean flag (yes=red bold, no=dim)
    Flag(bool),
    /// Numeric value
    Number(i64),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Text cell from an optional value
    pub fn opt_text(value: &Option<String>) -> Self {
        match value {
            Some(v) => CellValue::Text(v.clone()),
            None => CellValue::Empty,
        }
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::DocNo(no) => {
                let display = truncate_str(no, width);
                format!("{:<width$}", style(&display).cyan(), width = width)
            }
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Status(s) => {
                let display = truncate_str(s, width.saturating_sub(2));
                let styled = match StatusTone::of(s) {
                    StatusTone::Done => style(display).green(),
                    StatusTone::Waiting => style(display).yellow(),
                    StatusTone::Rejected => style(display).red(),
                    StatusTone::Late => style(display).red().bold(),
                    StatusTone::Neutral => style(display).white(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Date(date) => match date {
                Some(d) => format!("{:<width$}", d, width = width),
                None => format!("{:<width$}", style("-").dim(), width = width),
            },
            CellValue::Flag(flag) => {
                let styled = if *flag {
                    style("yes").red().bold()
                } else {
                    style("no").dim()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Number(n) => {
                format!("{:>width$}", n, width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Flag(true) => "**yes**".to_string(),
            CellValue::Date(None) | CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|").replace('\n', " ")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::DocNo(s) | CellValue::Text(s) | CellValue::Status(s) => s.clone(),
            CellValue::Date(date) => date.clone().unwrap_or_default(),
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Date(None) | CellValue::Empty => 1,
            CellValue::Flag(_) => 3,
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

/// A row of cell values for table output
pub struct TableRow {
    /// Value printed by `--format id`
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
    item_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat, visible_columns: &[&str])
    where
        I: IntoIterator<Item = TableRow>,
    {
        print!("{}", self.render(rows, format, visible_columns));
    }

    /// Render rows in the specified format
    pub fn render<I>(&self, rows: I, format: OutputFormat, visible_columns: &[&str]) -> String
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();
        let visible: Vec<&ColumnDef> = self
            .columns
            .iter()
            .filter(|c| visible_columns.contains(&c.key))
            .collect();

        match format {
            OutputFormat::Csv => self.render_csv(&rows, &visible),
            OutputFormat::Md => self.render_md(&rows, &visible),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_tsv(&rows, &visible),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow], visible: &[&ColumnDef]) -> Vec<usize> {
        visible
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);

                // +2 leaves room for the truncation buffer of text cells
                let natural_width = col.header.len().max(max_content.saturating_add(2));
                natural_width.min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow], visible: &[&ColumnDef]) -> String {
        let widths = self.calculate_widths(rows, visible);
        let mut out = String::new();

        let header: Vec<String> = visible
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap_width) => {
                    self.render_tsv_row_wrapped(&mut out, row, visible, &widths, wrap_width)
                }
                None => {
                    let parts: Vec<String> = visible
                        .iter()
                        .zip(&widths)
                        .map(|(col, w)| match row.get(col.key) {
                            Some(value) => value.format_tsv(*w),
                            None => format!("{:<width$}", "-", width = *w),
                        })
                        .collect();
                    out.push_str(parts.join(" ").trim_end());
                    out.push('\n');
                }
            }
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }

        out
    }

    fn render_tsv_row_wrapped(
        &self,
        out: &mut String,
        row: &TableRow,
        visible: &[&ColumnDef],
        widths: &[usize],
        wrap_width: usize,
    ) {
        let wrapped_cells: Vec<Vec<String>> = visible
            .iter()
            .map(|col| match row.get(col.key) {
                // Only free text wraps
                Some(value @ CellValue::Text(_)) => wrap_text(&value.raw(), wrap_width),
                Some(value) => vec![value.raw()],
                None => vec!["-".to_string()],
            })
            .collect();

        let max_lines = wrapped_cells.iter().map(|c| c.len()).max().unwrap_or(1);

        for line_idx in 0..max_lines {
            let parts: Vec<String> = wrapped_cells
                .iter()
                .enumerate()
                .map(|(col_idx, lines)| {
                    let width = widths.get(col_idx).copied().unwrap_or(10);
                    let content = lines.get(line_idx).map(|s| s.as_str()).unwrap_or("");
                    format!("{:<width$}", content, width = width)
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        // Blank line between multi-line rows for readability
        if max_lines > 1 {
            out.push('\n');
        }
    }

    fn render_csv(&self, rows: &[TableRow], visible: &[&ColumnDef]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = visible.iter().map(|c| c.key).collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = visible
                .iter()
                .map(|col| row.get(col.key).map(|v| v.format_csv()).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow], visible: &[&ColumnDef]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = visible.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = visible
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(|v| v.format_md())
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("doc_no", "DOC NO", 20),
        ColumnDef::new("title", "TITLE", 12),
        ColumnDef::new("status", "STATUS", 16),
        ColumnDef::new("overdue", "OVERDUE", 8),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new("doc-1")
                .cell("doc_no", CellValue::DocNo("DOC-001".to_string()))
                .cell("title", CellValue::Text("Cable schedule, main | sub".to_string()))
                .cell("status", CellValue::Status("Waiting cmt".to_string()))
                .cell("overdue", CellValue::Flag(true)),
            TableRow::new("doc-2")
                .cell("doc_no", CellValue::DocNo("DOC-002".to_string()))
                .cell("status", CellValue::Status("Approved".to_string()))
                .cell("overdue", CellValue::Flag(false)),
        ]
    }

    const ALL: &[&str] = &["doc_no", "title", "status", "overdue"];

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).starts_with("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a | b".to_string());
        assert_eq!(cell.format_md(), "a \\| b");
    }

    #[test]
    fn test_cell_value_date_and_flag() {
        assert_eq!(CellValue::Date(None).format_md(), "-");
        assert_eq!(CellValue::Date(Some("2025-10-01".into())).format_csv(), "2025-10-01");
        assert_eq!(CellValue::Flag(true).format_csv(), "yes");
        assert_eq!(CellValue::Flag(true).format_md(), "**yes**");
    }

    #[test]
    fn test_status_tone() {
        assert_eq!(StatusTone::of("Approved"), StatusTone::Done);
        assert_eq!(StatusTone::of("Issued"), StatusTone::Done);
        assert_eq!(StatusTone::of("Not yet issued"), StatusTone::Neutral);
        assert_eq!(StatusTone::of("Waiting cmt"), StatusTone::Waiting);
        assert_eq!(StatusTone::of("Rejected"), StatusTone::Rejected);
    }

    #[test]
    fn test_render_csv() {
        let out = TableFormatter::new(COLUMNS, "document").render(rows(), OutputFormat::Csv, ALL);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "doc_no,title,status,overdue");
        assert_eq!(lines[1], "DOC-001,\"Cable schedule, main | sub\",Waiting cmt,yes");
        assert_eq!(lines[2], "DOC-002,,Approved,no");
    }

    #[test]
    fn test_render_md() {
        let out = TableFormatter::new(COLUMNS, "document").render(
            rows(),
            OutputFormat::Md,
            &["doc_no", "overdue"],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| DOC NO | OVERDUE |");
        assert_eq!(lines[1], "|---|---|");
        assert_eq!(lines[2], "| DOC-001 | **yes** |");
    }

    #[test]
    fn test_render_ids() {
        let out = TableFormatter::new(COLUMNS, "document").render(rows(), OutputFormat::Id, ALL);
        assert_eq!(out, "doc-1\ndoc-2\n");
    }

    #[test]
    fn test_render_tsv_summary() {
        let out = TableFormatter::new(COLUMNS, "document").render(rows(), OutputFormat::Tsv, ALL);
        assert!(out.contains("DOC-001"));
        assert!(out.contains("2 document(s) found."));

        let piped = TableFormatter::new(COLUMNS, "document")
            .with_config(TableConfig::for_pipe())
            .render(rows(), OutputFormat::Tsv, ALL);
        assert!(!piped.contains("found."));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short", 10), vec!["short"]);
        assert_eq!(
            wrap_text("single line diagram for substation", 12),
            vec!["single line", "diagram for", "substation"]
        );
        assert_eq!(wrap_text("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_wrap_text_multibyte() {
        let lines = wrap_text("Nguyễn Văn Hưng phụ trách", 8);
        assert!(lines.iter().all(|l| l.chars().count() <= 8));
    }
}
