//! `mdi report` command - Generate document status reports

mod overdue;
mod pending;
mod weekly;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{truncate_str, write_output};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::report::discipline_distribution;
use crate::core::Document;

pub use overdue::OverdueArgs;
pub use pending::PendingArgs;
pub use weekly::WeeklyArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Documents with IFI or IFR planned before today and not yet submitted
    Overdue(OverdueArgs),

    /// Documents with a plan or actual submission in one ISO week
    Weekly(WeeklyArgs),

    /// Documents waiting for client comments
    #[clap(alias = "waiting")]
    Pending(PendingArgs),
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Overdue(args) => overdue::run(args, global),
        ReportCommands::Weekly(args) => weekly::run(args, global),
        ReportCommands::Pending(args) => pending::run(args, global),
    }
}

/// Output flag shared by every report
#[derive(clap::Args, Debug)]
pub struct ReportOutput {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Reports are Markdown unless JSON or YAML is asked for
pub(crate) fn emit<T: serde::Serialize>(
    markdown: String,
    data: &T,
    format: OutputFormat,
    output: &ReportOutput,
) -> Result<()> {
    let content = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(data).into_diagnostic()?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yml::to_string(data).into_diagnostic()?,
        _ => markdown,
    };
    write_output(&content, output.output.as_deref())
}

pub(crate) fn markdown_table(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::markdown());
    format!("{}\n", table)
}

/// Two-column summary table
pub(crate) fn summary_table(rows: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    for (label, value) in rows {
        builder.push_record([label.to_string(), value.clone()]);
    }
    markdown_table(builder)
}

/// Count documents per discipline ("Other" when blank), first-encounter order
pub(crate) fn discipline_breakdown(docs: &[Document]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Discipline", "Documents"]);
    for entry in discipline_distribution(docs) {
        builder.push_record([entry.name, entry.count.to_string()]);
    }
    markdown_table(builder)
}

pub(crate) fn pic_or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

pub(crate) fn title_cell(doc: &Document) -> String {
    truncate_str(&doc.title, 40)
}
