//! CLI argument definitions using clap derive

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, db::DbCommands, export::ExportArgs, import::ImportArgs,
    init::InitArgs, list::ListArgs, report::ReportCommands, show::ShowArgs, status::StatusArgs,
};
use crate::core::filter::{FilterState, FilterUpdate};

#[derive(Parser)]
#[command(name = "mdi")]
#[command(author, version, about = "Master Document Index tracker")]
#[command(
    long_about = "Import an engineering Master Document Index, track overdue and waiting documents, and produce status reports from a local SQLite store."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .mdi/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Evaluate overdue and weekly windows as of this date (YYYY-MM-DD)
    #[arg(long, global = true, env = "MDI_TODAY")]
    pub today: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new MDI project
    Init(InitArgs),

    /// Import a Master Document Index sheet (xlsx, CSV or JSON)
    Import(ImportArgs),

    /// List documents with optional filters
    List(ListArgs),

    /// Show one document by id or document number
    Show(ShowArgs),

    /// Generate reports (overdue, weekly, pending)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show the KPI dashboard
    Status(StatusArgs),

    /// Export documents to xlsx, CSV, TSV or a JSON snapshot
    Export(ExportArgs),

    /// Inspect or clear the document store
    #[command(subcommand)]
    Db(DbCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

/// Document filters shared by `list` and `export`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only this discipline (exact match)
    #[arg(long, short = 'd')]
    pub discipline: Option<String>,

    /// Only this status; "Waiting" matches any status containing "waiting"
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Only documents flagged overdue
    #[arg(long)]
    pub overdue: bool,

    /// Only these PTSC PICs (repeatable); "Unknown" selects documents without one
    #[arg(long = "pic")]
    pub pic: Vec<String>,

    /// Case-insensitive search over number, title, discipline, status, PICs, revision
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter_state(&self) -> FilterState {
        let pics: BTreeSet<String> = self.pic.iter().cloned().collect();
        FilterState::reset_filters()
            .set_filter(FilterUpdate::Discipline(self.discipline.clone()))
            .set_filter(FilterUpdate::Status(self.status.clone()))
            .set_filter(FilterUpdate::IsOverdue(self.overdue.then_some(true)))
            .set_filter(FilterUpdate::PicPtsc(pics))
            .set_filter(FilterUpdate::SearchQuery(
                self.search.clone().unwrap_or_default(),
            ))
    }
}
