//! `mdi import` command - Import a Master Document Index sheet

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{plural, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{normalize_rows, read_source, Document, SourceData};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Excel workbook, CSV file, or JSON workbook dump / data snapshot
    pub file: PathBuf,

    /// Sheet to read from workbook dumps (default: config sheet_name)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Update matching documents and keep the rest instead of replacing the store
    #[arg(long)]
    pub merge: bool,

    /// Parse and summarize without saving
    #[arg(long)]
    pub dry_run: bool,
}

/// What an import produced
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummary {
    source: String,
    sheet: String,
    rows: usize,
    overdue: usize,
    critical: usize,
    with_pic: usize,
    saved: usize,
    merged: bool,
    dry_run: bool,
}

impl ImportSummary {
    fn new(source: String, sheet: String, docs: &[Document]) -> Self {
        Self {
            source,
            sheet,
            rows: docs.len(),
            overdue: docs.iter().filter(|d| d.is_overdue).count(),
            critical: docs.iter().filter(|d| d.is_critical).count(),
            with_pic: docs.iter().filter(|d| d.pic_ptsc.is_some()).count(),
            saved: 0,
            merged: false,
            dry_run: false,
        }
    }
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let sheet_name = args
        .sheet
        .clone()
        .unwrap_or_else(|| ws.config.sheet_name().to_string());

    let loaded = read_source(&args.file, &sheet_name)?;
    let docs = match loaded.data {
        SourceData::Rows(rows) => normalize_rows(&rows, ws.today),
        SourceData::Snapshot(docs) => {
            log::debug!("loading {} documents from a data snapshot", docs.len());
            docs
        }
    };

    let source = loaded.path.display().to_string();
    let mut summary = ImportSummary::new(source.clone(), loaded.sheet, &docs);
    summary.merged = args.merge;
    summary.dry_run = args.dry_run;

    if !args.dry_run {
        let mut store = ws.store()?;
        summary.saved = if args.merge {
            store.upsert(&docs)?
        } else {
            store.replace_all(&docs)?
        };
        store.record_import(&source, &loaded.sha256)?;
    }

    match ws.format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&summary).into_diagnostic()?);
        }
        _ => print_summary(&summary, ws.today, global.quiet),
    }

    Ok(())
}

fn print_summary(summary: &ImportSummary, today: chrono::NaiveDate, quiet: bool) {
    if summary.dry_run {
        println!(
            "{} Dry run: parsed {} from sheet {} (nothing saved)",
            style("→").blue(),
            plural(summary.rows, "document", "documents"),
            style(&summary.sheet).cyan()
        );
    } else {
        let verb = if summary.merged { "Merged" } else { "Imported" };
        println!(
            "{} {} {} from sheet {}",
            style("✓").green(),
            verb,
            plural(summary.saved, "document", "documents"),
            style(&summary.sheet).cyan()
        );
    }

    if quiet {
        return;
    }

    println!("   Source:   {}", style(&summary.source).dim());
    println!("   As of:    {}", today);
    println!("   Overdue:  {}", style(summary.overdue).red().bold());
    println!("   Critical: {}", style(summary.critical).yellow());
    println!("   With PIC: {}", summary.with_pic);
}
