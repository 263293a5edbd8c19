//! `mdi db` command - Inspect or clear the document store
//!
//! The store is a local SQLite database holding the last import. It is
//! gitignored and can always be rebuilt by importing the sheet again.

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{plural, Workspace};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Show store statistics
    Stats,

    /// Remove every stored document
    Clear {
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Print the database path
    Path,
}

pub fn run(cmd: DbCommands, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    match cmd {
        DbCommands::Stats => run_stats(&ws, global),
        DbCommands::Clear { yes } => run_clear(&ws, yes),
        DbCommands::Path => {
            println!("{}", ws.database_path().display());
            Ok(())
        }
    }
}

fn run_stats(ws: &Workspace, global: &GlobalOpts) -> Result<()> {
    let store = ws.store()?;
    let stats = store.stats()?;

    if ws.format(global) == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
        return Ok(());
    }

    println!("{}", style("Store Status").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Location:        {}", store.path().display());
    println!("  Documents:       {}", style(stats.total_documents).cyan());
    println!(
        "  Database size:   {} KB",
        style(stats.db_size_bytes / 1024).cyan()
    );
    println!(
        "  Last import:     {}",
        stats.last_import.as_deref().unwrap_or("never")
    );
    if let Some(record) = &stats.last_source {
        println!("  Source:          {}", record.source);
        println!("  SHA256:          {}", style(&record.sha256).dim());
    }

    if !stats.by_discipline.is_empty() {
        println!();
        println!("  {}", style("By Discipline:").bold());
        for entry in &stats.by_discipline {
            println!("    {:<14} {}", entry.name, entry.count);
        }
    }

    Ok(())
}

fn run_clear(ws: &Workspace, yes: bool) -> Result<()> {
    let store = ws.store()?;
    let count = store.count()?;

    if count == 0 {
        println!("{} Store is already empty", style("✓").green());
        return Ok(());
    }

    if !yes {
        if !console::user_attended() {
            return Err(miette::miette!(
                help = "pass --yes to clear without a prompt",
                "refusing to clear the store without confirmation"
            ));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Remove {} from {}?",
                plural(count, "document", "documents"),
                store.path().display()
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{} Cancelled", style("!").yellow());
            return Ok(());
        }
    }

    let removed = store.clear()?;
    println!(
        "{} Removed {}",
        style("✓").green(),
        plural(removed, "document", "documents")
    );
    Ok(())
}
