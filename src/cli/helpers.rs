//! Shared helper functions for CLI commands

use chrono::{Local, NaiveDate, NaiveDateTime};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use console::style;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::DocumentStore;
use crate::core::{Config, Document, Project};

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
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

/// Write report content to a file, or to stdout when no path is given
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Find the project from `--project` or by walking up from the current directory
pub fn find_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Everything a data command needs: project, merged config and "today"
pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub today: NaiveDate,
}

impl Workspace {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = find_project(global)?;
        let config = Config::load_for(Some(&project));
        Ok(Self {
            project,
            config,
            today: today(global),
        })
    }

    /// `--format`, falling back to the configured `default_format` when auto
    pub fn format(&self, global: &GlobalOpts) -> OutputFormat {
        if global.format != OutputFormat::Auto {
            return global.format;
        }
        self.config
            .default_format
            .as_deref()
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path(&self.project)
    }

    pub fn store(&self) -> Result<DocumentStore> {
        DocumentStore::open(&self.database_path())
    }

    /// All stored documents, reflagged against today when configured
    pub fn documents(&self) -> Result<Vec<Document>> {
        let docs = self.store()?.load_all()?;
        if self.config.recompute_flags() {
            log::debug!("recomputing flags against {}", self.today);
            Ok(docs.iter().map(|d| d.reflagged(self.today)).collect())
        } else {
            Ok(docs)
        }
    }

    /// Like [`Workspace::documents`], but an empty store is an error
    pub fn require_documents(&self) -> Result<Vec<Document>> {
        let docs = self.documents()?;
        if docs.is_empty() {
            return Err(miette::miette!(
                help = "run 'mdi import <file>' first",
                "no documents in {}",
                self.database_path().display()
            ));
        }
        Ok(docs)
    }
}

/// `--today` / `MDI_TODAY`, or the local calendar date
pub fn today(global: &GlobalOpts) -> NaiveDate {
    global.today.unwrap_or_else(|| Local::now().date_naive())
}

/// Current time on `today`: the wall clock, unless `--today` pins the date
pub fn now(global: &GlobalOpts) -> NaiveDateTime {
    let local = Local::now().naive_local();
    match global.today {
        Some(day) => day.and_time(local.time()),
        None => local,
    }
}

/// Plain-language plural for summary lines
pub fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{} {}", count, one)
    } else {
        format!("{} {}", count, many)
    }
}
