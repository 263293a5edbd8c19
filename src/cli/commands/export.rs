//! `mdi export` command - Export documents to a file
//!
//! `--xlsx` writes an Excel workbook. Otherwise the export kind follows the
//! global `--format` flag: `csv` (default), `tsv`, or `json` for a data
//! snapshot that `mdi import` can load back.

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::{now, plural, Workspace};
use crate::cli::{FilterArgs, GlobalOpts, OutputFormat};
use crate::core::apply_filters;
use crate::core::export::{export_documents, ExportFormat};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Directory to write into (default: current directory)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// File name prefix (default: config export_prefix)
    #[arg(long, value_name = "PREFIX")]
    pub name: Option<String>,

    /// Write an Excel workbook (.xlsx) with sized columns
    #[arg(long)]
    pub xlsx: bool,
}

fn export_format(format: OutputFormat, xlsx: bool) -> Result<ExportFormat> {
    if xlsx {
        return Ok(ExportFormat::Xlsx);
    }
    match format {
        OutputFormat::Auto | OutputFormat::Csv => Ok(ExportFormat::Csv),
        OutputFormat::Tsv => Ok(ExportFormat::Tsv),
        OutputFormat::Json => Ok(ExportFormat::Json),
        other => Err(miette::miette!(
            help = "use --format csv, tsv or json, or --xlsx",
            "cannot export as {:?}",
            other
        )),
    }
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let format = export_format(global.format, args.xlsx)?;
    let ws = Workspace::open(global)?;
    let docs = ws.documents()?;
    let filtered = apply_filters(&docs, &args.filter.to_filter_state());

    let dir = match args.output {
        Some(dir) => dir,
        None => std::env::current_dir().into_diagnostic()?,
    };
    let prefix = args
        .name
        .unwrap_or_else(|| ws.config.export_prefix().to_string());

    let path = export_documents(&filtered, format, &dir, &prefix, now(global))?;

    if global.quiet {
        println!("{}", path.display());
    } else {
        println!(
            "{} Exported {} to {}",
            style("✓").green(),
            plural(filtered.len(), "document", "documents"),
            style(path.display()).cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_mapping() {
        assert_eq!(export_format(OutputFormat::Auto, false).unwrap(), ExportFormat::Csv);
        assert_eq!(export_format(OutputFormat::Tsv, false).unwrap(), ExportFormat::Tsv);
        assert_eq!(export_format(OutputFormat::Json, false).unwrap(), ExportFormat::Json);
        assert!(export_format(OutputFormat::Md, false).is_err());
    }

    #[test]
    fn test_xlsx_flag_wins() {
        assert_eq!(export_format(OutputFormat::Auto, true).unwrap(), ExportFormat::Xlsx);
        assert_eq!(export_format(OutputFormat::Md, true).unwrap(), ExportFormat::Xlsx);
    }
}
