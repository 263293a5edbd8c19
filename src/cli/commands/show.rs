//! `mdi show` command - Show one document

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Document, Milestone};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Document id or document number (case-insensitive)
    pub id: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let store = ws.store()?;

    let doc = store.get(&args.id)?.ok_or_else(|| {
        miette::miette!(
            help = "use 'mdi list --search <text>' to find the document number",
            "no document matching '{}'",
            args.id
        )
    })?;
    let doc = if ws.config.recompute_flags() {
        doc.reflagged(ws.today)
    } else {
        doc
    };

    match ws.format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&doc).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", doc.id),
        OutputFormat::Tsv | OutputFormat::Md | OutputFormat::Csv => print_card(&doc),
        OutputFormat::Auto | OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&doc).into_diagnostic()?);
        }
    }

    Ok(())
}

fn print_card(doc: &Document) {
    println!(
        "{}  {}",
        style(&doc.document_no).cyan().bold(),
        style(&doc.title).bold()
    );
    println!("{}", "─".repeat(60));
    println!("  STT:        {}", doc.stt);
    println!("  Revision:   {}", doc.revision);
    println!("  Discipline: {}", doc.discipline);
    println!("  Status:     {}", doc.status);
    println!(
        "  PIC:        {} / {}",
        doc.pic_ptsc.as_deref().unwrap_or("-"),
        doc.pic_lsp.as_deref().unwrap_or("-")
    );
    println!();
    println!("  {:<6} {:<14} {:<14}", "", "PLAN", "ACTUAL");
    for milestone in Milestone::ALL {
        println!(
            "  {:<6} {:<14} {:<14}",
            milestone.label(),
            doc.plan_dates.get(milestone).unwrap_or("-"),
            doc.actual_dates.get(milestone).unwrap_or("-")
        );
    }
    println!();
    let flag = |set: bool| {
        if set {
            style("yes").red().bold()
        } else {
            style("no").dim()
        }
    };
    println!("  Overdue:  {}", flag(doc.is_overdue));
    println!("  Critical: {}", flag(doc.is_critical));
}
