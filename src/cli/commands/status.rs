//! `mdi status` command - Document status dashboard

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::Workspace;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::report::{
    compute_kpis, pic_options, plan_vs_actual_by_discipline, status_distribution,
    top_overdue_by_pic, DisciplineProgress, KpiStats, NamedCount, TOP_PIC_LIMIT,
};
use crate::core::store::ImportRecord;

/// Dashboard sections
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Section {
    /// Headline counters
    Kpi,
    /// Plan vs actual per discipline
    Progress,
    /// Status distribution
    Status,
    /// Overdue ranking by PIC
    Pic,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Show only one section
    #[arg(long, value_enum)]
    pub section: Option<Section>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    as_of: chrono::NaiveDate,
    kpis: KpiStats,
    plan_vs_actual: Vec<DisciplineProgress>,
    status_distribution: Vec<NamedCount>,
    top_overdue_pic: Vec<NamedCount>,
    pic_options: Vec<NamedCount>,
    last_import: Option<ImportRecord>,
}

const WIDTH: usize = 68;
const BAR_WIDTH: usize = 20;

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let store = ws.store()?;
    let docs = ws.documents()?;

    let dashboard = Dashboard {
        as_of: ws.today,
        kpis: compute_kpis(&docs),
        plan_vs_actual: plan_vs_actual_by_discipline(&docs),
        status_distribution: status_distribution(&docs),
        top_overdue_pic: top_overdue_by_pic(&docs, TOP_PIC_LIMIT),
        pic_options: pic_options(&docs),
        last_import: store.last_import()?,
    };

    match ws.format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&dashboard).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&dashboard).into_diagnostic()?);
        }
        _ => print_dashboard(&dashboard, args.section),
    }

    Ok(())
}

fn print_dashboard(d: &Dashboard, section: Option<Section>) {
    let show = |s: Section| section.is_none() || section == Some(s);

    if section.is_none() {
        println!("{}", style("MDI Document Status").bold().underlined());
        println!("{}", "═".repeat(WIDTH));
        match &d.last_import {
            Some(record) => println!(
                "Source: {}  {}",
                style(&record.source).cyan(),
                style(format!("(imported {})", record.imported_at)).dim()
            ),
            None => println!("{}", style("No import recorded").dim()),
        }
        println!("As of:  {}", d.as_of);
        println!();
    }

    if show(Section::Kpi) && show(Section::Pic) {
        print_two_columns(
            "KEY FIGURES",
            &format_kpis(&d.kpis),
            "TOP OVERDUE BY PIC",
            &format_ranking(&d.top_overdue_pic),
        );
        println!();
    } else if show(Section::Kpi) {
        print_section("KEY FIGURES", &format_kpis(&d.kpis));
    } else if show(Section::Pic) {
        print_section("TOP OVERDUE BY PIC", &format_ranking(&d.top_overdue_pic));
    }

    if show(Section::Progress) {
        print_section("PLAN VS ACTUAL BY DISCIPLINE", &format_progress(&d.plan_vs_actual));
        println!();
    }

    if show(Section::Status) {
        print_section(
            "STATUS DISTRIBUTION",
            &format_distribution(&d.status_distribution, d.kpis.total_documents),
        );
    }

    if section.is_none() {
        println!();
        println!("{}", "═".repeat(WIDTH));
        let health = overdue_health(&d.kpis);
        let health_style = match health {
            "On track" => style(health).green().bold(),
            "Slipping" => style(health).yellow().bold(),
            _ => style(health).red().bold(),
        };
        println!("Schedule: {}", health_style);
    }
}

fn format_kpis(k: &KpiStats) -> Vec<String> {
    let mut lines = vec![format!("Documents:  {}", k.total_documents)];
    if k.overdue_count > 0 {
        lines.push(format!("Overdue:    {} {}", k.overdue_count, style("⚠").red()));
    } else {
        lines.push(format!("Overdue:    {}", k.overdue_count));
    }
    lines.push(format!("Waiting:    {}", k.waiting_comment_count));
    lines.push(format!("Critical:   {}", k.critical_issues));
    lines.push(format!("Flagged:    {}", k.critical_documents));
    lines
}

fn format_ranking(ranking: &[NamedCount]) -> Vec<String> {
    if ranking.is_empty() {
        return vec!["No overdue documents".to_string()];
    }
    ranking
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {:<20} {}", i + 1, entry.name, entry.count))
        .collect()
}

fn format_progress(progress: &[DisciplineProgress]) -> Vec<String> {
    if progress.is_empty() {
        return vec!["No documents".to_string()];
    }
    progress
        .iter()
        .map(|p| {
            format!(
                "{:<14} {} {:>4}/{:<4}",
                p.name,
                bar(p.actual, p.plan),
                p.actual,
                p.plan
            )
        })
        .collect()
}

fn format_distribution(distribution: &[NamedCount], total: usize) -> Vec<String> {
    distribution
        .iter()
        .map(|entry| {
            let pct = if total > 0 {
                entry.count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            format!("{:<30} {:>5} {:>5.1}%", entry.name, entry.count, pct)
        })
        .collect()
}

/// Horizontal bar of `value` out of `max`
fn bar(value: usize, max: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        (value.min(max) * BAR_WIDTH) / max
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Schedule verdict from the share of overdue documents
fn overdue_health(k: &KpiStats) -> &'static str {
    if k.total_documents == 0 || k.overdue_count == 0 {
        return "On track";
    }
    let pct = k.overdue_count as f64 * 100.0 / k.total_documents as f64;
    if pct < 10.0 {
        "Slipping"
    } else {
        "Behind"
    }
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String]) {
    let col_width = 32;

    println!("{:<col_width$} {}", style(title1).bold(), style(title2).bold());
    println!("{:-<col_width$} {:-<col_width$}", "", "");

    let max_lines = lines1.len().max(lines2.len());

    for i in 0..max_lines {
        let l1 = lines1.get(i).map(|s| s.as_str()).unwrap_or("");
        let l2 = lines2.get(i).map(|s| s.as_str()).unwrap_or("");
        println!("  {:<30} {}", l1, l2);
    }
}

fn print_section(title: &str, lines: &[String]) {
    println!("{}", style(title).bold());
    println!("{:-<64}", "");
    for line in lines {
        println!("  {}", line);
    }
}
