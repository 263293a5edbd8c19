//! Weekly submissions report

use chrono::NaiveDate;
use miette::Result;
use serde::Serialize;
use tabled::builder::Builder;

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;
use crate::core::dates::{iso_week_bounds, parse_date};
use crate::core::report::weekly_submissions;
use crate::core::{Document, Milestone};

use super::{emit, markdown_table, pic_or_dash, summary_table, title_cell, ReportOutput};

#[derive(clap::Args, Debug)]
pub struct WeeklyArgs {
    /// Any date inside the week to report (default: today)
    #[arg(long, value_name = "DATE")]
    pub week_of: Option<NaiveDate>,

    #[command(flatten)]
    pub output: ReportOutput,
}

/// A plan or actual date that falls inside the week
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeekHit {
    milestone: Milestone,
    kind: &'static str,
    date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyEntry<'a> {
    #[serde(flatten)]
    document: &'a Document,
    hits: Vec<WeekHit>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyReport<'a> {
    week_start: NaiveDate,
    week_end: NaiveDate,
    total: usize,
    documents: Vec<WeeklyEntry<'a>>,
}

pub fn run(args: WeeklyArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let docs = ws.require_documents()?;
    let reference = args.week_of.unwrap_or(ws.today);
    let (week_start, week_end) = iso_week_bounds(reference);
    let weekly = weekly_submissions(&docs, reference);

    let report = WeeklyReport {
        week_start,
        week_end,
        total: weekly.len(),
        documents: weekly
            .iter()
            .map(|doc| WeeklyEntry {
                document: doc,
                hits: week_hits(doc, week_start, week_end),
            })
            .collect(),
    };

    emit(render(&report), &report, ws.format(global), &args.output)
}

fn week_hits(doc: &Document, start: NaiveDate, end: NaiveDate) -> Vec<WeekHit> {
    let mut hits = Vec::new();
    for milestone in Milestone::WEEKLY {
        for (kind, dates) in [("plan", &doc.plan_dates), ("actual", &doc.actual_dates)] {
            if let Some(value) = dates.get(milestone) {
                if parse_date(value).is_some_and(|d| d >= start && d <= end) {
                    hits.push(WeekHit {
                        milestone,
                        kind,
                        date: value.to_string(),
                    });
                }
            }
        }
    }
    hits
}

fn render(report: &WeeklyReport) -> String {
    let mut output = String::new();
    output.push_str("# Weekly Submissions Report\n\n");
    output.push_str(&format!(
        "Week {} to {}\n\n",
        report.week_start, report.week_end
    ));

    let planned = report
        .documents
        .iter()
        .filter(|e| e.hits.iter().any(|h| h.kind == "plan"))
        .count();
    let submitted = report
        .documents
        .iter()
        .filter(|e| e.hits.iter().any(|h| h.kind == "actual"))
        .count();

    output.push_str("## Summary\n\n");
    output.push_str(&summary_table(&[
        ("Documents this week", report.total.to_string()),
        ("Planned this week", planned.to_string()),
        ("Submitted this week", submitted.to_string()),
    ]));

    if report.documents.is_empty() {
        output.push_str("\nNo submissions this week.\n");
        return output;
    }

    output.push_str("\n## Documents\n\n");
    let mut table = Builder::default();
    table.push_record([
        "STT",
        "Document No",
        "Title",
        "Discipline",
        "PIC",
        "Status",
        "This Week",
    ]);
    for entry in &report.documents {
        let doc = entry.document;
        let hits: Vec<String> = entry
            .hits
            .iter()
            .map(|h| format!("{} {} {}", h.milestone.label(), h.kind, h.date))
            .collect();
        table.push_record([
            doc.stt.to_string(),
            doc.document_no.clone(),
            title_cell(doc),
            doc.discipline.clone(),
            pic_or_dash(&doc.pic_ptsc),
            doc.status.clone(),
            hits.join("; "),
        ]);
    }
    output.push_str(&markdown_table(table));

    output
}
