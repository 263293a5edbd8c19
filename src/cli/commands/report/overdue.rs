//! Overdue documents report

use chrono::NaiveDate;
use miette::Result;
use serde::Serialize;
use tabled::builder::Builder;

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;
use crate::core::dates::parse_date;
use crate::core::report::overdue_items;
use crate::core::{Document, Milestone};

use super::{
    discipline_breakdown, emit, markdown_table, pic_or_dash, summary_table, title_cell,
    ReportOutput,
};

#[derive(clap::Args, Debug)]
pub struct OverdueArgs {
    #[command(flatten)]
    pub output: ReportOutput,
}

/// One late milestone of an overdue document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LateMilestone {
    milestone: Milestone,
    plan_date: String,
    days_late: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverdueEntry<'a> {
    #[serde(flatten)]
    document: &'a Document,
    late: Vec<LateMilestone>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverdueReport<'a> {
    as_of: NaiveDate,
    total: usize,
    documents: Vec<OverdueEntry<'a>>,
}

pub fn run(args: OverdueArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let docs = ws.require_documents()?;
    let overdue = overdue_items(&docs, ws.today);

    let report = OverdueReport {
        as_of: ws.today,
        total: overdue.len(),
        documents: overdue
            .iter()
            .map(|doc| OverdueEntry {
                document: doc,
                late: late_milestones(doc, ws.today),
            })
            .collect(),
    };

    emit(render(&report), &report, ws.format(global), &args.output)
}

/// Primary milestones of `doc` that are past plan, with days late
fn late_milestones(doc: &Document, today: NaiveDate) -> Vec<LateMilestone> {
    Milestone::PRIMARY
        .iter()
        .filter(|m| doc.milestone_overdue(**m, today))
        .filter_map(|m| {
            let plan = doc.plan_dates.get(*m)?;
            let date = parse_date(plan)?;
            Some(LateMilestone {
                milestone: *m,
                plan_date: plan.to_string(),
                days_late: (today - date).num_days(),
            })
        })
        .collect()
}

fn render(report: &OverdueReport) -> String {
    let mut output = String::new();
    output.push_str("# Overdue Documents Report\n\n");
    output.push_str(&format!("As of {}\n\n", report.as_of));

    output.push_str("## Summary\n\n");
    let max_days = report
        .documents
        .iter()
        .flat_map(|e| e.late.iter().map(|l| l.days_late))
        .max()
        .unwrap_or(0);
    output.push_str(&summary_table(&[
        ("Overdue documents", report.total.to_string()),
        ("Longest delay (days)", max_days.to_string()),
    ]));

    if report.documents.is_empty() {
        output.push_str("\nNo overdue documents.\n");
        return output;
    }

    let docs: Vec<Document> = report.documents.iter().map(|e| e.document.clone()).collect();
    output.push_str("\n## By Discipline\n\n");
    output.push_str(&discipline_breakdown(&docs));

    output.push_str("\n## Documents\n\n");
    let mut table = Builder::default();
    table.push_record([
        "STT",
        "Document No",
        "Title",
        "Discipline",
        "PIC",
        "Late",
        "Plan",
        "Days Late",
    ]);
    for entry in &report.documents {
        let doc = entry.document;
        let milestones: Vec<&str> = entry.late.iter().map(|l| l.milestone.label()).collect();
        let plans: Vec<&str> = entry.late.iter().map(|l| l.plan_date.as_str()).collect();
        let days = entry.late.iter().map(|l| l.days_late).max().unwrap_or(0);
        table.push_record([
            doc.stt.to_string(),
            doc.document_no.clone(),
            title_cell(doc),
            doc.discipline.clone(),
            pic_or_dash(&doc.pic_ptsc),
            milestones.join(", "),
            plans.join(", "),
            days.to_string(),
        ]);
    }
    output.push_str(&markdown_table(table));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MilestoneDates;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_late_milestones_reports_days() {
        let doc = Document {
            plan_dates: MilestoneDates {
                ifi: Some("2025-11-10".to_string()),
                ifr: Some("2025-11-25".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let late = late_milestones(&doc, day("2025-11-20"));
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].milestone, Milestone::Ifi);
        assert_eq!(late[0].days_late, 10);
    }

    #[test]
    fn test_render_empty_report() {
        let report = OverdueReport {
            as_of: day("2025-11-20"),
            total: 0,
            documents: Vec::new(),
        };
        let text = render(&report);
        assert!(text.contains("# Overdue Documents Report"));
        assert!(text.contains("No overdue documents."));
    }
}
