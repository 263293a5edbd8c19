//! Pending client feedback report

use miette::Result;
use serde::Serialize;
use tabled::builder::Builder;

use crate::cli::helpers::Workspace;
use crate::cli::GlobalOpts;
use crate::core::report::pending_feedback;
use crate::core::{Document, Milestone};

use super::{
    discipline_breakdown, emit, markdown_table, pic_or_dash, summary_table, title_cell,
    ReportOutput,
};

#[derive(clap::Args, Debug)]
pub struct PendingArgs {
    #[command(flatten)]
    pub output: ReportOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingReport {
    total: usize,
    documents: Vec<Document>,
}

pub fn run(args: PendingArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open(global)?;
    let docs = ws.require_documents()?;
    let pending = pending_feedback(&docs);

    let report = PendingReport {
        total: pending.len(),
        documents: pending,
    };

    emit(render(&report), &report, ws.format(global), &args.output)
}

/// Most recent milestone actually submitted, e.g. "IFA 2025-11-03"
fn last_submission(doc: &Document) -> String {
    Milestone::ALL
        .iter()
        .rev()
        .find_map(|m| {
            doc.actual_dates
                .get(*m)
                .map(|date| format!("{} {}", m.label(), date))
        })
        .unwrap_or_else(|| "-".to_string())
}

fn render(report: &PendingReport) -> String {
    let mut output = String::new();
    output.push_str("# Pending Client Feedback Report\n\n");

    output.push_str("## Summary\n\n");
    output.push_str(&summary_table(&[(
        "Waiting for comments",
        report.total.to_string(),
    )]));

    if report.documents.is_empty() {
        output.push_str("\nNo documents waiting for feedback.\n");
        return output;
    }

    output.push_str("\n## By Discipline\n\n");
    output.push_str(&discipline_breakdown(&report.documents));

    output.push_str("\n## Documents\n\n");
    let mut table = Builder::default();
    table.push_record([
        "STT",
        "Document No",
        "Title",
        "Rev",
        "Status",
        "Last Submission",
        "Trans No",
        "PIC",
    ]);
    for doc in &report.documents {
        table.push_record([
            doc.stt.to_string(),
            doc.document_no.clone(),
            title_cell(doc),
            doc.revision.clone(),
            doc.status.clone(),
            last_submission(doc),
            pic_or_dash(&doc.trans_no),
            pic_or_dash(&doc.pic_ptsc),
        ]);
    }
    output.push_str(&markdown_table(table));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MilestoneDates;

    #[test]
    fn test_last_submission_picks_latest_milestone() {
        let doc = Document {
            actual_dates: MilestoneDates {
                ifi: Some("2025-10-01".to_string()),
                ifa: Some("2025-11-03".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(last_submission(&doc), "IFA 2025-11-03");
        assert_eq!(last_submission(&Document::default()), "-");
    }

    #[test]
    fn test_render_lists_waiting_documents() {
        let doc = Document {
            document_no: "DOC-042".to_string(),
            status: "Waiting for comment".to_string(),
            ..Default::default()
        };
        let report = PendingReport {
            total: 1,
            documents: vec![doc],
        };
        let text = render(&report);
        assert!(text.contains("DOC-042"));
        assert!(text.contains("| Waiting for comments | 1"));
    }
}
