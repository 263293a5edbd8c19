//! Export artifacts
//!
//! A filtered document list flattens to one row per document with a fixed
//! column order. The same rows back the Excel, CSV and TSV renditions. The
//! JSON data snapshot keeps canonical documents plus a metadata block.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use miette::{IntoDiagnostic, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::core::document::{Document, Milestone};
use crate::core::report::{snapshot_statistics, SnapshotStatistics};

/// Widest auto-sized column in the Excel and TSV renditions
pub const MAX_COLUMN_WIDTH: usize = 50;

/// Sheet holding the exported documents
pub const EXPORT_SHEET: &str = "Documents";

/// Snapshot format version
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Export columns, in order
pub const EXPORT_COLUMNS: [&str; 35] = [
    "STT",
    "Document No",
    "Title",
    "Revision",
    "Discipline",
    "Scope",
    "Class",
    "Table",
    "Item",
    "Status",
    "IPI Status",
    "Review Code",
    "IFI Plan Date",
    "IFR Plan Date",
    "IFA Plan Date",
    "IFC Plan Date",
    "IFF Plan Date",
    "IFI Actual Date",
    "IFR Actual Date",
    "IFA Actual Date",
    "IFC Actual Date",
    "IFF Actual Date",
    "Target Mitigation Date",
    "Trans No",
    "Date Received",
    "TRN Out Date",
    "TRN Out No",
    "TRN In Date",
    "TRN In No",
    "PIC PTSC",
    "PIC LSP",
    "Local Path",
    "SharePoint Path",
    "Is Overdue",
    "Is Critical",
];

/// Export file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Flatten one document. `position` is its 1-based place in the export.
pub fn export_record(position: usize, doc: &Document) -> Vec<String> {
    let mut record = vec![
        position.to_string(),
        doc.document_no.clone(),
        doc.title.clone(),
        doc.revision.clone(),
        doc.discipline.clone(),
        doc.scope.clone(),
        doc.doc_class.clone(),
        doc.table.clone(),
        doc.item.clone(),
        doc.status.clone(),
        doc.ipi_status.clone(),
        opt(&doc.review_code),
    ];
    for milestone in Milestone::ALL {
        record.push(doc.plan_dates.get(milestone).unwrap_or_default().to_string());
    }
    for milestone in Milestone::ALL {
        record.push(doc.actual_dates.get(milestone).unwrap_or_default().to_string());
    }
    record.extend(
        [
            &doc.target_mitigation_date,
            &doc.trans_no,
            &doc.date_received,
            &doc.trn_out_date,
            &doc.trn_out_no,
            &doc.trn_in_date,
            &doc.trn_in_no,
            &doc.pic_ptsc,
            &doc.pic_lsp,
            &doc.local_path,
            &doc.sharepoint_path,
        ]
        .into_iter()
        .map(opt),
    );
    record.push(yes_no(doc.is_overdue));
    record.push(yes_no(doc.is_critical));
    record
}

/// Header row of the export
pub fn export_headers() -> &'static [&'static str] {
    &EXPORT_COLUMNS
}

/// Flatten a document list, numbering rows from 1
pub fn export_rows(docs: &[Document]) -> Vec<Vec<String>> {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| export_record(i + 1, doc))
        .collect()
}

/// Column widths: longest of header and cells, capped at [`MAX_COLUMN_WIDTH`]
pub fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let longest_cell = rows
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            MAX_COLUMN_WIDTH.min(header.chars().count().max(longest_cell))
        })
        .collect()
}

/// Write the CSV rendition
pub fn write_csv<W: Write>(docs: &[Document], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(export_headers()).into_diagnostic()?;
    for record in export_rows(docs) {
        wtr.write_record(&record).into_diagnostic()?;
    }
    wtr.flush().into_diagnostic()?;
    Ok(())
}

/// Build the Excel rendition: one "Documents" sheet, bold header row,
/// column widths from [`column_widths`]
pub fn build_workbook(docs: &[Document]) -> Result<Workbook> {
    let headers = export_headers();
    let rows = export_rows(docs);
    let widths = column_widths(headers, &rows);
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET).into_diagnostic()?;

    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        sheet
            .write_string_with_format(0, col, *header, &bold)
            .into_diagnostic()?;
        sheet
            .set_column_width(col, widths[col as usize] as f64)
            .into_diagnostic()?;
    }

    for (i, record) in rows.iter().enumerate() {
        let row = (i + 1) as u32;
        // STT is the export position
        sheet.write_number(row, 0, row as f64).into_diagnostic()?;
        for (col, cell) in record.iter().enumerate().skip(1) {
            if !cell.is_empty() {
                sheet
                    .write_string(row, col as u16, cell.as_str())
                    .into_diagnostic()?;
            }
        }
    }

    Ok(workbook)
}

fn tsv_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Render the TSV rendition with auto-sized, space-padded columns
pub fn render_tsv(docs: &[Document]) -> String {
    let headers = export_headers();
    let rows = export_rows(docs);
    let widths = column_widths(headers, &rows);

    let render_line = |cells: Vec<String>| -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .into_iter()
            .enumerate()
            .map(|(i, cell)| {
                let cell = tsv_cell(&cell);
                if i == last {
                    cell
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("\t")
    };

    let mut out = render_line(headers.iter().map(|h| h.to_string()).collect());
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out
}

/// Metadata block of a data snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub export_date: String,
    pub total_documents: usize,
    pub last_update: String,
    pub version: String,
    pub statistics: SnapshotStatistics,
}

/// JSON data snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: SnapshotMetadata,
    pub documents: Vec<Document>,
}

/// Build a snapshot of `docs` stamped with `now`
pub fn build_snapshot(docs: &[Document], now: NaiveDateTime) -> Snapshot {
    Snapshot {
        metadata: SnapshotMetadata {
            export_date: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            total_documents: docs.len(),
            last_update: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            version: SNAPSHOT_VERSION.to_string(),
            statistics: snapshot_statistics(docs),
        },
        documents: docs.to_vec(),
    }
}

/// `<prefix>_<YYYY-MM-DD>.<ext>`
pub fn export_file_name(prefix: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("{}_{}.{}", prefix, date.format("%Y-%m-%d"), format.extension())
}

/// Write `docs` to `<dir>/<prefix>_<date>.<ext>` and return the path
pub fn export_documents(
    docs: &[Document],
    format: ExportFormat,
    dir: &Path,
    prefix: &str,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    if docs.is_empty() {
        return Err(miette::miette!(
            help = "import documents first or relax the filters",
            "No data to export"
        ));
    }

    std::fs::create_dir_all(dir).into_diagnostic()?;
    let path = dir.join(export_file_name(prefix, now.date(), format));

    match format {
        ExportFormat::Xlsx => {
            build_workbook(docs)?.save(&path).into_diagnostic()?;
        }
        ExportFormat::Csv => {
            let file = std::fs::File::create(&path).into_diagnostic()?;
            write_csv(docs, std::io::BufWriter::new(file))?;
        }
        ExportFormat::Tsv => {
            std::fs::write(&path, render_tsv(docs)).into_diagnostic()?;
        }
        ExportFormat::Json => {
            let json = serde_json::to_string_pretty(&build_snapshot(docs, now)).into_diagnostic()?;
            std::fs::write(&path, json).into_diagnostic()?;
        }
    }

    log::info!("exported {} documents to {}", docs.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::MilestoneDates;
    use tempfile::tempdir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn doc(no: &str, stt: i64) -> Document {
        Document {
            id: no.to_string(),
            stt,
            document_no: no.to_string(),
            title: "Single line diagram".to_string(),
            discipline: "EE".to_string(),
            status: "Approved".to_string(),
            plan_dates: MilestoneDates {
                ifr: Some("2025-10-01".to_string()),
                ..Default::default()
            },
            actual_dates: MilestoneDates {
                iff: Some("2025-11-01".to_string()),
                ..Default::default()
            },
            pic_ptsc: Some("Hung".to_string()),
            is_overdue: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_layout() {
        let headers = export_headers();
        assert_eq!(headers.len(), 35);
        assert_eq!(headers[0], "STT");
        assert_eq!(headers[34], "Is Critical");

        let record = export_record(7, &doc("DOC-1", 42));
        assert_eq!(record.len(), headers.len());
        assert_eq!(record[0], "7");
        assert_eq!(record[1], "DOC-1");
        assert_eq!(record[13], "2025-10-01");
        assert_eq!(record[21], "2025-11-01");
        assert_eq!(record[29], "Hung");
        assert_eq!(record[33], "Yes");
        assert_eq!(record[34], "No");
    }

    #[test]
    fn test_stt_is_export_position() {
        let rows = export_rows(&[doc("A", 10), doc("B", 3)]);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[1][0], "2");
    }

    #[test]
    fn test_column_widths_capped() {
        let mut long = doc("A", 1);
        long.title = "x".repeat(80);
        let rows = export_rows(&[long]);
        let widths = column_widths(export_headers(), &rows);
        assert_eq!(widths[0], 3);
        assert_eq!(widths[2], MAX_COLUMN_WIDTH);
        assert_eq!(widths[1], "Document No".len());
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_csv(&[doc("DOC-1", 1)], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("STT,Document No,Title"));
        assert!(lines.next().unwrap().starts_with("1,DOC-1,Single line diagram"));
    }

    #[test]
    fn test_tsv_is_padded() {
        let text = render_tsv(&[doc("DOC-1", 1)]);
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("STT\tDocument No\t"));
        assert!(text.lines().nth(1).unwrap().starts_with("1  \tDOC-1      \t"));
    }

    #[test]
    fn test_snapshot_metadata() {
        let snapshot = build_snapshot(&[doc("A", 1), doc("B", 2)], now());
        assert_eq!(snapshot.metadata.total_documents, 2);
        assert_eq!(snapshot.metadata.export_date, "2025-11-20T09:30:00");
        assert_eq!(snapshot.metadata.last_update, "2025-11-20 09:30:00");
        assert_eq!(snapshot.metadata.statistics.approved, 2);
        assert_eq!(snapshot.metadata.statistics.overdue, 2);
        assert_eq!(snapshot.metadata.statistics.disciplines, 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["metadata"]["totalDocuments"].is_number());
        assert_eq!(json["documents"][0]["documentNo"], "A");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name("MDI_Export", now().date(), ExportFormat::Csv),
            "MDI_Export_2025-11-20.csv"
        );
    }

    #[test]
    fn test_export_documents_writes_file() {
        let tmp = tempdir().unwrap();
        let path = export_documents(
            &[doc("A", 1)],
            ExportFormat::Json,
            tmp.path(),
            "Weekly",
            now(),
        )
        .unwrap();
        assert_eq!(path, tmp.path().join("Weekly_2025-11-20.json"));
        let snapshot: Snapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(snapshot.documents.len(), 1);
    }

    #[test]
    fn test_xlsx_export_reads_back_as_a_sheet() {
        use crate::core::source::{read_source, SourceData};

        let tmp = tempdir().unwrap();
        let path = export_documents(
            &[doc("DOC-1", 9), doc("DOC-2", 4)],
            ExportFormat::Xlsx,
            tmp.path(),
            "MDI_Export",
            now(),
        )
        .unwrap();
        assert_eq!(path, tmp.path().join("MDI_Export_2025-11-20.xlsx"));

        let loaded = read_source(&path, EXPORT_SHEET).unwrap();
        assert_eq!(loaded.sheet, "Documents");
        let SourceData::Rows(rows) = loaded.data else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["Document No"], "DOC-2");
        assert_eq!(rows[1]["STT"], 2.0);
        assert_eq!(rows[0]["PIC PTSC"], "Hung");
        assert_eq!(rows[0]["Is Overdue"], "Yes");
        assert!(!rows[0].contains_key("IFI Plan Date"));
    }

    #[test]
    fn test_export_empty_is_refused() {
        let tmp = tempdir().unwrap();
        let err = export_documents(&[], ExportFormat::Csv, tmp.path(), "MDI_Export", now())
            .unwrap_err();
        assert_eq!(err.to_string(), "No data to export");
        assert!(!tmp.path().join("MDI_Export_2025-11-20.csv").exists());
    }
}
