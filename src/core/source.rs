//! Spreadsheet sources for `mdi import`
//!
//! Supported inputs:
//! - `.xlsx`/`.xlsm`/`.xls`/`.ods` workbooks: the first sheet, in workbook
//!   order, whose name contains the configured sheet name
//! - `.csv`: a single sheet with a header row
//! - `.json` array of row objects
//! - `.json` workbook dump `{ "<sheet name>": [rows...], ... }`
//! - `.json` data snapshot written by `mdi export --format json`
//!
//! Rows come back as [`RawRow`]s for the normalizer. Snapshots already hold
//! canonical documents and skip normalization.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use csv::ReaderBuilder;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value;
use thiserror::Error;

use crate::core::document::Document;
use crate::core::normalize::{cell_text, RawRow};
use crate::core::store::fingerprint;

/// Errors raised while reading an import source
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("cannot read {path:?}: {source}")]
    #[diagnostic(code(mdi::source::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source file {path:?}")]
    #[diagnostic(
        code(mdi::source::format),
        help("import an .xlsx workbook, a .csv sheet, or a .json workbook dump")
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("cannot read workbook {path:?}: {message}")]
    #[diagnostic(code(mdi::source::workbook))]
    Workbook { path: PathBuf, message: String },

    #[error("CSV error in {path:?}: {message}")]
    #[diagnostic(code(mdi::source::csv))]
    Csv { path: PathBuf, message: String },

    #[error("JSON syntax error: {message}")]
    #[diagnostic(code(mdi::source::json))]
    JsonSyntax {
        #[source_code]
        src: NamedSource<String>,

        #[label("error here")]
        span: SourceSpan,

        message: String,
    },

    #[error("unexpected JSON layout in {path:?}: {message}")]
    #[diagnostic(
        code(mdi::source::layout),
        help("expected an array of row objects, an object of sheet name to rows, or an mdi snapshot")
    )]
    InvalidShape { path: PathBuf, message: String },

    #[error("no sheet matching '{sheet}' found (available sheets: {available})")]
    #[diagnostic(
        code(mdi::source::sheet_not_found),
        help("use --sheet or the sheet_name config key to pick another sheet")
    )]
    SheetNotFound { sheet: String, available: String },

    #[error("sheet '{sheet}' has no data rows")]
    #[diagnostic(code(mdi::source::empty_sheet))]
    EmptySheet { sheet: String },
}

/// Contents of an import source
#[derive(Debug)]
pub enum SourceData {
    /// Raw rows to be normalized
    Rows(Vec<RawRow>),
    /// Canonical documents from a data snapshot
    Snapshot(Vec<Document>),
}

impl SourceData {
    pub fn len(&self) -> usize {
        match self {
            SourceData::Rows(rows) => rows.len(),
            SourceData::Snapshot(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A loaded import source
#[derive(Debug)]
pub struct LoadedSource {
    pub path: PathBuf,
    /// Sheet the rows were taken from
    pub sheet: String,
    pub data: SourceData,
    /// SHA256 of the file contents
    pub sha256: String,
}

/// Read an import source, picking `sheet_name` from workbook dumps
pub fn read_source(path: &Path, sheet_name: &str) -> Result<LoadedSource, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let sha256 = fingerprint(&bytes);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let (sheet, data) = match extension.as_str() {
        "csv" => {
            let sheet = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| sheet_name.to_string());
            (sheet, SourceData::Rows(parse_csv(path, &bytes)?))
        }
        "json" => {
            let text = String::from_utf8_lossy(&bytes);
            parse_json(path, &text, sheet_name)?
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            let (sheet, rows) = parse_workbook(path, bytes, sheet_name)?;
            (sheet, SourceData::Rows(rows))
        }
        _ => {
            return Err(SourceError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    if data.is_empty() {
        return Err(SourceError::EmptySheet { sheet });
    }

    log::info!(
        "read {} rows from sheet '{}' of {}",
        data.len(),
        sheet,
        path.display()
    );

    Ok(LoadedSource {
        path: path.to_path_buf(),
        sheet,
        data,
        sha256,
    })
}

/// Parse CSV bytes into raw rows. Cells are trimmed; an empty cell stays an
/// empty string so the normalizer treats it as absent.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<Vec<RawRow>, SourceError> {
    let csv_error = |e: csv::Error| SourceError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parse a JSON source into (sheet name, data)
pub fn parse_json(
    path: &Path,
    text: &str,
    sheet_name: &str,
) -> Result<(String, SourceData), SourceError> {
    let value: Value = serde_json::from_str(text).map_err(|e| json_syntax_error(&e, text, path))?;

    match value {
        Value::Array(items) => {
            let sheet = sheet_name.to_string();
            Ok((sheet, SourceData::Rows(rows_from_array(path, items)?)))
        }
        Value::Object(mut map) if map.contains_key("documents") && map.contains_key("metadata") => {
            let documents = map.remove("documents").unwrap_or(Value::Null);
            let docs: Vec<Document> =
                serde_json::from_value(documents).map_err(|e| SourceError::InvalidShape {
                    path: path.to_path_buf(),
                    message: format!("snapshot documents: {}", e),
                })?;
            Ok(("snapshot".to_string(), SourceData::Snapshot(docs)))
        }
        Value::Object(sheets) => {
            let names: Vec<String> = sheets.keys().cloned().collect();
            let name = select_sheet(&names, sheet_name)?;

            match sheets.get(&name) {
                Some(Value::Array(items)) => {
                    let rows = rows_from_array(path, items.clone())?;
                    Ok((name, SourceData::Rows(rows)))
                }
                _ => Err(SourceError::InvalidShape {
                    path: path.to_path_buf(),
                    message: format!("sheet '{}' is not an array of rows", name),
                }),
            }
        }
        _ => Err(SourceError::InvalidShape {
            path: path.to_path_buf(),
            message: "top-level value is neither an array nor an object".to_string(),
        }),
    }
}

/// First sheet, in source order, whose name contains `sheet_name`
pub fn select_sheet(names: &[String], sheet_name: &str) -> Result<String, SourceError> {
    if let Some(name) = names.iter().find(|name| name.contains(sheet_name)) {
        return Ok(name.clone());
    }
    let available = if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    };
    Err(SourceError::SheetNotFound {
        sheet: sheet_name.to_string(),
        available,
    })
}

/// Read the selected sheet of a workbook into raw rows keyed by the
/// header row
pub fn parse_workbook(
    path: &Path,
    bytes: Vec<u8>,
    sheet_name: &str,
) -> Result<(String, Vec<RawRow>), SourceError> {
    let workbook_error = |message: String| SourceError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| workbook_error(e.to_string()))?;
    let name = select_sheet(&workbook.sheet_names(), sheet_name)?;
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| workbook_error(e.to_string()))?;

    Ok((name, rows_from_range(&range)))
}

/// First row is the header. Empty cells are left out of the row, and rows
/// without any value are skipped.
fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut lines = range.rows();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .iter()
        .map(|cell| match cell_value(cell) {
            Some(value) => cell_text(&value).trim().to_string(),
            None => String::new(),
        })
        .collect();

    let mut rows = Vec::new();
    for line in lines {
        let mut row = RawRow::new();
        for (header, cell) in headers.iter().zip(line.iter()) {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            if let Some(value) = cell_value(cell) {
                row.insert(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    rows
}

/// Workbook cell as a JSON value. Date cells become their Excel serial
/// number, which the normalizer keeps verbatim.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::DateTime(dt) => serde_json::Number::from_f64(dt.as_f64()).map(Value::Number),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}

fn rows_from_array(path: &Path, items: Vec<Value>) -> Result<Vec<RawRow>, SourceError> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(row) => Ok(row),
            other => Err(SourceError::InvalidShape {
                path: path.to_path_buf(),
                message: format!("row {} is {} instead of an object", i + 1, json_kind(&other)),
            }),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn json_syntax_error(err: &serde_json::Error, source: &str, path: &Path) -> SourceError {
    let offset = line_col_to_offset(source, err.line(), err.column());
    SourceError::JsonSyntax {
        src: NamedSource::new(path.display().to_string(), source.to_string()),
        span: SourceSpan::from(offset..offset.saturating_add(1).min(source.len().max(1))),
        message: err.to_string(),
    }
}

/// Convert a 1-based line/column to a byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len());
        }
        offset += text.len();
    }
    source.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_csv_rows_keep_multiline_headers() {
        let tmp = tempdir().unwrap();
        let path = write(
            tmp.path(),
            "mdi.csv",
            "\u{feff}CompanyDoc.No.,\"IFI\nPlan Date\",Status\nDOC-001 , 2025-10-01,\n\n,,\n",
        );

        let loaded = read_source(&path, "MDI_DetailStatus").unwrap();
        assert_eq!(loaded.sheet, "mdi");
        let SourceData::Rows(rows) = loaded.data else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["CompanyDoc.No."], Value::String("DOC-001".into()));
        assert_eq!(rows[0]["IFI\nPlan Date"], Value::String("2025-10-01".into()));
        assert_eq!(rows[0]["Status"], Value::String(String::new()));
        assert_eq!(loaded.sha256.len(), 64);
    }

    #[test]
    fn test_csv_without_rows_is_empty_sheet() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "empty.csv", "CompanyDoc.No.,Status\n");
        let err = read_source(&path, "MDI_DetailStatus").unwrap_err();
        assert!(matches!(err, SourceError::EmptySheet { .. }));
    }

    #[test]
    fn test_json_array() {
        let (_, data) = parse_json(
            Path::new("rows.json"),
            r#"[{"CompanyDoc.No.": "DOC-1", "STT": 1}, {"CompanyDoc.No.": "DOC-2"}]"#,
            "MDI_DetailStatus",
        )
        .unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_json_workbook_picks_sheet_by_substring() {
        let (sheet, data) = parse_json(
            Path::new("book.json"),
            r#"{"Cover": [{"a": 1}], "Rev3_MDI_DetailStatus": [{"CompanyDoc.No.": "D"}]}"#,
            "MDI_DetailStatus",
        )
        .unwrap();
        assert_eq!(sheet, "Rev3_MDI_DetailStatus");
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_json_workbook_missing_sheet_lists_available() {
        let err = parse_json(
            Path::new("book.json"),
            r#"{"Cover": [], "Summary": []}"#,
            "MDI_DetailStatus",
        )
        .unwrap_err();
        match err {
            SourceError::SheetNotFound { sheet, available } => {
                assert_eq!(sheet, "MDI_DetailStatus");
                assert!(available.contains("Cover"));
                assert!(available.contains("Summary"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_workbook_empty_sheet() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "book.json", r#"{"MDI_DetailStatus": []}"#);
        let err = read_source(&path, "MDI_DetailStatus").unwrap_err();
        assert!(matches!(err, SourceError::EmptySheet { sheet } if sheet == "MDI_DetailStatus"));
    }

    #[test]
    fn test_json_snapshot_loads_documents() {
        let text = r#"{
            "metadata": {"version": "1.0"},
            "documents": [{
                "id": "a", "stt": 1, "documentNo": "DOC-1", "title": "T", "revision": "A",
                "discipline": "EE", "scope": "PTSC", "docClass": "", "table": "", "item": "",
                "status": "Approved", "ipiStatus": "",
                "planDates": {"ifi": "2025-01-01", "ifr": null, "ifa": null, "ifc": null, "iff": null},
                "actualDates": {"ifi": null, "ifr": null, "ifa": null, "ifc": null, "iff": null},
                "isOverdue": true, "isCritical": true
            }]
        }"#;
        let (_, data) = parse_json(Path::new("snap.json"), text, "MDI_DetailStatus").unwrap();
        let SourceData::Snapshot(docs) = data else {
            panic!("expected snapshot");
        };
        assert_eq!(docs[0].document_no, "DOC-1");
        assert!(docs[0].is_overdue);
    }

    #[test]
    fn test_json_rows_must_be_objects() {
        let err = parse_json(Path::new("rows.json"), "[1, 2]", "MDI").unwrap_err();
        assert!(matches!(err, SourceError::InvalidShape { .. }));
    }

    #[test]
    fn test_json_syntax_error() {
        let err = parse_json(Path::new("bad.json"), "[\n  {\"a\": }\n]", "MDI").unwrap_err();
        assert!(matches!(err, SourceError::JsonSyntax { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "mdi.txt", "CompanyDoc.No.\nDOC-1\n");
        let err = read_source(&path, "MDI").unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_corrupt_workbook_is_reported() {
        let tmp = tempdir().unwrap();
        let path = write(tmp.path(), "mdi.xlsx", "PK");
        let err = read_source(&path, "MDI").unwrap_err();
        assert!(matches!(err, SourceError::Workbook { .. }));
    }

    fn workbook(dir: &Path, sheets: Vec<(&str, Vec<Vec<&str>>)>) -> PathBuf {
        let mut book = rust_xlsxwriter::Workbook::new();
        for (name, lines) in sheets {
            let sheet = book.add_worksheet();
            sheet.set_name(name).unwrap();
            for (r, line) in lines.iter().enumerate() {
                for (c, cell) in line.iter().enumerate() {
                    if let Ok(number) = cell.parse::<f64>() {
                        sheet.write_number(r as u32, c as u16, number).unwrap();
                    } else if !cell.is_empty() {
                        sheet.write_string(r as u32, c as u16, *cell).unwrap();
                    }
                }
            }
        }
        let path = dir.join("MDI.xlsx");
        book.save(&path).unwrap();
        path
    }

    #[test]
    fn test_xlsx_picks_first_matching_sheet_in_workbook_order() {
        let tmp = tempdir().unwrap();
        let path = workbook(
            tmp.path(),
            vec![
                ("Cover", vec![vec!["Document No"], vec!["IGNORED"]]),
                (
                    "Z_MDI_DetailStatus",
                    vec![
                        vec!["CompanyDoc.No.", "STT", "IFI\nPlan Date", "Status"],
                        vec!["DOC-001", "1", "45835", ""],
                        vec!["", "", "", ""],
                        vec!["DOC-002", "2", "", "Approved"],
                    ],
                ),
                ("A_MDI_DetailStatus_old", vec![vec!["CompanyDoc.No."], vec!["OLD"]]),
            ],
        );

        let loaded = read_source(&path, "MDI_DetailStatus").unwrap();
        assert_eq!(loaded.sheet, "Z_MDI_DetailStatus");
        let SourceData::Rows(rows) = loaded.data else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["CompanyDoc.No."], Value::String("DOC-001".into()));
        assert_eq!(cell_text(&rows[0]["IFI\nPlan Date"]), "45835");
        assert!(!rows[0].contains_key("Status"));
        assert_eq!(rows[1]["Status"], Value::String("Approved".into()));
    }

    #[test]
    fn test_xlsx_missing_sheet_lists_available() {
        let tmp = tempdir().unwrap();
        let path = workbook(tmp.path(), vec![("Summary", vec![vec!["a"], vec!["b"]])]);
        let err = read_source(&path, "MDI_DetailStatus").unwrap_err();
        match err {
            SourceError::SheetNotFound { available, .. } => assert_eq!(available, "Summary"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_xlsx_header_only_sheet_is_empty() {
        let tmp = tempdir().unwrap();
        let path = workbook(
            tmp.path(),
            vec![("MDI_DetailStatus", vec![vec!["CompanyDoc.No.", "Status"]])],
        );
        let err = read_source(&path, "MDI_DetailStatus").unwrap_err();
        assert!(matches!(err, SourceError::EmptySheet { sheet } if sheet == "MDI_DetailStatus"));
    }

    #[test]
    fn test_json_workbook_keeps_sheet_order() {
        let (sheet, _) = parse_json(
            Path::new("book.json"),
            r#"{"Z_MDI_DetailStatus": [{"a": 1}], "A_MDI_DetailStatus": [{"b": 2}]}"#,
            "MDI_DetailStatus",
        )
        .unwrap();
        assert_eq!(sheet, "Z_MDI_DetailStatus");
    }

    #[test]
    fn test_line_col_to_offset() {
        assert_eq!(line_col_to_offset("ab\ncd", 2, 1), 3);
        assert_eq!(line_col_to_offset("ab\ncd", 1, 2), 1);
    }
}
