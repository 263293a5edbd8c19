//! Row normalizer - raw spreadsheet rows to canonical documents
//!
//! Column headers drift between MDI exports (embedded newlines, underscores,
//! abbreviations). Every semantic field therefore has an ordered list of
//! accepted header spellings in [`FIELD_ALIASES`], and a single lookup,
//! [`first_present`], resolves them. The normalizer never fails: missing or
//! garbled cells degrade to a default or `None`.

use chrono::NaiveDate;
use serde_json::Value;
use ulid::Ulid;

use crate::core::dates::parse_date;
use crate::core::document::{
    compute_overdue, status_is_waiting, Document, Milestone, MilestoneDates,
};

/// One raw spreadsheet row: header name to cell value
pub type RawRow = serde_json::Map<String, Value>;

/// Cell value that means "no data" in MDI sheets
const NOT_APPLICABLE: &str = "N/A";

/// Semantic document fields resolvable from a raw row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Stt,
    DocumentNo,
    Title,
    Revision,
    Discipline,
    Scope,
    DocClass,
    Table,
    Item,
    Status,
    IpiStatus,
    ReviewCode,
    Plan(Milestone),
    Actual(Milestone),
    TargetMitigationDate,
    TransNo,
    DateReceived,
    TrnOutDate,
    TrnOutNo,
    TrnInDate,
    TrnInNo,
    PicPtsc,
    PicLsp,
    LocalPath,
    SharepointPath,
}

/// Accepted header spellings for a field, probed in order
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub field: Field,
    pub aliases: &'static [&'static str],
    /// Value used when no alias yields a usable cell
    pub default: Option<&'static str>,
}

const fn alias(field: Field, aliases: &'static [&'static str]) -> FieldAlias {
    FieldAlias {
        field,
        aliases,
        default: None,
    }
}

const fn alias_or(
    field: Field,
    aliases: &'static [&'static str],
    default: &'static str,
) -> FieldAlias {
    FieldAlias {
        field,
        aliases,
        default: Some(default),
    }
}

/// Header alias table, ordered by priority within each field
pub const FIELD_ALIASES: &[FieldAlias] = &[
    alias(Field::Id, &["localPath", "id"]),
    alias(Field::Stt, &["stt", "STT", "No."]),
    alias(
        Field::DocumentNo,
        &["companyDocNo", "CompanyDoc.No.", "document_no", "documentNo", "Document No"],
    ),
    alias(Field::Title, &["name", "DocumentName", "title", "Title"]),
    alias(Field::Revision, &["revision", "Rev", "Revision"]),
    alias_or(Field::Discipline, &["discipline", "Org", "Discipline"], "General"),
    alias_or(Field::Scope, &["scope", "Scope"], "PTSC"),
    alias(Field::DocClass, &["doc_class", "Class", "docClass"]),
    alias(Field::Table, &["table", "Table", "table_name"]),
    alias(Field::Item, &["item", "Item"]),
    alias_or(
        Field::Status,
        &["doc_status", "Status", "status"],
        "Not yet issued",
    ),
    alias(Field::IpiStatus, &["ipi_status", "IPI", "ipiStatus", "IPI Status"]),
    alias(Field::ReviewCode, &["review_code", "Code", "reviewCode", "Review Code"]),
    alias(
        Field::Plan(Milestone::Ifi),
        &["ifi_plan_date", "IFI\nPlan Date", "IFI Plan Date", "IFIPlan Date", "IFI_Plan_Date"],
    ),
    alias(
        Field::Plan(Milestone::Ifr),
        &["ifr_plan_date", "IFR\nPlan Date", "IFR Plan Date", "IFRPlan Date", "IFR_Plan_Date"],
    ),
    alias(
        Field::Plan(Milestone::Ifa),
        &["ifa_plan_date", "IFA\nPlan Date", "IFA Plan Date", "IFAPlan Date", "IFA_Plan_Date"],
    ),
    alias(
        Field::Plan(Milestone::Ifc),
        &["ifc_plan_date", "IFC\nPlan Date", "IFC Plan Date", "IFCPlan Date", "IFC_Plan_Date"],
    ),
    alias(
        Field::Plan(Milestone::Iff),
        &[
            "iff_plan_date",
            "IFF/ASB\nPlan Date",
            "IFF/ASB Plan Date",
            "IFF Plan Date",
            "IFF\nPlan Date",
            "IFF_Plan_Date",
        ],
    ),
    alias(
        Field::Actual(Milestone::Ifi),
        &[
            "ifi_actual_date",
            "IFI\nActual Date",
            "IFI Actual Date",
            "IFIActual Date",
            "IFI_Actual_Date",
        ],
    ),
    alias(
        Field::Actual(Milestone::Ifr),
        &[
            "ifr_actual_date",
            "IFR\nActual Date",
            "IFR Actual Date",
            "IFRActual Date",
            "IFR_Actual_Date",
        ],
    ),
    alias(
        Field::Actual(Milestone::Ifa),
        &[
            "ifa_actual_date",
            "IFA\nActual Date",
            "IFA Actual Date",
            "IFAActual Date",
            "IFA_Actual_Date",
        ],
    ),
    alias(
        Field::Actual(Milestone::Ifc),
        &[
            "ifc_actual_date",
            "IFC\nActual Date",
            "IFC Actual Date",
            "IFCActual Date",
            "IFC_Actual_Date",
        ],
    ),
    alias(
        Field::Actual(Milestone::Iff),
        &[
            "iff_actual_date",
            "IFF/ASB\nActual Date",
            "IFF/ASB Actual Date",
            "IFF Actual Date",
            "IFF\nActual Date",
            "IFF_Actual_Date",
        ],
    ),
    alias(
        Field::TargetMitigationDate,
        &["target_mitigation_date", "Target Mitigation Date", "TargetMitigation Date"],
    ),
    alias(Field::TransNo, &["transNo", "Trans No"]),
    alias(Field::DateReceived, &["dateReceived", "date_received", "Date Received"]),
    alias(Field::TrnOutDate, &["trn_out_date", "DateTRNOut", "TRN Out Date"]),
    alias(Field::TrnOutNo, &["trn_out_no", "TRNOutNo.", "TRN Out No"]),
    alias(Field::TrnInDate, &["trn_in_date", "DateTRNIn", "TRN In Date"]),
    alias(Field::TrnInNo, &["trn_in_no", "TRNInNo.", "TRN In No"]),
    alias(Field::PicPtsc, &["pic_ptsc", "PIC PTSC", "PICPTSC", "PIC_PTSC"]),
    alias(Field::PicLsp, &["pic_lsp", "PIC LSP", "PICLSP", "PIC_LSP"]),
    alias(Field::LocalPath, &["localPath", "Local Path"]),
    alias(Field::SharepointPath, &["sharepointPath", "SharePoint Path"]),
];

/// Look up the alias entry for a field
pub fn alias_entry(field: Field) -> Option<&'static FieldAlias> {
    FIELD_ALIASES.iter().find(|a| a.field == field)
}

/// Return the first cell among `names` that carries data
///
/// A cell carries data unless it is missing, null, an empty string or the
/// literal "N/A".
pub fn first_present<'a>(raw: &'a RawRow, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| raw.get(*name))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty() && s != NOT_APPLICABLE,
            _ => true,
        })
}

/// Render a cell as text the way a spreadsheet shows it
///
/// Whole numbers lose their fractional part so an Excel serial date reads
/// "45835" rather than "45835.0".
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Resolve a field to its text, without applying the default
pub fn resolve(raw: &RawRow, field: Field) -> Option<String> {
    let entry = alias_entry(field)?;
    first_present(raw, entry.aliases).map(cell_text)
}

/// Resolve a field, falling back to its default or an empty string
fn resolve_text(raw: &RawRow, field: Field) -> String {
    resolve(raw, field)
        .or_else(|| alias_entry(field).and_then(|a| a.default).map(String::from))
        .unwrap_or_default()
}

fn resolve_dates(raw: &RawRow, kind: fn(Milestone) -> Field) -> MilestoneDates {
    let mut dates = MilestoneDates::default();
    for milestone in Milestone::ALL {
        dates.set(milestone, resolve(raw, kind(milestone)));
    }
    dates
}

/// Sequence numbers follow JavaScript `Number()` leniency: anything that is
/// not numeric becomes 0.
fn parse_stt(text: Option<String>) -> i64 {
    text.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
        .unwrap_or(0)
}

fn generated_id() -> String {
    format!("doc-{}", Ulid::new().to_string().to_lowercase())
}

/// Normalize one raw row into a document, computing flags against `today`
pub fn normalize_row(raw: &RawRow, today: NaiveDate) -> Document {
    let plan_dates = resolve_dates(raw, Field::Plan);
    let actual_dates = resolve_dates(raw, Field::Actual);

    for milestone in Milestone::OVERDUE_CHECKED {
        if let Some(plan) = plan_dates.get(milestone) {
            if parse_date(plan).is_none() {
                log::debug!(
                    "unparseable {} plan date {:?}; skipped for overdue check",
                    milestone,
                    plan
                );
            }
        }
    }

    let status = resolve_text(raw, Field::Status);
    let is_overdue = compute_overdue(&plan_dates, &actual_dates, today);
    let is_critical = is_overdue || status_is_waiting(&status);

    Document {
        id: resolve(raw, Field::Id).unwrap_or_else(generated_id),
        stt: parse_stt(resolve(raw, Field::Stt)),
        document_no: resolve_text(raw, Field::DocumentNo),
        title: resolve_text(raw, Field::Title),
        revision: resolve_text(raw, Field::Revision),
        discipline: resolve_text(raw, Field::Discipline),
        scope: resolve_text(raw, Field::Scope),
        doc_class: resolve_text(raw, Field::DocClass),
        table: resolve_text(raw, Field::Table),
        item: resolve_text(raw, Field::Item),
        status,
        ipi_status: resolve_text(raw, Field::IpiStatus),
        review_code: resolve(raw, Field::ReviewCode),
        plan_dates,
        actual_dates,
        target_mitigation_date: resolve(raw, Field::TargetMitigationDate),
        trans_no: resolve(raw, Field::TransNo),
        date_received: resolve(raw, Field::DateReceived),
        trn_out_date: resolve(raw, Field::TrnOutDate),
        trn_out_no: resolve(raw, Field::TrnOutNo),
        trn_in_date: resolve(raw, Field::TrnInDate),
        trn_in_no: resolve(raw, Field::TrnInNo),
        pic_ptsc: resolve(raw, Field::PicPtsc),
        pic_lsp: resolve(raw, Field::PicLsp),
        local_path: resolve(raw, Field::LocalPath),
        sharepoint_path: resolve(raw, Field::SharepointPath),
        is_overdue,
        is_critical,
    }
}

/// Normalize every row, preserving order
pub fn normalize_rows(rows: &[RawRow], today: NaiveDate) -> Vec<Document> {
    let docs: Vec<Document> = rows.iter().map(|row| normalize_row(row, today)).collect();
    log::debug!(
        "normalized {} rows ({} overdue, {} with PIC)",
        docs.len(),
        docs.iter().filter(|d| d.is_overdue).count(),
        docs.iter().filter(|d| d.pic_ptsc.is_some()).count()
    );
    docs
}
