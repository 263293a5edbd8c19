//! Flattened persistence shape of a `Document`
//!
//! Milestones become ten flat `<milestone>_{plan,actual}_date` columns,
//! `table` is stored as `table_name` and the flags as 0/1 integers.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;

use crate::core::document::{Document, Milestone, MilestoneDates};

/// Column order shared by INSERT and SELECT statements
pub(super) const COLUMNS: &[&str] = &[
    "id",
    "stt",
    "documentNo",
    "title",
    "revision",
    "discipline",
    "scope",
    "docClass",
    "table_name",
    "item",
    "status",
    "ipiStatus",
    "reviewCode",
    "ifi_plan_date",
    "ifr_plan_date",
    "ifa_plan_date",
    "ifc_plan_date",
    "iff_plan_date",
    "ifi_actual_date",
    "ifr_actual_date",
    "ifa_actual_date",
    "ifc_actual_date",
    "iff_actual_date",
    "targetMitigationDate",
    "transNo",
    "dateReceived",
    "trnOutDate",
    "trnOutNo",
    "trnInDate",
    "trnInNo",
    "picPtsc",
    "picLsp",
    "localPath",
    "sharepointPath",
    "isOverdue",
    "isCritical",
];

/// One row of the `documents` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRow {
    pub id: String,
    pub stt: i64,
    pub document_no: String,
    pub title: String,
    pub revision: String,
    pub discipline: String,
    pub scope: String,
    pub doc_class: String,
    pub table_name: String,
    pub item: String,
    pub status: String,
    pub ipi_status: String,
    pub review_code: Option<String>,
    /// ifi, ifr, ifa, ifc, iff
    pub plan: [Option<String>; 5],
    /// ifi, ifr, ifa, ifc, iff
    pub actual: [Option<String>; 5],
    pub target_mitigation_date: Option<String>,
    pub trans_no: Option<String>,
    pub date_received: Option<String>,
    pub trn_out_date: Option<String>,
    pub trn_out_no: Option<String>,
    pub trn_in_date: Option<String>,
    pub trn_in_no: Option<String>,
    pub pic_ptsc: Option<String>,
    pub pic_lsp: Option<String>,
    pub local_path: Option<String>,
    pub sharepoint_path: Option<String>,
    pub is_overdue: i64,
    pub is_critical: i64,
}

fn flatten(dates: &MilestoneDates) -> [Option<String>; 5] {
    Milestone::ALL.map(|m| dates.get(m).map(String::from))
}

fn unflatten(columns: [Option<String>; 5]) -> MilestoneDates {
    let mut dates = MilestoneDates::default();
    for (milestone, value) in Milestone::ALL.into_iter().zip(columns) {
        dates.set(milestone, value);
    }
    dates
}

impl From<&Document> for StoredRow {
    fn from(doc: &Document) -> Self {
        StoredRow {
            id: doc.id.clone(),
            stt: doc.stt,
            document_no: doc.document_no.clone(),
            title: doc.title.clone(),
            revision: doc.revision.clone(),
            discipline: doc.discipline.clone(),
            scope: doc.scope.clone(),
            doc_class: doc.doc_class.clone(),
            table_name: doc.table.clone(),
            item: doc.item.clone(),
            status: doc.status.clone(),
            ipi_status: doc.ipi_status.clone(),
            review_code: doc.review_code.clone(),
            plan: flatten(&doc.plan_dates),
            actual: flatten(&doc.actual_dates),
            target_mitigation_date: doc.target_mitigation_date.clone(),
            trans_no: doc.trans_no.clone(),
            date_received: doc.date_received.clone(),
            trn_out_date: doc.trn_out_date.clone(),
            trn_out_no: doc.trn_out_no.clone(),
            trn_in_date: doc.trn_in_date.clone(),
            trn_in_no: doc.trn_in_no.clone(),
            pic_ptsc: doc.pic_ptsc.clone(),
            pic_lsp: doc.pic_lsp.clone(),
            local_path: doc.local_path.clone(),
            sharepoint_path: doc.sharepoint_path.clone(),
            is_overdue: i64::from(doc.is_overdue),
            is_critical: i64::from(doc.is_critical),
        }
    }
}

impl From<StoredRow> for Document {
    fn from(row: StoredRow) -> Self {
        Document {
            id: row.id,
            stt: row.stt,
            document_no: row.document_no,
            title: row.title,
            revision: row.revision,
            discipline: row.discipline,
            scope: row.scope,
            doc_class: row.doc_class,
            table: row.table_name,
            item: row.item,
            status: row.status,
            ipi_status: row.ipi_status,
            review_code: row.review_code,
            plan_dates: unflatten(row.plan),
            actual_dates: unflatten(row.actual),
            target_mitigation_date: row.target_mitigation_date,
            trans_no: row.trans_no,
            date_received: row.date_received,
            trn_out_date: row.trn_out_date,
            trn_out_no: row.trn_out_no,
            trn_in_date: row.trn_in_date,
            trn_in_no: row.trn_in_no,
            pic_ptsc: row.pic_ptsc,
            pic_lsp: row.pic_lsp,
            local_path: row.local_path,
            sharepoint_path: row.sharepoint_path,
            is_overdue: row.is_overdue != 0,
            is_critical: row.is_critical != 0,
        }
    }
}

fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn opt_text(value: &Option<String>) -> SqlValue {
    match value {
        Some(v) => SqlValue::Text(v.clone()),
        None => SqlValue::Null,
    }
}

impl StoredRow {
    /// Parameter values in `COLUMNS` order
    pub(super) fn to_params(&self) -> Vec<SqlValue> {
        let mut values = vec![
            text(&self.id),
            SqlValue::Integer(self.stt),
            text(&self.document_no),
            text(&self.title),
            text(&self.revision),
            text(&self.discipline),
            text(&self.scope),
            text(&self.doc_class),
            text(&self.table_name),
            text(&self.item),
            text(&self.status),
            text(&self.ipi_status),
            opt_text(&self.review_code),
        ];
        values.extend(self.plan.iter().map(opt_text));
        values.extend(self.actual.iter().map(opt_text));
        values.extend(
            [
                &self.target_mitigation_date,
                &self.trans_no,
                &self.date_received,
                &self.trn_out_date,
                &self.trn_out_no,
                &self.trn_in_date,
                &self.trn_in_no,
                &self.pic_ptsc,
                &self.pic_lsp,
                &self.local_path,
                &self.sharepoint_path,
            ]
            .into_iter()
            .map(opt_text),
        );
        values.push(SqlValue::Integer(self.is_overdue));
        values.push(SqlValue::Integer(self.is_critical));
        values
    }

    /// Read a row selected with `COLUMNS`. NULL in a required text column
    /// reads as an empty string.
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let req = |i: usize| -> rusqlite::Result<String> {
            Ok(row.get::<_, Option<String>>(i)?.unwrap_or_default())
        };
        let opt = |i: usize| -> rusqlite::Result<Option<String>> { row.get(i) };

        Ok(StoredRow {
            id: req(0)?,
            stt: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            document_no: req(2)?,
            title: req(3)?,
            revision: req(4)?,
            discipline: req(5)?,
            scope: req(6)?,
            doc_class: req(7)?,
            table_name: req(8)?,
            item: req(9)?,
            status: req(10)?,
            ipi_status: req(11)?,
            review_code: opt(12)?,
            plan: [opt(13)?, opt(14)?, opt(15)?, opt(16)?, opt(17)?],
            actual: [opt(18)?, opt(19)?, opt(20)?, opt(21)?, opt(22)?],
            target_mitigation_date: opt(23)?,
            trans_no: opt(24)?,
            date_received: opt(25)?,
            trn_out_date: opt(26)?,
            trn_out_no: opt(27)?,
            trn_in_date: opt(28)?,
            trn_in_no: opt(29)?,
            pic_ptsc: opt(30)?,
            pic_lsp: opt(31)?,
            local_path: opt(32)?,
            sharepoint_path: opt(33)?,
            is_overdue: row.get::<_, Option<i64>>(34)?.unwrap_or(0),
            is_critical: row.get::<_, Option<i64>>(35)?.unwrap_or(0),
        })
    }
}
