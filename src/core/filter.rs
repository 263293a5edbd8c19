//! Document filtering
//!
//! `FilterState` is an immutable value. Reducers return a new state instead
//! of mutating a shared store, and `apply_filters` is a pure, order-preserving
//! filter over a document slice.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::document::Document;

/// Status filter value that switches to a "waiting" substring match
pub const WAITING_FILTER: &str = "Waiting";

/// Active filter criteria. Unset fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub discipline: Option<String>,
    pub status: Option<String>,
    /// Only `Some(true)` constrains; `Some(false)` behaves like `None`
    pub is_overdue: Option<bool>,
    /// PTSC PICs to keep (OR within the set); "Unknown" matches documents without one
    pub pic_ptsc: BTreeSet<String>,
    pub search_query: String,
}

/// A single filter change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Discipline(Option<String>),
    Status(Option<String>),
    IsOverdue(Option<bool>),
    PicPtsc(BTreeSet<String>),
    SearchQuery(String),
}

impl FilterState {
    /// Return a new state with one field replaced
    pub fn set_filter(self, update: FilterUpdate) -> FilterState {
        match update {
            FilterUpdate::Discipline(discipline) => FilterState { discipline, ..self },
            FilterUpdate::Status(status) => FilterState { status, ..self },
            FilterUpdate::IsOverdue(is_overdue) => FilterState { is_overdue, ..self },
            FilterUpdate::PicPtsc(pic_ptsc) => FilterState { pic_ptsc, ..self },
            FilterUpdate::SearchQuery(search_query) => FilterState {
                search_query,
                ..self
            },
        }
    }

    /// The empty state
    pub fn reset_filters() -> FilterState {
        FilterState::default()
    }

    /// True if no field constrains the result
    pub fn is_empty(&self) -> bool {
        self.discipline.is_none()
            && self.status.is_none()
            && self.is_overdue != Some(true)
            && self.pic_ptsc.is_empty()
            && self.search_query.is_empty()
    }

    /// Test one document against every active criterion
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(ref discipline) = self.discipline {
            if &doc.discipline != discipline {
                return false;
            }
        }

        if let Some(ref status) = self.status {
            let status_ok = if status == WAITING_FILTER {
                doc.is_waiting()
            } else {
                &doc.status == status
            };
            if !status_ok {
                return false;
            }
        }

        if self.is_overdue == Some(true) && !doc.is_overdue {
            return false;
        }

        if !self.pic_ptsc.is_empty() && !self.pic_ptsc.contains(doc.pic_bucket()) {
            return false;
        }

        if !self.search_query.is_empty() && !matches_search(doc, &self.search_query) {
            return false;
        }

        true
    }
}

/// Case-insensitive substring search across the visible text columns
fn matches_search(doc: &Document, query: &str) -> bool {
    let needle = query.to_lowercase();
    let optional = [doc.pic_ptsc.as_deref(), doc.pic_lsp.as_deref()];
    [
        doc.document_no.as_str(),
        doc.title.as_str(),
        doc.discipline.as_str(),
        doc.status.as_str(),
        doc.revision.as_str(),
        doc.ipi_status.as_str(),
    ]
    .into_iter()
    .chain(optional.into_iter().flatten())
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep the documents matching `filters`, in input order
pub fn apply_filters(docs: &[Document], filters: &FilterState) -> Vec<Document> {
    docs.iter().filter(|d| filters.matches(d)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(no: &str, discipline: &str, status: &str, pic: Option<&str>, overdue: bool) -> Document {
        Document {
            id: no.to_string(),
            document_no: no.to_string(),
            discipline: discipline.to_string(),
            status: status.to_string(),
            pic_ptsc: pic.map(String::from),
            is_overdue: overdue,
            ..Default::default()
        }
    }

    fn corpus() -> Vec<Document> {
        vec![
            doc("D1", "EE", "Approved", Some("Hung"), false),
            doc("D2", "PL", "Waiting cmt", None, true),
            doc("D3", "EE", "Not yet issued", Some("Lan"), true),
            doc("D4", "CV", "waiting for reply", Some("Hung"), false),
        ]
    }

    fn numbers(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.document_no.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let docs = corpus();
        assert_eq!(apply_filters(&docs, &FilterState::default()), docs);
        assert!(FilterState::default().is_empty());
    }

    #[test]
    fn test_filters_are_idempotent() {
        let docs = corpus();
        let f = FilterState::default()
            .set_filter(FilterUpdate::Discipline(Some("EE".to_string())))
            .set_filter(FilterUpdate::IsOverdue(Some(true)));
        let once = apply_filters(&docs, &f);
        assert_eq!(apply_filters(&once, &f), once);
        assert_eq!(numbers(&once), vec!["D3"]);
    }

    #[test]
    fn test_waiting_status_uses_substring() {
        let f = FilterState::default()
            .set_filter(FilterUpdate::Status(Some(WAITING_FILTER.to_string())));
        assert_eq!(numbers(&apply_filters(&corpus(), &f)), vec!["D2", "D4"]);
    }

    #[test]
    fn test_other_status_is_exact() {
        let f = FilterState::default()
            .set_filter(FilterUpdate::Status(Some("approved".to_string())));
        assert!(apply_filters(&corpus(), &f).is_empty());

        let f = FilterState::default()
            .set_filter(FilterUpdate::Status(Some("Approved".to_string())));
        assert_eq!(numbers(&apply_filters(&corpus(), &f)), vec!["D1"]);
    }

    #[test]
    fn test_overdue_false_does_not_constrain() {
        let f = FilterState::default().set_filter(FilterUpdate::IsOverdue(Some(false)));
        assert_eq!(apply_filters(&corpus(), &f).len(), 4);
    }

    #[test]
    fn test_unknown_pic_bucket() {
        let pics: BTreeSet<String> = ["Unknown".to_string()].into_iter().collect();
        let f = FilterState::default().set_filter(FilterUpdate::PicPtsc(pics));
        assert_eq!(numbers(&apply_filters(&corpus(), &f)), vec!["D2"]);
    }

    #[test]
    fn test_pic_set_is_or() {
        let pics: BTreeSet<String> = ["Lan".to_string(), "Unknown".to_string()]
            .into_iter()
            .collect();
        let f = FilterState::default().set_filter(FilterUpdate::PicPtsc(pics));
        assert_eq!(numbers(&apply_filters(&corpus(), &f)), vec!["D2", "D3"]);
    }

    #[test]
    fn test_search_query() {
        let f = FilterState::default().set_filter(FilterUpdate::SearchQuery("hung".to_string()));
        assert_eq!(numbers(&apply_filters(&corpus(), &f)), vec!["D1", "D4"]);
    }

    #[test]
    fn test_reset_filters() {
        let f = FilterState::default()
            .set_filter(FilterUpdate::Discipline(Some("EE".to_string())))
            .set_filter(FilterUpdate::SearchQuery("x".to_string()));
        assert!(!f.is_empty());
        assert_eq!(FilterState::reset_filters(), FilterState::default());
    }
}
