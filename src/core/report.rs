//! Report engine - derived views over a document list
//!
//! Every function here is pure. Callers re-run them over the full list
//! whenever the data or the filters change.
//!
//! Three overdue notions coexist and are deliberately kept apart:
//! - `Document::is_overdue`, the stored flag (IFI/IFR/IFA, frozen at import)
//! - [`overdue_items`], a live check against `today` on IFI/IFR only
//! - [`KpiStats::critical_issues`], overdue + waiting counts without
//!   deduplication ([`KpiStats::critical_documents`] is the deduplicated count)

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::dates::{iso_week_bounds, parse_date};
use crate::core::document::{Document, Milestone};

/// Number of PICs shown in the overdue ranking
pub const TOP_PIC_LIMIT: usize = 5;

/// Headline counters for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiStats {
    pub total_documents: usize,
    /// Documents with the stored overdue flag
    pub overdue_count: usize,
    /// Documents whose status contains "waiting"
    pub waiting_comment_count: usize,
    /// `overdue_count + waiting_comment_count`; a document in both is counted twice
    pub critical_issues: usize,
    /// Documents with the stored critical flag, each counted once
    pub critical_documents: usize,
}

/// Plan vs actual counts for one discipline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisciplineProgress {
    pub name: String,
    /// Documents with at least one plan date
    pub plan: usize,
    /// Documents with at least one actual date
    pub actual: usize,
}

/// A labelled count (chart slice, ranking bar, facet option)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Documents with a primary milestone (IFI or IFR) planned before `today`
/// and not yet delivered
pub fn overdue_items(docs: &[Document], today: NaiveDate) -> Vec<Document> {
    docs.iter()
        .filter(|doc| {
            Milestone::PRIMARY
                .iter()
                .any(|m| doc.milestone_overdue(*m, today))
        })
        .cloned()
        .collect()
}

/// Documents with a plan or actual date (IFI..IFC) inside the Monday-Sunday
/// week containing `reference_date`
pub fn weekly_submissions(docs: &[Document], reference_date: NaiveDate) -> Vec<Document> {
    let (start, end) = iso_week_bounds(reference_date);
    docs.iter()
        .filter(|doc| {
            Milestone::WEEKLY.iter().any(|m| {
                [doc.plan_dates.get(*m), doc.actual_dates.get(*m)]
                    .into_iter()
                    .flatten()
                    .filter_map(parse_date)
                    .any(|date| date >= start && date <= end)
            })
        })
        .cloned()
        .collect()
}

/// Documents awaiting client feedback (status contains "waiting")
pub fn pending_feedback(docs: &[Document]) -> Vec<Document> {
    docs.iter().filter(|d| d.is_waiting()).cloned().collect()
}

/// Aggregate dashboard counters from the stored flags and status labels
pub fn compute_kpis(docs: &[Document]) -> KpiStats {
    let overdue_count = docs.iter().filter(|d| d.is_overdue).count();
    let waiting_comment_count = docs.iter().filter(|d| d.is_waiting()).count();

    KpiStats {
        total_documents: docs.len(),
        overdue_count,
        waiting_comment_count,
        critical_issues: overdue_count + waiting_comment_count,
        critical_documents: docs.iter().filter(|d| d.is_critical).count(),
    }
}

/// Count occurrences by key, keeping first-encounter order
fn count_in_order<'a, I>(keys: I) -> Vec<NamedCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<NamedCount> = Vec::new();

    for key in keys {
        match index.get(key) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(key, counts.len());
                counts.push(NamedCount {
                    name: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}

/// Discipline label used for grouping ("Other" when blank)
fn discipline_label(doc: &Document) -> &str {
    if doc.discipline.is_empty() {
        "Other"
    } else {
        doc.discipline.as_str()
    }
}

/// Plan vs actual submissions per discipline, in first-encounter order
pub fn plan_vs_actual_by_discipline(docs: &[Document]) -> Vec<DisciplineProgress> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DisciplineProgress> = Vec::new();

    for doc in docs {
        let name = discipline_label(doc);
        let i = *index.entry(name).or_insert_with(|| {
            groups.push(DisciplineProgress {
                name: name.to_string(),
                plan: 0,
                actual: 0,
            });
            groups.len() - 1
        });

        if doc.plan_dates.any() {
            groups[i].plan += 1;
        }
        if doc.actual_dates.any() {
            groups[i].actual += 1;
        }
    }

    groups
}

/// Documents per discipline, in first-encounter order
pub fn discipline_distribution(docs: &[Document]) -> Vec<NamedCount> {
    count_in_order(docs.iter().map(discipline_label))
}

/// Occurrences of each status label, in first-encounter order
pub fn status_distribution(docs: &[Document]) -> Vec<NamedCount> {
    count_in_order(docs.iter().map(|d| {
        if d.status.is_empty() {
            "Unknown"
        } else {
            d.status.as_str()
        }
    }))
}

/// Overdue documents per PTSC PIC, highest first, at most `limit` entries.
/// Ties keep first-encounter order.
pub fn top_overdue_by_pic(docs: &[Document], limit: usize) -> Vec<NamedCount> {
    let mut counts = count_in_order(docs.iter().filter(|d| d.is_overdue).map(|d| d.pic_bucket()));
    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// PIC facet values with document counts, sorted by label
pub fn pic_options(docs: &[Document]) -> Vec<NamedCount> {
    let mut options = count_in_order(docs.iter().map(|d| d.pic_bucket()));
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options
}

/// Summary block of the JSON data snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStatistics {
    pub total: usize,
    /// Status exactly "Approved"
    pub approved: usize,
    /// Stored overdue flag
    pub overdue: usize,
    /// Distinct non-empty disciplines
    pub disciplines: usize,
}

pub fn snapshot_statistics(docs: &[Document]) -> SnapshotStatistics {
    SnapshotStatistics {
        total: docs.len(),
        approved: docs.iter().filter(|d| d.status == "Approved").count(),
        overdue: docs.iter().filter(|d| d.is_overdue).count(),
        disciplines: discipline_count(docs),
    }
}

/// Distinct non-empty disciplines
pub fn discipline_count(docs: &[Document]) -> usize {
    let mut seen: Vec<&str> = docs
        .iter()
        .map(|d| d.discipline.as_str())
        .filter(|d| !d.is_empty())
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
