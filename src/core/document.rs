//! Canonical MDI document record
//!
//! A `Document` is produced wholesale by the normalizer from one spreadsheet
//! row and is never partially mutated afterwards. Replacing the corpus means
//! re-normalizing every row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::dates::parse_date;

/// Submission milestones tracked for every document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Milestone {
    /// Issued for Information
    Ifi,
    /// Issued for Review
    Ifr,
    /// Issued for Approval
    Ifa,
    /// Issued for Construction
    Ifc,
    /// Issued for Final / As-built
    Iff,
}

impl Milestone {
    /// All milestones in submission order
    pub const ALL: [Milestone; 5] = [
        Milestone::Ifi,
        Milestone::Ifr,
        Milestone::Ifa,
        Milestone::Ifc,
        Milestone::Iff,
    ];

    /// Milestones checked when the stored overdue flag is computed.
    /// IFC and IFF are not part of the check.
    pub const OVERDUE_CHECKED: [Milestone; 3] = [Milestone::Ifi, Milestone::Ifr, Milestone::Ifa];

    /// Primary milestones used by the overdue report
    pub const PRIMARY: [Milestone; 2] = [Milestone::Ifi, Milestone::Ifr];

    /// Milestones scanned by the weekly submission report (IFF excluded)
    pub const WEEKLY: [Milestone; 4] = [
        Milestone::Ifi,
        Milestone::Ifr,
        Milestone::Ifa,
        Milestone::Ifc,
    ];

    /// Lowercase key used in storage column names and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Milestone::Ifi => "ifi",
            Milestone::Ifr => "ifr",
            Milestone::Ifa => "ifa",
            Milestone::Ifc => "ifc",
            Milestone::Iff => "iff",
        }
    }

    /// Upper-case label used in spreadsheet headers
    pub fn label(&self) -> &'static str {
        match self {
            Milestone::Ifi => "IFI",
            Milestone::Ifr => "IFR",
            Milestone::Ifa => "IFA",
            Milestone::Ifc => "IFC",
            Milestone::Iff => "IFF",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Milestone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ifi" => Ok(Milestone::Ifi),
            "ifr" => Ok(Milestone::Ifr),
            "ifa" => Ok(Milestone::Ifa),
            "ifc" => Ok(Milestone::Ifc),
            "iff" | "iff/asb" | "asb" => Ok(Milestone::Iff),
            _ => Err(format!("Unknown milestone: {}", s)),
        }
    }
}

/// One date per milestone. All five keys are always present; a value is
/// `None` when the source cell was absent, empty or "N/A".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneDates {
    pub ifi: Option<String>,
    pub ifr: Option<String>,
    pub ifa: Option<String>,
    pub ifc: Option<String>,
    pub iff: Option<String>,
}

impl MilestoneDates {
    pub fn get(&self, milestone: Milestone) -> Option<&str> {
        match milestone {
            Milestone::Ifi => self.ifi.as_deref(),
            Milestone::Ifr => self.ifr.as_deref(),
            Milestone::Ifa => self.ifa.as_deref(),
            Milestone::Ifc => self.ifc.as_deref(),
            Milestone::Iff => self.iff.as_deref(),
        }
    }

    pub fn set(&mut self, milestone: Milestone, value: Option<String>) {
        let slot = match milestone {
            Milestone::Ifi => &mut self.ifi,
            Milestone::Ifr => &mut self.ifr,
            Milestone::Ifa => &mut self.ifa,
            Milestone::Ifc => &mut self.ifc,
            Milestone::Iff => &mut self.iff,
        };
        *slot = value;
    }

    /// True if at least one milestone carries a date
    pub fn any(&self) -> bool {
        Milestone::ALL.iter().any(|m| self.get(*m).is_some())
    }
}

/// Canonical Master Document Index entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Source path or a generated `doc-<ulid>`; not stable across imports
    pub id: String,
    /// Sequence number from the sheet (ordering hint only)
    pub stt: i64,
    pub document_no: String,
    pub title: String,
    pub revision: String,

    pub discipline: String,
    pub scope: String,
    pub doc_class: String,
    pub table: String,
    pub item: String,

    /// Free-text status label ("Not yet issued", "Waiting cmt", "Approved", ...)
    pub status: String,
    pub ipi_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_code: Option<String>,

    pub plan_dates: MilestoneDates,
    pub actual_dates: MilestoneDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mitigation_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_received: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trn_out_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trn_out_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trn_in_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trn_in_no: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic_ptsc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pic_lsp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharepoint_path: Option<String>,

    /// Frozen at normalization time against that day's date
    #[serde(default)]
    pub is_overdue: bool,
    /// `is_overdue` or a "waiting" status, frozen at normalization time
    #[serde(default)]
    pub is_critical: bool,
}

/// Bucket used for documents without a PTSC person-in-charge
pub const UNKNOWN_PIC: &str = "Unknown";

impl Document {
    /// True if the status label contains "waiting" (any case)
    pub fn is_waiting(&self) -> bool {
        status_is_waiting(&self.status)
    }

    /// PTSC person-in-charge, or the "Unknown" bucket
    pub fn pic_bucket(&self) -> &str {
        self.pic_ptsc.as_deref().unwrap_or(UNKNOWN_PIC)
    }

    /// True if `milestone` has a plan date before `today` and no actual date.
    /// Unparseable plan dates never count as overdue.
    pub fn milestone_overdue(&self, milestone: Milestone, today: NaiveDate) -> bool {
        if self.actual_dates.get(milestone).is_some() {
            return false;
        }
        self.plan_dates
            .get(milestone)
            .and_then(parse_date)
            .is_some_and(|plan| plan < today)
    }

    /// A copy of this document with `is_overdue`/`is_critical` recomputed
    /// against `today`
    pub fn reflagged(&self, today: NaiveDate) -> Document {
        let is_overdue = compute_overdue(&self.plan_dates, &self.actual_dates, today);
        Document {
            is_overdue,
            is_critical: is_overdue || self.is_waiting(),
            ..self.clone()
        }
    }
}

/// Case-insensitive "waiting" substring test on a status label
pub fn status_is_waiting(status: &str) -> bool {
    status.to_lowercase().contains("waiting")
}

/// Stored overdue rule: any of IFI/IFR/IFA planned before `today` with no
/// actual date. Stops at the first overdue milestone.
pub fn compute_overdue(plan: &MilestoneDates, actual: &MilestoneDates, today: NaiveDate) -> bool {
    Milestone::OVERDUE_CHECKED.iter().any(|m| {
        actual.get(*m).is_none()
            && plan
                .get(*m)
                .and_then(parse_date)
                .is_some_and(|date| date < today)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_milestone_roundtrip_str() {
        for m in Milestone::ALL {
            assert_eq!(m.as_str().parse::<Milestone>().unwrap(), m);
        }
        assert_eq!("IFF/ASB".parse::<Milestone>().unwrap(), Milestone::Iff);
        assert!("ifx".parse::<Milestone>().is_err());
    }

    #[test]
    fn test_milestone_dates_get_set() {
        let mut dates = MilestoneDates::default();
        assert!(!dates.any());
        dates.set(Milestone::Ifc, Some("2025-01-01".to_string()));
        assert_eq!(dates.get(Milestone::Ifc), Some("2025-01-01"));
        assert!(dates.any());
    }

    #[test]
    fn test_compute_overdue_ignores_ifc_and_iff() {
        let plan = MilestoneDates {
            ifc: Some("2020-01-01".to_string()),
            iff: Some("2020-01-01".to_string()),
            ..Default::default()
        };
        assert!(!compute_overdue(&plan, &MilestoneDates::default(), day("2025-11-01")));
    }

    #[test]
    fn test_compute_overdue_checks_ifa() {
        let plan = MilestoneDates {
            ifa: Some("2025-10-01".to_string()),
            ..Default::default()
        };
        assert!(compute_overdue(&plan, &MilestoneDates::default(), day("2025-11-01")));
    }

    #[test]
    fn test_plan_date_today_is_not_overdue() {
        let plan = MilestoneDates {
            ifi: Some("2025-11-01".to_string()),
            ..Default::default()
        };
        assert!(!compute_overdue(&plan, &MilestoneDates::default(), day("2025-11-01")));
    }

    #[test]
    fn test_reflagged_recomputes_against_new_day() {
        let doc = Document {
            status: "Not yet issued".to_string(),
            plan_dates: MilestoneDates {
                ifr: Some("2025-12-01".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!doc.reflagged(day("2025-11-01")).is_overdue);
        let later = doc.reflagged(day("2025-12-02"));
        assert!(later.is_overdue);
        assert!(later.is_critical);
    }

    #[test]
    fn test_waiting_status_is_critical_after_reflag() {
        let doc = Document {
            status: "Waiting cmt".to_string(),
            ..Default::default()
        };
        let flagged = doc.reflagged(day("2025-11-01"));
        assert!(!flagged.is_overdue);
        assert!(flagged.is_critical);
    }

    #[test]
    fn test_pic_bucket() {
        let mut doc = Document::default();
        assert_eq!(doc.pic_bucket(), UNKNOWN_PIC);
        doc.pic_ptsc = Some("Hung".to_string());
        assert_eq!(doc.pic_bucket(), "Hung");
    }
}
