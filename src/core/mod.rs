//! Core module - document model, derivation rules and persistence

pub mod config;
pub mod dates;
pub mod document;
pub mod export;
pub mod filter;
pub mod normalize;
pub mod project;
pub mod report;
pub mod source;
pub mod store;

pub use config::Config;
pub use document::{Document, Milestone, MilestoneDates};
pub use filter::{apply_filters, FilterState, FilterUpdate};
pub use normalize::{normalize_row, normalize_rows, RawRow};
pub use project::{Project, ProjectError};
pub use report::{compute_kpis, KpiStats, NamedCount};
pub use source::{read_source, LoadedSource, SourceData, SourceError};
pub use store::{DocumentStore, StoredRow};
