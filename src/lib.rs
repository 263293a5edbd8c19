//! MDI: Master Document Index tracker
//!
//! Imports an engineering-document submission spreadsheet, derives overdue
//! and pending status per document, and reports on it from the command line.

pub mod cli;
pub mod core;
