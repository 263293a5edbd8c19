//! CLI command implementations

pub mod completions;
pub mod db;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod report;
pub mod show;
pub mod status;
