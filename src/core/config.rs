//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Project;

pub const DEFAULT_DATABASE: &str = ".mdi/mdi.db";
pub const DEFAULT_SHEET: &str = "MDI_DetailStatus";
pub const DEFAULT_EXPORT_PREFIX: &str = "MDI_Export";

/// MDI configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file, relative to the project root unless absolute
    pub database: Option<PathBuf>,

    /// Sheet to import from workbook dumps (substring match)
    pub sheet_name: Option<String>,

    /// File name prefix for exports
    pub export_prefix: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Re-derive overdue/critical flags against today on read
    pub recompute_flags: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/mdi/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.mdi/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.mdi_dir().join("config.yaml")) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        if let Ok(database) = std::env::var("MDI_DATABASE") {
            config.database = Some(PathBuf::from(database));
        }
        if let Ok(sheet) = std::env::var("MDI_SHEET") {
            config.sheet_name = Some(sheet);
        }
        if let Ok(prefix) = std::env::var("MDI_EXPORT_PREFIX") {
            config.export_prefix = Some(prefix);
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match Self::parse(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Parse one config document; a file with every key commented out is
    /// the default config
    fn parse(contents: &str) -> Result<Config, serde_yml::Error> {
        let has_content = contents.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#') && line != "---"
        });
        if !has_content {
            return Ok(Config::default());
        }
        serde_yml::from_str(contents)
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdi")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.sheet_name.is_some() {
            self.sheet_name = other.sheet_name;
        }
        if other.export_prefix.is_some() {
            self.export_prefix = other.export_prefix;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.recompute_flags.is_some() {
            self.recompute_flags = other.recompute_flags;
        }
    }

    /// Database path, resolved against the project root
    pub fn database_path(&self, project: &Project) -> PathBuf {
        let configured = self
            .database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
        project.resolve(&configured)
    }

    pub fn sheet_name(&self) -> &str {
        self.sheet_name.as_deref().unwrap_or(DEFAULT_SHEET)
    }

    pub fn export_prefix(&self) -> &str {
        self.export_prefix.as_deref().unwrap_or(DEFAULT_EXPORT_PREFIX)
    }

    pub fn recompute_flags(&self) -> bool {
        self.recompute_flags.unwrap_or(false)
    }
}
