//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".mdi";

/// Represents an MDI tracking project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .mdi/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_skeleton(root)
    }

    /// Force initialization even if .mdi/ exists. The database is left alone;
    /// only config.yaml and .gitignore are rewritten.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let mdi_dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&mdi_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(mdi_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // The database is a local cache of the last import
        std::fs::write(mdi_dir.join(".gitignore"), "*.db\n*.db-wal\n*.db-shm\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# MDI Project Configuration

# SQLite database holding the last import (relative to the project root)
# database: .mdi/mdi.db

# Sheet to read from workbook dumps (first sheet whose name contains this)
# sheet_name: MDI_DetailStatus

# File name prefix for `mdi export`
# export_prefix: MDI_Export

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Recompute overdue/critical flags against today when reading the database
# recompute_flags: false
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .mdi configuration directory
    pub fn mdi_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an MDI project (searched from {searched_from:?}). Run 'mdi init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("MDI project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.mdi_dir().is_dir());
        assert!(project.mdi_dir().join("config.yaml").exists());
        assert!(project.mdi_dir().join(".gitignore").exists());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_init_force_keeps_database() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let db = project.mdi_dir().join("mdi.db");
        std::fs::write(&db, b"data").unwrap();

        Project::init_force(tmp.path()).unwrap();
        assert_eq!(std::fs::read(&db).unwrap(), b"data");
    }

    #[test]
    fn test_project_discover_finds_mdi_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("reports/2025/week47");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_mdi_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert_eq!(
            project.resolve(Path::new(".mdi/mdi.db")),
            project.root().join(".mdi/mdi.db")
        );
        let abs = tmp.path().join("elsewhere.db");
        assert_eq!(project.resolve(&abs), abs);
    }
}
