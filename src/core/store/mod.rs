//! SQLite-backed document store
//!
//! The store is a pass-through cache of the last import:
//! - `documents` holds one flattened row per document id
//! - imports replace the whole table inside one transaction, so readers
//!   see either the old corpus or the new one
//! - `store_meta` remembers where the last import came from
//!
//! The schema is rebuilt (not migrated) when `SCHEMA_VERSION` changes.

mod row;
mod schema;

pub use row::StoredRow;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::document::Document;
use crate::core::report::NamedCount;

/// Current schema version - tables are rebuilt on version mismatch
const SCHEMA_VERSION: i32 = 1;

const META_SOURCE: &str = "last_import_source";
const META_SHA256: &str = "last_import_sha256";
const META_IMPORTED_AT: &str = "last_import_at";

/// Where the current corpus came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub source: String,
    pub sha256: String,
    pub imported_at: String,
}

/// Store statistics
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_documents: usize,
    /// Latest `import_date` among stored rows
    pub last_import: Option<String>,
    pub by_discipline: Vec<NamedCount>,
    pub last_source: Option<ImportRecord>,
    pub db_size_bytes: u64,
}

/// The document store backed by SQLite
pub struct DocumentStore {
    conn: Connection,
    path: PathBuf,
}

impl DocumentStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).into_diagnostic()?;
            }
        }

        let needs_init = !path.exists();
        let conn = Connection::open(path).into_diagnostic()?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .into_diagnostic()?;

        let store = Self {
            conn,
            path: path.to_path_buf(),
        };

        if needs_init {
            store.init_schema()?;
        } else if store.needs_schema_rebuild()? {
            store.reinitialize_schema()?;
        }

        Ok(store)
    }

    /// In-memory store, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().into_diagnostic()?;
        let store = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn needs_schema_rebuild(&self) -> Result<bool> {
        let current_version: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        Ok(current_version != SCHEMA_VERSION)
    }

    fn insert_sql() -> String {
        let columns = row::COLUMNS.join(", ");
        let placeholders = (1..=row::COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT OR REPLACE INTO documents ({}, updated_at) VALUES ({}, datetime('now'))",
            columns, placeholders
        )
    }

    fn select_sql(tail: &str) -> String {
        format!("SELECT {} FROM documents {}", row::COLUMNS.join(", "), tail)
    }

    fn write_documents(&mut self, documents: &[Document], replace: bool) -> Result<usize> {
        let distinct_ids: HashSet<&str> = documents.iter().map(|doc| doc.id.as_str()).collect();
        if distinct_ids.len() < documents.len() {
            log::warn!(
                "{} rows share an id with an earlier row; the later row is kept",
                documents.len() - distinct_ids.len()
            );
        }

        let tx = self.conn.transaction().into_diagnostic()?;
        if replace {
            tx.execute("DELETE FROM documents", []).into_diagnostic()?;
        }
        {
            let mut stmt = tx.prepare(&Self::insert_sql()).into_diagnostic()?;
            for doc in documents {
                let stored = StoredRow::from(doc);
                stmt.execute(params_from_iter(stored.to_params()))
                    .into_diagnostic()?;
            }
        }
        tx.commit().into_diagnostic()?;
        Ok(distinct_ids.len())
    }

    /// Replace the whole corpus atomically
    pub fn replace_all(&mut self, documents: &[Document]) -> Result<usize> {
        let count = self.write_documents(documents, true)?;
        log::info!("saved {} documents to {}", count, self.path.display());
        Ok(count)
    }

    /// Insert or replace by id, keeping documents not in `documents`
    pub fn upsert(&mut self, documents: &[Document]) -> Result<usize> {
        let count = self.write_documents(documents, false)?;
        log::info!("merged {} documents into {}", count, self.path.display());
        Ok(count)
    }

    /// All documents ordered by sequence number
    pub fn load_all(&self) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare(&Self::select_sql("ORDER BY stt ASC, documentNo ASC"))
            .into_diagnostic()?;
        let rows = stmt
            .query_map([], StoredRow::from_row)
            .into_diagnostic()?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(Document::from(row.into_diagnostic()?));
        }
        Ok(documents)
    }

    /// Look up one document by id, or by document number (case-insensitive)
    pub fn get(&self, id_or_doc_no: &str) -> Result<Option<Document>> {
        let by_id = self
            .conn
            .query_row(
                &Self::select_sql("WHERE id = ?1"),
                params![id_or_doc_no],
                StoredRow::from_row,
            )
            .optional()
            .into_diagnostic()?;
        if let Some(row) = by_id {
            return Ok(Some(row.into()));
        }

        let by_doc_no = self
            .conn
            .query_row(
                &Self::select_sql("WHERE documentNo = ?1 COLLATE NOCASE ORDER BY stt LIMIT 1"),
                params![id_or_doc_no],
                StoredRow::from_row,
            )
            .optional()
            .into_diagnostic()?;
        Ok(by_doc_no.map(Document::from))
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .into_diagnostic()
    }

    /// Remove every document and the import record
    pub fn clear(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM documents", [])
            .into_diagnostic()?;
        self.conn
            .execute("DELETE FROM store_meta", [])
            .into_diagnostic()?;
        log::info!("cleared {} documents from {}", removed, self.path.display());
        Ok(removed)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .into_diagnostic()?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .into_diagnostic()
    }

    /// Remember the source of the current corpus
    pub fn record_import(&self, source: &str, sha256: &str) -> Result<()> {
        self.set_meta(META_SOURCE, source)?;
        self.set_meta(META_SHA256, sha256)?;
        self.set_meta(META_IMPORTED_AT, &chrono::Utc::now().to_rfc3339())?;
        Ok(())
    }

    /// Source of the current corpus, if recorded
    pub fn last_import(&self) -> Result<Option<ImportRecord>> {
        let source = self.get_meta(META_SOURCE)?;
        let sha256 = self.get_meta(META_SHA256)?;
        let imported_at = self.get_meta(META_IMPORTED_AT)?;

        Ok(match (source, sha256, imported_at) {
            (Some(source), Some(sha256), Some(imported_at)) => Some(ImportRecord {
                source,
                sha256,
                imported_at,
            }),
            _ => None,
        })
    }

    /// Totals, last import time and per-discipline counts
    pub fn stats(&self) -> Result<StoreStats> {
        let total_documents = self.count()?;

        let last_import: Option<String> = self
            .conn
            .query_row("SELECT MAX(import_date) FROM documents", [], |row| row.get(0))
            .into_diagnostic()?;

        let mut by_discipline = Vec::new();
        {
            let mut stmt = self
                .conn
                .prepare(
                    "SELECT COALESCE(NULLIF(discipline, ''), 'Other'), COUNT(*) AS cnt \
                     FROM documents GROUP BY 1 ORDER BY cnt DESC, 1 ASC",
                )
                .into_diagnostic()?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(NamedCount {
                        name: row.get(0)?,
                        count: row.get::<_, i64>(1)? as usize,
                    })
                })
                .into_diagnostic()?;

            for row in rows {
                by_discipline.push(row.into_diagnostic()?);
            }
        }

        let db_size_bytes = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            total_documents,
            last_import,
            by_discipline,
            last_source: self.last_import()?,
            db_size_bytes,
        })
    }
}

/// SHA256 of an import source, hex encoded
pub fn fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests;
