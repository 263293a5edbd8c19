//! Database schema initialization

use miette::{IntoDiagnostic, Result};
use rusqlite::params;

use super::{DocumentStore, SCHEMA_VERSION};

impl DocumentStore {
    /// Initialize database schema
    pub(super) fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- One row per document, milestone dates flattened
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                stt INTEGER,
                documentNo TEXT NOT NULL,
                title TEXT,
                revision TEXT,
                discipline TEXT,
                scope TEXT,
                docClass TEXT,
                table_name TEXT,
                item TEXT,
                status TEXT,
                ipiStatus TEXT,
                reviewCode TEXT,

                ifi_plan_date TEXT,
                ifr_plan_date TEXT,
                ifa_plan_date TEXT,
                ifc_plan_date TEXT,
                iff_plan_date TEXT,

                ifi_actual_date TEXT,
                ifr_actual_date TEXT,
                ifa_actual_date TEXT,
                ifc_actual_date TEXT,
                iff_actual_date TEXT,

                targetMitigationDate TEXT,
                transNo TEXT,
                dateReceived TEXT,
                trnOutDate TEXT,
                trnOutNo TEXT,
                trnInDate TEXT,
                trnInNo TEXT,
                picPtsc TEXT,
                picLsp TEXT,
                localPath TEXT,
                sharepointPath TEXT,
                isOverdue INTEGER DEFAULT 0,
                isCritical INTEGER DEFAULT 0,

                import_date TEXT DEFAULT (datetime('now')),
                updated_at TEXT DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_documentNo ON documents(documentNo);
            CREATE INDEX IF NOT EXISTS idx_discipline ON documents(discipline);
            CREATE INDEX IF NOT EXISTS idx_status ON documents(status);
            CREATE INDEX IF NOT EXISTS idx_isOverdue ON documents(isOverdue);

            -- Import bookkeeping (source, sha256, imported_at)
            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
            )
            .into_diagnostic()?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .into_diagnostic()?;

        Ok(())
    }

    /// Drop all tables and reinitialize schema
    pub(super) fn reinitialize_schema(&self) -> Result<()> {
        log::warn!("database schema changed, rebuilding (previous import is discarded)");

        self.conn
            .execute_batch(
                r#"
                DROP TABLE IF EXISTS schema_version;
                DROP TABLE IF EXISTS documents;
                DROP TABLE IF EXISTS store_meta;
                "#,
            )
            .into_diagnostic()?;

        self.init_schema()
    }
}
