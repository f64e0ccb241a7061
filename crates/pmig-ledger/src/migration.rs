//! Schema runner for the ledger's own tables.
//!
//! Tracks applied ledger schema versions in `pmig_ledger.schema_version` and
//! runs any unapplied versions on each open. Plugin migrations are never
//! applied here.

use crate::ddl::MIGRATIONS;
use crate::error::{LedgerError, LedgerResult};
use duckdb::Connection;

/// Ensure the `pmig_ledger` schema and `schema_version` table exist.
fn ensure_version_table(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        "CREATE SCHEMA IF NOT EXISTS pmig_ledger;
         CREATE TABLE IF NOT EXISTS pmig_ledger.schema_version (
             version    INTEGER NOT NULL,
             applied_at TIMESTAMP NOT NULL DEFAULT now()
         );",
    )
    .map_err(|e| {
        LedgerError::MigrationError(format!("failed to create schema_version table: {e}"))
    })?;
    Ok(())
}

/// Return the highest applied ledger schema version, or 0 if none.
pub(crate) fn current_version(conn: &Connection) -> LedgerResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM pmig_ledger.schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| LedgerError::MigrationError(format!("failed to read schema version: {e}")))
}

/// Bring the ledger schema up to date.
///
/// Each version's DDL and its `schema_version` row are committed together so
/// a failed upgrade leaves the previous version intact.
pub fn run_migrations(conn: &Connection) -> LedgerResult<()> {
    ensure_version_table(conn)?;
    let current = current_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        log::debug!("Applying ledger schema v{:03}", migration.version);

        let sql = format!(
            "BEGIN TRANSACTION;\n{}\nINSERT INTO pmig_ledger.schema_version (version) VALUES ({});\nCOMMIT;",
            migration.sql, migration.version
        );
        if let Err(e) = conn.execute_batch(&sql) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(LedgerError::MigrationError(format!(
                "ledger schema v{:03} failed: {e}",
                migration.version
            )));
        }
    }
    Ok(())
}
