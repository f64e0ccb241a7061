//! The applied-migration ledger.
//!
//! [`Ledger`] is the record-store interface the rollback engine consumes.
//! [`MigrationDb`] implements it over `pmig_ledger.plugin_migrations`.

use crate::connection::MigrationDb;
use crate::error::{LedgerError, LedgerResult, LedgerResultExt};
use chrono::{DateTime, Utc};
use pmig_core::{AppliedRecord, PluginName};

/// Record store of currently-applied plugin migrations.
pub trait Ledger {
    /// All applied records for `plugin`, ascending by version.
    fn list_applied(&self, plugin: &PluginName) -> LedgerResult<Vec<AppliedRecord>>;

    /// The single record matching the exact (plugin, version, name) triple.
    ///
    /// Returns `Ok(None)` when nothing matches and
    /// [`LedgerError::DuplicateRecord`] when more than one record does.
    fn find_one(
        &self,
        plugin: &PluginName,
        version: i32,
        name: &str,
    ) -> LedgerResult<Option<AppliedRecord>>;

    /// Look up a record by its ledger id.
    fn get(&self, id: i64) -> LedgerResult<Option<AppliedRecord>>;

    /// Remove exactly this record.
    ///
    /// Callers must only invoke this after the migration's reverse action
    /// has committed.
    fn delete(&self, record: &AppliedRecord) -> LedgerResult<()>;
}

const SELECT_RECORDS: &str = "SELECT id, plugin_name, migration_number, migration_name, epoch_ms(applied_at)
     FROM pmig_ledger.plugin_migrations";

/// Raw column values before validation into an [`AppliedRecord`].
type RecordRow = (i64, String, i32, String, i64);

fn read_row(row: &duckdb::Row<'_>) -> duckdb::Result<RecordRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn into_record((id, plugin, version, name, applied_ms): RecordRow) -> LedgerResult<AppliedRecord> {
    let plugin = PluginName::try_new(plugin).ok_or_else(|| {
        LedgerError::QueryError(format!("ledger record {id} has an empty plugin name"))
    })?;
    let applied_at = DateTime::<Utc>::from_timestamp_millis(applied_ms).ok_or_else(|| {
        LedgerError::QueryError(format!("ledger record {id} has an invalid timestamp"))
    })?;
    Ok(AppliedRecord {
        id,
        plugin,
        version,
        name,
        applied_at,
    })
}

impl MigrationDb {
    fn query_records<P: duckdb::Params>(
        &self,
        sql: &str,
        params: P,
        what: &str,
    ) -> LedgerResult<Vec<AppliedRecord>> {
        let mut stmt = self.conn().prepare(sql).query_context(what)?;
        let rows: Vec<RecordRow> = stmt
            .query_map(params, read_row)
            .query_context(what)?
            .collect::<Result<Vec<_>, _>>()
            .query_context(what)?;
        rows.into_iter().map(into_record).collect()
    }

    /// Record a migration as applied and return its ledger id.
    ///
    /// Forward migration is outside pmig; this exists for the host that
    /// applies migrations and for seeding. A second record for the same
    /// plugin version is rejected.
    pub fn record_applied(&self, plugin: &PluginName, version: i32, name: &str) -> LedgerResult<i64> {
        let existing: i64 = self
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM pmig_ledger.plugin_migrations
                 WHERE plugin_name = ? AND migration_number = ?",
                duckdb::params![plugin.as_str(), version],
                |row| row.get(0),
            )
            .query_context("count existing record")?;
        if existing > 0 {
            return Err(LedgerError::AlreadyApplied {
                plugin: plugin.to_string(),
                version,
            });
        }

        self.conn()
            .query_row(
                "INSERT INTO pmig_ledger.plugin_migrations (plugin_name, migration_number, migration_name)
                 VALUES (?, ?, ?) RETURNING id",
                duckdb::params![plugin.as_str(), version, name],
                |row| row.get(0),
            )
            .query_context("insert plugin_migrations")
    }

    /// Every applied record whose plugin is not hidden by `exclude_prefixes`,
    /// ordered by plugin ascending then version descending.
    pub fn list_all(&self, exclude_prefixes: &[String]) -> LedgerResult<Vec<AppliedRecord>> {
        let sql = format!("{SELECT_RECORDS} ORDER BY plugin_name, migration_number DESC");
        let records = self.query_records(&sql, [], "list plugin_migrations")?;
        Ok(records
            .into_iter()
            .filter(|r| !r.plugin.has_any_prefix(exclude_prefixes))
            .collect())
    }
}

impl Ledger for MigrationDb {
    fn list_applied(&self, plugin: &PluginName) -> LedgerResult<Vec<AppliedRecord>> {
        let sql = format!("{SELECT_RECORDS} WHERE plugin_name = ? ORDER BY migration_number");
        self.query_records(&sql, duckdb::params![plugin.as_str()], "list applied")
    }

    fn find_one(
        &self,
        plugin: &PluginName,
        version: i32,
        name: &str,
    ) -> LedgerResult<Option<AppliedRecord>> {
        let sql = format!(
            "{SELECT_RECORDS} WHERE plugin_name = ? AND migration_number = ? AND migration_name = ?"
        );
        let mut matches = self.query_records(
            &sql,
            duckdb::params![plugin.as_str(), version, name],
            "find applied record",
        )?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            count => Err(LedgerError::DuplicateRecord {
                plugin: plugin.to_string(),
                version,
                name: name.to_string(),
                count,
            }),
        }
    }

    fn get(&self, id: i64) -> LedgerResult<Option<AppliedRecord>> {
        let sql = format!("{SELECT_RECORDS} WHERE id = ?");
        let mut records = self.query_records(&sql, duckdb::params![id], "get applied record")?;
        Ok(records.pop())
    }

    fn delete(&self, record: &AppliedRecord) -> LedgerResult<()> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM pmig_ledger.plugin_migrations WHERE id = ?",
                duckdb::params![record.id],
            )
            .query_context("delete plugin_migrations")?;
        if removed != 1 {
            return Err(LedgerError::RecordNotFound { id: record.id });
        }
        log::debug!("Removed ledger record {} ({record})", record.id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
