//! Opening the database a rollback runs against.

use crate::error::{RollbackError, RollbackResult};
use pmig_core::DatabaseConfig;
use pmig_ledger::MigrationDb;

/// Open the configured database, failing fast when none is usable.
///
/// A missing or blank path, or one DuckDB cannot open, is a
/// [`RollbackError::Configuration`]; no transaction has been started at that
/// point.
pub fn open_database(config: &DatabaseConfig) -> RollbackResult<MigrationDb> {
    let Some(location) = config.usable_path() else {
        return Err(RollbackError::Configuration(
            "no database path configured".to_string(),
        ));
    };
    MigrationDb::open_location(location).map_err(|e| RollbackError::Configuration(e.to_string()))
}
