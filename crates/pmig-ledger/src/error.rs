//! Error types for the ledger.

use thiserror::Error;

/// Ledger and database-handle errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or create the database (L001).
    #[error("[L001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Ledger schema migration failed (L002).
    #[error("[L002] Ledger schema migration failed: {0}")]
    MigrationError(String),

    /// SQL execution error against the ledger table (L003).
    #[error("[L003] Ledger query failed: {0}")]
    QueryError(String),

    /// Transaction management error (L004).
    #[error("[L004] Transaction failed: {0}")]
    TransactionError(String),

    /// A record for this plugin version already exists (L005).
    #[error("[L005] {plugin} #{version} is already recorded as applied")]
    AlreadyApplied { plugin: String, version: i32 },

    /// More than one record matched an exact lookup (L006).
    #[error("[L006] {count} ledger records match {plugin} #{version}: {name}")]
    DuplicateRecord {
        plugin: String,
        version: i32,
        name: String,
        count: usize,
    },

    /// A delete did not remove exactly one row (L007).
    #[error("[L007] Ledger record {id} was not found for deletion")]
    RecordNotFound { id: i64 },

    /// DuckDB driver error with preserved source chain (L008).
    #[error("[L008] DuckDB error")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<duckdb::Error> for LedgerError {
    fn from(err: duckdb::Error) -> Self {
        LedgerError::DuckDb(err)
    }
}

/// Attach a short operation label to driver errors as a [`LedgerError::QueryError`].
pub(crate) trait LedgerResultExt<T> {
    fn query_context(self, what: &str) -> LedgerResult<T>;
}

impl<T> LedgerResultExt<T> for Result<T, duckdb::Error> {
    fn query_context(self, what: &str) -> LedgerResult<T> {
        self.map_err(|e| LedgerError::QueryError(format!("{what}: {e}")))
    }
}
