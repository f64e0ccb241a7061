//! Error types for the rollback engine

use pmig_ledger::LedgerError;
use thiserror::Error;

/// Failure raised by a migration's reverse action or its transaction.
#[derive(Error, Debug)]
pub enum ActionError {
    /// SQL issued by the reverse action failed
    #[error("SQL failed: {0}")]
    Sql(#[from] duckdb::Error),

    /// The reverse action reported a failure of its own
    #[error("{0}")]
    Failed(String),

    /// BEGIN or COMMIT for the migration's transaction failed
    #[error(transparent)]
    Transaction(#[from] LedgerError),
}

/// Rollback engine errors
#[derive(Error, Debug)]
pub enum RollbackError {
    /// R001: No usable database connection
    #[error("[R001] No usable database connection: {0}")]
    Configuration(String),

    /// R002: The requested ledger id has no applied record
    #[error("[R002] No applied migration with id {id}")]
    NotFound { id: i64 },

    /// R003: Ledger lookup after a committed rollback did not find exactly one record
    #[error("[R003] Ledger is inconsistent for {migration}: expected exactly one applied record, found {found}")]
    LedgerInconsistency { migration: String, found: usize },

    /// R004: Reverse action failed or its transaction did not commit
    #[error("[R004] Could not roll back {migration}")]
    RollbackAction {
        migration: String,
        #[source]
        source: ActionError,
    },

    /// R005: Ledger collaborator error
    #[error("[R005] Ledger access failed")]
    Ledger(#[from] LedgerError),

    /// R006: Cancellation observed between migrations
    #[error("[R006] Rollback cancelled before {next}")]
    Cancelled { next: String },
}

impl RollbackError {
    /// Label of the migration this error is about, if any.
    pub fn migration(&self) -> Option<&str> {
        match self {
            RollbackError::LedgerInconsistency { migration, .. }
            | RollbackError::RollbackAction { migration, .. } => Some(migration),
            RollbackError::Cancelled { next } => Some(next),
            _ => None,
        }
    }
}

/// Result type alias for RollbackError
pub type RollbackResult<T> = Result<T, RollbackError>;

/// An execution that stopped before finishing its plan.
///
/// The first `completed` migrations of the plan are fully rolled back and
/// removed from the ledger; the rest are untouched.
#[derive(Error, Debug)]
#[error("rollback stopped after {completed} of {total} migrations")]
pub struct PartialFailure {
    pub completed: usize,
    pub total: usize,
    #[source]
    pub error: RollbackError,
}

/// Errors building a migration catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// C001: Two definitions share a plugin and version
    #[error("[C001] Duplicate migration {plugin} #{version}")]
    DuplicateMigration { plugin: String, version: i32 },

    /// C002: A reverse-migration file name could not be parsed
    #[error("[C002] Invalid migration file '{path}': {reason}")]
    InvalidFile { path: String, reason: String },

    /// C003: IO error with file path context
    #[error("[C003] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}
