//! Applied-migration ledger for pmig.
//!
//! Provides [`MigrationDb`], a DuckDB-backed handle that hosts both the
//! plugin-owned schema objects and the `pmig_ledger.plugin_migrations`
//! table recording which plugin migrations are currently applied. The
//! [`Ledger`] trait is the seam the rollback engine consumes.

pub mod connection;
pub mod ddl;
pub mod error;
pub mod ledger;
pub mod migration;

pub use connection::MigrationDb;
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
