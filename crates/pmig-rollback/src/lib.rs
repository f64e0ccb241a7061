//! pmig-rollback - Rollback engine for plugin migrations
//!
//! Given a catalog of plugin migrations and the applied-migration ledger,
//! [`resolve`] computes which applied migrations must be undone to roll a
//! plugin back to a given version, and [`execute`] undoes them newest-first,
//! one transaction per migration, removing each ledger record only after its
//! reverse action commits.

pub mod catalog;
pub mod database;
pub mod error;
pub mod executor;
pub mod plan;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use catalog::{
    load_configured_plugins, ActionResult, CatalogRegistry, MigrationCatalog, MigrationDefinition,
};
pub use database::open_database;
pub use error::{ActionError, CatalogError, PartialFailure, RollbackError, RollbackResult};
pub use executor::{execute, Executor, RollbackReport};
pub use plan::{summarize, RollbackPlan, RollbackRequest};
pub use resolver::{resolve, resolve_record};
