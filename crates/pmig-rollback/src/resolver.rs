//! Rollback set resolution.
//!
//! Resolution is a read-only query over the catalog and the ledger: it never
//! mutates either and returns the same plan when called repeatedly against
//! unchanged state.

use crate::catalog::MigrationCatalog;
use crate::error::{RollbackError, RollbackResult};
use crate::plan::{RollbackPlan, RollbackRequest};
use pmig_core::AppliedRecord;
use pmig_ledger::Ledger;
use std::collections::HashSet;

/// Compute the applied migrations that must be undone for `request`.
///
/// Selects the plugin's definitions at or after `since_version` that have an
/// applied ledger record, ordered newest first. Definitions that are not
/// applied are skipped; an empty plan is not an error. Ledger errors are
/// returned unchanged as [`RollbackError::Ledger`].
pub fn resolve(
    catalog: &dyn MigrationCatalog,
    ledger: &dyn Ledger,
    request: &RollbackRequest,
) -> RollbackResult<RollbackPlan> {
    let applied: HashSet<i32> = ledger
        .list_applied(&request.plugin)?
        .iter()
        .map(|r| r.version)
        .collect();

    let mut steps: Vec<_> = catalog
        .definitions_for(&request.plugin)
        .into_iter()
        .filter(|d| d.version() >= request.since_version && applied.contains(&d.version()))
        .collect();
    steps.sort_by(|a, b| b.version().cmp(&a.version()));

    log::debug!(
        "Resolved {} migrations to roll back for {} since #{}",
        steps.len(),
        request.plugin,
        request.since_version
    );
    Ok(RollbackPlan::new(request.clone(), steps))
}

/// Resolve the rollback of the applied migration stored under ledger `id`.
///
/// Fails with [`RollbackError::NotFound`] before any plan is built when no
/// such record exists.
pub fn resolve_record(
    catalog: &dyn MigrationCatalog,
    ledger: &dyn Ledger,
    id: i64,
) -> RollbackResult<(AppliedRecord, RollbackPlan)> {
    let record = ledger.get(id)?.ok_or(RollbackError::NotFound { id })?;
    let request = RollbackRequest::new(record.plugin.clone(), record.version);
    let plan = resolve(catalog, ledger, &request)?;
    Ok((record, plan))
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
