//! Transactional rollback executor.
//!
//! Each migration in a plan is rolled back in its own transaction, in plan
//! order. The ledger record is removed only after that transaction commits,
//! so the ledger never disagrees with what actually committed. Execution
//! stops at the first failure; migrations already rolled back stay rolled
//! back.

use crate::catalog::MigrationDefinition;
use crate::error::{PartialFailure, RollbackError, RollbackResult};
use crate::plan::RollbackPlan;
use pmig_ledger::{Ledger, LedgerError, MigrationDb};
use std::sync::atomic::{AtomicBool, Ordering};

/// Migrations rolled back by a fully successful execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Labels of the rolled-back migrations, in execution order.
    pub rolled_back: Vec<String>,
}

impl RollbackReport {
    pub fn len(&self) -> usize {
        self.rolled_back.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolled_back.is_empty()
    }
}

/// Drives a [`RollbackPlan`] against a database.
///
/// By default the ledger is the `pmig_ledger` table in the same database.
pub struct Executor<'a> {
    db: &'a MigrationDb,
    ledger: &'a dyn Ledger,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a MigrationDb) -> Self {
        Self {
            db,
            ledger: db,
            cancel: None,
        }
    }

    /// Keep bookkeeping in a different ledger than `db`.
    pub fn with_ledger(mut self, ledger: &'a dyn Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Stop before the next migration once `flag` is set.
    ///
    /// The flag is only read between migrations; a migration that has started
    /// always finishes or rolls back first.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Roll back every migration in `plan`, newest first.
    ///
    /// On failure, [`PartialFailure::completed`] counts the migrations that
    /// were fully rolled back (reverse committed and ledger record removed)
    /// before the failing one.
    pub fn execute(&self, plan: &RollbackPlan) -> Result<RollbackReport, PartialFailure> {
        let total = plan.len();
        let mut report = RollbackReport::default();

        for migration in plan {
            if self.cancelled() {
                return Err(PartialFailure {
                    completed: report.len(),
                    total,
                    error: RollbackError::Cancelled {
                        next: migration.label(),
                    },
                });
            }

            if let Err(error) = self.roll_back_one(migration) {
                return Err(PartialFailure {
                    completed: report.len(),
                    total,
                    error,
                });
            }
            report.rolled_back.push(migration.label());
        }

        Ok(report)
    }

    /// Reverse one migration, commit, then remove its ledger record.
    fn roll_back_one(&self, migration: &MigrationDefinition) -> RollbackResult<()> {
        log::debug!("Rolling back {migration}");

        self.db
            .transaction(|conn| migration.reverse(conn))
            .map_err(|source| RollbackError::RollbackAction {
                migration: migration.label(),
                source,
            })?;

        let inconsistent = |found| RollbackError::LedgerInconsistency {
            migration: migration.label(),
            found,
        };
        let record = match self
            .ledger
            .find_one(migration.plugin(), migration.version(), migration.name())
        {
            Ok(Some(record)) => record,
            Ok(None) => return Err(inconsistent(0)),
            Err(LedgerError::DuplicateRecord { count, .. }) => return Err(inconsistent(count)),
            Err(e) => return Err(e.into()),
        };
        match self.ledger.delete(&record) {
            Ok(()) => {}
            Err(LedgerError::RecordNotFound { .. }) => return Err(inconsistent(0)),
            Err(e) => return Err(e.into()),
        }

        log::info!("Rolled back {migration}");
        Ok(())
    }
}

/// Roll back `plan` against `db`, keeping bookkeeping in `db`'s ledger.
pub fn execute(plan: &RollbackPlan, db: &MigrationDb) -> Result<RollbackReport, PartialFailure> {
    Executor::new(db).execute(plan)
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
