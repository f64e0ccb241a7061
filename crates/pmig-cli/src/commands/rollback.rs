//! Roll back an applied migration and everything applied after it.

use crate::cli::{GlobalArgs, RollbackArgs};
use crate::commands::common::{error_chain, plan_preview, ExitCode};
use crate::context::RuntimeContext;
use anyhow::Result;
use pmig_rollback::{execute as execute_plan, resolve_record, RollbackError};

/// Exit code when a plan was shown but not confirmed.
const EXIT_UNCONFIRMED: u8 = 2;

/// Execute the rollback command.
///
/// This command is the single place a rollback failure is reported: it is
/// logged once and summarized for the operator.
pub(crate) fn execute(args: &RollbackArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let (record, plan) = resolve_record(&ctx.catalog, &ctx.db, args.id)?;

    if !args.yes {
        print!("{}", plan_preview(&plan));
        if !plan.is_empty() {
            println!("Re-run with --yes to roll back {record}.");
            return Err(ExitCode(EXIT_UNCONFIRMED).into());
        }
        return Ok(());
    }

    match execute_plan(&plan, &ctx.db) {
        Ok(report) if report.is_empty() => {
            println!("Nothing to roll back.");
            Ok(())
        }
        Ok(report) => {
            for label in &report.rolled_back {
                println!("  rolled back {label}");
            }
            println!("All rollbacks successful.");
            Ok(())
        }
        Err(failure) => {
            log::error!("{}", error_chain(&failure));
            let failed = plan
                .steps()
                .get(failure.completed)
                .map(|m| m.label())
                .unwrap_or_else(|| "a migration".to_string());
            println!("{}", failure_message(&failure.error, &failed));
            if failure.completed > 0 {
                println!(
                    "The {} migrations processed before it remain rolled back.",
                    failure.completed
                );
            }
            Err(ExitCode(1).into())
        }
    }
}

/// Operator message for the migration a rollback stopped at.
///
/// Ledger failures happen after the reverse action committed, so that
/// migration is already undone in the database but still recorded as applied.
fn failure_message(error: &RollbackError, failed: &str) -> String {
    match error {
        RollbackError::LedgerInconsistency { .. } | RollbackError::Ledger(_) => format!(
            "{failed} was rolled back, but its ledger record could not be removed. \
             The ledger no longer matches the database and needs manual attention."
        ),
        _ => format!("There was an error rolling back {failed}. It has not been rolled back."),
    }
}
