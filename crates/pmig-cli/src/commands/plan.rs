//! Preview a rollback without executing it.

use crate::cli::{GlobalArgs, PlanArgs};
use crate::commands::common::plan_preview;
use crate::context::RuntimeContext;
use anyhow::Result;
use pmig_rollback::resolve_record;

/// Execute the plan command.
pub(crate) fn execute(args: &PlanArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;
    let (record, plan) = resolve_record(&ctx.catalog, &ctx.db, args.id)?;

    println!("Rolling back {record}");
    print!("{}", plan_preview(&plan));
    Ok(())
}
