//! List applied plugin migrations.

use crate::cli::{GlobalArgs, LsArgs, LsOutput};
use crate::commands::common::print_table;
use crate::context::RuntimeContext;
use anyhow::{Context, Result};
use pmig_core::AppliedRecord;

/// Execute the ls command.
pub(crate) fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global)?;

    let records: Vec<AppliedRecord> = ctx
        .db
        .list_all(&ctx.config.exclude_prefixes)
        .context("Failed to list applied migrations")?
        .into_iter()
        .filter(|r| args.plugin.as_deref().map_or(true, |p| r.plugin == p))
        .collect();

    match args.output {
        LsOutput::Json => {
            let json =
                serde_json::to_string_pretty(&records).context("Failed to serialize records")?;
            println!("{json}");
        }
        LsOutput::Table => {
            if records.is_empty() {
                println!("No applied plugin migrations.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.plugin.to_string(),
                        r.version.to_string(),
                        r.name.clone(),
                        r.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "PLUGIN", "NUMBER", "NAME", "APPLIED AT"], &rows);
            println!("\n({} migrations)", records.len());
        }
    }
    Ok(())
}
