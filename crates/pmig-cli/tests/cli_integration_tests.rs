//! CLI integration tests for `pmig ls`, `pmig plan`, and `pmig rollback`.
//!
//! Each test builds a throwaway project: a `pmig.yml`, a plugin directory of
//! reverse-migration SQL files, and a DuckDB file with the forward
//! migrations applied and recorded.

use pmig_core::PluginName;
use pmig_ledger::{Ledger, MigrationDb};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the compiled pmig binary (resolved at compile time)
fn pmig_bin() -> String {
    env!("CARGO_BIN_EXE_pmig").to_string()
}

const PLUGIN: &str = "com.example.Widgets";

/// Build a project with three applied `Widgets` migrations and one hidden
/// host migration. The reverse of v2 is broken when `break_v2` is set.
fn project(break_v2: bool) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let plugin_dir = root.join("plugins/widgets");
    fs::create_dir_all(&plugin_dir).unwrap();
    fs::write(plugin_dir.join("1_CreateWidgets.down.sql"), "DROP TABLE widgets;").unwrap();
    let v2_down = if break_v2 {
        "ALTER TABLE no_such_table DROP COLUMN color;"
    } else {
        "ALTER TABLE widgets DROP COLUMN color;"
    };
    fs::write(plugin_dir.join("2_AddColor.down.sql"), v2_down).unwrap();
    fs::write(plugin_dir.join("3_SeedWidgets.down.sql"), "DELETE FROM widgets;").unwrap();
    fs::write(
        root.join("pmig.yml"),
        r#"
name: site
database:
  path: site.duckdb
exclude_prefixes:
  - Host
plugins:
  - name: com.example.Widgets
    path: plugins/widgets
"#,
    )
    .unwrap();

    let db = MigrationDb::open(&root.join("site.duckdb")).unwrap();
    db.conn()
        .execute_batch(
            "CREATE TABLE widgets (id INTEGER);
             ALTER TABLE widgets ADD COLUMN color VARCHAR;
             INSERT INTO widgets VALUES (1, 'red');",
        )
        .unwrap();
    let plugin = PluginName::new(PLUGIN);
    db.record_applied(&plugin, 1, "CreateWidgets").unwrap();
    db.record_applied(&plugin, 2, "AddColor").unwrap();
    db.record_applied(&plugin, 3, "SeedWidgets").unwrap();
    db.record_applied(&PluginName::new("Host.Core"), 1, "Bootstrap")
        .unwrap();
    dir
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(pmig_bin())
        .arg("--project-dir")
        .arg(root)
        .args(args)
        .env_remove("PMIG_DATABASE")
        .output()
        .expect("Failed to run pmig")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn ledger_id(root: &Path, version: i32) -> i64 {
    let db = MigrationDb::open(&root.join("site.duckdb")).unwrap();
    db.list_applied(&PluginName::new(PLUGIN))
        .unwrap()
        .into_iter()
        .find(|r| r.version == version)
        .map(|r| r.id)
        .expect("version is applied")
}

fn applied_versions(root: &Path) -> Vec<i32> {
    let db = MigrationDb::open(&root.join("site.duckdb")).unwrap();
    db.list_applied(&PluginName::new(PLUGIN))
        .unwrap()
        .iter()
        .map(|r| r.version)
        .collect()
}

fn widget_count(root: &Path) -> i64 {
    let db = MigrationDb::open(&root.join("site.duckdb")).unwrap();
    db.conn()
        .query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0))
        .unwrap()
}

// ── pmig ls ────────────────────────────────────────────────────────────

#[test]
fn test_ls_hides_excluded_plugins() {
    let dir = project(false);
    let output = run(dir.path(), &["ls"]);
    let out = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.contains("SeedWidgets"));
    assert!(!out.contains("Host.Core"));
    assert!(out.contains("(3 migrations)"));
    // newest first within a plugin
    assert!(out.find("SeedWidgets").unwrap() < out.find("CreateWidgets").unwrap());
}

#[test]
fn test_ls_json() {
    let dir = project(false);
    let output = run(dir.path(), &["ls", "--output", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let records: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let versions: Vec<i64> = records
        .iter()
        .map(|r| r["version"].as_i64().unwrap())
        .collect();
    assert_eq!(versions, vec![3, 2, 1]);
}

// ── pmig plan ──────────────────────────────────────────────────────────

#[test]
fn test_plan_previews_descending() {
    let dir = project(false);
    let id = ledger_id(dir.path(), 2);
    let output = run(dir.path(), &["plan", &id.to_string()]);
    let out = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.contains("This will roll back the following migrations:"));
    assert!(out.contains("  - com.example.Widgets #3: SeedWidgets\n  - com.example.Widgets #2: AddColor\n"));
    assert!(!out.contains("#1: CreateWidgets\n"));
    assert_eq!(applied_versions(dir.path()), vec![1, 2, 3]);
}

#[test]
fn test_plan_unknown_id() {
    let dir = project(false);
    let output = run(dir.path(), &["plan", "999999"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("[R002]"));
}

// ── pmig rollback ──────────────────────────────────────────────────────

#[test]
fn test_rollback_requires_confirmation() {
    let dir = project(false);
    let id = ledger_id(dir.path(), 2);
    let output = run(dir.path(), &["rollback", &id.to_string()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Re-run with --yes"));
    assert_eq!(applied_versions(dir.path()), vec![1, 2, 3]);
}

#[test]
fn test_rollback_success() {
    let dir = project(false);
    let id = ledger_id(dir.path(), 2);
    let output = run(dir.path(), &["rollback", &id.to_string(), "--yes"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("All rollbacks successful."));
    assert_eq!(applied_versions(dir.path()), vec![1]);
}

#[test]
fn test_rollback_partial_failure() {
    let dir = project(true);
    let id = ledger_id(dir.path(), 1);
    let output = run(dir.path(), &["rollback", &id.to_string(), "--yes"]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(out.contains("There was an error rolling back com.example.Widgets #2: AddColor"));
    assert!(out.contains("remain rolled back"));
    assert!(stderr(&output).contains("[R004]"));
    assert_eq!(applied_versions(dir.path()), vec![1, 2]);
}

#[test]
fn test_missing_database_is_configuration_error() {
    let dir = project(false);
    fs::write(dir.path().join("pmig.yml"), "name: site\n").unwrap();
    let output = run(dir.path(), &["ls"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("[R001]"));
}

#[test]
fn test_rollback_ledger_inconsistency_reports_committed_reverse() {
    let dir = project(false);
    let id = ledger_id(dir.path(), 3);
    {
        let db = MigrationDb::open(&dir.path().join("site.duckdb")).unwrap();
        db.conn()
            .execute(
                "UPDATE pmig_ledger.plugin_migrations SET migration_name = 'Renamed' WHERE id = ?",
                [id],
            )
            .unwrap();
    }

    let output = run(dir.path(), &["rollback", &id.to_string(), "--yes"]);
    let out = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(out.contains("com.example.Widgets #3: SeedWidgets was rolled back"));
    assert!(out.contains("needs manual attention"));
    assert!(!out.contains("It has not been rolled back"));
    assert!(stderr(&output).contains("[R003]"));

    // the reverse action committed even though the ledger row stayed
    assert_eq!(widget_count(dir.path()), 0);
    assert_eq!(applied_versions(dir.path()), vec![1, 2, 3]);
}
