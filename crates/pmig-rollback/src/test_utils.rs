//! Shared test fixtures for pmig-rollback

use crate::catalog::{CatalogRegistry, MigrationDefinition};
use crate::error::ActionError;
use pmig_core::PluginName;
use pmig_ledger::MigrationDb;
use std::sync::{Arc, Mutex};

/// In-memory database with the `Sample` plugin chain applied, plus the
/// catalog that knows how to undo it.
pub struct SampleSite {
    pub db: MigrationDb,
    pub catalog: CatalogRegistry,
    /// Versions whose reverse action ran, in call order (including failures).
    pub calls: Arc<Mutex<Vec<i32>>>,
}

/// Plugin name used by [`sample_site`].
pub fn sample_plugin() -> PluginName {
    PluginName::new("Sample")
}

/// (version, name, forward SQL, reverse SQL) of the `Sample` chain.
///
/// M1 creates `widgets`, M2 adds a `color` column, M3 seeds rows. Each later
/// migration depends on the schema of the earlier ones.
const SAMPLE_CHAIN: &[(i32, &str, &str, &str)] = &[
    (
        1,
        "M1",
        "CREATE TABLE widgets (id INTEGER, label VARCHAR);",
        "DROP TABLE widgets;",
    ),
    (
        2,
        "M2",
        "ALTER TABLE widgets ADD COLUMN color VARCHAR;",
        "ALTER TABLE widgets DROP COLUMN color;",
    ),
    (
        3,
        "M3",
        "INSERT INTO widgets VALUES (1, 'sprocket', 'red'), (2, 'gear', 'blue');",
        "DELETE FROM widgets;",
    ),
];

/// Build the `Sample` site with every migration applied and recorded.
///
/// Reverse actions for versions in `failing` run their SQL and then report a
/// failure, so their transaction must be rolled back by the executor.
pub fn sample_site(failing: &[i32]) -> SampleSite {
    let db = MigrationDb::open_memory().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut catalog = CatalogRegistry::new();

    for &(version, name, forward, reverse) in SAMPLE_CHAIN {
        db.conn().execute_batch(forward).unwrap();
        db.record_applied(&sample_plugin(), version, name).unwrap();

        let fails = failing.contains(&version);
        let calls = Arc::clone(&calls);
        catalog
            .register(MigrationDefinition::new(
                sample_plugin(),
                version,
                name,
                move |conn| {
                    calls.lock().unwrap().push(version);
                    conn.execute_batch(reverse)?;
                    if fails {
                        return Err(ActionError::Failed(format!("simulated failure in M{version}")));
                    }
                    Ok(())
                },
            ))
            .unwrap();
    }

    SampleSite { db, catalog, calls }
}

impl SampleSite {
    /// Applied versions of the `Sample` plugin, ascending.
    pub fn applied_versions(&self) -> Vec<i32> {
        use pmig_ledger::Ledger;
        self.db
            .list_applied(&sample_plugin())
            .unwrap()
            .iter()
            .map(|r| r.version)
            .collect()
    }

    pub fn calls(&self) -> Vec<i32> {
        self.calls.lock().unwrap().clone()
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                duckdb::params![table],
                |row| row.get::<_, i64>(0),
            )
            .unwrap()
            > 0
    }

    pub fn column_exists(&self, table: &str, column: &str) -> bool {
        self.db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM information_schema.columns WHERE table_name = ? AND column_name = ?",
                duckdb::params![table, column],
                |row| row.get::<_, i64>(0),
            )
            .unwrap()
            > 0
    }

    pub fn widget_count(&self) -> i64 {
        self.db
            .conn()
            .query_row("SELECT COUNT(*) FROM widgets", [], |row| row.get(0))
            .unwrap()
    }
}
