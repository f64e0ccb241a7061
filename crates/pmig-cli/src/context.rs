//! Runtime context for CLI commands

use anyhow::{Context, Result};
use pmig_core::{Config, DatabaseConfig};
use pmig_ledger::MigrationDb;
use pmig_rollback::{load_configured_plugins, open_database, CatalogRegistry};
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded project configuration, database handle, and migration catalog
pub(crate) struct RuntimeContext {
    pub config: Config,
    pub db: MigrationDb,
    pub catalog: CatalogRegistry,
}

impl RuntimeContext {
    /// Load config, open the database, and register plugin migrations.
    ///
    /// The database is opened before anything else touches it, so a missing
    /// database setting fails here.
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        let db = open_database(&database_config(&config, &root, args.database.as_deref()))?;

        let catalog = load_configured_plugins(&config, &root)
            .context("Failed to register plugin migrations")?;
        log::debug!(
            "Registered {} migrations across {} plugins",
            catalog.len(),
            catalog.plugins().count()
        );

        Ok(Self {
            config,
            db,
            catalog,
        })
    }
}

/// Apply the `--database` override and resolve relative paths against the
/// project root.
fn database_config(config: &Config, root: &Path, override_path: Option<&str>) -> DatabaseConfig {
    let path = override_path
        .map(str::to_string)
        .or_else(|| config.database.path.clone())
        .map(|p| {
            let trimmed = p.trim();
            if trimmed.is_empty() || trimmed == ":memory:" || Path::new(trimmed).is_absolute() {
                p
            } else {
                root.join(trimmed).display().to_string()
            }
        });
    DatabaseConfig { path }
}
