//! Register reverse migrations from SQL files on disk.
//!
//! Each configured plugin directory holds one file per migration named
//! `<version>_<name>.down.sql`, e.g. `003_AddWidgetColor.down.sql`. The file
//! body is the SQL batch that undoes the migration.
//!
//! The batch runs inside the transaction pmig opens for that migration, so it
//! must not manage transactions itself. Files containing `BEGIN`, `COMMIT`,
//! `ROLLBACK` or similar statements are rejected when the catalog is loaded.

use super::{CatalogRegistry, MigrationDefinition};
use crate::error::CatalogError;
use pmig_core::{Config, PluginName};
use std::path::Path;

const DOWN_SUFFIX: &str = ".down.sql";

/// Leading keywords of statements that end or start a transaction.
const TRANSACTION_KEYWORDS: &[&str] = &["BEGIN", "START", "COMMIT", "END", "ROLLBACK", "ABORT"];

/// First transaction-control statement keyword in `sql`, if any.
///
/// Statements are split on `;` and `--` comment lines are ignored.
fn transaction_control(sql: &str) -> Option<&'static str> {
    sql.split(';').find_map(|statement| {
        let keyword = statement
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with("--"))?
            .split_whitespace()
            .next()?
            .to_ascii_uppercase();
        TRANSACTION_KEYWORDS
            .iter()
            .find(|k| **k == keyword)
            .copied()
    })
}

/// Split `<version>_<name>.down.sql` into its version and name.
fn parse_file_name(file_name: &str) -> Result<(i32, &str), String> {
    let stem = file_name
        .strip_suffix(DOWN_SUFFIX)
        .ok_or_else(|| format!("expected a '{DOWN_SUFFIX}' suffix"))?;
    let (version, name) = stem
        .split_once('_')
        .ok_or_else(|| "expected '<version>_<name>'".to_string())?;
    let version: i32 = version
        .parse()
        .map_err(|_| format!("'{version}' is not a migration number"))?;
    if name.is_empty() {
        return Err("migration name is empty".to_string());
    }
    Ok((version, name))
}

/// Load every reverse migration in `dir` for `plugin`, ascending by version.
///
/// Files without the `.down.sql` suffix are ignored; subdirectories are not
/// searched.
pub fn load_plugin_dir(
    plugin: &PluginName,
    dir: &Path,
) -> Result<Vec<MigrationDefinition>, CatalogError> {
    let io_err = |source| CatalogError::IoWithPath {
        path: dir.display().to_string(),
        source,
    };

    let mut definitions = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if !file_name.ends_with(DOWN_SUFFIX) {
            log::debug!("Skipping {}: not a reverse migration", path.display());
            continue;
        }

        let (version, name) =
            parse_file_name(file_name).map_err(|reason| CatalogError::InvalidFile {
                path: path.display().to_string(),
                reason,
            })?;
        let sql = std::fs::read_to_string(&path).map_err(|source| CatalogError::IoWithPath {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(keyword) = transaction_control(&sql) {
            return Err(CatalogError::InvalidFile {
                path: path.display().to_string(),
                reason: format!("contains a {keyword} statement; pmig manages the transaction"),
            });
        }
        definitions.push(MigrationDefinition::from_sql(
            plugin.clone(),
            version,
            name,
            sql,
        ));
    }

    definitions.sort_by_key(MigrationDefinition::version);
    Ok(definitions)
}

/// Build a registry from the `plugins:` entries of a project config.
pub fn load_configured_plugins(config: &Config, root: &Path) -> Result<CatalogRegistry, CatalogError> {
    let mut registry = CatalogRegistry::new();
    for (plugin, dir) in config.plugin_paths_absolute(root) {
        let definitions = load_plugin_dir(&plugin, &dir)?;
        log::debug!(
            "Registered {} migrations for {plugin} from {}",
            definitions.len(),
            dir.display()
        );
        registry.register_all(definitions)?;
    }
    Ok(registry)
}

#[cfg(test)]
#[path = "sql_files_test.rs"]
mod tests;
