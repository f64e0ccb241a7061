//! Migration catalog: the registered migration chains of every plugin.
//!
//! Plugins register their definitions explicitly at startup, either in code
//! via [`CatalogRegistry::register`] or from a directory of reverse-migration
//! SQL files (see [`sql_files`]).

pub mod sql_files;

use crate::error::{ActionError, CatalogError};
use duckdb::Connection;
use pmig_core::PluginName;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use sql_files::{load_configured_plugins, load_plugin_dir};

/// Outcome of a reverse action.
pub type ActionResult = Result<(), ActionError>;

type ReverseFn = dyn Fn(&Connection) -> ActionResult + Send + Sync;

/// One migration contributed by a plugin.
///
/// Equality considers only the identity triple
/// (plugin, version, name), never the reverse action.
#[derive(Clone)]
pub struct MigrationDefinition {
    plugin: PluginName,
    version: i32,
    name: String,
    reverse: Arc<ReverseFn>,
}

impl MigrationDefinition {
    /// Define a migration whose reverse action is an arbitrary function.
    ///
    /// The function receives a connection with an open transaction scoped to
    /// this migration. It must not begin, commit, or roll back that
    /// transaction itself.
    pub fn new<F>(plugin: PluginName, version: i32, name: impl Into<String>, reverse: F) -> Self
    where
        F: Fn(&Connection) -> ActionResult + Send + Sync + 'static,
    {
        Self {
            plugin,
            version,
            name: name.into(),
            reverse: Arc::new(reverse),
        }
    }

    /// Define a migration whose reverse action runs a SQL batch.
    ///
    /// The batch must not contain transaction-control statements;
    /// [`sql_files`] rejects such files before they get here.
    pub fn from_sql(
        plugin: PluginName,
        version: i32,
        name: impl Into<String>,
        sql: impl Into<String>,
    ) -> Self {
        let sql = sql.into();
        Self::new(plugin, version, name, move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
    }

    pub fn plugin(&self) -> &PluginName {
        &self.plugin
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the reverse action against `conn`.
    pub fn reverse(&self, conn: &Connection) -> ActionResult {
        (self.reverse)(conn)
    }

    /// `"{plugin} #{version}: {name}"`
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MigrationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.plugin, self.version, self.name)
    }
}

impl fmt::Debug for MigrationDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationDefinition")
            .field("plugin", &self.plugin)
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for MigrationDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.plugin == other.plugin && self.version == other.version && self.name == other.name
    }
}

impl Eq for MigrationDefinition {}

/// Source of migration definitions, keyed by plugin.
pub trait MigrationCatalog {
    /// Every definition `plugin` contributes, ascending by version.
    ///
    /// An unknown plugin yields an empty list.
    fn definitions_for(&self, plugin: &PluginName) -> Vec<MigrationDefinition>;
}

/// In-memory catalog populated by explicit registration.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    chains: BTreeMap<PluginName, BTreeMap<i32, MigrationDefinition>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition to its plugin's chain.
    ///
    /// Versions are unique within a chain; registering the same version twice
    /// is an error and leaves the registry unchanged.
    pub fn register(&mut self, definition: MigrationDefinition) -> Result<(), CatalogError> {
        let chain = self.chains.entry(definition.plugin.clone()).or_default();
        if chain.contains_key(&definition.version) {
            return Err(CatalogError::DuplicateMigration {
                plugin: definition.plugin.to_string(),
                version: definition.version,
            });
        }
        chain.insert(definition.version, definition);
        Ok(())
    }

    /// Register several definitions, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = MigrationDefinition>,
    ) -> Result<(), CatalogError> {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// Plugins with at least one registered migration, in name order.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginName> {
        self.chains.keys()
    }

    /// Total number of registered definitions across all plugins.
    pub fn len(&self) -> usize {
        self.chains.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MigrationCatalog for CatalogRegistry {
    fn definitions_for(&self, plugin: &PluginName) -> Vec<MigrationDefinition> {
        self.chains
            .get(plugin)
            .map(|chain| chain.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
