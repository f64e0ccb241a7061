//! Rollback requests and the plans resolved from them.

use crate::catalog::MigrationDefinition;
use pmig_core::PluginName;

/// Roll back the migration at `since_version` of `plugin`, and every applied
/// migration of that plugin after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    pub plugin: PluginName,
    pub since_version: i32,
}

impl RollbackRequest {
    pub fn new(plugin: PluginName, since_version: i32) -> Self {
        Self {
            plugin,
            since_version,
        }
    }
}

/// Ordered migrations to undo for one request, newest first.
///
/// A snapshot of ledger state at resolution time. Every step was applied
/// when the plan was built; nothing re-validates that afterwards except the
/// executor's per-step ledger lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackPlan {
    request: RollbackRequest,
    steps: Vec<MigrationDefinition>,
}

impl RollbackPlan {
    /// Callers must supply `steps` strictly descending by version.
    pub(crate) fn new(request: RollbackRequest, steps: Vec<MigrationDefinition>) -> Self {
        debug_assert!(steps.windows(2).all(|w| w[0].version() > w[1].version()));
        Self { request, steps }
    }

    pub fn request(&self) -> &RollbackRequest {
        &self.request
    }

    pub fn steps(&self) -> &[MigrationDefinition] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationDefinition> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Versions in plan order.
    pub fn versions(&self) -> Vec<i32> {
        self.steps.iter().map(MigrationDefinition::version).collect()
    }
}

impl<'a> IntoIterator for &'a RollbackPlan {
    type Item = &'a MigrationDefinition;
    type IntoIter = std::slice::Iter<'a, MigrationDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// One `"{plugin} #{version}: {name}"` line per step, in plan order.
pub fn summarize(plan: &RollbackPlan) -> Vec<String> {
    plan.iter().map(MigrationDefinition::label).collect()
}
