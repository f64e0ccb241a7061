//! Ledger entry marking a plugin migration as currently applied.

use crate::plugin_name::PluginName;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One row of the applied-migration ledger.
///
/// At most one record exists per (`plugin`, `version`). Records are created
/// when a migration is applied and deleted once its rollback commits; they
/// are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRecord {
    /// Ledger identity, used for lookup and deletion.
    pub id: i64,
    pub plugin: PluginName,
    pub version: i32,
    pub name: String,
    /// When the forward migration was recorded.
    pub applied_at: DateTime<Utc>,
}

impl fmt::Display for AppliedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.plugin, self.version, self.name)
    }
}
