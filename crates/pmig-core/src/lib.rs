//! pmig-core - Core library for pmig
//!
//! Shared types used across the pmig crates: the strongly-typed
//! [`PluginName`], the [`AppliedRecord`] ledger entry, and the `pmig.yml`
//! project configuration.

pub mod config;
pub mod error;
pub mod plugin_name;
pub mod record;

pub use config::{Config, DatabaseConfig, PluginConfig};
pub use error::{CoreError, CoreResult};
pub use plugin_name::PluginName;
pub use record::AppliedRecord;
