//! Runtime configuration for the relation end-point core.
//!
//! Configuration is passed explicitly through `EndPointContext`; nothing here
//! is read from ambient process state.

use crate::error::InternalError;
use serde::Deserialize;

///
/// RelationConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RelationConfig {
    pub metrics: MetricsConfig,
    pub sync: SyncConfig,
}

impl RelationConfig {
    /// Parse a TOML document, e.g. the `[relation]` table of a host config file.
    pub fn from_toml_str(source: &str) -> Result<Self, InternalError> {
        toml::from_str(source).map_err(|err| {
            InternalError::config_unsupported(format!("invalid relation config: {err}"))
        })
    }

    #[must_use]
    pub const fn metrics_enabled(&self) -> bool {
        self.metrics.enabled
    }
}

///
/// MetricsConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Record relation events into the metrics sink.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

///
/// SyncConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Reject synchronizing an opposite end-point that was never recorded as
    /// unsynchronized.
    pub strict_opposite_synchronization: bool,
}

///
/// TESTS
///
