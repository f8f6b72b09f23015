//! Replication client configuration.
//!
//! Loaded once at startup from a flat TOML document:
//!
//! ```toml
//! readiness_poll_interval_ms = 16
//! readiness_timeout_ms = 30000
//! readiness_timeout_action = "skip_metadata"
//! ```

use crate::error::{ReplicationError, ReplicationResult};
use serde::Deserialize;
use std::time::Duration;

/// What to do when an entity's readiness gate does not clear in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTimeoutAction {
    /// Log, leave the entity without metadata, keep walking.
    #[default]
    SkipMetadata,
    /// Fail the whole walk.
    Abort,
}

/// Configuration for the entity orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplicationConfig {
    /// Delay between readiness polls. One 60Hz frame by default.
    pub readiness_poll_interval_ms: u64,
    /// Upper bound on a readiness wait. `None` waits forever; TOML has no
    /// null, so that can only be set in code.
    pub readiness_timeout_ms: Option<u64>,
    /// Behavior once the bound is hit.
    pub readiness_timeout_action: ReadinessTimeoutAction,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            readiness_poll_interval_ms: 16,
            readiness_timeout_ms: Some(30_000),
            readiness_timeout_action: ReadinessTimeoutAction::SkipMetadata,
        }
    }
}

impl ReplicationConfig {
    /// Parses a TOML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::InvalidConfig`] on malformed input or
    /// unknown fields.
    pub fn from_toml_str(source: &str) -> ReplicationResult<Self> {
        toml::from_str(source).map_err(|e| ReplicationError::InvalidConfig(e.to_string()))
    }

    /// Poll interval as a [`Duration`]. Never zero.
    #[must_use]
    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms.max(1))
    }

    /// Readiness bound as a [`Duration`].
    #[must_use]
    pub fn readiness_timeout(&self) -> Option<Duration> {
        self.readiness_timeout_ms.map(Duration::from_millis)
    }
}
