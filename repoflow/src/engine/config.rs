//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for an [`Engine`](super::Engine).
///
/// All durations are expressed in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory under which working copies are materialized.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// How long a working copy stays fresh after a clone or pull.
    #[serde(default = "default_stale_window")]
    pub stale_window_seconds: u64,
    /// Safety-release timeout for held locks.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_seconds: u64,
    /// Cache TTL for datasources that do not declare their own.
    #[serde(default = "default_datasource_ttl")]
    pub default_ttl_seconds: u64,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("./.repos")
}

fn default_stale_window() -> u64 {
    3600
}

fn default_lock_timeout() -> u64 {
    60
}

fn default_datasource_ttl() -> u64 {
    6000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            stale_window_seconds: default_stale_window(),
            lock_timeout_seconds: default_lock_timeout(),
            default_ttl_seconds: default_datasource_ttl(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workspace root.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Sets the staleness window.
    #[must_use]
    pub fn with_stale_window(mut self, seconds: u64) -> Self {
        self.stale_window_seconds = seconds;
        self
    }

    /// Sets the lock safety-release timeout.
    #[must_use]
    pub fn with_lock_timeout(mut self, seconds: u64) -> Self {
        self.lock_timeout_seconds = seconds;
        self
    }

    /// Sets the default datasource TTL.
    #[must_use]
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    pub(crate) fn stale_window(&self) -> Duration {
        Duration::from_secs(self.stale_window_seconds)
    }

    pub(crate) fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_seconds)
    }

    pub(crate) fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}
