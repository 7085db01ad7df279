//! Engine configuration.
//!
//! All limits default to the values the desktop application ships with.

use chrono::Duration;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_RECENT_LIMIT: usize = 10;
pub const DEFAULT_AUTO_SNAPSHOT_MINUTES: i64 = 10;

/// Tunables for one `ProjectEngine` instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum entries kept on each of the undo and redo stacks.
    pub history_limit: usize,
    /// Maximum entries kept in the recent-projects list.
    pub recent_limit: usize,
    /// Period between automatic snapshots while a project is open.
    pub auto_snapshot_interval: Duration,
    /// Record a `Manual` snapshot after every successful save.
    pub snapshot_on_save: bool,
    /// Directory receiving `<name>.mpproj` archive files.
    ///
    /// `None` builds archives in memory only.
    pub archive_root: Option<PathBuf>,
    /// Written to `manifest.json` as `created_platform`.
    pub created_platform: String,
    /// Written to `manifest.json` as `created_with_version`.
    pub created_with_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            recent_limit: DEFAULT_RECENT_LIMIT,
            auto_snapshot_interval: Duration::minutes(DEFAULT_AUTO_SNAPSHOT_MINUTES),
            snapshot_on_save: true,
            archive_root: None,
            created_platform: std::env::consts::OS.to_string(),
            created_with_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_archive_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.archive_root = Some(root.into());
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_snapshot_on_save(mut self, enabled: bool) -> Self {
        self.snapshot_on_save = enabled;
        self
    }
}
