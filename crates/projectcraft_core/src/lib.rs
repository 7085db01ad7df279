//! Core document engine for ProjectCraft.
//! This crate is the single source of truth for document, history,
//! lifecycle and persistence invariants.

pub mod archive;
pub mod clock;
pub mod config;
pub mod db;
pub mod history;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use archive::{ArchiveError, ArchiveOrigin, ProjectArchive, StagedArchive};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use db::{open_db, open_db_in_memory, DbError};
pub use history::{ActionKind, CommandLog, EntityChange, EntityKind, UndoEntry};
pub use lifecycle::NavigationCheck;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::cost::{Cost, CostCategory, CostPatch, CostStatus};
pub use model::document::ProjectDocument;
pub use model::project::{Project, ProjectId, ProjectPatch, ProjectState};
pub use model::recent::RecentProject;
pub use model::resource::{Resource, ResourcePatch, ResourceType, WeeklySchedule};
pub use model::risk::{Risk, RiskLevel, RiskPatch, RiskStatus};
pub use model::snapshot::{SnapshotKind, SnapshotRecord};
pub use model::task::{DependencyType, Task, TaskDependency, TaskPatch, TaskType};
pub use repo::kv_repo::{KeyValueStore, RepoError, RepoResult, SqliteKeyValueStore};
pub use service::engine::ProjectEngine;
pub use service::persistence::{PersistenceError, PersistenceResult, SavedArchive};
pub use store::{MutationOutcome, RejectReason};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
