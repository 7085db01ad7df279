//! Project engine facade.
//!
//! # Responsibility
//! - Bundle document store, lifecycle, persistence and snapshots for one
//!   open project.
//! - Stamp every operation with the injected clock.
//!
//! # Invariants
//! - Every engine is independent; nothing is shared between instances.
//! - Saves and snapshots serialize a copy taken at call time.
//! - A failed save leaves the live document and lifecycle untouched.
//! - Replacing the document (create, load, import, restore) clears history.
//! - Until a project exists, mutations and saves are refused.

use log::{info, warn};
use std::path::Path;

use crate::archive::ProjectArchive;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::history::CommandLog;
use crate::lifecycle::{self, NavigationCheck};
use crate::model::cost::{Cost, CostId, CostPatch};
use crate::model::document::ProjectDocument;
use crate::model::project::{Project, ProjectId, ProjectPatch, ProjectState};
use crate::model::recent::RecentProject;
use crate::model::resource::{Resource, ResourceId, ResourcePatch};
use crate::model::risk::{Risk, RiskId, RiskPatch};
use crate::model::snapshot::{SnapshotKind, SnapshotRecord};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::kv_repo::{KeyValueStore, RepoResult};
use crate::service::persistence::{
    PersistenceError, PersistenceResult, PersistenceService, SavedArchive,
};
use crate::service::snapshot_service::{AutoSnapshotScheduler, SnapshotManager};
use crate::store::{DocumentStore, MutationOutcome, RejectReason};

pub struct ProjectEngine<S: KeyValueStore + Clone, C: Clock> {
    config: EngineConfig,
    clock: C,
    store: DocumentStore,
    persistence: PersistenceService<S>,
    snapshots: SnapshotManager<S>,
    scheduler: AutoSnapshotScheduler,
}

impl<S: KeyValueStore + Clone, C: Clock> ProjectEngine<S, C> {
    /// Creates an engine with no project open.
    pub fn new(kv: S, clock: C, config: EngineConfig) -> Self {
        let mut document = ProjectDocument::new(None, clock.now());
        document.project.current_state = ProjectState::Uninitialized;
        Self {
            store: DocumentStore::new(document, config.history_limit),
            persistence: PersistenceService::new(kv.clone(), &config),
            snapshots: SnapshotManager::new(kv),
            scheduler: AutoSnapshotScheduler::new(config.auto_snapshot_interval),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn document(&self) -> &ProjectDocument {
        self.store.document()
    }

    pub fn project(&self) -> &Project {
        self.store.project()
    }

    pub fn history(&self) -> &CommandLog {
        self.store.log()
    }

    // Project lifecycle

    /// Resets to a fresh `Untitled` project with empty collections.
    pub fn create_project(&mut self, name: Option<&str>) -> ProjectId {
        let now = self.clock.now();
        let document = ProjectDocument::new(name, now);
        let project_id = document.project.id;
        self.open(document);
        info!("event=project_create module=engine status=ok project={project_id}");
        project_id
    }

    /// Merges project metadata and marks the project dirty.
    pub fn update_project(&mut self, patch: ProjectPatch) {
        if !self.has_project() {
            return;
        }
        let now = self.clock.now();
        self.store.update_project(patch, now);
    }

    /// Saves under the current project name.
    pub fn save(&mut self) -> PersistenceResult<SavedArchive> {
        self.persist(None)
    }

    /// Names the project, clears the untitled flag, then saves.
    pub fn save_as(&mut self, name: &str) -> PersistenceResult<SavedArchive> {
        self.persist(Some(name))
    }

    /// Opens the flat copy of `project_id`. Returns `false` when none exists.
    pub fn load_project(&mut self, project_id: ProjectId) -> PersistenceResult<bool> {
        match self.persistence.load(project_id)? {
            Some(document) => {
                self.open(document);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn import_archive(&mut self, archive: &ProjectArchive) -> PersistenceResult<ProjectId> {
        let document = self.persistence.import_archive(archive, self.clock.now())?;
        Ok(self.open(document))
    }

    pub fn import_json(&mut self, raw: &str) -> PersistenceResult<ProjectId> {
        let document = self.persistence.import_json(raw, self.clock.now())?;
        Ok(self.open(document))
    }

    pub fn import_path(&mut self, path: &Path) -> PersistenceResult<ProjectId> {
        let document = self.persistence.import_path(path, self.clock.now())?;
        Ok(self.open(document))
    }

    /// Replaces the live document wholesale, e.g. with a restored snapshot.
    pub fn load_document(&mut self, document: ProjectDocument) {
        self.open(document);
    }

    pub fn current_state(&self) -> ProjectState {
        self.project().current_state
    }

    /// Whether a project has been created, loaded or imported.
    pub fn has_project(&self) -> bool {
        self.current_state() != ProjectState::Uninitialized
    }

    pub fn is_dirty(&self) -> bool {
        let project = self.project();
        project.current_state == ProjectState::Dirty || project.has_unsaved_changes
    }

    /// Marks the project dirty without touching any collection.
    pub fn set_dirty(&mut self) {
        if !self.has_project() {
            return;
        }
        let now = self.clock.now();
        lifecycle::mark_dirty(self.store.project_mut(), now);
    }

    pub fn begin_editing(&mut self) -> bool {
        lifecycle::begin_editing(self.store.project_mut())
    }

    pub fn navigation_check(&self) -> NavigationCheck {
        lifecycle::navigation_check(self.project())
    }

    /// Enters `Closing` and stops automatic snapshots.
    pub fn close_project(&mut self) -> NavigationCheck {
        self.scheduler.stop();
        lifecycle::begin_closing(self.store.project_mut())
    }

    /// Reloads the last saved flat copy. Returns `false` when the project
    /// was never saved.
    pub fn discard_changes(&mut self) -> PersistenceResult<bool> {
        let project_id = self.project().id;
        let discarded = self.load_project(project_id)?;
        info!(
            "event=project_discard module=engine status={} project={project_id}",
            if discarded { "ok" } else { "skip" }
        );
        Ok(discarded)
    }

    pub fn recent_projects(&self) -> PersistenceResult<Vec<RecentProject>> {
        self.persistence.recent_projects()
    }

    pub fn add_recent_project(&self, entry: RecentProject) -> PersistenceResult<()> {
        self.persistence.add_recent_project(entry)
    }

    // Tasks

    pub fn tasks(&self) -> &[Task] {
        self.store.list::<Task>()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.store.get::<Task>(id)
    }

    pub fn children_of(&self, parent_id: Option<TaskId>) -> Vec<&Task> {
        self.store.children_of(parent_id)
    }

    pub fn create_task(&mut self, patch: TaskPatch) -> Option<TaskId> {
        if !self.has_project() {
            return None;
        }
        let now = self.clock.now();
        Some(self.store.create::<Task>(patch, now))
    }

    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.update::<Task>(id, patch, now)
    }

    pub fn delete_task(&mut self, id: TaskId) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.delete::<Task>(id, now)
    }

    // Resources

    pub fn resources(&self) -> &[Resource] {
        self.store.list::<Resource>()
    }

    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.store.get::<Resource>(id)
    }

    pub fn create_resource(&mut self, patch: ResourcePatch) -> Option<ResourceId> {
        if !self.has_project() {
            return None;
        }
        let now = self.clock.now();
        Some(self.store.create::<Resource>(patch, now))
    }

    pub fn update_resource(&mut self, id: ResourceId, patch: ResourcePatch) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.update::<Resource>(id, patch, now)
    }

    pub fn delete_resource(&mut self, id: ResourceId) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.delete::<Resource>(id, now)
    }

    // Costs

    pub fn costs(&self) -> &[Cost] {
        self.store.list::<Cost>()
    }

    pub fn cost(&self, id: CostId) -> Option<&Cost> {
        self.store.get::<Cost>(id)
    }

    pub fn create_cost(&mut self, patch: CostPatch) -> Option<CostId> {
        if !self.has_project() {
            return None;
        }
        let now = self.clock.now();
        Some(self.store.create::<Cost>(patch, now))
    }

    pub fn update_cost(&mut self, id: CostId, patch: CostPatch) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.update::<Cost>(id, patch, now)
    }

    pub fn delete_cost(&mut self, id: CostId) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.delete::<Cost>(id, now)
    }

    // Risks

    pub fn risks(&self) -> &[Risk] {
        self.store.list::<Risk>()
    }

    pub fn risk(&self, id: RiskId) -> Option<&Risk> {
        self.store.get::<Risk>(id)
    }

    pub fn create_risk(&mut self, patch: RiskPatch) -> Option<RiskId> {
        if !self.has_project() {
            return None;
        }
        let now = self.clock.now();
        Some(self.store.create::<Risk>(patch, now))
    }

    pub fn update_risk(&mut self, id: RiskId, patch: RiskPatch) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.update::<Risk>(id, patch, now)
    }

    pub fn delete_risk(&mut self, id: RiskId) -> MutationOutcome {
        if !self.has_project() {
            return MutationOutcome::Rejected(RejectReason::NoOpenProject);
        }
        let now = self.clock.now();
        self.store.delete::<Risk>(id, now)
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let now = self.clock.now();
        self.store.undo(now)
    }

    pub fn redo(&mut self) -> bool {
        let now = self.clock.now();
        self.store.redo(now)
    }

    // Snapshots

    pub fn manual_snapshot(&self) -> RepoResult<SnapshotRecord> {
        self.take_snapshot(SnapshotKind::Manual)
    }

    pub fn crash_recovery_snapshot(&self) -> RepoResult<SnapshotRecord> {
        self.take_snapshot(SnapshotKind::CrashRecovery)
    }

    /// Snapshots of the open project in creation order.
    pub fn snapshots(&self) -> RepoResult<Vec<SnapshotRecord>> {
        self.snapshots.list(self.project().id)
    }

    pub fn latest_snapshot(&self, kind: SnapshotKind) -> RepoResult<Option<SnapshotRecord>> {
        self.snapshots.latest(self.project().id, kind)
    }

    /// Returns the snapshot payload without applying it; see `load_document`.
    pub fn restore_snapshot(&self, snapshot_id: &str) -> RepoResult<Option<ProjectDocument>> {
        self.snapshots.restore(snapshot_id)
    }

    pub fn delete_snapshot(&self, snapshot_id: &str) -> RepoResult<bool> {
        self.snapshots.delete(snapshot_id)
    }

    /// Takes an automatic snapshot when the interval has elapsed since the
    /// project was opened or since the previous automatic snapshot.
    pub fn tick(&mut self) -> RepoResult<Option<SnapshotRecord>> {
        let now = self.clock.now();
        if !self.project().current_state.is_open() || !self.scheduler.due(now) {
            return Ok(None);
        }
        let record = self.take_snapshot(SnapshotKind::Auto)?;
        self.scheduler.reset(now);
        Ok(Some(record))
    }

    fn take_snapshot(&self, kind: SnapshotKind) -> RepoResult<SnapshotRecord> {
        let document = self.store.document();
        self.snapshots
            .snapshot(document, document.project.id, kind, self.clock.now())
    }

    fn open(&mut self, document: ProjectDocument) -> ProjectId {
        let project_id = document.project.id;
        self.store.replace_document(document);
        self.scheduler.reset(self.clock.now());
        project_id
    }

    fn persist(&mut self, rename: Option<&str>) -> PersistenceResult<SavedArchive> {
        if !self.has_project() {
            return Err(PersistenceError::NoOpenProject);
        }
        let now = self.clock.now();
        let mut copy = self.store.document().clone();
        if let Some(name) = rename {
            lifecycle::apply_save_as_name(&mut copy.project, name);
        }
        lifecycle::mark_saved(&mut copy.project, now);

        let saved = self.persistence.save(&copy, &copy.project.name, now)?;

        let project = self.store.project_mut();
        if let Some(name) = rename {
            lifecycle::apply_save_as_name(project, name);
        }
        lifecycle::mark_saved(project, now);

        if self.config.snapshot_on_save {
            if let Err(err) = self
                .snapshots
                .snapshot(&copy, copy.project.id, SnapshotKind::Manual, now)
            {
                warn!(
                    "event=snapshot_create module=engine status=error kind=manual trigger=save error={err}"
                );
            }
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectEngine;
    use crate::clock::ManualClock;
    use crate::config::EngineConfig;
    use crate::db::open_db_in_memory;
    use crate::model::project::ProjectState;
    use crate::model::resource::ResourcePatch;
    use crate::model::task::TaskPatch;
    use crate::repo::kv_repo::SqliteKeyValueStore;
    use crate::service::persistence::PersistenceError;
    use crate::store::{MutationOutcome, RejectReason};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn fresh_engine_has_no_open_project() {
        let conn = open_db_in_memory().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());
        let mut engine =
            ProjectEngine::new(SqliteKeyValueStore::new(&conn), clock, EngineConfig::default());

        assert_eq!(engine.current_state(), ProjectState::Uninitialized);
        engine.clock().advance(Duration::minutes(30));
        assert!(engine.tick().unwrap().is_none());
    }

    #[test]
    fn fresh_engine_refuses_edits_and_saves() {
        let conn = open_db_in_memory().unwrap();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());
        let mut engine =
            ProjectEngine::new(SqliteKeyValueStore::new(&conn), clock, EngineConfig::default());

        assert_eq!(engine.create_resource(ResourcePatch::named("Crane")), None);
        assert_eq!(
            engine.delete_task(Uuid::new_v4()),
            MutationOutcome::Rejected(RejectReason::NoOpenProject)
        );
        engine.set_dirty();
        assert!(matches!(engine.save(), Err(PersistenceError::NoOpenProject)));

        assert_eq!(engine.current_state(), ProjectState::Uninitialized);
        assert!(engine.document().is_empty());
        assert!(engine.recent_projects().unwrap().is_empty());
    }

    #[test]
    fn save_failure_keeps_project_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let conn = open_db_in_memory().unwrap();
        let clock = ManualClock::new(Utc::now());
        let config = EngineConfig::default().with_archive_root(blocker.join("archives"));
        let mut engine = ProjectEngine::new(SqliteKeyValueStore::new(&conn), clock, config);
        engine.create_project(Some("Bridge"));
        engine.create_task(TaskPatch::named("Survey"));

        assert!(engine.save().is_err());
        assert_eq!(engine.current_state(), ProjectState::Dirty);
        assert!(engine.recent_projects().unwrap().is_empty());
        assert!(engine.snapshots().unwrap().is_empty());
    }
}
