//! Snapshot use-case service.
//!
//! # Responsibility
//! - Store immutable full-document snapshots keyed by project identity.
//! - Keep the snapshot index separate from payloads.
//! - Decide when the next automatic snapshot is due.
//!
//! # Invariants
//! - Payload and index entry are written or removed in one batch.
//! - Snapshot ids are unique within the store, even for equal timestamps.
//! - Listing and restoring never mutate the index.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{debug, info};

use crate::model::document::ProjectDocument;
use crate::model::project::ProjectId;
use crate::model::snapshot::{SnapshotId, SnapshotKind, SnapshotPayload, SnapshotRecord};
use crate::repo::keys::{SNAPSHOT_INDEX_KEY, SNAPSHOT_KEY_PREFIX};
use crate::repo::kv_repo::{KeyValueStore, KvWrite, RepoResult};

/// Snapshot facade over a key-value store.
pub struct SnapshotManager<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SnapshotManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stores a full copy of `document` and indexes it under `project_id`.
    pub fn snapshot(
        &self,
        document: &ProjectDocument,
        project_id: ProjectId,
        kind: SnapshotKind,
        now: DateTime<Utc>,
    ) -> RepoResult<SnapshotRecord> {
        let mut index = self.index()?;
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let id = self.unique_id(&index, &format!("{SNAPSHOT_KEY_PREFIX}{project_id}_{timestamp}"))?;

        let record = SnapshotRecord {
            id: id.clone(),
            project_id,
            name: format!("{}_{timestamp}", document.project.name),
            created_at: now,
            kind,
        };
        let payload = SnapshotPayload {
            record: record.clone(),
            data: document.clone(),
        };
        index.push(record.clone());

        self.store.write_batch(&[
            KvWrite::put_json(id.as_str(), &payload)?,
            KvWrite::put_json(SNAPSHOT_INDEX_KEY, &index)?,
        ])?;
        info!(
            "event=snapshot_create module=snapshot status=ok kind={} project={project_id}",
            kind.as_str()
        );
        Ok(record)
    }

    /// Index entries of one project in creation order.
    pub fn list(&self, project_id: ProjectId) -> RepoResult<Vec<SnapshotRecord>> {
        Ok(self
            .index()?
            .into_iter()
            .filter(|record| record.project_id == project_id)
            .collect())
    }

    /// Newest entry of `kind` for the project.
    pub fn latest(
        &self,
        project_id: ProjectId,
        kind: SnapshotKind,
    ) -> RepoResult<Option<SnapshotRecord>> {
        Ok(self
            .list(project_id)?
            .into_iter()
            .filter(|record| record.kind == kind)
            .last())
    }

    /// Returns the stored document, or `None` for unknown ids.
    pub fn restore(&self, snapshot_id: &str) -> RepoResult<Option<ProjectDocument>> {
        if !snapshot_id.starts_with(SNAPSHOT_KEY_PREFIX) {
            debug!("event=snapshot_restore module=snapshot status=skip reason=foreign_key");
            return Ok(None);
        }
        let payload = self.store.get_json::<SnapshotPayload>(snapshot_id)?;
        debug!(
            "event=snapshot_restore module=snapshot status={}",
            if payload.is_some() { "ok" } else { "skip" }
        );
        Ok(payload.map(|payload| payload.data))
    }

    /// Removes payload and index entry. Unknown ids are a no-op.
    pub fn delete(&self, snapshot_id: &str) -> RepoResult<bool> {
        let mut index = self.index()?;
        let before = index.len();
        index.retain(|record| record.id != snapshot_id);
        let indexed = index.len() != before;
        let stored = snapshot_id.starts_with(SNAPSHOT_KEY_PREFIX) && self.store.contains(snapshot_id)?;
        if !indexed && !stored {
            return Ok(false);
        }

        let mut writes = vec![KvWrite::put_json(SNAPSHOT_INDEX_KEY, &index)?];
        if stored {
            writes.push(KvWrite::remove(snapshot_id));
        }
        self.store.write_batch(&writes)?;
        info!("event=snapshot_delete module=snapshot status=ok");
        Ok(true)
    }

    fn index(&self) -> RepoResult<Vec<SnapshotRecord>> {
        Ok(self
            .store
            .get_json::<Vec<SnapshotRecord>>(SNAPSHOT_INDEX_KEY)?
            .unwrap_or_default())
    }

    fn unique_id(&self, index: &[SnapshotRecord], base: &str) -> RepoResult<SnapshotId> {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while index.iter().any(|record| record.id == candidate) || self.store.contains(&candidate)? {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        Ok(candidate)
    }
}

/// Fires once per interval while a project is open.
#[derive(Debug, Clone)]
pub struct AutoSnapshotScheduler {
    interval: Duration,
    last: Option<DateTime<Utc>>,
}

impl AutoSnapshotScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts a new period at `now` (project opened or snapshot taken).
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.last = Some(now);
    }

    pub fn stop(&mut self) {
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    pub fn due(&self, now: DateTime<Utc>) -> bool {
        self.last
            .is_some_and(|last| now.signed_duration_since(last) >= self.interval)
    }
}
