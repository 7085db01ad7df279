//! Document store: the single owner of live project state.
//!
//! # Responsibility
//! - Apply create/update/delete to the four entity collections.
//! - Record every applied mutation in the command log and mark the project dirty.
//! - Replay log entries backward (undo) and forward (redo).
//!
//! # Invariants
//! - Unknown ids are silent no-ops: no document change, no log entry, no
//!   lifecycle change. The returned `MutationOutcome` reports what happened.
//! - Ids are engine-generated v4 UUIDs and never collide with history.
//! - Deleting an entity never cascades to entities that reference it.
//! - `n` undos followed by `n` redos restore the collections exactly,
//!   including order.

use chrono::{DateTime, Utc};
use log::debug;
use uuid::Uuid;

use crate::history::{CommandLog, EntityChange, UndoEntry};
use crate::lifecycle;
use crate::model::document::ProjectDocument;
use crate::model::project::{Project, ProjectPatch};
use crate::model::task::{Task, TaskId};
use crate::model::EntityId;

mod entity;

pub use entity::{Entity, RejectReason};

/// Diagnostic result of an update or delete.
///
/// Callers may ignore it; it never signals a failure that needs handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    NotFound(EntityId),
    Rejected(RejectReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Backward,
    Forward,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    document: ProjectDocument,
    log: CommandLog,
}

impl DocumentStore {
    pub fn new(document: ProjectDocument, history_limit: usize) -> Self {
        Self {
            document,
            log: CommandLog::new(history_limit),
        }
    }

    pub fn document(&self) -> &ProjectDocument {
        &self.document
    }

    pub fn project(&self) -> &Project {
        &self.document.project
    }

    pub(crate) fn project_mut(&mut self) -> &mut Project {
        &mut self.document.project
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    /// Replaces the whole document and drops all history.
    pub fn replace_document(&mut self, document: ProjectDocument) {
        self.document = document;
        self.log.clear();
    }

    pub fn list<E: Entity>(&self) -> &[E] {
        E::collection(&self.document)
    }

    pub fn get<E: Entity>(&self, id: EntityId) -> Option<&E> {
        E::collection(&self.document)
            .iter()
            .find(|entity| entity.id() == id)
    }

    /// Tasks directly under `parent_id` (`None` for roots), by display order.
    pub fn children_of(&self, parent_id: Option<TaskId>) -> Vec<&Task> {
        let mut children: Vec<&Task> = self
            .document
            .tasks
            .iter()
            .filter(|task| task.parent_id == parent_id)
            .collect();
        children.sort_by_key(|task| task.order);
        children
    }

    pub fn create<E: Entity>(&mut self, patch: E::Patch, now: DateTime<Utc>) -> EntityId {
        let id = Uuid::new_v4();
        let entity = E::build(patch, id, &self.document, now);
        let collection = E::collection_mut(&mut self.document);
        let position = collection.len();
        collection.push(entity.clone());

        self.log.record(E::wrap(EntityChange::Created {
            after: entity,
            position,
        }));
        lifecycle::mark_dirty(&mut self.document.project, now);
        debug!(
            "event=entity_create module=store status=ok kind={} id={}",
            E::KIND.as_str(),
            id
        );
        id
    }

    pub fn update<E: Entity>(
        &mut self,
        id: EntityId,
        patch: E::Patch,
        now: DateTime<Utc>,
    ) -> MutationOutcome {
        let Some(index) = position_of::<E>(&self.document, id) else {
            debug!(
                "event=entity_update module=store status=skip kind={} reason=not_found id={}",
                E::KIND.as_str(),
                id
            );
            return MutationOutcome::NotFound(id);
        };

        let before = E::collection(&self.document)[index].clone();
        let mut after = before.clone();
        after.merge(patch);

        if let Err(reason) = E::validate_edit(&self.document, &after) {
            debug!(
                "event=entity_update module=store status=skip kind={} reason=rejected id={}",
                E::KIND.as_str(),
                id
            );
            return MutationOutcome::Rejected(reason);
        }

        E::collection_mut(&mut self.document)[index] = after.clone();
        self.log
            .record(E::wrap(EntityChange::Edited { before, after }));
        lifecycle::mark_dirty(&mut self.document.project, now);
        debug!(
            "event=entity_update module=store status=ok kind={} id={}",
            E::KIND.as_str(),
            id
        );
        MutationOutcome::Applied
    }

    pub fn delete<E: Entity>(&mut self, id: EntityId, now: DateTime<Utc>) -> MutationOutcome {
        let Some(position) = position_of::<E>(&self.document, id) else {
            debug!(
                "event=entity_delete module=store status=skip kind={} reason=not_found id={}",
                E::KIND.as_str(),
                id
            );
            return MutationOutcome::NotFound(id);
        };

        let before = E::collection_mut(&mut self.document).remove(position);
        self.log
            .record(E::wrap(EntityChange::Deleted { before, position }));
        lifecycle::mark_dirty(&mut self.document.project, now);
        debug!(
            "event=entity_delete module=store status=ok kind={} id={}",
            E::KIND.as_str(),
            id
        );
        MutationOutcome::Applied
    }

    /// Merges project metadata. Not recorded in the command log.
    pub fn update_project(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        patch.apply_to(&mut self.document.project);
        lifecycle::mark_dirty(&mut self.document.project, now);
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    /// Reverts the most recent entry. Returns `false` when history is empty.
    pub fn undo(&mut self, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.log.pop_undo() else {
            return false;
        };
        replay(&mut self.document, &entry, Replay::Backward);
        debug!(
            "event=history_undo module=store status=ok action={} target={}",
            entry.label(),
            entry.target_id()
        );
        self.log.push_redo(entry);
        lifecycle::mark_dirty(&mut self.document.project, now);
        true
    }

    /// Reapplies the most recently undone entry. Returns `false` when nothing
    /// is redoable.
    pub fn redo(&mut self, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.log.pop_redo() else {
            return false;
        };
        replay(&mut self.document, &entry, Replay::Forward);
        debug!(
            "event=history_redo module=store status=ok action={} target={}",
            entry.label(),
            entry.target_id()
        );
        self.log.push_replayed(entry);
        lifecycle::mark_dirty(&mut self.document.project, now);
        true
    }
}

fn position_of<E: Entity>(document: &ProjectDocument, id: EntityId) -> Option<usize> {
    E::collection(document)
        .iter()
        .position(|entity| entity.id() == id)
}

fn replay(document: &mut ProjectDocument, entry: &UndoEntry, direction: Replay) {
    match entry {
        UndoEntry::Task(change) => replay_change(document, change, direction),
        UndoEntry::Resource(change) => replay_change(document, change, direction),
        UndoEntry::Cost(change) => replay_change(document, change, direction),
        UndoEntry::Risk(change) => replay_change(document, change, direction),
    }
}

fn replay_change<E: Entity>(
    document: &mut ProjectDocument,
    change: &EntityChange<E>,
    direction: Replay,
) {
    match (change, direction) {
        (EntityChange::Created { after, .. }, Replay::Backward) => remove::<E>(document, after.id()),
        (EntityChange::Created { after, position }, Replay::Forward) => {
            insert_at(document, after.clone(), *position)
        }
        (EntityChange::Edited { before, .. }, Replay::Backward) => {
            replace(document, before.clone())
        }
        (EntityChange::Edited { after, .. }, Replay::Forward) => replace(document, after.clone()),
        (EntityChange::Deleted { before, position }, Replay::Backward) => {
            insert_at(document, before.clone(), *position)
        }
        (EntityChange::Deleted { before, .. }, Replay::Forward) => remove::<E>(document, before.id()),
    }
}

fn remove<E: Entity>(document: &mut ProjectDocument, id: EntityId) {
    E::collection_mut(document).retain(|entity| entity.id() != id);
}

fn insert_at<E: Entity>(document: &mut ProjectDocument, entity: E, position: usize) {
    let collection = E::collection_mut(document);
    let index = position.min(collection.len());
    collection.insert(index, entity);
}

/// Replaces the entity with the same id; a missing target is skipped.
fn replace<E: Entity>(document: &mut ProjectDocument, entity: E) {
    if let Some(slot) = E::collection_mut(document)
        .iter_mut()
        .find(|existing| existing.id() == entity.id())
    {
        *slot = entity;
    }
}
