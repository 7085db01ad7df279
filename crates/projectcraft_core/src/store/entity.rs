//! Uniform entity contract used by the document store.
//!
//! Each entity kind binds its patch type, its collection inside the
//! document, and its `UndoEntry` variant, so create/update/delete and replay
//! are written once.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::history::{EntityChange, EntityKind, UndoEntry};
use crate::model::cost::{Cost, CostPatch};
use crate::model::document::ProjectDocument;
use crate::model::resource::{Resource, ResourcePatch};
use crate::model::risk::{Risk, RiskPatch};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::model::EntityId;

/// Why the store refused an otherwise well-addressed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The new parent is the task itself or one of its descendants.
    ParentCycle { task_id: TaskId, parent_id: TaskId },
    /// Nothing has been created or loaded yet.
    NoOpenProject,
}

pub trait Entity: Clone + Sized {
    type Patch;

    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    fn collection(document: &ProjectDocument) -> &Vec<Self>;

    fn collection_mut(document: &mut ProjectDocument) -> &mut Vec<Self>;

    /// Builds a new entity, filling omitted fields with kind defaults.
    fn build(patch: Self::Patch, id: EntityId, document: &ProjectDocument, now: DateTime<Utc>)
        -> Self;

    fn merge(&mut self, patch: Self::Patch);

    fn wrap(change: EntityChange<Self>) -> UndoEntry;

    /// Checks an edited entity against document-wide invariants.
    fn validate_edit(_document: &ProjectDocument, _edited: &Self) -> Result<(), RejectReason> {
        Ok(())
    }
}

impl Entity for Task {
    type Patch = TaskPatch;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> EntityId {
        self.id
    }

    fn collection(document: &ProjectDocument) -> &Vec<Self> {
        &document.tasks
    }

    fn collection_mut(document: &mut ProjectDocument) -> &mut Vec<Self> {
        &mut document.tasks
    }

    fn build(patch: TaskPatch, id: EntityId, document: &ProjectDocument, now: DateTime<Utc>) -> Self {
        let next_order = u32::try_from(document.tasks.len()).unwrap_or(u32::MAX);
        patch.into_task(id, now, next_order)
    }

    fn merge(&mut self, patch: TaskPatch) {
        patch.apply_to(self);
    }

    fn wrap(change: EntityChange<Self>) -> UndoEntry {
        UndoEntry::Task(change)
    }

    fn validate_edit(document: &ProjectDocument, edited: &Self) -> Result<(), RejectReason> {
        match edited.parent_id {
            Some(parent_id) if would_create_cycle(&document.tasks, edited.id, parent_id) => {
                Err(RejectReason::ParentCycle {
                    task_id: edited.id,
                    parent_id,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Entity for Resource {
    type Patch = ResourcePatch;

    const KIND: EntityKind = EntityKind::Resource;

    fn id(&self) -> EntityId {
        self.id
    }

    fn collection(document: &ProjectDocument) -> &Vec<Self> {
        &document.resources
    }

    fn collection_mut(document: &mut ProjectDocument) -> &mut Vec<Self> {
        &mut document.resources
    }

    fn build(patch: ResourcePatch, id: EntityId, _document: &ProjectDocument, _now: DateTime<Utc>) -> Self {
        patch.into_resource(id)
    }

    fn merge(&mut self, patch: ResourcePatch) {
        patch.apply_to(self);
    }

    fn wrap(change: EntityChange<Self>) -> UndoEntry {
        UndoEntry::Resource(change)
    }
}

impl Entity for Cost {
    type Patch = CostPatch;

    const KIND: EntityKind = EntityKind::Cost;

    fn id(&self) -> EntityId {
        self.id
    }

    fn collection(document: &ProjectDocument) -> &Vec<Self> {
        &document.costs
    }

    fn collection_mut(document: &mut ProjectDocument) -> &mut Vec<Self> {
        &mut document.costs
    }

    fn build(patch: CostPatch, id: EntityId, _document: &ProjectDocument, now: DateTime<Utc>) -> Self {
        patch.into_cost(id, now)
    }

    fn merge(&mut self, patch: CostPatch) {
        patch.apply_to(self);
    }

    fn wrap(change: EntityChange<Self>) -> UndoEntry {
        UndoEntry::Cost(change)
    }
}

impl Entity for Risk {
    type Patch = RiskPatch;

    const KIND: EntityKind = EntityKind::Risk;

    fn id(&self) -> EntityId {
        self.id
    }

    fn collection(document: &ProjectDocument) -> &Vec<Self> {
        &document.risks
    }

    fn collection_mut(document: &mut ProjectDocument) -> &mut Vec<Self> {
        &mut document.risks
    }

    fn build(patch: RiskPatch, id: EntityId, _document: &ProjectDocument, now: DateTime<Utc>) -> Self {
        patch.into_risk(id, now)
    }

    fn merge(&mut self, patch: RiskPatch) {
        patch.apply_to(self);
    }

    fn wrap(change: EntityChange<Self>) -> UndoEntry {
        UndoEntry::Risk(change)
    }
}

/// Walks up from `candidate_parent` and reports whether `task_id` is reached.
///
/// Unknown parents end the walk: dangling references are tolerated. A loop
/// that does not pass through `task_id` is treated as a cycle as well.
fn would_create_cycle(tasks: &[Task], task_id: TaskId, candidate_parent: TaskId) -> bool {
    let mut visited = HashSet::new();
    let mut cursor = Some(candidate_parent);
    while let Some(current) = cursor {
        if current == task_id {
            return true;
        }
        if !visited.insert(current) {
            return true;
        }
        cursor = tasks
            .iter()
            .find(|task| task.id == current)
            .and_then(|task| task.parent_id);
    }
    false
}
