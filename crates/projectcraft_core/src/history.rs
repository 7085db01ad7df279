//! Command log: bounded undo/redo stacks of typed entity deltas.
//!
//! # Responsibility
//! - Hold reversible deltas in strict call order.
//! - Enforce the history bound and the no-branching redo policy.
//!
//! # Invariants
//! - `record` always clears the redo stack.
//! - Each stack holds at most `limit` entries; the oldest is dropped first.
//! - Entries own full copies of entity states and never alias live data.
//!
//! Applying an entry to a document is the store's job; this module only
//! orders them.

use std::collections::VecDeque;

use crate::model::cost::Cost;
use crate::model::resource::Resource;
use crate::model::risk::Risk;
use crate::model::task::Task;
use crate::model::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Resource,
    Cost,
    Risk,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Resource => "resource",
            Self::Cost => "cost",
            Self::Risk => "risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Edit,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// One reversible change to a single entity.
///
/// `position` is the collection index the entity occupied (delete) or was
/// appended at (create), so replay restores ordering exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityChange<T> {
    Created { after: T, position: usize },
    Edited { before: T, after: T },
    Deleted { before: T, position: usize },
}

impl<T> EntityChange<T> {
    pub fn action(&self) -> ActionKind {
        match self {
            Self::Created { .. } => ActionKind::Create,
            Self::Edited { .. } => ActionKind::Edit,
            Self::Deleted { .. } => ActionKind::Delete,
        }
    }

    /// State before the change; `None` for creations.
    pub fn before(&self) -> Option<&T> {
        match self {
            Self::Created { .. } => None,
            Self::Edited { before, .. } | Self::Deleted { before, .. } => Some(before),
        }
    }

    /// State after the change; `None` for deletions.
    pub fn after(&self) -> Option<&T> {
        match self {
            Self::Deleted { .. } => None,
            Self::Created { after, .. } | Self::Edited { after, .. } => Some(after),
        }
    }
}

/// Undo/redo log entry over entity kind x change kind.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    Task(EntityChange<Task>),
    Resource(EntityChange<Resource>),
    Cost(EntityChange<Cost>),
    Risk(EntityChange<Risk>),
}

impl UndoEntry {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Task(_) => EntityKind::Task,
            Self::Resource(_) => EntityKind::Resource,
            Self::Cost(_) => EntityKind::Cost,
            Self::Risk(_) => EntityKind::Risk,
        }
    }

    pub fn action(&self) -> ActionKind {
        match self {
            Self::Task(change) => change.action(),
            Self::Resource(change) => change.action(),
            Self::Cost(change) => change.action(),
            Self::Risk(change) => change.action(),
        }
    }

    pub fn target_id(&self) -> EntityId {
        fn pick<T>(change: &EntityChange<T>, id: impl Fn(&T) -> EntityId) -> EntityId {
            match change {
                EntityChange::Created { after, .. } => id(after),
                EntityChange::Edited { after, .. } => id(after),
                EntityChange::Deleted { before, .. } => id(before),
            }
        }

        match self {
            Self::Task(change) => pick(change, |task| task.id),
            Self::Resource(change) => pick(change, |resource| resource.id),
            Self::Cost(change) => pick(change, |cost| cost.id),
            Self::Risk(change) => pick(change, |risk| risk.id),
        }
    }

    /// Stable label such as `CREATE_TASK`.
    pub fn label(&self) -> String {
        format!(
            "{}_{}",
            self.action().as_str().to_ascii_uppercase(),
            self.entity_kind().as_str().to_ascii_uppercase()
        )
    }
}

/// Linear, bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct CommandLog {
    undo: VecDeque<UndoEntry>,
    redo: VecDeque<UndoEntry>,
    limit: usize,
}

impl CommandLog {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            limit,
        }
    }

    /// Records a fresh user edit, invalidating any redoable future.
    pub fn record(&mut self, entry: UndoEntry) {
        push_bounded(&mut self.undo, entry, self.limit);
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Most recent undoable entry, if any.
    pub fn peek_undo(&self) -> Option<&UndoEntry> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&UndoEntry> {
        self.redo.back()
    }

    pub(crate) fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo.pop_back()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo.pop_back()
    }

    /// Moves an undone entry onto the redo stack.
    pub(crate) fn push_redo(&mut self, entry: UndoEntry) {
        push_bounded(&mut self.redo, entry, self.limit);
    }

    /// Moves a redone entry back onto the undo stack without touching redo.
    pub(crate) fn push_replayed(&mut self, entry: UndoEntry) {
        push_bounded(&mut self.undo, entry, self.limit);
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<UndoEntry>, entry: UndoEntry, limit: usize) {
    stack.push_back(entry);
    while stack.len() > limit {
        stack.pop_front();
    }
}
