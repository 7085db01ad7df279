//! Project metadata model.
//!
//! # Responsibility
//! - Define the project descriptor owned by every document.
//! - Provide the lifecycle state enum persisted with the descriptor.
//!
//! # Invariants
//! - `id` is assigned once and never changes for the project lifetime.
//! - `is_untitled` is true iff the project was never explicitly named.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::compat;

/// Stable identifier of a project document.
pub type ProjectId = Uuid;

/// Display name given to projects created without an explicit name.
pub const UNTITLED_PROJECT_NAME: &str = "Untitled project";

/// Creator recorded on projects created by the local user.
pub const DEFAULT_CREATOR: &str = "User";

/// Persistence lifecycle state of the active project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectState {
    /// No project has been created or loaded yet.
    #[default]
    Uninitialized,
    /// Fresh project that has never been saved.
    Untitled,
    /// Open for editing with no pending changes.
    Editing,
    /// Unsaved mutations exist.
    Dirty,
    /// Matches the last durable save.
    Saved,
    /// Caller is navigating away from the project.
    Closing,
}

impl ProjectState {
    /// Returns whether `next` is a listed edge of the lifecycle graph.
    ///
    /// Re-entering the current state is always allowed. Creating a new project
    /// is a reset, not a transition, and does not consult this table.
    pub fn can_transition_to(self, next: ProjectState) -> bool {
        use ProjectState::*;

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Uninitialized, Untitled)
                | (Closing, Untitled)
                | (Untitled, Editing)
                | (Saved, Editing)
                | (Untitled, Dirty)
                | (Editing, Dirty)
                | (Saved, Dirty)
                | (Uninitialized, Saved)
                | (Untitled, Saved)
                | (Editing, Saved)
                | (Dirty, Saved)
                | (Closing, Saved)
                | (Untitled, Closing)
                | (Editing, Closing)
                | (Dirty, Closing)
                | (Saved, Closing)
        )
    }

    /// Returns whether a project is open in this state.
    pub fn is_open(self) -> bool {
        !matches!(self, ProjectState::Uninitialized | ProjectState::Closing)
    }
}

/// Project descriptor persisted alongside the entity collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub current_state: ProjectState,
    #[serde(default)]
    pub has_unsaved_changes: bool,
    #[serde(default)]
    pub is_untitled: bool,
}

impl Project {
    /// Creates a fresh project in `Untitled` state spanning one month from `now`.
    pub fn new(name: Option<&str>, now: DateTime<Utc>) -> Self {
        let named = name.map(str::trim).filter(|value| !value.is_empty());
        Self {
            id: Uuid::new_v4(),
            name: named.unwrap_or(UNTITLED_PROJECT_NAME).to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
            start_date: now,
            end_date: now.checked_add_months(Months::new(1)).unwrap_or(now),
            created_by: DEFAULT_CREATOR.to_string(),
            current_state: ProjectState::Untitled,
            has_unsaved_changes: false,
            is_untitled: named.is_none(),
        }
    }
}

/// Partial update for project metadata.
///
/// Identity and lifecycle fields are deliberately absent: they only change
/// through lifecycle transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ProjectPatch {
    pub fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(created_by) = self.created_by {
            project.created_by = created_by;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
    }
}
