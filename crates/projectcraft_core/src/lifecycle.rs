//! Project lifecycle state machine.
//!
//! # Responsibility
//! - Apply persistence-state transitions to the project descriptor.
//! - Expose the navigation query callers use to prompt save/discard/cancel.
//!
//! # Invariants
//! - Transitions never fail; an unlisted edge is applied and logged.
//! - Only `mark_dirty` sets `has_unsaved_changes`; only `mark_saved` clears it.
//! - There is no edge from `Dirty` back to `Untitled`.

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::model::project::{Project, ProjectState};

/// Pure snapshot of what a caller needs before navigating away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCheck {
    pub state: ProjectState,
    pub name: String,
    /// True when leaving would drop unsaved changes.
    pub requires_prompt: bool,
}

/// Transitions to `Dirty` unless already there.
///
/// Returns whether a transition happened.
pub fn mark_dirty(project: &mut Project, now: DateTime<Utc>) -> bool {
    if project.current_state == ProjectState::Dirty {
        return false;
    }
    transition(project, ProjectState::Dirty);
    project.has_unsaved_changes = true;
    project.updated_at = now;
    true
}

/// Records a successful durable save.
pub fn mark_saved(project: &mut Project, now: DateTime<Utc>) {
    transition(project, ProjectState::Saved);
    project.has_unsaved_changes = false;
    project.updated_at = now;
}

/// Names the project ahead of a save-as; the save itself still has to run.
pub fn apply_save_as_name(project: &mut Project, name: &str) {
    project.name = name.to_string();
    project.is_untitled = false;
}

/// Enters `Editing` from `Untitled` or `Saved`; other states are left alone.
pub fn begin_editing(project: &mut Project) -> bool {
    match project.current_state {
        ProjectState::Untitled | ProjectState::Saved => {
            transition(project, ProjectState::Editing);
            true
        }
        _ => false,
    }
}

/// Enters `Closing` and returns the navigation check taken just before.
pub fn begin_closing(project: &mut Project) -> NavigationCheck {
    let check = navigation_check(project);
    if project.current_state.is_open() {
        transition(project, ProjectState::Closing);
    }
    check
}

pub fn navigation_check(project: &Project) -> NavigationCheck {
    NavigationCheck {
        state: project.current_state,
        name: project.name.clone(),
        requires_prompt: project.current_state == ProjectState::Dirty
            || project.has_unsaved_changes,
    }
}

fn transition(project: &mut Project, next: ProjectState) {
    let current = project.current_state;
    if !current.can_transition_to(next) {
        warn!(
            "event=lifecycle_transition module=lifecycle status=unlisted from={:?} to={:?}",
            current, next
        );
    } else {
        debug!(
            "event=lifecycle_transition module=lifecycle status=ok from={:?} to={:?}",
            current, next
        );
    }
    project.current_state = next;
}
