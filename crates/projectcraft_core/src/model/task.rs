//! Task model.
//!
//! # Invariants
//! - `parent_id` links form a forest; the store rejects edits that would make a
//!   task its own ancestor.
//! - `progress` stays within `0..=100`.
//! - Date/duration consistency is owned by callers, not enforced here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::compat;
use super::resource::ResourceId;
use super::EntityId;

/// Stable identifier of a task.
pub type TaskId = EntityId;

pub const DEFAULT_TASK_NAME: &str = "New task";
pub const MAX_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    Standard,
    Milestone,
    Buffer,
}

/// Scheduling link kind between two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish-to-start.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Start-to-start.
    #[serde(rename = "SS")]
    StartToStart,
    /// Finish-to-finish.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Start-to-finish.
    #[serde(rename = "SF")]
    StartToFinish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    pub task_id: TaskId,
    #[serde(rename = "type")]
    pub kind: DependencyType,
    /// Lag in days; negative values express lead time.
    #[serde(default)]
    pub lag: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default, deserialize_with = "compat::optional_id")]
    pub parent_id: Option<TaskId>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub end_date: DateTime<Utc>,
    /// Length in days.
    pub duration: i64,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub assignee_ids: Vec<ResourceId>,
    #[serde(default)]
    pub dependencies: Vec<TaskDependency>,
    #[serde(rename = "type", default)]
    pub kind: TaskType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub order: u32,
}

/// Partial task used for both creation and update.
///
/// `parent_id: Some(None)` detaches a task to the root level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub parent_id: Option<Option<TaskId>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub progress: Option<u8>,
    pub assignee_ids: Option<Vec<ResourceId>>,
    pub dependencies: Option<Vec<TaskDependency>>,
    pub kind: Option<TaskType>,
    pub notes: Option<String>,
    pub order: Option<u32>,
}

impl TaskPatch {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Builds a task from this patch, defaulting to a one-day task starting `now`.
    pub fn into_task(self, id: TaskId, now: DateTime<Utc>, next_order: u32) -> Task {
        let start_date = self.start_date.unwrap_or(now);
        Task {
            id,
            name: self.name.unwrap_or_else(|| DEFAULT_TASK_NAME.to_string()),
            parent_id: self.parent_id.flatten(),
            start_date,
            end_date: self.end_date.unwrap_or(start_date + Duration::days(1)),
            duration: self.duration.unwrap_or(1),
            progress: self.progress.unwrap_or(0).min(MAX_PROGRESS),
            assignee_ids: self.assignee_ids.unwrap_or_default(),
            dependencies: self.dependencies.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            order: self.order.unwrap_or(next_order),
        }
    }

    pub fn apply_to(self, task: &mut Task) {
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(parent_id) = self.parent_id {
            task.parent_id = parent_id;
        }
        if let Some(start_date) = self.start_date {
            task.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            task.end_date = end_date;
        }
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(progress) = self.progress {
            task.progress = progress.min(MAX_PROGRESS);
        }
        if let Some(assignee_ids) = self.assignee_ids {
            task.assignee_ids = assignee_ids;
        }
        if let Some(dependencies) = self.dependencies {
            task.dependencies = dependencies;
        }
        if let Some(kind) = self.kind {
            task.kind = kind;
        }
        if let Some(notes) = self.notes {
            task.notes = notes;
        }
        if let Some(order) = self.order {
            task.order = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DependencyType, TaskDependency, TaskPatch, TaskType, DEFAULT_TASK_NAME};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn empty_patch_yields_one_day_standard_task() {
        let now = Utc::now();
        let task = TaskPatch::default().into_task(Uuid::new_v4(), now, 3);
        assert_eq!(task.name, DEFAULT_TASK_NAME);
        assert_eq!(task.start_date, now);
        assert_eq!(task.end_date, now + Duration::days(1));
        assert_eq!(task.duration, 1);
        assert_eq!(task.kind, TaskType::Standard);
        assert_eq!(task.order, 3);
        assert!(task.parent_id.is_none());
    }

    #[test]
    fn progress_is_clamped() {
        let mut task = TaskPatch::default().into_task(Uuid::new_v4(), Utc::now(), 0);
        TaskPatch {
            progress: Some(250),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);
        assert_eq!(task.progress, 100);
    }

    #[test]
    fn detach_parent_with_nested_none() {
        let parent = Uuid::new_v4();
        let mut task = TaskPatch {
            parent_id: Some(Some(parent)),
            ..TaskPatch::default()
        }
        .into_task(Uuid::new_v4(), Utc::now(), 0);
        assert_eq!(task.parent_id, Some(parent));

        TaskPatch {
            parent_id: Some(None),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);
        assert!(task.parent_id.is_none());
    }

    #[test]
    fn serializes_with_model_field_names() {
        let mut task = TaskPatch::named("Design").into_task(Uuid::new_v4(), Utc::now(), 0);
        task.dependencies.push(TaskDependency {
            task_id: Uuid::new_v4(),
            kind: DependencyType::FinishToStart,
            lag: 2,
        });
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("parentId").is_some());
        assert!(value.get("assigneeIds").is_some());
        assert_eq!(value["type"], "standard");
        assert_eq!(value["dependencies"][0]["type"], "FS");
    }
}
