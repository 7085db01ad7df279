//! Whole-document aggregate.
//!
//! # Responsibility
//! - Group project metadata with its four entity collections.
//! - Serve as the unit for flat copies, snapshots and raw JSON import.
//!
//! # Invariants
//! - Missing collections deserialize as empty vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cost::Cost;
use super::project::Project;
use super::resource::Resource;
use super::risk::Risk;
use super::task::Task;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub project: Project,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub costs: Vec<Cost>,
    #[serde(default)]
    pub risks: Vec<Risk>,
}

impl ProjectDocument {
    /// Creates an empty document around a fresh project.
    pub fn new(name: Option<&str>, now: DateTime<Utc>) -> Self {
        Self::from_project(Project::new(name, now))
    }

    pub fn from_project(project: Project) -> Self {
        Self {
            project,
            tasks: Vec::new(),
            resources: Vec::new(),
            costs: Vec::new(),
            risks: Vec::new(),
        }
    }

    /// Returns whether all four entity collections are empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.resources.is_empty()
            && self.costs.is_empty()
            && self.risks.is_empty()
    }

    /// Returns whether both documents hold element-wise equal collections,
    /// ignoring project metadata.
    pub fn same_entities(&self, other: &ProjectDocument) -> bool {
        self.tasks == other.tasks
            && self.resources == other.resources
            && self.costs == other.costs
            && self.risks == other.risks
    }
}
