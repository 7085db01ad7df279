//! Risk log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::compat;
use super::task::TaskId;
use super::EntityId;

pub type RiskId = EntityId;

pub const DEFAULT_RISK_TITLE: &str = "New risk";

/// Shared scale for impact and probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[default]
    Open,
    Mitigated,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub id: RiskId,
    #[serde(default, deserialize_with = "compat::optional_id")]
    pub task_id: Option<TaskId>,
    #[serde(deserialize_with = "compat::timestamp")]
    pub identified_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact_level: RiskLevel,
    #[serde(default)]
    pub probability: RiskLevel,
    #[serde(default)]
    pub mitigation_plan: String,
    #[serde(default)]
    pub status: RiskStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskPatch {
    pub task_id: Option<Option<TaskId>>,
    pub identified_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub impact_level: Option<RiskLevel>,
    pub probability: Option<RiskLevel>,
    pub mitigation_plan: Option<String>,
    pub status: Option<RiskStatus>,
}

impl RiskPatch {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn into_risk(self, id: RiskId, now: DateTime<Utc>) -> Risk {
        Risk {
            id,
            task_id: self.task_id.flatten(),
            identified_at: self.identified_at.unwrap_or(now),
            title: self.title.unwrap_or_else(|| DEFAULT_RISK_TITLE.to_string()),
            description: self.description.unwrap_or_default(),
            impact_level: self.impact_level.unwrap_or_default(),
            probability: self.probability.unwrap_or_default(),
            mitigation_plan: self.mitigation_plan.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
        }
    }

    pub fn apply_to(self, risk: &mut Risk) {
        if let Some(task_id) = self.task_id {
            risk.task_id = task_id;
        }
        if let Some(identified_at) = self.identified_at {
            risk.identified_at = identified_at;
        }
        if let Some(title) = self.title {
            risk.title = title;
        }
        if let Some(description) = self.description {
            risk.description = description;
        }
        if let Some(impact_level) = self.impact_level {
            risk.impact_level = impact_level;
        }
        if let Some(probability) = self.probability {
            risk.probability = probability;
        }
        if let Some(mitigation_plan) = self.mitigation_plan {
            risk.mitigation_plan = mitigation_plan;
        }
        if let Some(status) = self.status {
            risk.status = status;
        }
    }
}
