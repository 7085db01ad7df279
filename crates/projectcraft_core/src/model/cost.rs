//! Cost ledger model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::compat;
use super::task::TaskId;
use super::EntityId;

pub type CostId = EntityId;

pub const DEFAULT_CURRENCY: &str = "TWD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    #[serde(alias = "人事")]
    Personnel,
    #[serde(alias = "設備")]
    Equipment,
    #[default]
    #[serde(alias = "其他")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStatus {
    #[default]
    Pending,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: CostId,
    /// May reference a task that no longer exists.
    #[serde(default, deserialize_with = "compat::optional_id")]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub category: CostCategory,
    pub currency: String,
    #[serde(deserialize_with = "compat::timestamp")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub invoice_id: String,
    #[serde(default)]
    pub status: CostStatus,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostPatch {
    pub task_id: Option<Option<TaskId>>,
    pub amount: Option<f64>,
    pub category: Option<CostCategory>,
    pub currency: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub invoice_id: Option<String>,
    pub status: Option<CostStatus>,
    pub note: Option<String>,
}

impl CostPatch {
    pub fn into_cost(self, id: CostId, now: DateTime<Utc>) -> Cost {
        Cost {
            id,
            task_id: self.task_id.flatten(),
            amount: self.amount.unwrap_or(0.0),
            category: self.category.unwrap_or_default(),
            currency: self
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            date: self.date.unwrap_or(now),
            invoice_id: self.invoice_id.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            note: self.note.unwrap_or_default(),
        }
    }

    pub fn apply_to(self, cost: &mut Cost) {
        if let Some(task_id) = self.task_id {
            cost.task_id = task_id;
        }
        if let Some(amount) = self.amount {
            cost.amount = amount;
        }
        if let Some(category) = self.category {
            cost.category = category;
        }
        if let Some(currency) = self.currency {
            cost.currency = currency;
        }
        if let Some(date) = self.date {
            cost.date = date;
        }
        if let Some(invoice_id) = self.invoice_id {
            cost.invoice_id = invoice_id;
        }
        if let Some(status) = self.status {
            cost.status = status;
        }
        if let Some(note) = self.note {
            cost.note = note;
        }
    }
}
