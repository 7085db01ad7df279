//! Resource model (people and equipment assignable to tasks).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EntityId;

pub type ResourceId = EntityId;

pub const DEFAULT_RESOURCE_NAME: &str = "New resource";
pub const MAX_DAILY_HOURS: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    Human,
    Equipment,
}

/// Available hours per weekday, each within `0..=24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub mon: u8,
    pub tue: u8,
    pub wed: u8,
    pub thu: u8,
    pub fri: u8,
    pub sat: u8,
    pub sun: u8,
}

impl Default for WeeklySchedule {
    /// Monday to Friday, eight hours a day.
    fn default() -> Self {
        Self {
            mon: 8,
            tue: 8,
            wed: 8,
            thu: 8,
            fri: 8,
            sat: 0,
            sun: 0,
        }
    }
}

impl WeeklySchedule {
    pub fn clamped(self) -> Self {
        let clamp = |hours: u8| hours.min(MAX_DAILY_HOURS);
        Self {
            mon: clamp(self.mon),
            tue: clamp(self.tue),
            wed: clamp(self.wed),
            thu: clamp(self.thu),
            fri: clamp(self.fri),
            sat: clamp(self.sat),
            sun: clamp(self.sun),
        }
    }

    pub fn weekly_total(&self) -> u32 {
        [
            self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun,
        ]
        .iter()
        .map(|hours| u32::from(*hours))
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceType,
    #[serde(default)]
    pub available_hours: WeeklySchedule,
    /// Calendar exception dates (days off).
    #[serde(default)]
    pub calendar: Vec<NaiveDate>,
    #[serde(default)]
    pub rate_per_hour: f64,
    #[serde(default)]
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub kind: Option<ResourceType>,
    pub available_hours: Option<WeeklySchedule>,
    pub calendar: Option<Vec<NaiveDate>>,
    pub rate_per_hour: Option<f64>,
    pub contact: Option<String>,
}

impl ResourcePatch {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn into_resource(self, id: ResourceId) -> Resource {
        Resource {
            id,
            name: self
                .name
                .unwrap_or_else(|| DEFAULT_RESOURCE_NAME.to_string()),
            kind: self.kind.unwrap_or_default(),
            available_hours: self.available_hours.unwrap_or_default().clamped(),
            calendar: self.calendar.unwrap_or_default(),
            rate_per_hour: self.rate_per_hour.unwrap_or(0.0),
            contact: self.contact.unwrap_or_default(),
        }
    }

    pub fn apply_to(self, resource: &mut Resource) {
        if let Some(name) = self.name {
            resource.name = name;
        }
        if let Some(kind) = self.kind {
            resource.kind = kind;
        }
        if let Some(available_hours) = self.available_hours {
            resource.available_hours = available_hours.clamped();
        }
        if let Some(calendar) = self.calendar {
            resource.calendar = calendar;
        }
        if let Some(rate_per_hour) = self.rate_per_hour {
            resource.rate_per_hour = rate_per_hour;
        }
        if let Some(contact) = self.contact {
            resource.contact = contact;
        }
    }
}
