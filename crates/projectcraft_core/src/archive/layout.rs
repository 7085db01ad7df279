//! Member names and JSON shapes of the `.mpproj` archive.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ARCHIVE_EXTENSION: &str = "mpproj";
pub const FILE_VERSION: &str = "1.0.0";
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

pub const MANIFEST_MEMBER: &str = "manifest.json";
pub const PROJECT_MEMBER: &str = "project.json";
pub const TASKS_MEMBER: &str = "tasks.json";
pub const RESOURCES_MEMBER: &str = "resources.json";
pub const COSTS_MEMBER: &str = "cost.json";
pub const RISKS_MEMBER: &str = "risklog.json";
pub const SCHEDULE_MEMBER: &str = "schedule.json";
pub const LOG_MEMBER: &str = "meta/log.txt";
pub const META_DIR: &str = "meta/";
pub const ATTACHMENTS_DIR: &str = "attachments/";

static FILE_VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").expect("valid file version regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub project_uuid: Uuid,
    pub file_version: String,
    #[serde(default)]
    pub created_platform: String,
    #[serde(default)]
    pub created_with_version: String,
}

/// `project.json` as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDescriptor {
    pub project_name: String,
    pub description: String,
    pub created_by: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// `project.json` as read; required fields are checked after parsing so a
/// missing one is reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProjectDescriptor {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Reserved schedule tracking member; always empty for now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub baseline: Vec<Value>,
    pub actual: Vec<Value>,
    pub deviation: Vec<Value>,
}

/// Returns the major component of a `MAJOR.MINOR.PATCH` file version.
pub fn major_version(file_version: &str) -> Option<u64> {
    FILE_VERSION_PATTERN
        .captures(file_version.trim())
        .and_then(|captures| captures.get(1))
        .and_then(|major| major.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::{major_version, FILE_VERSION};

    #[test]
    fn major_version_parses_semver_triplets_only() {
        assert_eq!(major_version(FILE_VERSION), Some(1));
        assert_eq!(major_version("2.10.0"), Some(2));
        assert_eq!(major_version("1.0"), None);
        assert_eq!(major_version("v1.0.0"), None);
    }
}
