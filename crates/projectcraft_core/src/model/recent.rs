//! Recently opened project list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::project::ProjectId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub file_name: String,
    pub file_path: String,
    pub opened_at: DateTime<Utc>,
    #[serde(rename = "projectUUID")]
    pub project_uuid: ProjectId,
    /// True when the project was still untitled at save time.
    pub is_temporary: bool,
}

/// Moves `entry` to the head of `list`, replacing any entry for the same
/// project and truncating to `limit`.
pub fn upsert_recent(list: &mut Vec<RecentProject>, entry: RecentProject, limit: usize) {
    list.retain(|existing| existing.project_uuid != entry.project_uuid);
    list.insert(0, entry);
    list.truncate(limit);
}
