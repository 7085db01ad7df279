//! Storage key-space layout.
//!
//! - `project_<id>`: flat copy of one saved document.
//! - `recentProjects`: recent-project list.
//! - `projectSnapshots`: snapshot index.
//! - `<snapshot id>`: one snapshot payload.

use crate::model::project::ProjectId;

pub const RECENT_PROJECTS_KEY: &str = "recentProjects";
pub const SNAPSHOT_INDEX_KEY: &str = "projectSnapshots";
pub const PROJECT_KEY_PREFIX: &str = "project_";
pub const SNAPSHOT_KEY_PREFIX: &str = "snapshot_";

pub fn project_key(id: ProjectId) -> String {
    format!("{PROJECT_KEY_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::project_key;
    use uuid::Uuid;

    #[test]
    fn project_key_embeds_hyphenated_uuid() {
        let id = Uuid::parse_str("6f1c2a9e-3b4d-4f5a-9c8e-1a2b3c4d5e6f").unwrap();
        assert_eq!(
            project_key(id),
            "project_6f1c2a9e-3b4d-4f5a-9c8e-1a2b3c4d5e6f"
        );
    }
}
