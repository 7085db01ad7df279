//! Snapshot index and payload records.
//!
//! # Invariants
//! - A snapshot is immutable once written; only deletion removes it.
//! - Index records never embed the document payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::ProjectDocument;
use super::project::ProjectId;

/// Storage key of one snapshot, derived from project id and timestamp.
pub type SnapshotId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    Auto,
    Manual,
    #[serde(rename = "Crash Recovery")]
    CrashRecovery,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::CrashRecovery => "crash_recovery",
        }
    }
}

/// Lightweight index entry listed without loading payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub id: SnapshotId,
    pub project_id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
}

/// Stored payload: the index fields plus the full document copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    #[serde(flatten)]
    pub record: SnapshotRecord,
    pub data: ProjectDocument,
}
