//! `.mpproj` archive container.
//!
//! # Responsibility
//! - Build the complete member set of an archive from a document in memory.
//! - Parse an archive back into a document, rejecting malformed input whole.
//! - Carry the member set to and from a zip file (`container`).
//!
//! # Invariants
//! - An archive is fully built before any byte reaches the disk.
//! - Parsing never yields a partial document: any member error aborts.
//! - Folder members end with `/` and carry no content.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;
use zip::result::ZipError;

use crate::model::document::ProjectDocument;
use crate::model::project::{Project, ProjectState, DEFAULT_CREATOR};

mod container;
pub mod layout;

pub(crate) use container::looks_like_zip;
pub use container::StagedArchive;

use layout::{
    major_version, Manifest, ProjectDescriptor, RawProjectDescriptor, ScheduleRecord,
    ATTACHMENTS_DIR, COSTS_MEMBER, FILE_VERSION, LOG_MEMBER, MANIFEST_MEMBER, META_DIR,
    PROJECT_MEMBER, RESOURCES_MEMBER, RISKS_MEMBER, SCHEDULE_MEMBER, SUPPORTED_MAJOR_VERSION,
    TASKS_MEMBER,
};

pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[derive(Debug)]
pub enum ArchiveError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    MissingMember(&'static str),
    InvalidJson {
        member: String,
        source: serde_json::Error,
    },
    MissingField {
        member: &'static str,
        field: &'static str,
    },
    UnsupportedVersion(String),
    /// The container is not a readable zip.
    Zip(ZipError),
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for ArchiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "archive io error at {}: {source}", path.display()),
            Self::MissingMember(member) => write!(f, "archive is missing `{member}`"),
            Self::InvalidJson { member, source } => {
                write!(f, "archive member `{member}` is not valid JSON: {source}")
            }
            Self::MissingField { member, field } => {
                write!(f, "archive member `{member}` lacks required field `{field}`")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported archive file version `{version}`")
            }
            Self::Zip(err) => write!(f, "archive container error: {err}"),
        }
    }
}

impl Error for ArchiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidJson { source, .. } => Some(source),
            Self::Zip(err) => Some(err),
            Self::MissingMember(_) | Self::MissingField { .. } | Self::UnsupportedVersion(_) => None,
        }
    }
}

impl From<ZipError> for ArchiveError {
    fn from(value: ZipError) -> Self {
        Self::Zip(value)
    }
}

/// Producer identity stamped into `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOrigin {
    pub created_platform: String,
    pub created_with_version: String,
}

impl Default for ArchiveOrigin {
    fn default() -> Self {
        Self {
            created_platform: std::env::consts::OS.to_string(),
            created_with_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// In-memory archive: member path to content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectArchive {
    members: BTreeMap<String, Vec<u8>>,
}

impl ProjectArchive {
    /// Serializes every member of `document` into a fresh archive.
    pub fn from_document(
        document: &ProjectDocument,
        origin: &ArchiveOrigin,
        now: DateTime<Utc>,
    ) -> ArchiveResult<Self> {
        let project = &document.project;
        let mut archive = Self::default();

        archive.insert_json(
            MANIFEST_MEMBER,
            &Manifest {
                project_uuid: project.id,
                file_version: FILE_VERSION.to_string(),
                created_platform: origin.created_platform.clone(),
                created_with_version: origin.created_with_version.clone(),
            },
        )?;
        archive.insert_json(
            PROJECT_MEMBER,
            &ProjectDescriptor {
                project_name: project.name.clone(),
                description: project.description.clone(),
                created_by: project.created_by.clone(),
                start_date: project.start_date,
                end_date: project.end_date,
            },
        )?;
        archive.insert_json(TASKS_MEMBER, &document.tasks)?;
        archive.insert_json(RESOURCES_MEMBER, &document.resources)?;
        archive.insert_json(COSTS_MEMBER, &document.costs)?;
        archive.insert_json(RISKS_MEMBER, &document.risks)?;
        archive.insert_json(SCHEDULE_MEMBER, &ScheduleRecord::default())?;
        archive.insert_dir(META_DIR);
        archive.insert(
            LOG_MEMBER,
            format!(
                "Project created: {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            )
            .into_bytes(),
        );
        archive.insert_dir(ATTACHMENTS_DIR);
        Ok(archive)
    }

    /// Rebuilds a document from the archive members.
    ///
    /// The imported project is `Saved`, named, and stamped with `now`. A
    /// missing manifest yields a fresh project id; missing entity members
    /// yield empty collections.
    pub fn to_document(&self, now: DateTime<Utc>) -> ArchiveResult<ProjectDocument> {
        let manifest = self.read_json::<Manifest>(MANIFEST_MEMBER)?;
        if let Some(manifest) = &manifest {
            check_version(&manifest.file_version)?;
        }

        let descriptor = self
            .read_json::<RawProjectDescriptor>(PROJECT_MEMBER)?
            .ok_or(ArchiveError::MissingMember(PROJECT_MEMBER))?;
        let name = required(descriptor.project_name, "project_name")?;
        let start_date = required(descriptor.start_date, "start_date")?;
        let end_date = required(descriptor.end_date, "end_date")?;

        let project = Project {
            id: manifest
                .map(|manifest| manifest.project_uuid)
                .unwrap_or_else(Uuid::new_v4),
            name,
            description: descriptor.description.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            start_date,
            end_date,
            created_by: descriptor
                .created_by
                .unwrap_or_else(|| DEFAULT_CREATOR.to_string()),
            current_state: ProjectState::Saved,
            has_unsaved_changes: false,
            is_untitled: false,
        };

        Ok(ProjectDocument {
            project,
            tasks: self.read_json(TASKS_MEMBER)?.unwrap_or_default(),
            resources: self.read_json(RESOURCES_MEMBER)?.unwrap_or_default(),
            costs: self.read_json(COSTS_MEMBER)?.unwrap_or_default(),
            risks: self.read_json(RISKS_MEMBER)?.unwrap_or_default(),
        })
    }

    pub fn member(&self, name: &str) -> Option<&[u8]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, content: Vec<u8>) {
        self.members.insert(name.into(), content);
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.members.remove(name)
    }

    fn insert_dir(&mut self, name: &str) {
        self.members.insert(name.to_string(), Vec::new());
    }

    fn insert_json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> ArchiveResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArchiveError::InvalidJson {
            member: name.to_string(),
            source,
        })?;
        self.insert(name, bytes);
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, name: &'static str) -> ArchiveResult<Option<T>> {
        let Some(bytes) = self.member(name) else {
            return Ok(None);
        };
        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|source| ArchiveError::InvalidJson {
                member: name.to_string(),
                source,
            })
    }
}

fn check_version(file_version: &str) -> ArchiveResult<()> {
    match major_version(file_version) {
        Some(major) if major <= SUPPORTED_MAJOR_VERSION => Ok(()),
        _ => Err(ArchiveError::UnsupportedVersion(file_version.to_string())),
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> ArchiveResult<T> {
    value.ok_or(ArchiveError::MissingField {
        member: PROJECT_MEMBER,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::layout::{
        ATTACHMENTS_DIR, LOG_MEMBER, MANIFEST_MEMBER, PROJECT_MEMBER, SCHEDULE_MEMBER,
        TASKS_MEMBER,
    };
    use super::{ArchiveError, ArchiveOrigin, ProjectArchive};
    use crate::model::document::ProjectDocument;
    use crate::model::project::ProjectState;
    use crate::model::task::TaskPatch;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample() -> ProjectDocument {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut document = ProjectDocument::new(Some("Bridge"), now);
        document
            .tasks
            .push(TaskPatch::named("Survey").into_task(Uuid::new_v4(), now, 0));
        document
    }

    fn build(document: &ProjectDocument) -> ProjectArchive {
        ProjectArchive::from_document(document, &ArchiveOrigin::default(), Utc::now()).unwrap()
    }

    #[test]
    fn builds_every_member() {
        let archive = build(&sample());
        for member in [
            MANIFEST_MEMBER,
            PROJECT_MEMBER,
            TASKS_MEMBER,
            "resources.json",
            "cost.json",
            "risklog.json",
            SCHEDULE_MEMBER,
            LOG_MEMBER,
            ATTACHMENTS_DIR,
        ] {
            assert!(archive.contains(member), "missing {member}");
        }
        let log = String::from_utf8(archive.member(LOG_MEMBER).unwrap().to_vec()).unwrap();
        assert!(log.starts_with("Project created: "));

        let schedule: serde_json::Value =
            serde_json::from_slice(archive.member(SCHEDULE_MEMBER).unwrap()).unwrap();
        assert_eq!(
            schedule,
            serde_json::json!({ "baseline": [], "actual": [], "deviation": [] })
        );
    }

    #[test]
    fn parse_restores_collections_and_marks_saved() {
        let document = sample();
        let imported = build(&document).to_document(Utc::now()).unwrap();

        assert!(imported.same_entities(&document));
        assert_eq!(imported.project.id, document.project.id);
        assert_eq!(imported.project.name, "Bridge");
        assert_eq!(imported.project.current_state, ProjectState::Saved);
        assert!(!imported.project.is_untitled);
    }

    #[test]
    fn missing_manifest_assigns_fresh_id() {
        let document = sample();
        let mut archive = build(&document);
        archive.remove(MANIFEST_MEMBER);

        let imported = archive.to_document(Utc::now()).unwrap();
        assert_ne!(imported.project.id, document.project.id);
    }

    #[test]
    fn missing_project_member_is_rejected() {
        let mut archive = build(&sample());
        archive.remove(PROJECT_MEMBER);
        assert!(matches!(
            archive.to_document(Utc::now()),
            Err(ArchiveError::MissingMember(PROJECT_MEMBER))
        ));
    }

    #[test]
    fn missing_descriptor_field_is_rejected() {
        let mut archive = build(&sample());
        archive.insert(
            PROJECT_MEMBER,
            br#"{"project_name":"x","start_date":"2024-01-01T00:00:00Z"}"#.to_vec(),
        );
        assert!(matches!(
            archive.to_document(Utc::now()),
            Err(ArchiveError::MissingField {
                field: "end_date",
                ..
            })
        ));
    }

    #[test]
    fn invalid_member_json_is_rejected() {
        let mut archive = build(&sample());
        archive.insert(TASKS_MEMBER, b"[{".to_vec());
        match archive.to_document(Utc::now()) {
            Err(ArchiveError::InvalidJson { member, .. }) => assert_eq!(member, TASKS_MEMBER),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn newer_major_version_is_rejected() {
        let mut archive = build(&sample());
        let manifest = serde_json::json!({
            "project_uuid": Uuid::new_v4(),
            "file_version": "2.0.0",
        });
        archive.insert(MANIFEST_MEMBER, serde_json::to_vec(&manifest).unwrap());
        assert!(matches!(
            archive.to_document(Utc::now()),
            Err(ArchiveError::UnsupportedVersion(version)) if version == "2.0.0"
        ));
    }
}
