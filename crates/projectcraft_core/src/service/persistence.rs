//! Persistence use-case service.
//!
//! # Responsibility
//! - Save a document as an archive plus a flat keyed copy.
//! - Load flat copies and import external archives or raw JSON documents.
//! - Maintain the bounded recent-projects list.
//!
//! # Invariants
//! - The archive and every key-value write are built before anything durable
//!   happens.
//! - The flat copy and the recent list are written in one batch.
//! - The archive file is staged before that batch and renamed into place only
//!   after it commits; a failed batch leaves the previous archive on disk.
//! - An import either stores a complete document or changes nothing.

use chrono::{DateTime, Utc};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::layout::ARCHIVE_EXTENSION;
use crate::archive::{looks_like_zip, ArchiveError, ArchiveOrigin, ProjectArchive};
use crate::config::EngineConfig;
use crate::model::document::ProjectDocument;
use crate::model::project::{ProjectId, ProjectState, UNTITLED_PROJECT_NAME};
use crate::model::recent::{upsert_recent, RecentProject};
use crate::repo::keys::{project_key, RECENT_PROJECTS_KEY};
use crate::repo::kv_repo::{KeyValueStore, KvWrite, RepoError};

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug)]
pub enum PersistenceError {
    Repo(RepoError),
    Archive(ArchiveError),
    Serialize(serde_json::Error),
    /// External input is not a project document.
    Malformed(String),
    /// Save was requested while no project is open.
    NoOpenProject,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Archive(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize project: {err}"),
            Self::Malformed(message) => write!(f, "malformed project input: {message}"),
            Self::NoOpenProject => write!(f, "no project is open"),
            Self::Io { path, source } => write!(f, "io error at {}: {source}", path.display()),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Archive(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Malformed(_) | Self::NoOpenProject => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for PersistenceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ArchiveError> for PersistenceError {
    fn from(value: ArchiveError) -> Self {
        Self::Archive(value)
    }
}

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SavedArchive {
    pub file_name: String,
    /// Archive location on disk, or the bare archive file name when no
    /// archive root is configured.
    pub file_path: String,
    pub archive: ProjectArchive,
}

/// Persistence facade over a key-value store and an optional archive root.
pub struct PersistenceService<S: KeyValueStore> {
    store: S,
    origin: ArchiveOrigin,
    archive_root: Option<PathBuf>,
    recent_limit: usize,
}

impl<S: KeyValueStore> PersistenceService<S> {
    pub fn new(store: S, config: &EngineConfig) -> Self {
        Self {
            store,
            origin: ArchiveOrigin {
                created_platform: config.created_platform.clone(),
                created_with_version: config.created_with_version.clone(),
            },
            archive_root: config.archive_root.clone(),
            recent_limit: config.recent_limit,
        }
    }

    /// Saves `document` under `file_name`.
    ///
    /// The caller passes the document exactly as it should be stored,
    /// lifecycle fields included.
    pub fn save(
        &self,
        document: &ProjectDocument,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> PersistenceResult<SavedArchive> {
        let project_id = document.project.id;
        info!("event=project_save module=persistence status=start project={project_id}");

        let file_name = sanitize_file_name(file_name);
        let archive_name = format!("{file_name}.{ARCHIVE_EXTENSION}");
        let archive = ProjectArchive::from_document(document, &self.origin, now)
            .inspect_err(|err| log_failure("project_save", project_id, err))?;
        let file_path = match &self.archive_root {
            Some(root) => root.join(&archive_name).display().to_string(),
            None => archive_name.clone(),
        };

        let recent = RecentProject {
            file_name: file_name.clone(),
            file_path: file_path.clone(),
            opened_at: now,
            project_uuid: project_id,
            is_temporary: document.project.is_untitled,
        };
        let writes = self.flat_copy_writes(document, recent)?;

        let staged = match &self.archive_root {
            Some(root) => Some(
                archive
                    .stage(&root.join(&archive_name))
                    .inspect_err(|err| log_failure("project_save", project_id, err))?,
            ),
            None => None,
        };
        self.store
            .write_batch(&writes)
            .inspect_err(|err| log_failure("project_save", project_id, err))?;
        if let Some(staged) = staged {
            staged
                .commit()
                .inspect_err(|err| log_failure("project_save", project_id, err))?;
        }

        info!("event=project_save module=persistence status=ok project={project_id}");
        Ok(SavedArchive {
            file_name,
            file_path,
            archive,
        })
    }

    /// Returns the flat copy stored for `project_id`.
    pub fn load(&self, project_id: ProjectId) -> PersistenceResult<Option<ProjectDocument>> {
        let document = self
            .store
            .get_json::<ProjectDocument>(&project_key(project_id))?;
        info!(
            "event=project_load module=persistence status={} project={project_id}",
            if document.is_some() { "ok" } else { "skip" }
        );
        Ok(document)
    }

    /// Imports an in-memory archive and stores it as a flat copy.
    pub fn import_archive(
        &self,
        archive: &ProjectArchive,
        now: DateTime<Utc>,
    ) -> PersistenceResult<ProjectDocument> {
        let document = archive.to_document(now).inspect_err(|err| {
            error!("event=project_import module=persistence status=error source=archive error={err}");
        })?;
        self.store_imported(document, None, now)
    }

    /// Imports a raw JSON document as produced by the flat copy.
    pub fn import_json(&self, raw: &str, now: DateTime<Utc>) -> PersistenceResult<ProjectDocument> {
        let mut document: ProjectDocument = serde_json::from_str(raw).map_err(|err| {
            error!("event=project_import module=persistence status=error source=json error={err}");
            PersistenceError::Malformed(err.to_string())
        })?;
        document.project.current_state = ProjectState::Saved;
        document.project.has_unsaved_changes = false;
        document.project.is_untitled = false;
        self.store_imported(document, None, now)
    }

    /// Imports a `.mpproj` zip or a raw JSON file from disk, told apart by
    /// content rather than extension.
    pub fn import_path(&self, path: &Path, now: DateTime<Utc>) -> PersistenceResult<ProjectDocument> {
        let bytes = fs::read(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if looks_like_zip(&bytes) {
            let document = ProjectArchive::from_zip(&bytes)
                .and_then(|archive| archive.to_document(now))
                .inspect_err(|err| {
                    error!("event=project_import module=persistence status=error source=zip error={err}");
                })?;
            let file_path = path.display().to_string();
            return self.store_imported(document, Some(file_path), now);
        }

        let raw = String::from_utf8(bytes).map_err(|err| {
            error!("event=project_import module=persistence status=error source=file error={err}");
            PersistenceError::Malformed(err.to_string())
        })?;
        self.import_json(&raw, now)
    }

    /// Upserts `entry` at the head of the recent list.
    pub fn add_recent_project(&self, entry: RecentProject) -> PersistenceResult<()> {
        let mut recent = self.recent_projects()?;
        upsert_recent(&mut recent, entry, self.recent_limit);
        self.store.put_json(RECENT_PROJECTS_KEY, &recent)?;
        Ok(())
    }

    /// Most-recent-first list of opened projects.
    pub fn recent_projects(&self) -> PersistenceResult<Vec<RecentProject>> {
        Ok(self
            .store
            .get_json::<Vec<RecentProject>>(RECENT_PROJECTS_KEY)?
            .unwrap_or_default())
    }

    fn store_imported(
        &self,
        document: ProjectDocument,
        file_path: Option<String>,
        now: DateTime<Utc>,
    ) -> PersistenceResult<ProjectDocument> {
        let file_name = sanitize_file_name(&document.project.name);
        let recent = RecentProject {
            file_path: file_path
                .unwrap_or_else(|| format!("{file_name}.{ARCHIVE_EXTENSION}")),
            file_name,
            opened_at: now,
            project_uuid: document.project.id,
            is_temporary: false,
        };
        let writes = self.flat_copy_writes(&document, recent)?;
        self.store.write_batch(&writes)?;
        info!(
            "event=project_import module=persistence status=ok project={} tasks={} resources={} costs={} risks={}",
            document.project.id,
            document.tasks.len(),
            document.resources.len(),
            document.costs.len(),
            document.risks.len()
        );
        Ok(document)
    }

    fn flat_copy_writes(
        &self,
        document: &ProjectDocument,
        recent_entry: RecentProject,
    ) -> PersistenceResult<Vec<KvWrite>> {
        let mut recent = self.recent_projects()?;
        upsert_recent(&mut recent, recent_entry, self.recent_limit);
        Ok(vec![
            KvWrite::put_json(project_key(document.project.id), document)?,
            KvWrite::put_json(RECENT_PROJECTS_KEY, &recent)?,
        ])
    }
}

/// Keeps archive names to a single path segment.
fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        UNTITLED_PROJECT_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

fn log_failure(event: &str, project_id: ProjectId, err: &dyn Display) {
    error!("event={event} module=persistence status=error project={project_id} error={err}");
}
