//! Zip encoding of an archive and its placement on disk.
//!
//! # Invariants
//! - The zip is encoded fully in memory before any file is created.
//! - `target` only changes through a rename of a synced staging file, so
//!   readers see either the previous archive or the new one.
//! - A staged archive that is never committed removes its staging file.

use log::{info, warn};
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{ArchiveError, ArchiveResult, ProjectArchive};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Returns whether `bytes` start with a zip local file header.
pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC)
}

impl ProjectArchive {
    /// Encodes every member into a deflated zip.
    pub fn to_zip(&self) -> ArchiveResult<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in &self.members {
            if name.ends_with('/') {
                writer.add_directory(name.clone(), options)?;
            } else {
                writer.start_file(name.clone(), options)?;
                writer.write_all(content).map_err(ZipError::Io)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }

    /// Decodes a zip produced by this crate or by the desktop app.
    pub fn from_zip(bytes: &[u8]) -> ArchiveResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut archive = Self::default();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let name = entry.name().trim_start_matches('/').to_string();
            if entry.is_dir() {
                archive.insert(name, Vec::new());
                continue;
            }
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(ZipError::Io)?;
            archive.insert(name, content);
        }
        Ok(archive)
    }

    /// Encodes and writes the archive next to `target` without touching it.
    pub fn stage(&self, target: &Path) -> ArchiveResult<StagedArchive> {
        let bytes = self.to_zip()?;
        let parent = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|err| ArchiveError::io(parent, err))?;

        let staged = StagedArchive {
            staging: staging_path(parent, target),
            target: target.to_path_buf(),
            committed: false,
        };
        write_synced(&staged.staging, &bytes)?;
        Ok(staged)
    }

    /// Writes the archive to `target`, replacing any previous file.
    pub fn write_to_file(&self, target: &Path) -> ArchiveResult<()> {
        self.stage(target)?.commit()
    }

    pub fn read_from_file(path: &Path) -> ArchiveResult<Self> {
        let bytes = fs::read(path).map_err(|err| ArchiveError::io(path, err))?;
        Self::from_zip(&bytes)
    }
}

/// Archive bytes parked beside their destination, awaiting `commit`.
#[derive(Debug)]
pub struct StagedArchive {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedArchive {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Moves the staged file over the target.
    pub fn commit(mut self) -> ArchiveResult<()> {
        fs::rename(&self.staging, &self.target)
            .map_err(|err| ArchiveError::io(&self.target, err))?;
        self.committed = true;
        info!(
            "event=archive_write module=archive status=ok path={}",
            self.target.display()
        );
        Ok(())
    }
}

impl Drop for StagedArchive {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.staging) {
            warn!("event=archive_cleanup module=archive status=error error={err}");
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> ArchiveResult<()> {
    let result = File::create(path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    result.map_err(|err| {
        let _ = fs::remove_file(path);
        ArchiveError::io(path, err)
    })
}

fn staging_path(parent: &Path, target: &Path) -> PathBuf {
    let stem = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    parent.join(format!(".{stem}.tmp-{}", Uuid::new_v4().simple()))
}
