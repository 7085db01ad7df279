//! Backing database for the flat project key-space.
//!
//! # Responsibility
//! - Open the SQLite file (or memory database) that holds flat copies,
//!   snapshots and the recent list.
//! - Bring its schema to the version this build understands and confirm the
//!   key-space table has the expected shape.
//!
//! # Invariants
//! - A connection handed out by this module has a usable `kv_entries` table.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A migration script failed; nothing from the pending run was kept.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The schema version matches but `kv_entries` lacks a column, e.g. the
    /// file belongs to another application.
    KeySpaceMismatch { missing_column: &'static str },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "project store schema {db_version} was written by a newer build (supported up to {latest_supported})"
            ),
            Self::KeySpaceMismatch { missing_column } => write!(
                f,
                "database is not a project store: kv_entries lacks column `{missing_column}`"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::KeySpaceMismatch { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
