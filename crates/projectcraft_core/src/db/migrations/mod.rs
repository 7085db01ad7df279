//! Schema steps for the project key-space.
//!
//! # Invariants
//! - Steps are listed by strictly increasing `version`.
//! - All pending steps run in one transaction; the reached version is stored
//!   in `PRAGMA user_version` inside that same transaction.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Table every persisted key lives in.
pub const KEY_SPACE_TABLE: &str = "kv_entries";

/// Columns the repository reads and writes.
const KEY_SPACE_COLUMNS: &[&str] = &["key", "value", "updated_at"];

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "kv_entries",
    sql: include_str!("0001_kv_entries.sql"),
}];

/// Outcome of bringing a database up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Names of the steps applied by this run, oldest first.
    pub applied: Vec<&'static str>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Latest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Runs every step newer than the stored schema version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = schema_version(conn)?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            applied: Vec::new(),
        });
    }

    let tx = conn.transaction()?;
    for migration in &pending {
        tx.execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            })
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
    }
    tx.commit()?;

    Ok(MigrationReport {
        from_version,
        to_version: latest,
        applied: pending.iter().map(|migration| migration.name).collect(),
    })
}

/// Confirms `kv_entries` carries every column the repository uses.
pub fn verify_key_space(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({KEY_SPACE_TABLE});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    match KEY_SPACE_COLUMNS
        .iter()
        .copied()
        .find(|expected| !columns.iter().any(|column| column == expected))
    {
        Some(missing_column) => Err(DbError::KeySpaceMismatch { missing_column }),
        None => Ok(()),
    }
}
