//! Key-value repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide get/put/remove over the `kv_entries` table.
//! - Offer atomic batches for writes that must land together.
//!
//! # Invariants
//! - `put` upserts; `remove` of a missing key is not an error.
//! - A failed batch leaves every key in the batch untouched.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A stored value could not be decoded into the expected shape.
    InvalidData(String),
    Serialize(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Serialize(err) => write!(f, "failed to serialize value: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Put { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn put_json<T: Serialize>(key: impl Into<String>, value: &T) -> RepoResult<Self> {
        Ok(Self::Put {
            key: key.into(),
            value: serde_json::to_string(value).map_err(RepoError::Serialize)?,
        })
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }
}

/// Flat key-space used by persistence and snapshots.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn remove(&self, key: &str) -> RepoResult<bool>;
    fn contains(&self, key: &str) -> RepoResult<bool>;
    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|err| {
                RepoError::InvalidData(format!("key `{key}` does not decode: {err}"))
            }),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> RepoResult<()> {
        let raw = serde_json::to_string(value).map_err(RepoError::Serialize)?;
        self.put(key, &raw)
    }
}

/// SQLite-backed key-value repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        upsert(self.conn, key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }

    fn contains(&self, key: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE key = ?1);",
            [key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn write_batch(&self, writes: &[KvWrite]) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for write in writes {
            match write {
                KvWrite::Put { key, value } => upsert(&tx, key, value)?,
                KvWrite::Remove { key } => {
                    tx.execute("DELETE FROM kv_entries WHERE key = ?1;", [key.as_str()])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value, updated_at)
         VALUES (?1, ?2, strftime('%s', 'now') * 1000)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, value],
    )?;
    Ok(())
}
