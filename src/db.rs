use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tracing::info;

use crate::network::{Network, NetworkError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored brain is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored brain is malformed: {0}")]
    Invalid(#[from] NetworkError),
}

/// Load, save and clear the best brain found so far, stored under one key.
pub trait BrainStore {
    fn load(&self) -> Result<Option<Network>, StoreError>;
    fn save(&mut self, brain: &Network) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

fn decode(payload: &str) -> Result<Network, StoreError> {
    let brain: Network = serde_json::from_str(payload)?;
    brain.validate()?;
    Ok(brain)
}

/// SQLite-backed store, one row per key.
pub struct SqliteStore {
    conn: Connection,
    key: String,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, key: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?, key)
    }

    pub fn in_memory(key: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, key)
    }

    fn with_connection(conn: Connection, key: impl Into<String>) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS brains (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// RFC 3339 timestamp of the last save under this key.
    pub fn saved_at(&self) -> Result<Option<String>, StoreError> {
        let saved_at = self
            .conn
            .query_row(
                "SELECT saved_at FROM brains WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(saved_at)
    }
}

impl BrainStore for SqliteStore {
    fn load(&self) -> Result<Option<Network>, StoreError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM brains WHERE key = ?1",
                params![self.key],
                |row| row.get(0),
            )
            .optional()?;
        payload.as_deref().map(decode).transpose()
    }

    fn save(&mut self, brain: &Network) -> Result<(), StoreError> {
        let payload = serde_json::to_string(brain)?;
        // one row per key, overwritten on every save
        self.conn.execute(
            "INSERT INTO brains (key, payload, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at",
            params![self.key, payload, Utc::now().to_rfc3339()],
        )?;
        info!(key = %self.key, "saved best brain");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM brains WHERE key = ?1", params![self.key])?;
        info!(key = %self.key, "discarded best brain");
        Ok(())
    }
}

/// One pretty-printed JSON file per key, `<dir>/<key>.json`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BrainStore for JsonFileStore {
    fn load(&self) -> Result<Option<Network>, StoreError> {
        // nothing saved yet
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        decode(&content).map(Some)
    }

    fn save(&mut self, brain: &Network) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(brain)?;
        fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "saved best brain");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        info!(path = %self.path.display(), "discarded best brain");
        Ok(())
    }
}
