//! Durable key-value storage backends
//!
//! The conversation store persists everything under a handful of string keys,
//! the same way a browser front-end uses `localStorage`. [`KeyValueStorage`]
//! is that seam; [`SqliteStorage`] is the durable implementation and
//! [`MemoryStorage`] the in-process one used by tests.

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{LexchatError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod memory;
pub use memory::MemoryStorage;

/// Synchronous string key-value storage
///
/// `set` is all-or-nothing: when it fails (for instance with
/// [`LexchatError::QuotaExceeded`]) the previous value stays in place.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Open the storage backend selected by `config`
pub fn open_storage(config: &StorageConfig) -> Result<Box<dyn KeyValueStorage>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory storage; nothing will be persisted");
            Ok(Box::new(match config.quota_bytes {
                Some(limit) => MemoryStorage::with_quota(limit),
                None => MemoryStorage::new(),
            }))
        }
        StorageBackend::Sqlite => {
            let storage = match &config.path {
                Some(path) => SqliteStorage::new_with_path(path)?,
                None => SqliteStorage::new()?,
            }
            .with_quota(config.quota_bytes);
            tracing::debug!("Using SQLite storage at {}", storage.db_path().display());
            Ok(Box::new(storage))
        }
    }
}

/// Environment variable overriding the SQLite database location
pub const STORAGE_DB_ENV: &str = "LEXCHAT_STORAGE_DB";

/// SQLite-backed key-value storage
pub struct SqliteStorage {
    db_path: PathBuf,
    quota_bytes: Option<usize>,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory, unless
    /// `LEXCHAT_STORAGE_DB` points somewhere else.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORAGE_DB_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("id", "lexchat", "lexchat")
            .ok_or_else(|| LexchatError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| LexchatError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("storage.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use lexchat::storage::{KeyValueStorage, SqliteStorage};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("kv.db")).unwrap();
    /// storage.set("greeting", "halo").unwrap();
    /// assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("halo"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| LexchatError::Storage(e.to_string()))?;
        }

        let storage = Self {
            db_path,
            quota_bytes: None,
        };
        storage.init()?;
        Ok(storage)
    }

    /// Limit the total size (keys plus values, in bytes) the store may hold
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Location of the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| LexchatError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| LexchatError::Storage(e.to_string()))?;

        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;

        conn.query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
            row.get(0)
        })
        .optional()
        .context("Failed to query key")
        .map_err(|e| LexchatError::Storage(e.to_string()).into())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.open()?;

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| LexchatError::Storage(e.to_string()))?;

        if let Some(limit) = self.quota_bytes {
            let others: i64 = tx
                .query_row(
                    "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                    FROM kv WHERE key != ?",
                    params![key],
                    |row| row.get(0),
                )
                .context("Failed to measure storage usage")
                .map_err(|e| LexchatError::Storage(e.to_string()))?;

            let required = others.max(0) as usize + key.len() + value.len();
            if required > limit {
                // Dropping the transaction rolls it back.
                return Err(LexchatError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                }
                .into());
            }
        }

        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .context("Failed to write key")
        .map_err(|e| LexchatError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| LexchatError::Storage(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;

        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| LexchatError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    /// Returns both the storage and the `TempDir` so the caller keeps the
    /// directory alive.
    fn create_test_storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("storage.db");
        let storage = SqliteStorage::new_with_path(db_path).expect("failed to create storage");
        (storage, dir)
    }

    #[test]
    fn test_sqlite_storage_init_creates_table() {
        let (storage, _dir) = create_test_storage();
        let conn = Connection::open(storage.db_path()).expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='kv'",
                [],
                |r| r.get(0),
            )
            .expect("query row");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let (storage, _dir) = create_test_storage();
        assert_eq!(storage.get("missing").expect("get failed"), None);
    }

    #[test]
    fn test_set_overwrites_existing_value() {
        let (storage, _dir) = create_test_storage();
        storage.set("k", "one").expect("first set failed");
        storage.set("k", "two").expect("second set failed");
        assert_eq!(storage.get("k").expect("get failed").as_deref(), Some("two"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (storage, _dir) = create_test_storage();
        storage.set("k", "v").expect("set failed");
        storage.remove("k").expect("first remove failed");
        storage.remove("k").expect("second remove failed");
        assert_eq!(storage.get("k").expect("get failed"), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("storage.db");
        {
            let storage = SqliteStorage::new_with_path(&db_path).expect("open 1");
            storage.set("persisted", "ya").expect("set failed");
        }
        let storage = SqliteStorage::new_with_path(&db_path).expect("open 2");
        assert_eq!(
            storage.get("persisted").expect("get failed").as_deref(),
            Some("ya")
        );
    }

    #[test]
    fn test_quota_rejects_oversized_write_and_keeps_previous_value() {
        let (storage, _dir) = create_test_storage();
        let storage = storage.with_quota(Some(16));

        storage.set("k", "small").expect("small write failed");
        let err = storage
            .set("k", "this value is far too large")
            .expect_err("oversized write should fail");

        assert!(LexchatError::is_quota_exceeded(&err));
        assert_eq!(storage.get("k").expect("get failed").as_deref(), Some("small"));
    }

    #[test]
    fn test_quota_counts_other_keys() {
        let (storage, _dir) = create_test_storage();
        let storage = storage.with_quota(Some(12));

        storage.set("a", "12345").expect("first write failed");
        // "a"+"12345" = 6 bytes, "b"+"123456" = 7 bytes, 13 > 12
        let err = storage.set("b", "123456").expect_err("should exceed quota");
        assert!(LexchatError::is_quota_exceeded(&err));
        assert_eq!(storage.get("b").expect("get failed"), None);
    }

    #[test]
    #[serial]
    fn test_new_respects_env_override() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let db_path = dir.path().join("nested").join("storage.db");
        env::set_var(STORAGE_DB_ENV, db_path.to_string_lossy().to_string());

        let storage = SqliteStorage::new().expect("new failed with env override");
        assert_eq!(storage.db_path(), db_path.as_path());
        assert!(db_path.parent().unwrap().exists());

        env::remove_var(STORAGE_DB_ENV);
    }
}
