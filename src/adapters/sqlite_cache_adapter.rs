//! SQLite shared artifact cache tier.
//!
//! One table keyed by the wire form of the cache key. Writes are
//! `INSERT OR REPLACE`, so concurrent compilers racing on the same key are
//! last-writer-wins; both wrote identical payloads, so either outcome is
//! correct. Expiry is lazy on read plus an explicit purge.

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::artifact::{Artifact, CacheKey};
use crate::domain::error::EngineError;
use crate::ports::cache_port::ArtifactStore;

pub struct SqliteCacheAdapter {
    pool: Pool<SqliteConnectionManager>,
    ttl_seconds: i64,
}

fn cache_err(reason: impl ToString) -> EngineError {
    EngineError::Cache {
        reason: reason.to_string(),
    }
}

impl SqliteCacheAdapter {
    pub fn new(path: &str, pool_size: u32, ttl_seconds: i64) -> Result<Self, EngineError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(cache_err)?;
        let adapter = Self { pool, ttl_seconds };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    /// Single-connection in-memory database for tests.
    pub fn in_memory(ttl_seconds: i64) -> Result<Self, EngineError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(cache_err)?;
        let adapter = Self { pool, ttl_seconds };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn initialize_schema(&self) -> Result<(), EngineError> {
        let conn = self.pool.get().map_err(cache_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS artifacts (
                cache_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_artifacts_expires ON artifacts(expires_at);",
        )
        .map_err(cache_err)?;
        Ok(())
    }
}

impl ArtifactStore for SqliteCacheAdapter {
    fn get(&self, key: &CacheKey) -> Result<Option<Artifact>, EngineError> {
        let conn = self.pool.get().map_err(cache_err)?;
        let wire = key.wire();
        let now = Utc::now().timestamp();

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, expires_at FROM artifacts WHERE cache_key = ?1",
                params![wire],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(cache_err(other)),
            })?;

        let Some((payload, expires_at)) = row else {
            return Ok(None);
        };
        if expires_at <= now {
            conn.execute("DELETE FROM artifacts WHERE cache_key = ?1", params![wire])
                .map_err(cache_err)?;
            return Ok(None);
        }

        let artifact: Artifact = serde_json::from_str(&payload).map_err(cache_err)?;
        Ok(Some(artifact))
    }

    fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), EngineError> {
        let conn = self.pool.get().map_err(cache_err)?;
        let payload = serde_json::to_string(artifact).map_err(cache_err)?;
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT OR REPLACE INTO artifacts (cache_key, payload, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key.wire(), payload, now, now + self.ttl_seconds],
        )
        .map_err(cache_err)?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<u64, EngineError> {
        let conn = self.pool.get().map_err(cache_err)?;
        let dropped = conn
            .execute(
                "DELETE FROM artifacts WHERE expires_at <= ?1",
                params![Utc::now().timestamp()],
            )
            .map_err(cache_err)?;
        Ok(dropped as u64)
    }

    fn clear(&self) -> Result<u64, EngineError> {
        let conn = self.pool.get().map_err(cache_err)?;
        let dropped = conn
            .execute("DELETE FROM artifacts", params![])
            .map_err(cache_err)?;
        Ok(dropped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compiler::compile;

    fn artifact(source: &str) -> Artifact {
        compile(source).artifact.unwrap()
    }

    #[test]
    fn round_trip_through_sqlite() {
        let store = SqliteCacheAdapter::in_memory(3600).unwrap();
        let a = artifact("fast = sma(close, 10)\nsignal = fast > close");
        let key = a.cache_key();

        assert_eq!(store.get(&key).unwrap(), None);
        store.put(&key, &a).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(a));
    }

    #[test]
    fn replace_is_last_writer_wins() {
        let store = SqliteCacheAdapter::in_memory(3600).unwrap();
        let a = artifact("x = close + 1");
        let key = a.cache_key();
        store.put(&key, &a).unwrap();
        store.put(&key, &a).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(a));
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let store = SqliteCacheAdapter::in_memory(0).unwrap();
        let a = artifact("x = close + 1");
        let key = a.cache_key();
        store.put(&key, &a).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn purge_expired_counts() {
        let store = SqliteCacheAdapter::in_memory(0).unwrap();
        let a = artifact("x = close + 1");
        let b = artifact("x = close + 2");
        store.put(&a.cache_key(), &a).unwrap();
        store.put(&b.cache_key(), &b).unwrap();
        assert_eq!(store.purge_expired().unwrap(), 2);
    }

    #[test]
    fn clear_counts() {
        let store = SqliteCacheAdapter::in_memory(3600).unwrap();
        let a = artifact("x = close + 1");
        store.put(&a.cache_key(), &a).unwrap();
        assert_eq!(store.clear().unwrap(), 1);
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn file_backed_store_persists_across_adapters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts.db");
        let path = path.to_str().unwrap();

        let a = artifact("x = close + 1");
        {
            let store = SqliteCacheAdapter::new(path, 2, 3600).unwrap();
            store.put(&a.cache_key(), &a).unwrap();
        }
        let store = SqliteCacheAdapter::new(path, 2, 3600).unwrap();
        assert_eq!(store.get(&a.cache_key()).unwrap(), Some(a));
    }
}
