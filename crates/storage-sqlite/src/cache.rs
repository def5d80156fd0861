//! Durable lookup cache on a single SQLite table.
//!
//! Rows are keyed by the canonical digits and carry a JSON payload
//! plus a wall-clock stamp in epoch milliseconds. Entries expire by
//! real elapsed time, so a reopened database honors the TTL across
//! process restarts. Eviction is lazy: expired rows are deleted when
//! read, never by a background sweep.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use rusqlite::{Connection, OptionalExtension};

use cepfill_core::cache::{CacheStore, CachedLookup};
use cepfill_core::errors::CacheError;
use cepfill_providers::Cep;

/// SQLite-backed cache for resolved lookups.
///
/// The connection lives behind a mutex; every call takes the lock for
/// the duration of its statement. Lookups are tiny single-row
/// operations, so contention is not a concern at the engine's one
/// attempt at a time.
pub struct SqliteCacheStore {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteCacheStore {
    /// Open (or create) the cache database at `path`.
    pub fn new(path: impl AsRef<Path>, ttl: Duration) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::with_connection(conn, ttl)
    }

    /// Open a private in-memory database.
    ///
    /// Nothing survives the store being dropped; useful for tests and
    /// for callers that want SQLite semantics without a file.
    pub fn open_in_memory(ttl: Duration) -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn, ttl)
    }

    fn with_connection(conn: Connection, ttl: Duration) -> Result<Self, CacheError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS lookup_cache (
                cep TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                stored_at INTEGER NOT NULL
            )",
        )
        .map_err(backend)?;

        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
        })
    }

    /// Lock the connection, recovering from poison if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            warn!("Cache connection mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, cep: &Cep) -> Result<Option<CachedLookup>, CacheError> {
        let conn = self.lock_conn();

        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, stored_at FROM lookup_cache WHERE cep = ?1",
                [cep.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(backend)?;

        let Some((payload, stored_at)) = row else {
            return Ok(None);
        };

        let age_ms = now_millis().saturating_sub(stored_at);
        if age_ms >= self.ttl.as_millis() as i64 {
            conn.execute("DELETE FROM lookup_cache WHERE cep = ?1", [cep.as_str()])
                .map_err(backend)?;
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // A row this build cannot decode is useless; drop it
                // and let the resolver fetch a fresh answer.
                warn!("Dropping undecodable cache row for {}: {}", cep, e);
                conn.execute("DELETE FROM lookup_cache WHERE cep = ?1", [cep.as_str()])
                    .map_err(backend)?;
                Ok(None)
            }
        }
    }

    async fn put(&self, cep: &Cep, entry: CachedLookup) -> Result<(), CacheError> {
        let payload = serde_json::to_string(&entry)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let conn = self.lock_conn();
        conn.execute(
            "INSERT OR REPLACE INTO lookup_cache (cep, payload, stored_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![cep.as_str(), payload, now_millis()],
        )
        .map_err(backend)?;

        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn backend(err: rusqlite::Error) -> CacheError {
    CacheError::Backend(err.to_string())
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use cepfill_providers::AddressRecord;

    const TTL: Duration = Duration::from_secs(300);

    fn cep(raw: &str) -> Cep {
        Cep::parse(raw).unwrap()
    }

    fn found_entry(provider: &str) -> CachedLookup {
        CachedLookup::Found {
            record: AddressRecord {
                cep: "01001000".to_string(),
                street: "Praça da Sé".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                ..Default::default()
            },
            provider: provider.to_string(),
        }
    }

    #[tokio::test]
    async fn test_roundtrip_found_entry() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        let cep = cep("01001000");

        store.put(&cep, found_entry("viacep")).await.unwrap();

        let hit = store.get(&cep).await.unwrap();
        assert_eq!(hit, Some(found_entry("viacep")));
    }

    #[tokio::test]
    async fn test_roundtrip_not_found_entry() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        let cep = cep("99999999");

        store
            .put(
                &cep,
                CachedLookup::NotFound {
                    provider: "brasilapi".to_string(),
                },
            )
            .await
            .unwrap();

        let hit = store.get(&cep).await.unwrap();
        assert_eq!(
            hit,
            Some(CachedLookup::NotFound {
                provider: "brasilapi".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_miss_for_unknown_cep() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        assert_eq!(store.get(&cep("01001000")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_entry() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        let cep = cep("01001000");

        store.put(&cep, found_entry("viacep")).await.unwrap();
        store.put(&cep, found_entry("brasilapi")).await.unwrap();

        let hit = store.get(&cep).await.unwrap().unwrap();
        assert_eq!(hit.provider(), "brasilapi");
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = SqliteCacheStore::open_in_memory(Duration::ZERO).unwrap();
        let cep = cep("01001000");

        store.put(&cep, found_entry("viacep")).await.unwrap();

        assert_eq!(store.get(&cep).await.unwrap(), None);

        // The expired row was evicted, not just skipped.
        let count: i64 = store
            .lock_conn()
            .query_row("SELECT COUNT(*) FROM lookup_cache", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_stale_row_is_evicted() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        let cep = cep("01001000");
        store.put(&cep, found_entry("viacep")).await.unwrap();

        // Backdate the stamp past the TTL.
        let stale_stamp = now_millis() - TTL.as_millis() as i64 - 1_000;
        store
            .lock_conn()
            .execute(
                "UPDATE lookup_cache SET stored_at = ?1 WHERE cep = ?2",
                rusqlite::params![stale_stamp, cep.as_str()],
            )
            .unwrap();

        assert_eq!(store.get(&cep).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_dropped() {
        let store = SqliteCacheStore::open_in_memory(TTL).unwrap();
        let cep = cep("01001000");

        store
            .lock_conn()
            .execute(
                "INSERT INTO lookup_cache (cep, payload, stored_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![cep.as_str(), "{not json", now_millis()],
            )
            .unwrap();

        assert_eq!(store.get(&cep).await.unwrap(), None);

        let count: i64 = store
            .lock_conn()
            .query_row("SELECT COUNT(*) FROM lookup_cache", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lookup_cache.db");
        let cep = cep("01001000");

        {
            let store = SqliteCacheStore::new(&path, TTL).unwrap();
            store.put(&cep, found_entry("viacep")).await.unwrap();
        }

        let store = SqliteCacheStore::new(&path, TTL).unwrap();
        let hit = store.get(&cep).await.unwrap();
        assert_eq!(hit, Some(found_entry("viacep")));
    }
}
