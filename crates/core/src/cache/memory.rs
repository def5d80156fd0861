//! In-memory cache backend.
//!
//! Keyed by the canonical digits, stamped with a monotonic instant.
//! Entries are evicted lazily on read; the map lives exactly as long
//! as the engine and resets with it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::warn;

use cepfill_providers::Cep;

use super::{CacheStore, CachedLookup};
use crate::errors::CacheError;

/// A stored answer with its insertion stamp.
#[derive(Debug)]
struct StoredEntry {
    stored_at: Instant,
    entry: CachedLookup,
}

/// In-memory TTL cache for resolved lookups.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, StoredEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Create a cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Lock the entry map, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a stale or missing entry, which
    /// the resolver treats as a miss anyway.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, StoredEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Memory cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, cep: &Cep) -> Result<Option<CachedLookup>, CacheError> {
        let mut entries = self.lock_entries();

        match entries.get(cep.as_str()) {
            Some(stored) if stored.stored_at.elapsed() < self.ttl => Ok(Some(stored.entry.clone())),
            Some(_) => {
                entries.remove(cep.as_str());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, cep: &Cep, entry: CachedLookup) -> Result<(), CacheError> {
        let mut entries = self.lock_entries();
        entries.insert(
            cep.as_str().to_string(),
            StoredEntry {
                stored_at: Instant::now(),
                entry,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cepfill_providers::AddressRecord;

    fn found_entry(provider: &str) -> CachedLookup {
        CachedLookup::Found {
            record: AddressRecord {
                cep: "01001000".to_string(),
                city: "São Paulo".to_string(),
                ..Default::default()
            },
            provider: provider.to_string(),
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let cep = Cep::parse("01001000").unwrap();

        cache.put(&cep, found_entry("viacep")).await.unwrap();

        let hit = cache.get(&cep).await.unwrap();
        assert_eq!(hit, Some(found_entry("viacep")));
    }

    #[tokio::test]
    async fn test_miss_for_unknown_cep() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let cep = Cep::parse("99999999").unwrap();

        assert_eq!(cache.get(&cep).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        // Zero TTL: everything is expired the moment it lands.
        let cache = MemoryCache::new(Duration::ZERO);
        let cep = Cep::parse("01001000").unwrap();

        cache.put(&cep, found_entry("viacep")).await.unwrap();

        assert_eq!(cache.get(&cep).await.unwrap(), None);
        assert!(cache.lock_entries().is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_and_restamps() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let cep = Cep::parse("01001000").unwrap();

        cache.put(&cep, found_entry("viacep")).await.unwrap();
        cache.put(&cep, found_entry("brasilapi")).await.unwrap();

        let hit = cache.get(&cep).await.unwrap().unwrap();
        assert_eq!(hit.provider(), "brasilapi");
        assert_eq!(cache.lock_entries().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_cacheable() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let cep = Cep::parse("99999999").unwrap();

        cache
            .put(
                &cep,
                CachedLookup::NotFound {
                    provider: "viacep".to_string(),
                },
            )
            .await
            .unwrap();

        let hit = cache.get(&cep).await.unwrap();
        assert_eq!(
            hit,
            Some(CachedLookup::NotFound {
                provider: "viacep".to_string()
            })
        );
    }
}
