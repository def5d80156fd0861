//! Cache contract and backends for resolved lookups.
//!
//! This module provides:
//! - [`CachedLookup`]: what gets stored, a definitive answer plus its
//!   provider
//! - [`CacheStore`]: the trait every backend implements
//! - [`MemoryCache`]: the in-memory TTL backend
//! - [`NoopCache`]: the backend selected when caching is off
//!
//! Backends own their TTL: `put` stamps the entry, `get` evicts lazily
//! and reports an expired entry as absent. There is no background
//! sweep. Only definitive answers are ever stored; failures are not.

mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cepfill_providers::{AddressRecord, Cep};

use crate::errors::CacheError;

/// A cached definitive answer and the provider that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CachedLookup {
    /// The CEP resolved to this address.
    Found {
        record: AddressRecord,
        provider: String,
    },

    /// A provider stated the CEP does not exist.
    NotFound { provider: String },
}

impl CachedLookup {
    /// The provider that produced the stored answer.
    pub fn provider(&self) -> &str {
        match self {
            Self::Found { provider, .. } | Self::NotFound { provider } => provider,
        }
    }
}

/// Storage backend for resolved lookups.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a fresh entry for `cep`.
    ///
    /// An expired entry is evicted and reported as absent.
    async fn get(&self, cep: &Cep) -> Result<Option<CachedLookup>, CacheError>;

    /// Store a definitive answer for `cep`, replacing any previous
    /// entry and restarting its TTL.
    async fn put(&self, cep: &Cep, entry: CachedLookup) -> Result<(), CacheError>;
}

/// Backend for disabled caching: stores nothing, reports everything
/// absent.
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    async fn get(&self, _cep: &Cep) -> Result<Option<CachedLookup>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _cep: &Cep, _entry: CachedLookup) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AddressRecord {
        AddressRecord {
            cep: "01001000".to_string(),
            street: "Praça da Sé".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_accessor() {
        let found = CachedLookup::Found {
            record: sample_record(),
            provider: "viacep".to_string(),
        };
        assert_eq!(found.provider(), "viacep");

        let not_found = CachedLookup::NotFound {
            provider: "brasilapi".to_string(),
        };
        assert_eq!(not_found.provider(), "brasilapi");
    }

    #[test]
    fn test_cached_lookup_serde_roundtrip() {
        let entry = CachedLookup::Found {
            record: sample_record(),
            provider: "viacep".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"outcome\":\"found\""));
        let back: CachedLookup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);

        let entry = CachedLookup::NotFound {
            provider: "viacep".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"outcome\":\"not_found\""));
        let back: CachedLookup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[tokio::test]
    async fn test_noop_cache_stores_nothing() {
        let cache = NoopCache;
        let cep = Cep::parse("01001000").unwrap();

        cache
            .put(
                &cep,
                CachedLookup::NotFound {
                    provider: "viacep".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(cache.get(&cep).await.unwrap(), None);
    }
}
