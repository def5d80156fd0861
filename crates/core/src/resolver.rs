//! Resolution pipeline: cache probe, retry loop, provider fallback.
//!
//! The resolver is usable on its own for programmatic lookups; the
//! engine wraps it with debouncing and supersession.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use cepfill_providers::{AddressProvider, Cep, LookupError, LookupReply};

use crate::cache::{CacheStore, CachedLookup};
use crate::retry::RetryPolicy;

/// A definitive answer together with its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The answer itself.
    pub reply: LookupReply,
    /// The provider that produced it. On cache hits this is the
    /// provider stored with the entry, not whoever would serve a
    /// fresh lookup.
    pub provider: String,
    /// Whether the answer came from the cache.
    pub from_cache: bool,
}

/// Resolves CEPs through an ordered provider chain with caching,
/// retries and linear backoff.
pub struct CepResolver {
    providers: Vec<Arc<dyn AddressProvider>>,
    cache: Arc<dyn CacheStore>,
    policy: RetryPolicy,
    fetch_timeout: Duration,
}

impl CepResolver {
    /// Create a resolver over the given chain.
    ///
    /// Providers are consulted in order; the first definitive answer
    /// wins.
    pub fn new(
        providers: Vec<Arc<dyn AddressProvider>>,
        cache: Arc<dyn CacheStore>,
        policy: RetryPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            policy,
            fetch_timeout,
        }
    }

    /// Resolve a CEP to a definitive answer.
    ///
    /// Order of business:
    /// 1. Cache probe. A fresh entry short-circuits without touching
    ///    any provider; a cache failure degrades to a miss.
    /// 2. Up to `attempts` passes over the provider chain in order.
    ///    The first definitive answer (found or not found) is cached
    ///    and returned; a failing provider hands over to the next one
    ///    in the same pass.
    /// 3. Between passes, the linear backoff delay, raced against the
    ///    cancellation token.
    ///
    /// Cancellation observed at any point returns `Canceled`
    /// immediately; nothing is cached for a canceled lookup.
    pub async fn resolve(
        &self,
        cep: &Cep,
        cancel: &CancellationToken,
    ) -> Result<Resolution, LookupError> {
        match self.cache.get(cep).await {
            Ok(Some(entry)) => {
                debug!("Cache hit for {}", cep);
                let provider = entry.provider().to_string();
                let reply = match entry {
                    CachedLookup::Found { record, .. } => LookupReply::Found(record),
                    CachedLookup::NotFound { .. } => LookupReply::NotFound,
                };
                return Ok(Resolution {
                    reply,
                    provider,
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Cache read failed for {}: {}, treating as miss", cep, e);
            }
        }

        let mut last_error: Option<LookupError> = None;

        for attempt in 0..self.policy.attempts() {
            if cancel.is_cancelled() {
                return Err(LookupError::Canceled);
            }

            for provider in &self.providers {
                match provider.resolve(cep, self.fetch_timeout, cancel).await {
                    Ok(reply) => {
                        self.store(cep, &reply, provider.id()).await;
                        return Ok(Resolution {
                            reply,
                            provider: provider.id().to_string(),
                            from_cache: false,
                        });
                    }
                    Err(LookupError::Canceled) => return Err(LookupError::Canceled),
                    Err(e) => {
                        warn!(
                            "Provider '{}' failed for {} on attempt {}: {}",
                            provider.id(),
                            cep,
                            attempt,
                            e
                        );
                        last_error = Some(e);
                    }
                }
            }

            // Not the last attempt: back off before the next pass.
            if attempt + 1 < self.policy.attempts() {
                let delay = self.policy.backoff_delay(attempt);
                debug!("Backing off {:?} before attempt {}", delay, attempt + 1);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(LookupError::Canceled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LookupError::Provider {
            provider: "none".to_string(),
            message: "Provider chain is empty".to_string(),
        }))
    }

    /// Cache a definitive answer. Write failures degrade to a log
    /// line; a broken cache must not fail the lookup.
    async fn store(&self, cep: &Cep, reply: &LookupReply, provider: &str) {
        let entry = match reply {
            LookupReply::Found(record) => CachedLookup::Found {
                record: record.clone(),
                provider: provider.to_string(),
            },
            LookupReply::NotFound => CachedLookup::NotFound {
                provider: provider.to_string(),
            },
        };

        if let Err(e) = self.cache.put(cep, entry).await {
            warn!("Cache write failed for {}: {}", cep, e);
        }
    }
}
