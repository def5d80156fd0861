//! Engine configuration.
//!
//! All knobs in one struct with conservative defaults; construct with
//! `EngineConfig::default()` and override fields as needed.

use std::time::Duration;

/// Default per-call time budget for one provider request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(6);

/// Default number of retries after the initial attempt.
pub const DEFAULT_RETRIES: u32 = 1;

/// Default base of the linear retry backoff ladder.
pub const DEFAULT_RETRY_BACKOFF_BASE: Duration = Duration::from_millis(300);

/// Default debounce window between an edit and the trigger.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default time-to-live for cache entries (five minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Cache backend selection.
///
/// Disabling the cache is a backend choice, not a code path: `Off`
/// selects a backend that stores nothing, and the resolver never
/// branches on the mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum CacheMode {
    /// No caching; every trigger reaches the providers.
    Off,
    /// In-memory cache, gone when the engine is dropped.
    #[default]
    Memory,
    /// Caller-supplied durable backend, e.g. the SQLite store.
    Durable,
}

/// Configuration for the resolution engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Per-call time budget for one provider request.
    pub fetch_timeout: Duration,

    /// Retries after the initial attempt. Zero means a single attempt.
    pub retries: u32,

    /// Base of the linear backoff ladder between attempts: the first
    /// wait is the base, the second twice the base, and so on.
    pub retry_backoff_base: Duration,

    /// Whether the fallback provider joins the chain behind the
    /// primary.
    pub fallback_enabled: bool,

    /// Which cache backend to use.
    pub cache_mode: CacheMode,

    /// Time-to-live for cache entries.
    pub cache_ttl: Duration,

    /// Debounce window between an edit and the trigger. Zero fires on
    /// the next turn of the engine loop.
    pub debounce: Duration,

    /// Defer invalid-input reporting while the field still has focus;
    /// losing focus fires the deferred report.
    pub validate_on_blur: bool,

    /// Whether emptying the input cancels any live attempt and resets
    /// the engine to idle.
    pub clear_on_empty: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_backoff_base: DEFAULT_RETRY_BACKOFF_BASE,
            fallback_enabled: true,
            cache_mode: CacheMode::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            debounce: DEFAULT_DEBOUNCE,
            validate_on_blur: false,
            clear_on_empty: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_timeout, Duration::from_secs(6));
        assert_eq!(config.retries, 1);
        assert_eq!(config.retry_backoff_base, Duration::from_millis(300));
        assert!(config.fallback_enabled);
        assert_eq!(config.cache_mode, CacheMode::Memory);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert!(!config.validate_on_blur);
        assert!(config.clear_on_empty);
    }
}
