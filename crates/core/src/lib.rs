//! Cepfill Core - Debounced CEP resolution engine.
//!
//! This crate contains the engine that sits between a text input
//! surface and the CEP lookup providers: validation, debounce with
//! trigger coalescing, single-flight supersession, a pluggable TTL
//! cache, retries with linear backoff, and provider fallback. It is
//! backend-agnostic and defines the cache trait that the
//! `storage-sqlite` crate implements.
//!
//! # Overview
//!
//! ```text
//! +-----------------+     +------------------+
//! |  Input Surface  | --> |   EngineHandle   |  (raw input, focus, cancel)
//! +-----------------+     +------------------+
//!                                  |
//!                                  v
//!                         +------------------+
//!                         | ResolutionEngine |  (debounce, validate, supersede)
//!                         +------------------+
//!                                  |
//!                                  v
//!                         +------------------+
//!                         |   CepResolver    |  (cache, retry, fallback)
//!                         +------------------+
//!                                  |
//!                                  v
//!                         +------------------+
//!                         | AddressProvider  |  (ViaCEP, BrasilAPI, ...)
//!                         +------------------+
//! ```
//!
//! Outcomes flow back out through the [`EngineObserver`] callbacks.

pub mod cache;
pub mod config;
pub mod engine;
pub mod errors;
pub mod observer;
pub mod resolver;
pub mod retry;

// Re-export the engine surface
pub use engine::{
    Attempt, EngineBuilder, EngineHandle, EngineState, RequestCoordinator, ResolutionEngine,
    StateDetail, StateMachine,
};

// Re-export supporting types
pub use cache::{CacheStore, CachedLookup, MemoryCache, NoopCache};
pub use config::{CacheMode, EngineConfig};
pub use observer::{EngineObserver, NoopObserver};
pub use resolver::{CepResolver, Resolution};
pub use retry::RetryPolicy;

// Re-export error types
pub use errors::{CacheError, Error, Result};

// Re-export the provider types engine consumers touch
pub use cepfill_providers::{AddressProvider, AddressRecord, Cep, LookupError, LookupReply};
