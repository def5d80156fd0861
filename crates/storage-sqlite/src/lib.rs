//! SQLite cache backend for cepfill.
//!
//! This crate implements the [`CacheStore`](cepfill_core::CacheStore)
//! contract from `cepfill-core` on top of a single SQLite table, so
//! resolved lookups survive process restarts. It is the only place in
//! the workspace that touches SQLite; the engine stays
//! storage-agnostic and talks to the trait.
//!
//! ```text
//! cepfill-core (engine, cache trait)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```
//!
//! Select this backend with
//! [`CacheMode::Durable`](cepfill_core::CacheMode) and hand the store
//! to the engine builder.

pub mod cache;

pub use cache::SqliteCacheStore;
