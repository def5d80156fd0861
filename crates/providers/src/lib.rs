//! Cepfill Providers Crate
//!
//! This crate provides provider-agnostic CEP (Brazilian postal code)
//! resolution for the cepfill engine.
//!
//! # Overview
//!
//! The providers crate supports:
//! - Canonical CEP parsing and formatting
//! - A closed error taxonomy for lookup failures
//! - Multiple lookup services behind one trait: ViaCEP, BrasilAPI
//! - Cooperative cancellation at every network suspension point
//!
//! # Core Types
//!
//! - [`Cep`] - Canonical eight-digit postal code identifier
//! - [`AddressRecord`] - Address payload returned by a provider
//! - [`LookupReply`] - A provider's definitive answer (found / not found)
//! - [`LookupError`] - Everything that can go wrong during a lookup
//! - [`AddressProvider`] - The trait every lookup service implements

pub mod errors;
pub mod models;
pub mod provider;

// Re-export all public types from models
pub use models::{strip_non_digits, AddressRecord, Cep, LookupReply};

// Re-export error types
pub use errors::LookupError;

// Re-export provider types
pub use provider::brasilapi::BrasilApiProvider;
pub use provider::viacep::ViaCepProvider;
pub use provider::AddressProvider;
