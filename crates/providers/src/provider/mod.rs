//! CEP provider abstractions and implementations.
//!
//! This module contains:
//! - The `AddressProvider` trait that all lookup services implement
//! - Concrete clients for the public ViaCEP and BrasilAPI services
//!
//! Providers receive an already-validated [`Cep`](crate::models::Cep):
//! input validation happens before a provider is ever contacted, so the
//! clients only deal with transport and response mapping.

mod traits;

pub mod brasilapi;
pub mod viacep;

// Re-exports
pub use traits::AddressProvider;
