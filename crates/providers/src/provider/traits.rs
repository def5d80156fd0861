//! CEP provider trait definitions.
//!
//! This module defines the core `AddressProvider` trait that all
//! lookup services must implement.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::LookupError;
use crate::models::{Cep, LookupReply};

/// Trait for CEP lookup services.
///
/// Implement this trait to add support for a new address source.
/// The resolver iterates its provider chain in order and stops at the
/// first definitive answer.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use cepfill_providers::{AddressProvider, Cep, LookupError, LookupReply};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl AddressProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "my_provider"
///     }
///
///     async fn resolve(
///         &self,
///         cep: &Cep,
///         timeout: std::time::Duration,
///         cancel: &tokio_util::sync::CancellationToken,
///     ) -> Result<LookupReply, LookupError> {
///         // ... contact the service
///         Ok(LookupReply::NotFound)
///     }
/// }
/// ```
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "viacep" or "brasilapi".
    /// Used for logging, error attribution, and cache entries.
    fn id(&self) -> &'static str;

    /// Resolve a CEP to a definitive answer.
    ///
    /// # Arguments
    ///
    /// * `cep` - The already-validated canonical CEP
    /// * `timeout` - Per-call time budget; the request is aborted when
    ///   it elapses and the call returns `Timeout`
    /// * `cancel` - Cooperative cancellation token; a cancellation
    ///   observed at any suspension point aborts the request and
    ///   returns `Canceled`
    ///
    /// # Returns
    ///
    /// `Ok(Found)` with the address, `Ok(NotFound)` when the service
    /// states the CEP does not exist, or a `LookupError` on failure.
    async fn resolve(
        &self,
        cep: &Cep,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<LookupReply, LookupError>;
}
