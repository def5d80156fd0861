//! Error types for CEP lookups.
//!
//! This module provides [`LookupError`], the closed taxonomy covering
//! everything a lookup can fail with, from local validation through
//! transport problems to malformed provider answers.

use thiserror::Error;

/// Errors that can occur while resolving a CEP.
///
/// The taxonomy is closed: callers match exhaustively and the engine
/// maps each variant to exactly one terminal state. Fields are owned
/// strings so the error can cross task boundaries and be replayed to
/// observers by reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The raw input did not contain exactly eight digits.
    /// Detected locally, no provider is ever contacted.
    #[error("Invalid CEP: {raw:?}")]
    InvalidCep {
        /// The rejected raw input
        raw: String,
    },

    /// A transport-level failure or a non-success HTTP status.
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The provider whose request failed
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// The per-call time budget elapsed before the provider answered.
    /// The underlying request is aborted when the budget expires.
    #[error("Timeout after {timeout_ms}ms: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
        /// The budget that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The provider rejected the request with HTTP 429.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider answered with a success status but an unusable body:
    /// undecodable JSON, or a shape carrying neither an address nor an
    /// explicit not-found marker.
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the unusable answer
        provider: String,
        /// Description of what was wrong with it
        message: String,
    },

    /// The lookup was canceled cooperatively, usually because newer
    /// input superseded it. Never surfaced through error callbacks.
    #[error("Lookup canceled")]
    Canceled,
}

impl LookupError {
    /// Whether another attempt (same or next provider) could succeed.
    ///
    /// Invalid input and cancellation are final; everything the network
    /// or a provider did wrong is worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidCep { .. } | Self::Canceled => false,
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::Provider { .. } => true,
        }
    }

    /// Whether this error is a cooperative cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// The provider this error originated from, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Network { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::RateLimited { provider }
            | Self::Provider { provider, .. } => Some(provider),
            Self::InvalidCep { .. } | Self::Canceled => None,
        }
    }
}
