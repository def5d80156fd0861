//! Collaborator callbacks emitted by the engine.

use cepfill_providers::{AddressRecord, Cep, LookupError};

use crate::engine::{EngineState, StateDetail};

/// Receives engine notifications.
///
/// All methods default to no-ops so implementors only override what
/// they care about. Callbacks run on the engine task; keep them
/// short and never block.
///
/// `on_state_change` fires for every transition. The outcome
/// callbacks fire in addition to it: `on_success` and `on_not_found`
/// on definitive answers, `on_error` on rejected input and failed
/// lookups. Cancellation is visible only as a state change.
pub trait EngineObserver: Send + Sync {
    /// The engine moved to `state`.
    fn on_state_change(&self, state: EngineState, detail: &StateDetail) {
        let _ = (state, detail);
    }

    /// A lookup produced an address.
    fn on_success(&self, record: &AddressRecord, provider: &str, from_cache: bool) {
        let _ = (record, provider, from_cache);
    }

    /// A lookup came back definitively empty.
    fn on_not_found(&self, cep: &Cep, provider: &str) {
        let _ = (cep, provider);
    }

    /// Input was rejected or a lookup failed.
    fn on_error(&self, error: &LookupError) {
        let _ = error;
    }
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
