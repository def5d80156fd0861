//! Engine lifecycle states and the machine that tracks them.

use log::debug;
use std::fmt;
use std::sync::Arc;

use cepfill_providers::{Cep, LookupError};

use crate::observer::EngineObserver;

/// Lifecycle state of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing to do. Also the state after the field is cleared.
    Idle,
    /// Input is changing and the debounce window is open.
    Editing,
    /// A lookup attempt is in flight.
    Resolving,
    /// The last attempt produced an address.
    Succeeded,
    /// The last attempt came back definitively empty.
    NotFound,
    /// The last attempt was superseded or canceled.
    Canceled,
    /// The trigger fired on input that is not a valid CEP.
    InvalidInput,
    /// A provider refused the last attempt with a rate limit.
    RateLimited,
    /// The last attempt failed after exhausting the provider chain.
    Failed,
}

impl EngineState {
    /// Stable lowercase name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Editing => "editing",
            EngineState::Resolving => "resolving",
            EngineState::Succeeded => "succeeded",
            EngineState::NotFound => "not_found",
            EngineState::Canceled => "canceled",
            EngineState::InvalidInput => "invalid_input",
            EngineState::RateLimited => "rate_limited",
            EngineState::Failed => "failed",
        }
    }

    /// Whether this state ends an attempt. New input always leaves a
    /// terminal state again.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            EngineState::Idle | EngineState::Editing | EngineState::Resolving
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context carried with a state transition.
#[derive(Clone, Debug, PartialEq)]
pub enum StateDetail {
    /// No extra context.
    None,
    /// Digits seen so far while editing.
    Editing { digits: usize },
    /// The CEP being looked up.
    Resolving { cep: Cep },
    /// Where a definitive answer came from.
    Resolved { provider: String, from_cache: bool },
    /// Why the attempt or the input was rejected.
    Rejected { error: LookupError },
}

/// Tracks the current state and announces every transition.
pub struct StateMachine {
    current: EngineState,
    observer: Arc<dyn EngineObserver>,
}

impl StateMachine {
    /// Start in `Idle`.
    pub fn new(observer: Arc<dyn EngineObserver>) -> Self {
        Self {
            current: EngineState::Idle,
            observer,
        }
    }

    /// The current state.
    pub fn current(&self) -> EngineState {
        self.current
    }

    /// Move to `state` and notify the observer. Re-entering the same
    /// state still notifies; repeated edits legitimately produce
    /// `Editing` -> `Editing`.
    pub fn transition(&mut self, state: EngineState, detail: StateDetail) {
        debug!("State transition: {} -> {}", self.current, state);
        self.current = state;
        self.observer.on_state_change(state, &detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingObserver {
        seen: Mutex<Vec<(EngineState, StateDetail)>>,
    }

    impl RecordingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<(EngineState, StateDetail)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl EngineObserver for RecordingObserver {
        fn on_state_change(&self, state: EngineState, detail: &StateDetail) {
            self.seen.lock().unwrap().push((state, detail.clone()));
        }
    }

    #[test]
    fn test_starts_idle() {
        let machine = StateMachine::new(RecordingObserver::new());
        assert_eq!(machine.current(), EngineState::Idle);
    }

    #[test]
    fn test_transition_updates_and_notifies() {
        let observer = RecordingObserver::new();
        let mut machine = StateMachine::new(observer.clone());

        machine.transition(EngineState::Editing, StateDetail::Editing { digits: 3 });
        assert_eq!(machine.current(), EngineState::Editing);
        assert_eq!(
            observer.seen(),
            vec![(EngineState::Editing, StateDetail::Editing { digits: 3 })]
        );
    }

    #[test]
    fn test_repeated_state_still_notifies() {
        let observer = RecordingObserver::new();
        let mut machine = StateMachine::new(observer.clone());

        machine.transition(EngineState::Editing, StateDetail::Editing { digits: 1 });
        machine.transition(EngineState::Editing, StateDetail::Editing { digits: 2 });
        assert_eq!(observer.seen().len(), 2);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!EngineState::Idle.is_terminal());
        assert!(!EngineState::Editing.is_terminal());
        assert!(!EngineState::Resolving.is_terminal());
        assert!(EngineState::Succeeded.is_terminal());
        assert!(EngineState::NotFound.is_terminal());
        assert!(EngineState::Canceled.is_terminal());
        assert!(EngineState::InvalidInput.is_terminal());
        assert!(EngineState::RateLimited.is_terminal());
        assert!(EngineState::Failed.is_terminal());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(EngineState::Idle.to_string(), "idle");
        assert_eq!(EngineState::NotFound.to_string(), "not_found");
        assert_eq!(EngineState::InvalidInput.to_string(), "invalid_input");
        assert_eq!(EngineState::RateLimited.to_string(), "rate_limited");
    }
}
