//! Supersession bookkeeping for in-flight lookup attempts.
//!
//! At most one attempt is live at a time. Starting a new one cancels
//! whatever was running, and each attempt carries a generation number
//! so outcomes from superseded attempts can be recognized and dropped
//! even if their tasks outlive the cancel.

use tokio_util::sync::CancellationToken;

use cepfill_providers::Cep;

/// A single lookup attempt handed to a worker task.
#[derive(Clone, Debug)]
pub struct Attempt {
    /// The CEP under resolution.
    pub cep: Cep,
    /// Monotonic id; only the outcome matching the coordinator's
    /// current generation is applied.
    pub generation: u64,
    /// Canceled when the attempt is superseded.
    pub token: CancellationToken,
}

/// Tracks the single live attempt.
pub struct RequestCoordinator {
    current: Option<Attempt>,
    generation: u64,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }

    /// Begin a new attempt, canceling any live one first.
    pub fn start(&mut self, cep: Cep) -> Attempt {
        self.cancel_current();
        self.generation += 1;
        let attempt = Attempt {
            cep,
            generation: self.generation,
            token: CancellationToken::new(),
        };
        self.current = Some(attempt.clone());
        attempt
    }

    /// Cancel the live attempt, if any. Returns whether one existed.
    pub fn cancel_current(&mut self) -> bool {
        match self.current.take() {
            Some(attempt) => {
                attempt.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether `generation` identifies the live attempt.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|a| a.generation == generation)
    }

    /// The live attempt, if any.
    pub fn current(&self) -> Option<&Attempt> {
        self.current.as_ref()
    }

    /// Mark the live attempt finished if `generation` still matches.
    pub fn finish(&mut self, generation: u64) {
        if self.is_current(generation) {
            self.current = None;
        }
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
