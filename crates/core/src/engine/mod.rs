//! Engine actor, attempt coordination and lifecycle states.

mod coordinator;
mod service;
mod state;

pub use coordinator::{Attempt, RequestCoordinator};
pub use service::{EngineBuilder, EngineHandle, ResolutionEngine};
pub use state::{EngineState, StateDetail, StateMachine};
