//! The resolution engine: an actor that turns raw input events into
//! debounced, cancelable lookup attempts.
//!
//! The engine owns all mutable state and runs on a single task.
//! Callers hold an [`EngineHandle`] and feed it input events; lookup
//! attempts run on spawned worker tasks and report back over an
//! outcome channel, so a slow provider never blocks input handling.

use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::Instant;

use cepfill_providers::{
    strip_non_digits, AddressProvider, BrasilApiProvider, Cep, LookupError, LookupReply,
    ViaCepProvider,
};

use crate::cache::{CacheStore, MemoryCache, NoopCache};
use crate::config::{CacheMode, EngineConfig};
use crate::errors::{Error, Result};
use crate::observer::{EngineObserver, NoopObserver};
use crate::resolver::{CepResolver, Resolution};
use crate::retry::RetryPolicy;

use super::coordinator::RequestCoordinator;
use super::state::{EngineState, StateDetail, StateMachine};

/// Input events accepted by the engine.
#[derive(Debug)]
enum EngineCommand {
    /// The field content changed.
    Input(String),
    /// Focus left the field.
    FocusLost,
    /// Abandon whatever is pending or in flight.
    Cancel,
}

/// Result of one worker task, tagged with its attempt generation.
struct AttemptOutcome {
    generation: u64,
    cep: Cep,
    result: std::result::Result<Resolution, LookupError>,
}

/// Cheap, cloneable front door to a running engine.
///
/// All methods are fire-and-forget. Once the engine task has stopped,
/// sends are silently dropped.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Report the field's full current content, as typed.
    pub fn submit_raw_input(&self, raw: &str) {
        let _ = self.tx.send(EngineCommand::Input(raw.to_string()));
    }

    /// Report that focus left the field.
    pub fn signal_focus_lost(&self) {
        let _ = self.tx.send(EngineCommand::FocusLost);
    }

    /// Cancel the pending trigger and any in-flight attempt.
    pub fn request_cancel(&self) {
        let _ = self.tx.send(EngineCommand::Cancel);
    }
}

/// Assembles an engine from a config plus optional overrides.
pub struct EngineBuilder {
    config: EngineConfig,
    providers: Option<Vec<Arc<dyn AddressProvider>>>,
    cache: Option<Arc<dyn CacheStore>>,
    observer: Option<Arc<dyn EngineObserver>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            providers: None,
            cache: None,
            observer: None,
        }
    }

    /// Replace the default ViaCEP/BrasilAPI chain.
    pub fn providers(mut self, providers: Vec<Arc<dyn AddressProvider>>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Supply a cache backend. Required for `CacheMode::Durable`,
    /// optional override for `CacheMode::Memory`, ignored for
    /// `CacheMode::Off`.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Supply the observer to notify.
    pub fn observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the engine and its handle. The engine does nothing until
    /// `run` is awaited, typically on a spawned task.
    pub fn build(self) -> Result<(EngineHandle, ResolutionEngine)> {
        let providers = match self.providers {
            Some(providers) => providers,
            None => {
                let mut chain: Vec<Arc<dyn AddressProvider>> =
                    vec![Arc::new(ViaCepProvider::new())];
                if self.config.fallback_enabled {
                    chain.push(Arc::new(BrasilApiProvider::new()));
                }
                chain
            }
        };
        if providers.is_empty() {
            return Err(Error::InvalidConfig("Provider chain is empty".to_string()));
        }

        let cache: Arc<dyn CacheStore> = match (self.config.cache_mode, self.cache) {
            (CacheMode::Off, _) => Arc::new(NoopCache),
            (CacheMode::Memory, Some(cache)) => cache,
            (CacheMode::Memory, None) => Arc::new(MemoryCache::new(self.config.cache_ttl)),
            (CacheMode::Durable, Some(cache)) => cache,
            (CacheMode::Durable, None) => {
                return Err(Error::InvalidConfig(
                    "CacheMode::Durable requires a cache backend".to_string(),
                ));
            }
        };

        let observer: Arc<dyn EngineObserver> = match self.observer {
            Some(observer) => observer,
            None => Arc::new(NoopObserver),
        };

        let resolver = Arc::new(CepResolver::new(
            providers,
            cache,
            RetryPolicy::new(self.config.retries, self.config.retry_backoff_base),
            self.config.fetch_timeout,
        ));

        let (tx, rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let engine = ResolutionEngine {
            config: self.config,
            resolver,
            state: StateMachine::new(observer.clone()),
            observer,
            coordinator: RequestCoordinator::new(),
            rx,
            outcome_tx,
            outcome_rx,
            raw_input: String::new(),
            focused: false,
            deadline: None,
            last_resolved: None,
        };

        Ok((EngineHandle { tx }, engine))
    }
}

/// The engine actor. See the crate docs for the event flow.
pub struct ResolutionEngine {
    config: EngineConfig,
    resolver: Arc<CepResolver>,
    state: StateMachine,
    observer: Arc<dyn EngineObserver>,
    coordinator: RequestCoordinator,
    rx: mpsc::UnboundedReceiver<EngineCommand>,
    outcome_tx: mpsc::UnboundedSender<AttemptOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<AttemptOutcome>,
    /// Last raw input, kept verbatim so the trigger validates what
    /// the user actually typed.
    raw_input: String,
    /// Whether the field currently has focus.
    focused: bool,
    /// When the armed debounce fires, if armed.
    deadline: Option<Instant>,
    /// CEP of the last successful attempt, for idempotence.
    last_resolved: Option<Cep>,
}

impl ResolutionEngine {
    /// Start assembling an engine.
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Run the event loop until every handle is dropped.
    ///
    /// Commands are drained before outcomes so a cancel or new input
    /// arriving together with a stale result wins; the debounce timer
    /// has the lowest priority.
    pub async fn run(mut self) {
        info!("Resolution engine started");
        // Announce the initial state so observers see the full
        // lifecycle from the start.
        self.state.transition(EngineState::Idle, StateDetail::None);
        loop {
            let deadline = self.deadline;
            let debounce_fired = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            self.coordinator.cancel_current();
                            info!("All handles dropped, resolution engine stopping");
                            return;
                        }
                    }
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.handle_outcome(outcome);
                }
                _ = debounce_fired => {
                    self.deadline = None;
                    self.fire_trigger();
                }
            }
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Input(raw) => self.handle_input(raw),
            EngineCommand::FocusLost => {
                // Blur re-arms the trigger so input deferred while
                // focused gets its verdict now.
                self.focused = false;
                self.arm_debounce();
            }
            EngineCommand::Cancel => self.handle_cancel(),
        }
    }

    fn handle_input(&mut self, raw: String) {
        self.focused = true;
        let digits = strip_non_digits(&raw);
        self.raw_input = raw;

        if digits.is_empty() {
            // A cleared field is never invalid input.
            self.deadline = None;
            self.last_resolved = None;
            if self.config.clear_on_empty {
                if self.coordinator.cancel_current() {
                    self.state
                        .transition(EngineState::Canceled, StateDetail::None);
                }
                self.state.transition(EngineState::Idle, StateDetail::None);
            }
            return;
        }

        self.state.transition(
            EngineState::Editing,
            StateDetail::Editing {
                digits: digits.len(),
            },
        );
        self.arm_debounce();
    }

    fn handle_cancel(&mut self) {
        let had_pending = self.deadline.take().is_some();
        let had_inflight = self.coordinator.cancel_current();
        if had_pending || had_inflight {
            self.state
                .transition(EngineState::Canceled, StateDetail::None);
        }
    }

    /// The debounce elapsed: validate the input and, if it holds a
    /// complete CEP that is not already resolved, start an attempt.
    fn fire_trigger(&mut self) {
        let digits = strip_non_digits(&self.raw_input);
        if digits.is_empty() {
            return;
        }

        let cep = match Cep::parse(&self.raw_input) {
            Ok(cep) => cep,
            Err(error) => {
                if self.config.validate_on_blur && self.focused {
                    debug!("Deferring invalid input verdict until focus leaves");
                    return;
                }
                self.state.transition(
                    EngineState::InvalidInput,
                    StateDetail::Rejected {
                        error: error.clone(),
                    },
                );
                self.observer.on_error(&error);
                return;
            }
        };

        // Same CEP already answered: nothing to redo.
        if self.state.current() == EngineState::Succeeded
            && self.last_resolved.as_ref() == Some(&cep)
        {
            debug!("Skipping repeat lookup for {}", cep);
            return;
        }

        self.begin_attempt(cep);
    }

    fn begin_attempt(&mut self, cep: Cep) {
        if self.coordinator.current().is_some() {
            self.coordinator.cancel_current();
            self.state
                .transition(EngineState::Canceled, StateDetail::None);
        }

        let attempt = self.coordinator.start(cep.clone());
        self.state
            .transition(EngineState::Resolving, StateDetail::Resolving { cep });

        let resolver = self.resolver.clone();
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = resolver.resolve(&attempt.cep, &attempt.token).await;
            let _ = outcome_tx.send(AttemptOutcome {
                generation: attempt.generation,
                cep: attempt.cep,
                result,
            });
        });
    }

    fn handle_outcome(&mut self, outcome: AttemptOutcome) {
        // Superseded attempts may still deliver; their outcomes are
        // dropped on the floor.
        if !self.coordinator.is_current(outcome.generation) {
            debug!("Dropping stale outcome for {}", outcome.cep);
            return;
        }
        self.coordinator.finish(outcome.generation);

        match outcome.result {
            Ok(resolution) => match resolution.reply {
                LookupReply::Found(record) => {
                    self.last_resolved = Some(outcome.cep);
                    self.state.transition(
                        EngineState::Succeeded,
                        StateDetail::Resolved {
                            provider: resolution.provider.clone(),
                            from_cache: resolution.from_cache,
                        },
                    );
                    self.observer
                        .on_success(&record, &resolution.provider, resolution.from_cache);
                }
                LookupReply::NotFound => {
                    self.state.transition(
                        EngineState::NotFound,
                        StateDetail::Resolved {
                            provider: resolution.provider.clone(),
                            from_cache: resolution.from_cache,
                        },
                    );
                    self.observer.on_not_found(&outcome.cep, &resolution.provider);
                }
            },
            Err(error) => {
                if error.is_canceled() {
                    self.state
                        .transition(EngineState::Canceled, StateDetail::None);
                    return;
                }
                let state = if matches!(error, LookupError::RateLimited { .. }) {
                    EngineState::RateLimited
                } else {
                    EngineState::Failed
                };
                self.state.transition(
                    state,
                    StateDetail::Rejected {
                        error: error.clone(),
                    },
                );
                self.observer.on_error(&error);
            }
        }
    }

    fn arm_debounce(&mut self) {
        self.deadline = Some(Instant::now() + self.config.debounce);
    }
}
