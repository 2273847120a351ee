//! State shared between client handles and the supervisor task.
//!
//! Every `connect` starts a new generation. The supervisor carries the
//! generation it was spawned with and every transition it requests is
//! checked against the current one, so a supervisor that lost a race with
//! `disconnect` or a newer `connect` can never move the client out of
//! `Idle` or schedule another attempt.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::registry::Registry;
use crate::transport::connection::ConnectionCommand;

use super::options::ReconnectPolicy;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Outcome of a transport close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// Wait the interval, then make attempt number `attempt`.
    Retry { attempt: u32 },
    /// Budget spent; the client is now `Failed`.
    Exhausted { attempts: u32 },
    /// The supervisor has been superseded and must exit.
    Stale,
}

struct Lifecycle {
    state: ConnectionState,
    generation: u64,
    attempts: u32,
    commands: Option<mpsc::UnboundedSender<ConnectionCommand>>,
}

// ============================================================================
// Shared
// ============================================================================

pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) policy: ReconnectPolicy,
    lifecycle: Mutex<Lifecycle>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Shared {
    pub(crate) fn new(policy: ReconnectPolicy) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);

        Self {
            registry: Registry::new(),
            policy,
            lifecycle: Mutex::new(Lifecycle {
                state: ConnectionState::Idle,
                generation: 0,
                attempts: 0,
                commands: None,
            }),
            state_tx,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.lifecycle.lock().state
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.lifecycle.lock().attempts
    }

    pub(crate) fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: &str, data: &Value) -> usize {
        self.registry.emit(event, data)
    }

    // ========================================================================
    // Client-side transitions
    // ========================================================================

    /// Starts a new generation in `Connecting`, shutting down any previous
    /// supervisor. Resets the attempt counter.
    pub(crate) fn begin(&self) -> (u64, mpsc::UnboundedReceiver<ConnectionCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut lifecycle = self.lifecycle.lock();

        if let Some(previous) = lifecycle.commands.replace(tx) {
            debug!(state = %lifecycle.state, "Replacing existing live connection");
            let _ = previous.send(ConnectionCommand::Shutdown);
        }

        lifecycle.generation += 1;
        lifecycle.attempts = 0;
        self.set_state(&mut lifecycle, ConnectionState::Connecting);

        (lifecycle.generation, rx)
    }

    /// Stops the current generation and returns to `Idle`.
    ///
    /// Keeps the attempt counter. Returns `false` if already idle.
    pub(crate) fn end(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.generation += 1;

        if let Some(commands) = lifecycle.commands.take() {
            let _ = commands.send(ConnectionCommand::Shutdown);
        }

        if lifecycle.state == ConnectionState::Idle {
            return false;
        }

        info!(from = %lifecycle.state, "Live connection closed locally");
        self.set_state(&mut lifecycle, ConnectionState::Idle);
        true
    }

    /// Returns the command channel if frames can be sent right now.
    pub(crate) fn outbound(
        &self,
    ) -> Result<mpsc::UnboundedSender<ConnectionCommand>, ConnectionState> {
        let lifecycle = self.lifecycle.lock();
        match (&lifecycle.commands, lifecycle.state) {
            (Some(commands), ConnectionState::Open) => Ok(commands.clone()),
            (_, state) => Err(state),
        }
    }

    // ========================================================================
    // Supervisor-side transitions
    // ========================================================================

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.lifecycle.lock().generation == generation
    }

    /// `Connecting → Open`. Resets the attempt counter.
    pub(crate) fn mark_open(&self, generation: u64) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation != generation {
            return false;
        }

        lifecycle.attempts = 0;
        self.set_state(&mut lifecycle, ConnectionState::Open);
        true
    }

    /// `Retrying → Connecting`.
    pub(crate) fn mark_connecting(&self, generation: u64) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation != generation {
            return false;
        }

        self.set_state(&mut lifecycle, ConnectionState::Connecting);
        true
    }

    /// Records a close (or failed open) and decides what happens next.
    pub(crate) fn close(&self, generation: u64) -> RetryDecision {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation != generation {
            return RetryDecision::Stale;
        }

        if self.policy.allows(lifecycle.attempts) {
            lifecycle.attempts += 1;
            self.set_state(&mut lifecycle, ConnectionState::Retrying);
            RetryDecision::Retry {
                attempt: lifecycle.attempts,
            }
        } else {
            lifecycle.commands = None;
            self.set_state(&mut lifecycle, ConnectionState::Failed);
            RetryDecision::Exhausted {
                attempts: lifecycle.attempts,
            }
        }
    }

    fn set_state(&self, lifecycle: &mut Lifecycle, state: ConnectionState) {
        if lifecycle.state != state {
            debug!(from = %lifecycle.state, to = %state, generation = lifecycle.generation, "State transition");
        }
        lifecycle.state = state;
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for Shared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lifecycle = self.lifecycle.lock();
        f.debug_struct("Shared")
            .field("state", &lifecycle.state)
            .field("generation", &lifecycle.generation)
            .field("attempts", &lifecycle.attempts)
            .field("policy", &self.policy)
            .field("registry", &self.registry)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
