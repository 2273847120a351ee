//! Connection supervisor and event loop.
//!
//! One supervisor task runs per `connect` call. It owns the transport, the
//! reconnect timer and the outbound command channel, which keeps the whole
//! state machine on a single logical thread:
//!
//! - Opens the transport, racing the open against `Shutdown`
//! - Pumps inbound frames to listeners and outbound frames to the sink
//! - On close, waits the reconnect interval (again racing `Shutdown`) and
//!   reopens, until the attempt budget is spent
//!
//! Only a close schedules a reconnect. A transport error is reported as an
//! `error` event and the close that follows drives the retry.
//!
//! Listeners run inline on this task, so a slow listener delays frame
//! delivery for every event type.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, to_value};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::client::shared::{RetryDecision, Shared};
use crate::error::Error;
use crate::protocol::event::{CONNECTED, DISCONNECTED, ERROR, RECONNECT_FAILED};
use crate::protocol::{Envelope, ErrorPayload, ReconnectFailed, StatusPayload};

use super::{Connector, FrameSink, Transport};

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Commands from client handles to the supervisor.
#[derive(Debug)]
pub(crate) enum ConnectionCommand {
    /// Write a serialized envelope.
    Send(String),
    /// Close the transport and exit.
    Shutdown,
}

/// How a session with an open transport ended.
enum SessionEnd {
    /// Local shutdown; the supervisor exits quietly.
    Shutdown,
    /// The transport closed; retry logic applies.
    Closed,
}

// ============================================================================
// Supervisor
// ============================================================================

/// Runs the connect / pump / retry loop for one generation.
pub(crate) async fn supervise(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    url: Url,
    generation: u64,
    mut commands: mpsc::UnboundedReceiver<ConnectionCommand>,
) {
    debug!(%url, generation, "Supervisor started");

    loop {
        // Connecting
        let opened = {
            let mut open = connector.open(&url);
            loop {
                tokio::select! {
                    biased;

                    command = commands.recv() => match command {
                        Some(ConnectionCommand::Send(_)) => {
                            trace!("Dropping frame queued before open");
                        }
                        Some(ConnectionCommand::Shutdown) | None => {
                            debug!(generation, "Shutdown while connecting");
                            return;
                        }
                    },

                    result = &mut open => break result,
                }
            }
        };

        let was_open = match opened {
            Ok(transport) => {
                if !shared.mark_open(generation) {
                    close_quietly(transport).await;
                    return;
                }

                info!(%url, "Live connection open");
                shared.emit(CONNECTED, &payload(StatusPayload::connected()));

                match run_session(&shared, generation, transport, &mut commands).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Closed => true,
                }
            }

            Err(e) => {
                warn!(%url, error = %e, "Live connection failed to open");
                if !shared.is_current(generation) {
                    return;
                }
                shared.emit(ERROR, &error_payload(&e));
                false
            }
        };

        // Closed
        let decision = shared.close(generation);
        if decision == RetryDecision::Stale {
            return;
        }
        if was_open {
            shared.emit(DISCONNECTED, &payload(StatusPayload::disconnected()));
        }

        match decision {
            RetryDecision::Retry { attempt } => {
                info!(
                    attempt,
                    max = shared.policy.max_attempts,
                    delay_ms = u64::try_from(shared.policy.interval.as_millis()).unwrap_or(u64::MAX),
                    "Scheduling reconnect"
                );
            }
            RetryDecision::Exhausted { attempts } => {
                error!(attempts, %url, "Max reconnection attempts reached");
                shared.emit(RECONNECT_FAILED, &payload(ReconnectFailed { attempts }));
                return;
            }
            RetryDecision::Stale => return,
        }

        // Retrying
        let delay = sleep(shared.policy.interval);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(ConnectionCommand::Send(_)) => {
                        trace!("Dropping frame queued while retrying");
                    }
                    Some(ConnectionCommand::Shutdown) | None => {
                        debug!(generation, "Reconnect cancelled");
                        return;
                    }
                },

                () = &mut delay => break,
            }
        }

        if !shared.mark_connecting(generation) {
            return;
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Pumps frames until the transport closes or `Shutdown` arrives.
///
/// Pending commands win over pending frames, and nothing is emitted once
/// `generation` has been superseded.
async fn run_session(
    shared: &Shared,
    generation: u64,
    transport: Transport,
    commands: &mut mpsc::UnboundedReceiver<ConnectionCommand>,
) -> SessionEnd {
    let Transport {
        mut sink,
        mut source,
    } = transport;

    loop {
        let frame = tokio::select! {
            biased;

            // Commands from client handles
            command = commands.recv() => match command {
                Some(ConnectionCommand::Send(text)) => {
                    match sink.send_frame(text).await {
                        Ok(()) => trace!("Frame sent"),
                        Err(e) => warn!(error = %e, "Failed to write frame"),
                    }
                    continue;
                }

                Some(ConnectionCommand::Shutdown) | None => {
                    shut_down(sink.as_mut()).await;
                    return SessionEnd::Shutdown;
                }
            },

            // Incoming frames from the server
            frame = source.next_frame() => frame,
        };

        if !shared.is_current(generation) {
            debug!(generation, "Superseded, discarding inbound frame");
            shut_down(sink.as_mut()).await;
            return SessionEnd::Shutdown;
        }

        match frame {
            Some(Ok(text)) => dispatch(shared, &text),

            Some(Err(e)) => {
                warn!(error = %e, "Live connection error");
                shared.emit(ERROR, &error_payload(&e));
                return SessionEnd::Closed;
            }

            None => {
                info!("Live connection closed by remote");
                return SessionEnd::Closed;
            }
        }
    }
}

async fn shut_down(sink: &mut dyn FrameSink) {
    if let Err(e) = sink.close().await {
        debug!(error = %e, "Close handshake failed");
    }
    debug!("Live connection shut down");
}

/// Parses a frame and routes it to listeners of its type.
fn dispatch(shared: &Shared, text: &str) {
    match Envelope::parse(text) {
        Ok(envelope) => {
            trace!(event = %envelope.event_type, "Frame received");
            shared.emit(&envelope.event_type, &envelope.payload);
        }
        Err(e) => warn!(error = %e, len = text.len(), "Dropping malformed frame"),
    }
}

/// Closes a transport opened by a superseded supervisor.
async fn close_quietly(transport: Transport) {
    let Transport { mut sink, .. } = transport;
    if let Err(e) = sink.close().await {
        trace!(error = %e, "Close of stale transport failed");
    }
}

// ============================================================================
// Payloads
// ============================================================================

fn payload(value: impl Serialize) -> Value {
    to_value(value).unwrap_or(Value::Null)
}

fn error_payload(error: &Error) -> Value {
    payload(ErrorPayload {
        error: error.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
