//! Live-event client.
//!
//! [`EventBusClient`] keeps one live connection to the dashboard backend,
//! reconnects on a fixed interval when it drops, and routes every inbound
//! envelope to the listeners registered for its `type`.
//!
//! # Example
//!
//! ```no_run
//! use chargeflow_live::{ChargerUpdate, EventBusClient, DEFAULT_LIVE_URL};
//!
//! # #[tokio::main]
//! # async fn main() -> chargeflow_live::Result<()> {
//! let client = EventBusClient::new();
//!
//! client.on_fn("connected", |_| println!("live"));
//! client.on_typed(|update: ChargerUpdate| {
//!     println!("charger {} changed: {:?}", update.charger_id, update.updates);
//! });
//!
//! client.connect(DEFAULT_LIVE_URL)?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Envelope, TypedEvent};
use crate::registry::Listener;
use crate::transport::connection::{ConnectionCommand, supervise};
use crate::transport::{Connector, WebSocketConnector};

use super::builder::EventBusClientBuilder;
use super::options::ReconnectPolicy;
use super::shared::Shared;
use super::state::ConnectionState;

// ============================================================================
// EventBusClient
// ============================================================================

/// Reconnecting client for the dashboard's live event feed.
///
/// Cloning is cheap; clones share the connection and the listener registry.
/// Own one client at the application's composition root and hand clones to
/// the components that need it.
///
/// Dropping the last handle disconnects. A listener that captures a clone
/// keeps the client alive through the registry, so components that do that
/// must call [`disconnect`](Self::disconnect) themselves.
#[derive(Clone)]
pub struct EventBusClient {
    inner: Arc<ClientInner>,
}

/// State owned by the handles. The supervisor only holds `shared`, so this
/// drops with the last handle.
struct ClientInner {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if self.shared.end() {
            debug!("Last client handle dropped, live connection closed");
        }
    }
}

impl Default for EventBusClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// EventBusClient - Constructors
// ============================================================================

impl EventBusClient {
    /// Creates a client with the default policy over WebSocket.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(ReconnectPolicy::default(), Arc::new(WebSocketConnector::new()))
    }

    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> EventBusClientBuilder {
        EventBusClientBuilder::new()
    }

    pub(crate) fn from_parts(policy: ReconnectPolicy, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                shared: Arc::new(Shared::new(policy)),
                connector,
            }),
        }
    }
}

// ============================================================================
// EventBusClient - Connection
// ============================================================================

impl EventBusClient {
    /// Connects to `address`, replacing any existing connection.
    ///
    /// Returns as soon as the connection attempt is scheduled; the outcome
    /// arrives as a `connected` or `error` event. The attempt counter
    /// starts fresh.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] if `address` is not a URL with a host
    /// - [`Error::UnsupportedScheme`] if the scheme is not `ws` or `wss`
    /// - [`Error::Config`] if called outside a Tokio runtime
    pub fn connect(&self, address: &str) -> Result<()> {
        let url = parse_address(address)?;
        let runtime = Handle::try_current()
            .map_err(|_| Error::config("connect must be called within a Tokio runtime"))?;

        let (generation, commands) = self.inner.shared.begin();
        debug!(%url, generation, "Connecting");

        runtime.spawn(supervise(
            Arc::clone(&self.inner.shared),
            Arc::clone(&self.inner.connector),
            url,
            generation,
            commands,
        ));

        Ok(())
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// Listeners stay registered. No `disconnected` event is emitted for a
    /// local disconnect. The attempt counter is left as it was until the
    /// next [`connect`](Self::connect). Calling this while idle does nothing.
    pub fn disconnect(&self) {
        self.inner.shared.end();
    }

    /// Sends an envelope to the server.
    ///
    /// Best effort: if the connection is not open the message is dropped
    /// with a warning. Nothing is queued for later delivery.
    pub fn send(&self, event_type: &str, payload: Value) {
        let commands = match self.inner.shared.outbound() {
            Ok(commands) => commands,
            Err(state) => {
                warn!(event_type, %state, "Live connection is not open, dropping message");
                return;
            }
        };

        let text = match Envelope::new(event_type, payload).to_text() {
            Ok(text) => text,
            Err(e) => {
                warn!(event_type, error = %e, "Failed to serialize message");
                return;
            }
        };

        if commands.send(ConnectionCommand::Send(text)).is_err() {
            warn!(event_type, "Live connection closed, dropping message");
        }
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.state()
    }

    /// Returns `true` if the connection is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    /// Returns the reconnect attempts spent since the last successful open.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.shared.attempts()
    }

    /// Returns a receiver that tracks the connection state.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.shared.watch_state()
    }

    /// Returns the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.inner.shared.policy
    }
}

// ============================================================================
// EventBusClient - Listeners
// ============================================================================

impl EventBusClient {
    /// Registers `listener` for `event`.
    ///
    /// Listeners for the same event run in registration order. Registering
    /// the same listener twice makes it run twice.
    pub fn on(&self, event: impl AsRef<str>, listener: Listener) {
        self.inner.shared.registry.add(event.as_ref(), listener);
    }

    /// Registers a closure for `event` and returns it for later [`off`](Self::off).
    pub fn on_fn<F>(&self, event: impl AsRef<str>, f: F) -> Listener
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(f);
        self.on(event, Arc::clone(&listener));
        listener
    }

    /// Registers a closure that receives a typed payload.
    ///
    /// Payloads that do not deserialize into `T` are logged and skipped.
    pub fn on_typed<T, F>(&self, f: F) -> Listener
    where
        T: TypedEvent + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on_fn(T::NAME, move |payload| match T::deserialize(payload) {
            Ok(typed) => f(typed),
            Err(e) => warn!(event = T::NAME, error = %e, "Payload does not match its event type"),
        })
    }

    /// Removes the first registration of `listener` for `event`.
    ///
    /// Returns `true` if a registration was removed.
    pub fn off(&self, event: impl AsRef<str>, listener: &Listener) -> bool {
        self.inner.shared.registry.remove(event.as_ref(), listener)
    }

    /// Returns the number of registrations for `event`.
    #[must_use]
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.inner.shared.registry.count(event.as_ref())
    }

    /// Invokes the listeners for `event`.
    pub(crate) fn emit(&self, event: &str, data: &Value) -> usize {
        self.inner.shared.emit(event, data)
    }
}

impl std::fmt::Debug for EventBusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusClient")
            .field("shared", &self.inner.shared)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses and validates a live endpoint address.
fn parse_address(address: &str) -> Result<Url> {
    let url = Url::parse(address).map_err(|e| Error::invalid_address(address, e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(Error::unsupported_scheme(other)),
    }

    if url.host_str().is_none() {
        return Err(Error::invalid_address(address, "missing host"));
    }

    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================
