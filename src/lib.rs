//! chargeflow-live - live-event client for the EV charging dashboard.
//!
//! The dashboard's pages render charts and tables from a backend API and a
//! live event feed. This crate is the live feed side: one persistent
//! connection, named events routed to subscribers, and automatic recovery
//! from disconnects without losing subscriber registrations.
//!
//! # Architecture
//!
//! - **[`EventBusClient`]**: public handle; `connect`, `disconnect`, `send`,
//!   `on`, `off`, stream helpers
//! - **Supervisor task**: one per `connect`; owns the transport, the
//!   reconnect timer and the frame pump
//! - **[`Registry`](registry::Registry)**: event name → ordered listeners,
//!   shared by all handles and kept across reconnects
//! - **[`Connector`](transport::Connector)**: transport seam; WebSocket in
//!   production, in-memory in tests
//!
//! Lifecycle events `connected`, `disconnected`, `error` and
//! `reconnect_failed` are delivered through the same registry as server
//! events.
//!
//! # Quick Start
//!
//! ```no_run
//! use chargeflow_live::{EventBusClient, LifecycleEvent, DEFAULT_LIVE_URL};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EventBusClient::new();
//!
//!     let live = client.clone();
//!     client.on_fn(LifecycleEvent::Connected, move |_| {
//!         live.subscribe_to_metrics();
//!         live.subscribe_to_charger_status();
//!     });
//!     client.on_fn("metrics_update", |metrics| println!("{metrics}"));
//!
//!     client.connect(DEFAULT_LIVE_URL)?;
//!     tokio::signal::ctrl_c().await?;
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`EventBusClient`], builder, reconnect policy, state |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Envelope, event names, typed payloads, stream ids |
//! | [`registry`] | Subscriber registry |
//! | [`transport`] | Connector traits, WebSocket and in-memory transports |

// ============================================================================
// Modules
// ============================================================================

/// Live-event client.
pub mod client;

/// Error types and result aliases.
pub mod error;

/// Wire messages and event payloads.
pub mod protocol;

/// Subscriber registry.
pub mod registry;

/// Transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ConnectionState, DEFAULT_LIVE_URL, EventBusClient, EventBusClientBuilder, ReconnectPolicy,
};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{
    ChargerId, ChargerUpdate, Envelope, ErrorPayload, LifecycleEvent, MetricsUpdate,
    ReconnectFailed, StreamKind, TypedEvent,
};

// Listener types
pub use registry::{Listener, listener};

// Transport types
pub use transport::{Connector, MemoryConnector, WebSocketConnector};
