//! Transport layer.
//!
//! The client talks to the server through three small traits, so the
//! reconnect state machine never depends on a concrete socket:
//!
//! ```text
//! ┌──────────────────┐   open(url)    ┌──────────────┐
//! │   Supervisor     │───────────────►│  Connector   │
//! │  (one per        │                └──────┬───────┘
//! │   connect call)  │   Transport { sink, source }
//! │                  │◄──────────────────────┘
//! │  send_frame ─────┼──► FrameSink ───► server
//! │  next_frame ◄────┼─── FrameSource ◄── server
//! └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `EventBusClient::connect` spawns a supervisor task
//! 2. The supervisor opens a [`Transport`] through the [`Connector`]
//! 3. Frames are pumped until the transport closes or `Shutdown` arrives
//! 4. On close the supervisor waits the reconnect interval and reopens
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Supervisor task: event loop and reconnect policy |
//! | `memory` | In-process connector for tests and demos |
//! | `websocket` | WebSocket connector |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Supervisor task and event loop.
pub(crate) mod connection;

/// In-process connector.
pub mod memory;

/// WebSocket connector.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryConnector, MemoryPeer};
pub use websocket::WebSocketConnector;

// ============================================================================
// Traits
// ============================================================================

/// Outbound half of a transport.
#[async_trait]
pub trait FrameSink: Send {
    /// Writes one text frame.
    async fn send_frame(&mut self, text: String) -> Result<()>;

    /// Closes the transport from the local side.
    async fn close(&mut self) -> Result<()>;
}

/// Inbound half of a transport.
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next text frame.
    ///
    /// Returns `None` once the transport has closed and `Some(Err(_))` on a
    /// transport error. Must be cancel-safe: the supervisor polls it inside
    /// `tokio::select!`.
    async fn next_frame(&mut self) -> Option<Result<String>>;
}

/// Opens transports to a server address.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new transport.
    ///
    /// # Errors
    ///
    /// Any error means the open failed; the supervisor reports it as an
    /// `error` event and schedules a retry.
    async fn open(&self, url: &Url) -> Result<Transport>;
}

// ============================================================================
// Transport
// ============================================================================

/// An open connection split into its two halves.
pub struct Transport {
    /// Outbound half.
    pub sink: Box<dyn FrameSink>,
    /// Inbound half.
    pub source: Box<dyn FrameSource>,
}

impl Transport {
    /// Creates a transport from its halves.
    #[inline]
    #[must_use]
    pub fn new(sink: impl FrameSink + 'static, source: impl FrameSource + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            source: Box::new(source),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}
