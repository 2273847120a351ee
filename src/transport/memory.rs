//! In-process connector.
//!
//! [`MemoryConnector`] hands out channel-backed transports instead of
//! sockets. Each accepted open is paired with a [`MemoryPeer`] playing the
//! server: it can push frames, inject transport errors, close the
//! connection, and read what the client sent. Opens nobody prepared for
//! are refused, which is exactly what a server that is down looks like.
//!
//! # Example
//!
//! ```ignore
//! let connector = MemoryConnector::new();
//! connector.refuse_next("server restarting");
//! let mut peer = connector.accept_next();
//!
//! let client = EventBusClient::builder().connector(connector.clone()).build()?;
//! client.connect("ws://control-room.local/ws")?;
//! // first open is refused, the retry lands on `peer`
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::Envelope;

use super::{Connector, FrameSink, FrameSource, Transport};

// ============================================================================
// Types
// ============================================================================

/// What the peer pushes toward the client.
enum PeerFrame {
    Text(String),
    Error(String),
}

/// Queued outcome for the next open.
enum Outcome {
    Refuse(String),
    Accept(Transport),
}

#[derive(Default)]
struct ConnectorState {
    outcomes: VecDeque<Outcome>,
    opened: Vec<Url>,
}

// ============================================================================
// MemoryConnector
// ============================================================================

/// Connector backed by in-process channels.
///
/// Cloning shares the same queue of outcomes and open log.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MemoryConnector {
    /// Creates a connector that refuses every open until told otherwise.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a refusal for the next unprepared open.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .outcomes
            .push_back(Outcome::Refuse(reason.into()));
    }

    /// Queues an accepted open and returns the server side of it.
    #[must_use]
    pub fn accept_next(&self) -> MemoryPeer {
        let (to_client, from_peer) = mpsc::unbounded_channel();
        let (to_peer, from_client) = mpsc::unbounded_channel();

        let transport = Transport::new(
            MemorySink(Some(to_peer)),
            MemorySource {
                rx: from_peer,
                failed: false,
            },
        );
        self.state
            .lock()
            .outcomes
            .push_back(Outcome::Accept(transport));

        MemoryPeer {
            to_client: Some(to_client),
            from_client,
        }
    }

    /// Number of opens attempted so far, accepted or not.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.lock().opened.len()
    }

    /// Addresses of every open attempted so far.
    #[must_use]
    pub fn opened_urls(&self) -> Vec<Url> {
        self.state.lock().opened.clone()
    }
}

impl std::fmt::Debug for MemoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryConnector")
            .field("queued", &state.outcomes.len())
            .field("opened", &state.opened.len())
            .finish()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, url: &Url) -> Result<Transport> {
        let outcome = {
            let mut state = self.state.lock();
            state.opened.push(url.clone());
            state.outcomes.pop_front()
        };

        match outcome {
            Some(Outcome::Accept(transport)) => {
                debug!(%url, "Memory transport accepted");
                Ok(transport)
            }
            Some(Outcome::Refuse(reason)) => Err(Error::connection(reason)),
            None => Err(Error::connection("connection refused")),
        }
    }
}

// ============================================================================
// MemoryPeer
// ============================================================================

/// Server side of one accepted memory transport.
///
/// Dropping the peer closes the connection.
pub struct MemoryPeer {
    to_client: Option<mpsc::UnboundedSender<PeerFrame>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Pushes a raw text frame to the client.
    ///
    /// Returns `false` if the client side is gone.
    pub fn push_text(&self, text: impl Into<String>) -> bool {
        self.push(PeerFrame::Text(text.into()))
    }

    /// Pushes an envelope to the client.
    pub fn push_event(&self, event_type: &str, payload: Value) -> bool {
        match Envelope::new(event_type, payload).to_text() {
            Ok(text) => self.push_text(text),
            Err(_) => false,
        }
    }

    /// Fails the transport with a transport error.
    ///
    /// The client sees the error and then the close.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.push(PeerFrame::Error(reason.into()));
        self.to_client = None;
    }

    /// Closes the connection from the server side.
    pub fn close(&mut self) {
        self.to_client = None;
    }

    /// Waits for the next frame the client sent.
    ///
    /// Returns `None` once the client has closed its side.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Returns a frame the client already sent, without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }

    /// Returns `true` once the client has closed its side.
    #[must_use]
    pub fn is_closed_by_client(&self) -> bool {
        self.from_client.is_closed() && self.from_client.is_empty()
    }

    fn push(&self, frame: PeerFrame) -> bool {
        self.to_client
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }
}

impl std::fmt::Debug for MemoryPeer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPeer")
            .field("open", &self.to_client.is_some())
            .finish()
    }
}

// ============================================================================
// MemorySink / MemorySource
// ============================================================================

struct MemorySink(Option<mpsc::UnboundedSender<String>>);

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_frame(&mut self, text: String) -> Result<()> {
        let tx = self.0.as_ref().ok_or(Error::ConnectionClosed)?;
        tx.send(text).map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<()> {
        self.0 = None;
        Ok(())
    }
}

struct MemorySource {
    rx: mpsc::UnboundedReceiver<PeerFrame>,
    failed: bool,
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        if self.failed {
            return None;
        }

        match self.rx.recv().await? {
            PeerFrame::Text(text) => Some(Ok(text)),
            PeerFrame::Error(reason) => {
                self.failed = true;
                Some(Err(Error::connection(reason)))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
