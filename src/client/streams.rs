//! Stream subscription helpers.
//!
//! Thin wrappers over [`EventBusClient::send`] naming the streams the
//! dashboard pages ask for. They carry no state of their own: a
//! subscription sent while disconnected is dropped like any other send,
//! and nothing is replayed after a reconnect. Pages that need a stream
//! re-subscribe from their `connected` listener.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::stream::{SUBSCRIBE, UNSUBSCRIBE};
use crate::protocol::{StreamKind, StreamRequest};

use super::core::EventBusClient;

// ============================================================================
// EventBusClient - Streams
// ============================================================================

impl EventBusClient {
    /// Requests the site-wide metrics stream.
    pub fn subscribe_to_metrics(&self) {
        self.subscribe(StreamRequest::new(StreamKind::Metrics));
    }

    /// Requests per-charger status updates.
    pub fn subscribe_to_charger_status(&self) {
        self.subscribe(StreamRequest::new(StreamKind::ChargerStatus));
    }

    /// Requests approaching-traffic updates.
    pub fn subscribe_to_traffic(&self) {
        self.subscribe(StreamRequest::new(StreamKind::Traffic));
    }

    /// Requests detections from one camera.
    pub fn subscribe_to_camera_feed(&self, camera_id: impl Into<String>) {
        self.subscribe(StreamRequest::camera(camera_id));
    }

    /// Stops a stream by identifier.
    pub fn unsubscribe_from_stream(&self, stream: impl AsRef<str>) {
        self.send(UNSUBSCRIBE, StreamRequest::new(stream).to_payload());
    }

    fn subscribe(&self, request: StreamRequest) {
        self.send(SUBSCRIBE, request.to_payload());
    }
}

// ============================================================================
// Tests
// ============================================================================
