//! Named data streams the backend pushes on request.
//!
//! A collaborator asks for a stream by sending a `subscribe` envelope and
//! stops it with `unsubscribe`. The identifiers are plain strings the
//! backend recognizes; the client does not validate them.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use serde_json::{Value, to_value};

// ============================================================================
// Constants
// ============================================================================

/// Outbound envelope type for starting a stream.
pub const SUBSCRIBE: &str = "subscribe";

/// Outbound envelope type for stopping a stream.
pub const UNSUBSCRIBE: &str = "unsubscribe";

// ============================================================================
// StreamKind
// ============================================================================

/// Known stream identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Site-wide metrics.
    Metrics,
    /// Per-charger status changes.
    ChargerStatus,
    /// Approaching-traffic counts.
    Traffic,
    /// Detections from one camera.
    Camera,
}

impl StreamKind {
    /// Returns the wire identifier.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::ChargerStatus => "charger_status",
            Self::Traffic => "traffic",
            Self::Camera => "camera",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for StreamKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// StreamRequest
// ============================================================================

/// Payload of `subscribe` and `unsubscribe` envelopes.
///
/// # Format
///
/// ```json
/// { "stream": "camera", "cameraId": "cam-north-2" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRequest {
    /// Stream identifier.
    pub stream: String,

    /// Camera to follow, only for the `camera` stream.
    #[serde(rename = "cameraId", skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
}

impl StreamRequest {
    /// Request for a stream by name.
    #[inline]
    #[must_use]
    pub fn new(stream: impl AsRef<str>) -> Self {
        Self {
            stream: stream.as_ref().to_string(),
            camera_id: None,
        }
    }

    /// Request for one camera's feed.
    #[inline]
    #[must_use]
    pub fn camera(camera_id: impl Into<String>) -> Self {
        Self {
            stream: StreamKind::Camera.as_str().to_string(),
            camera_id: Some(camera_id.into()),
        }
    }

    /// Converts the request into an envelope payload.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        // Two string fields cannot fail to serialize.
        to_value(self).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_stream_identifiers() {
        assert_eq!(StreamKind::Metrics.as_str(), "metrics");
        assert_eq!(StreamKind::ChargerStatus.as_str(), "charger_status");
        assert_eq!(StreamKind::Traffic.as_str(), "traffic");
        assert_eq!(StreamKind::Camera.to_string(), "camera");
    }

    #[test]
    fn test_plain_request_omits_camera() {
        let payload = StreamRequest::new(StreamKind::Traffic).to_payload();
        assert_eq!(payload, json!({ "stream": "traffic" }));
    }

    #[test]
    fn test_camera_request() {
        let payload = StreamRequest::camera("cam-7").to_payload();
        assert_eq!(payload, json!({ "stream": "camera", "cameraId": "cam-7" }));
    }

    #[test]
    fn test_unknown_stream_passes_through() {
        let payload = StreamRequest::new("occupancy").to_payload();
        assert_eq!(payload, json!({ "stream": "occupancy" }));
    }
}
