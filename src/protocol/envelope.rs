//! Wire envelope shared by inbound and outbound frames.
//!
//! Every text frame on the live connection carries exactly one envelope.
//! The server pushes data events in it; the client uses it for stream
//! subscription requests.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Value, from_str, to_string};

use crate::error::{Error, Result};

// ============================================================================
// Envelope
// ============================================================================

/// A single message on the live connection.
///
/// # Format
///
/// ```json
/// {
///   "type": "charger_update",
///   "payload": { "chargerId": "A3", "updates": { "status": "charging" } }
/// }
/// ```
///
/// A frame without `payload` parses with a `null` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name used to route the payload to listeners.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event data, opaque to the transport.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Creates a new envelope.
    #[inline]
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Parses an envelope from a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the text is not JSON or has no
    /// string `type` field.
    pub fn parse(text: &str) -> Result<Self> {
        from_str(text).map_err(|e| Error::protocol(format!("malformed envelope: {e}")))
    }

    /// Serializes the envelope into a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        Ok(to_string(self)?)
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
    fn test_parse_envelope() {
        let text = r#"{"type":"metrics_update","payload":{"currentQueue":8}}"#;
        let envelope = Envelope::parse(text).expect("parse envelope");

        assert_eq!(envelope.event_type, "metrics_update");
        assert_eq!(envelope.payload["currentQueue"], 8);
    }

    #[test]
    fn test_missing_payload_is_null() {
        let envelope = Envelope::parse(r#"{"type":"ping"}"#).expect("parse envelope");
        assert_eq!(envelope.payload, Value::Null);
    }

    #[test]
    fn test_rejects_non_json() {
        let err = Envelope::parse("definitely not json").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_rejects_missing_type() {
        assert!(Envelope::parse(r#"{"payload":1}"#).is_err());
        assert!(Envelope::parse(r#"{"type":7,"payload":1}"#).is_err());
    }

    #[test]
    fn test_outbound_wire_format() {
        let envelope = Envelope::new("subscribe", json!({ "stream": "metrics" }));
        let text = envelope.to_text().expect("serialize");
        let wire: Value = serde_json::from_str(&text).expect("valid json");

        assert_eq!(
            wire,
            json!({ "type": "subscribe", "payload": { "stream": "metrics" } })
        );
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = json!({
            "nested": { "list": [1, 2.5, "three", null, true] },
            "unicode": "Zone B – Bay 2",
        });
        let text = Envelope::new("echo", payload.clone())
            .to_text()
            .expect("serialize");

        assert_eq!(Envelope::parse(&text).expect("parse").payload, payload);
    }
}
