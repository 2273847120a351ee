//! Event names and typed payloads.
//!
//! Two families of events reach listeners:
//!
//! | Family | Events | Origin |
//! |--------|--------|--------|
//! | Lifecycle | `connected`, `disconnected`, `error`, `reconnect_failed` | Emitted by the client itself |
//! | Dashboard data | `metrics_update`, `charger_update` | Pushed by the server |
//!
//! Any other `type` the server sends is routed by name as an untyped
//! [`Value`](serde_json::Value).

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Event Names
// ============================================================================

/// Emitted when a transport opens.
pub const CONNECTED: &str = "connected";

/// Emitted when an open transport closes.
pub const DISCONNECTED: &str = "disconnected";

/// Emitted on a transport error, including failed opens.
pub const ERROR: &str = "error";

/// Emitted once when the reconnect budget is spent.
pub const RECONNECT_FAILED: &str = "reconnect_failed";

/// Live dashboard metrics snapshot.
pub const METRICS_UPDATE: &str = "metrics_update";

/// Partial update of one charger.
pub const CHARGER_UPDATE: &str = "charger_update";

// ============================================================================
// LifecycleEvent
// ============================================================================

/// Events the client emits about its own connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Transport opened.
    Connected,
    /// Open transport closed.
    Disconnected,
    /// Transport error.
    Error,
    /// Reconnect attempts exhausted.
    ReconnectFailed,
}

impl LifecycleEvent {
    /// Returns the wire name of the event.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => CONNECTED,
            Self::Disconnected => DISCONNECTED,
            Self::Error => ERROR,
            Self::ReconnectFailed => RECONNECT_FAILED,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for LifecycleEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

// ============================================================================
// TypedEvent
// ============================================================================

/// Binds a payload type to the event name it arrives under.
///
/// Used by [`EventBusClient::on_typed`](crate::EventBusClient::on_typed)
/// to hand listeners a concrete struct instead of raw JSON.
pub trait TypedEvent: DeserializeOwned {
    /// Event name this payload is routed under.
    const NAME: &'static str;
}

// ============================================================================
// Lifecycle Payloads
// ============================================================================

/// Payload of `connected` and `disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// `"connected"` or `"disconnected"`.
    pub status: String,
}

impl StatusPayload {
    /// Payload for `connected`.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            status: CONNECTED.to_string(),
        }
    }

    /// Payload for `disconnected`.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            status: DISCONNECTED.to_string(),
        }
    }
}

/// Payload of `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable error detail.
    pub error: String,
}

impl TypedEvent for ErrorPayload {
    const NAME: &'static str = ERROR;
}

/// Payload of `reconnect_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectFailed {
    /// Reconnect attempts spent before giving up.
    pub attempts: u32,
}

impl TypedEvent for ReconnectFailed {
    const NAME: &'static str = RECONNECT_FAILED;
}

// ============================================================================
// Dashboard Payloads
// ============================================================================

/// Charger identifier as sent by the backend.
///
/// Older stations report numeric ids, newer ones bay labels such as `"A3"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChargerId {
    /// Numeric id.
    Numeric(i64),
    /// Bay label.
    Label(String),
}

impl fmt::Display for ChargerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// Payload of `charger_update`: fields to merge into one charger record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerUpdate {
    /// Charger to update.
    #[serde(rename = "chargerId")]
    pub charger_id: ChargerId,

    /// Changed fields.
    #[serde(default)]
    pub updates: Map<String, Value>,
}

impl TypedEvent for ChargerUpdate {
    const NAME: &'static str = CHARGER_UPDATE;
}

/// Payload of `metrics_update`.
///
/// The metrics object replaces the dashboard's current snapshot wholesale,
/// so its fields are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsUpdate(pub Map<String, Value>);

impl MetricsUpdate {
    /// Returns a metric by name.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl TypedEvent for MetricsUpdate {
    const NAME: &'static str = METRICS_UPDATE;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{from_value, json, to_value};

    #[test]
    fn test_lifecycle_names() {
        assert_eq!(LifecycleEvent::Connected.as_str(), "connected");
        assert_eq!(LifecycleEvent::Disconnected.as_str(), "disconnected");
        assert_eq!(LifecycleEvent::Error.as_str(), "error");
        assert_eq!(LifecycleEvent::ReconnectFailed.as_str(), "reconnect_failed");
    }

    #[test]
    fn test_status_payload_wire() {
        assert_eq!(
            to_value(StatusPayload::connected()).unwrap(),
            json!({ "status": "connected" })
        );
        assert_eq!(
            to_value(StatusPayload::disconnected()).unwrap(),
            json!({ "status": "disconnected" })
        );
    }

    #[test]
    fn test_reconnect_failed_wire() {
        let payload = to_value(ReconnectFailed { attempts: 3 }).unwrap();
        assert_eq!(payload, json!({ "attempts": 3 }));
    }

    #[test]
    fn test_charger_update_label_id() {
        let update: ChargerUpdate = from_value(json!({
            "chargerId": "B2",
            "updates": { "status": "offline", "power": 0 }
        }))
        .unwrap();

        assert_eq!(update.charger_id, ChargerId::Label("B2".into()));
        assert_eq!(update.updates["status"], "offline");
        assert_eq!(update.charger_id.to_string(), "B2");
    }

    #[test]
    fn test_charger_update_numeric_id_without_updates() {
        let update: ChargerUpdate = from_value(json!({ "chargerId": 14 })).unwrap();

        assert_eq!(update.charger_id, ChargerId::Numeric(14));
        assert!(update.updates.is_empty());
    }

    #[test]
    fn test_metrics_update_transparent() {
        let metrics: MetricsUpdate =
            from_value(json!({ "currentQueue": 8, "avgDwellTime": "23 min" })).unwrap();

        assert_eq!(metrics.get("currentQueue"), Some(&json!(8)));
        assert!(from_value::<MetricsUpdate>(json!([1, 2])).is_err());
    }
}
