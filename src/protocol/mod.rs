//! Live connection message types.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `Envelope` | Both | `{type, payload}` unit carried by every text frame |
//! | `subscribe` / `unsubscribe` | Local → Remote | Start or stop a named data stream |
//! | Data events | Remote → Local | `metrics_update`, `charger_update`, ... |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Wire envelope |
//! | `event` | Event names and typed payloads |
//! | `stream` | Stream identifiers and subscription payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Wire envelope.
pub mod envelope;

/// Event names and typed payloads.
pub mod event;

/// Stream identifiers.
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::Envelope;
pub use event::{
    ChargerId, ChargerUpdate, ErrorPayload, LifecycleEvent, MetricsUpdate, ReconnectFailed,
    StatusPayload, TypedEvent,
};
pub use stream::{StreamKind, StreamRequest};
