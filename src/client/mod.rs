//! Live-event client and its configuration.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent client configuration |
//! | `core` | [`EventBusClient`]: connection, send, listeners |
//! | `options` | [`ReconnectPolicy`] and defaults |
//! | `state` | [`ConnectionState`] |
//! | `streams` | Named stream subscription helpers |

// ============================================================================
// Submodules
// ============================================================================

/// Client builder.
pub mod builder;

/// Client core.
pub mod core;

/// Reconnect policy.
pub mod options;

/// Connection state.
pub mod state;

/// State shared with the supervisor task.
pub(crate) mod shared;

/// Stream subscription helpers.
mod streams;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::EventBusClientBuilder;
pub use core::EventBusClient;
pub use options::{
    DEFAULT_LIVE_URL, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL, ReconnectPolicy,
};
pub use state::ConnectionState;
