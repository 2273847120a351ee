//! Connection state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the client is in its connection lifecycle.
///
/// ```text
///            connect()
///   Idle ───────────────► Connecting ──── open ok ────► Open
///    ▲                       ▲   │                        │
///    │ disconnect()          │   │ open failed            │ closed
///    │ (from any state)      │   ▼                        │
///    │                    Retrying ◄──────────────────────┘
///    │                       │
///    │                       │ attempts exhausted
///    │                       ▼
///    └──────────────────── Failed
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection requested.
    #[default]
    Idle,
    /// Opening a transport.
    Connecting,
    /// Transport open, frames flowing.
    Open,
    /// Transport closed, waiting out the reconnect interval.
    Retrying,
    /// Reconnect attempts exhausted; only `connect` leaves this state.
    Failed,
}

impl ConnectionState {
    /// Returns `true` if frames can be sent.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` while the client is trying to get or stay connected.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open | Self::Retrying)
    }

    /// Returns the state name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Retrying => "retrying",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
