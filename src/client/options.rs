//! Reconnect policy.
//!
//! The client retries on a fixed interval rather than backing off
//! exponentially. Deployments sit on the control-room LAN next to the
//! backend, where an outage is a restart, not congestion.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use chargeflow_live::ReconnectPolicy;
//!
//! let policy = ReconnectPolicy::new()
//!     .with_max_attempts(10)
//!     .with_interval(Duration::from_secs(1));
//!
//! assert!(policy.allows(9));
//! assert!(!policy.allows(10));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay between a close and the next attempt.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

/// Live endpoint of a locally running dashboard backend.
///
/// The client has no default address; collaborators pass this (or their
/// own) to `connect`.
pub const DEFAULT_LIVE_URL: &str = "ws://localhost:8000/ws";

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// How many times, and how often, to reopen a closed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnect attempts allowed after the initial one.
    pub max_attempts: u32,

    /// Fixed delay before each reconnect attempt.
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectPolicy {
    /// Creates the default policy: 5 attempts, 3 seconds apart.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }

    /// Creates a policy that never reconnects.
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_attempts: 0,
            interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }

    /// Sets the maximum number of reconnect attempts.
    #[inline]
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts.
    #[inline]
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns `true` if another attempt is allowed after `spent` attempts.
    #[inline]
    #[must_use]
    pub const fn allows(&self, spent: u32) -> bool {
        spent < self.max_attempts
    }
}

// ============================================================================
// Tests
// ============================================================================
