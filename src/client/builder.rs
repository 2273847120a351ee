//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use chargeflow_live::EventBusClient;
//!
//! # fn example() -> chargeflow_live::Result<()> {
//! let client = EventBusClient::builder()
//!     .max_reconnect_attempts(10)
//!     .reconnect_interval(Duration::from_secs(2))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{Connector, WebSocketConnector};

use super::core::EventBusClient;
use super::options::ReconnectPolicy;

// ============================================================================
// EventBusClientBuilder
// ============================================================================

/// Builder for configuring an [`EventBusClient`].
///
/// Use [`EventBusClient::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct EventBusClientBuilder {
    /// Reconnect policy.
    policy: ReconnectPolicy,
    /// Transport factory; WebSocket when unset.
    connector: Option<Arc<dyn Connector>>,
}

// ============================================================================
// EventBusClientBuilder Implementation
// ============================================================================

impl EventBusClientBuilder {
    /// Creates a builder with the default policy and WebSocket transport.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the maximum number of reconnect attempts.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.with_max_attempts(max_attempts);
        self
    }

    /// Sets the fixed delay between reconnect attempts.
    #[inline]
    #[must_use]
    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.policy = self.policy.with_interval(interval);
        self
    }

    /// Sets the transport factory.
    ///
    /// Defaults to [`WebSocketConnector`]. Tests usually pass a
    /// [`MemoryConnector`](crate::transport::MemoryConnector).
    #[inline]
    #[must_use]
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Sets an already shared transport factory.
    #[inline]
    #[must_use]
    pub fn shared_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the reconnect interval is zero.
    pub fn build(self) -> Result<EventBusClient> {
        if self.policy.interval.is_zero() {
            return Err(Error::config(
                "reconnect interval must be greater than zero",
            ));
        }

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector::new()));

        Ok(EventBusClient::from_parts(self.policy, connector))
    }
}

impl std::fmt::Debug for EventBusClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusClientBuilder")
            .field("policy", &self.policy)
            .field("custom_connector", &self.connector.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
