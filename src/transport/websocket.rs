//! WebSocket connector.
//!
//! Opens `ws://` (and, with the `tls` feature, `wss://`) connections via
//! tokio-tungstenite and adapts the split stream to [`FrameSink`] and
//! [`FrameSource`].
//!
//! # Frame Handling
//!
//! | Inbound message | Result |
//! |-----------------|--------|
//! | Text | Delivered as a frame |
//! | Binary | Dropped with a warning (envelopes are text) |
//! | Ping / Pong | Ignored (tungstenite answers pings) |
//! | Close | Transport closed |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::{Connector, FrameSink, FrameSource, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for the TCP connect plus WebSocket handshake.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocketConnector
// ============================================================================

/// Opens WebSocket transports.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    /// Upper bound on connect plus handshake.
    connect_timeout: Duration,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketConnector {
    /// Creates a connector with the default connect timeout (10s).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the connect timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, url: &Url) -> Result<Transport> {
        let (ws_stream, response) = timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| timeout_error(self.connect_timeout))?
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        debug!(%url, status = %response.status(), "WebSocket handshake completed");

        let (write, read) = ws_stream.split();
        Ok(Transport::new(WsSink(write), WsSource(read)))
    }
}

fn timeout_error(limit: Duration) -> Error {
    Error::connection_timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
}

// ============================================================================
// WsSink / WsSource
// ============================================================================

/// Write half of a WebSocket.
struct WsSink(SplitSink<WsStream, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, text: String) -> Result<()> {
        self.0.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.0.close().await?;
        Ok(())
    }
}

/// Read half of a WebSocket.
struct WsSource(SplitStream<WsStream>);

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        loop {
            match self.0.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),

                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return None;
                }

                Ok(Message::Binary(bytes)) => {
                    warn!(len = bytes.len(), "Dropping binary frame");
                }

                // Ping, Pong, raw frames
                Ok(other) => trace!(?other, "Ignoring control frame"),

                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

// ============================================================================
// Test Server
// ============================================================================

/// Local echo server shared by the WebSocket tests.
#[cfg(test)]
pub(crate) mod test_server {
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::TcpListener;

    /// Binds an echo server on a random port and returns its `ws://` URL.
    ///
    /// Every text frame is sent back verbatim.
    pub(crate) async fn spawn_echo_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(message)) = ws.next().await {
                        if message.is_text() && ws.send(message).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        format!("ws://127.0.0.1:{port}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    use super::test_server::spawn_echo_server;

    #[test]
    fn test_default_timeout() {
        assert_eq!(WebSocketConnector::new().connect_timeout().as_secs(), 10);
        assert_eq!(
            WebSocketConnector::default()
                .with_connect_timeout(Duration::from_millis(250))
                .connect_timeout(),
            Duration::from_millis(250)
        );
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let url = Url::parse(&spawn_echo_server().await).expect("valid url");
        let mut transport = WebSocketConnector::new()
            .open(&url)
            .await
            .expect("open should succeed");

        let frame = r#"{"type":"subscribe","payload":{"stream":"traffic"}}"#;
        transport
            .sink
            .send_frame(frame.to_string())
            .await
            .expect("send should succeed");

        let echoed = transport
            .source
            .next_frame()
            .await
            .expect("frame expected")
            .expect("frame should be ok");
        assert_eq!(echoed, frame);
    }

    #[tokio::test]
    async fn test_local_close_ends_source() {
        let url = Url::parse(&spawn_echo_server().await).expect("valid url");
        let mut transport = WebSocketConnector::new()
            .open(&url)
            .await
            .expect("open should succeed");

        transport.sink.close().await.expect("close should succeed");

        let next = timeout(Duration::from_secs(5), transport.source.next_frame())
            .await
            .expect("source should finish");
        assert!(matches!(next, None | Some(Err(_))));
    }

    #[test]
    fn test_timeout_error_saturates() {
        assert!(matches!(
            timeout_error(Duration::from_millis(1500)),
            Error::ConnectionTimeout { timeout_ms: 1500 }
        ));
        assert!(matches!(
            timeout_error(Duration::MAX),
            Error::ConnectionTimeout {
                timeout_ms: u64::MAX
            }
        ));
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        // Bound but never accepted: TCP connects, the handshake never answers.
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();

        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("valid url");
        let err = WebSocketConnector::new()
            .with_connect_timeout(Duration::from_millis(50))
            .open(&url)
            .await
            .expect_err("handshake never completes");

        assert!(matches!(err, Error::ConnectionTimeout { timeout_ms: 50 }));
        drop(listener);
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let url = Url::parse(&format!("ws://127.0.0.1:{port}")).expect("valid url");
        let err = WebSocketConnector::new()
            .open(&url)
            .await
            .expect_err("nothing is listening");

        assert!(err.is_connection_error());
    }
}
