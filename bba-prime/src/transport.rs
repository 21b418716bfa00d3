//! WebSocket transport abstraction
//!
//! The supervisor only needs a handful of capabilities from a connection:
//! open it (bounded by a timeout), send text, close it, and receive events in
//! order. [`WsTransport`] provides them on top of `tokio-tungstenite`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use bba_core::{FeedError, FeedResult};

/// Close code reported when the stream ends without a close frame
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code reported for a close frame without a status
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Event delivered by an open transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    Closed {
        code: u16,
        reason: String,
        /// The remote host initiated a clean close
        remote: bool,
    },
    Error(String),
}

/// Connection capabilities the supervisor depends on.
///
/// A successful `connect` is the "opened" event. Implementations may be
/// reconnected after a close.
#[async_trait]
pub trait Transport: Send {
    /// Connect and wait until the session is open or `timeout` elapses
    async fn connect(&mut self, url: &str, timeout: Duration) -> FeedResult<()>;

    async fn send(&mut self, text: String) -> FeedResult<()>;

    async fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Next inbound event; `None` once the transport is closed
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport over `tokio-tungstenite`
#[derive(Default)]
pub struct WsTransport {
    stream: Option<WsStream>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&mut self, url: &str, timeout: Duration) -> FeedResult<()> {
        self.close().await;

        match tokio::time::timeout(timeout, connect_async(url)).await {
            Ok(Ok((stream, _response))) => {
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(FeedError::link(format!("Connection failed: {}", e))),
            Err(_) => Err(FeedError::link(format!(
                "Failed to connect within {} seconds",
                timeout.as_secs()
            ))),
        }
    }

    async fn send(&mut self, text: String) -> FeedResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FeedError::link("send on closed connection"))?;
        stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| FeedError::link(format!("Failed to send: {}", e)))
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                debug!("[Prime WS] Close handshake failed: {}", e);
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            let stream = self.stream.as_mut()?;
            let event = match stream.next().await {
                Some(Ok(Message::Text(text))) => TransportEvent::Text(text.as_str().to_owned()),
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = stream.send(Message::Pong(data)).await {
                        warn!("[Prime WS] Failed to send pong: {}", e);
                        self.stream = None;
                        return Some(TransportEvent::Error(e.to_string()));
                    }
                    continue;
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    self.stream = None;
                    TransportEvent::Closed {
                        code,
                        reason,
                        remote: true,
                    }
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.stream = None;
                    TransportEvent::Error(e.to_string())
                }
                None => {
                    self.stream = None;
                    TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: "stream ended".to_string(),
                        remote: false,
                    }
                }
            };
            return Some(event);
        }
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("connected", &self.stream.is_some())
            .finish()
    }
}
