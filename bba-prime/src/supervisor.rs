//! Connection supervisor for the Prime level-2 feed
//!
//! Owns the transport, the parser and every order book. Drives the
//! connect → subscribe → stream → backoff → reconnect cycle and publishes a
//! [`FeedUpdate`] whenever an instrument's top of book can be read.
//!
//! All inbound frames are processed on the supervisor's own task, in arrival
//! order, so a snapshot is always applied before the updates that follow it.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use bba_core::{BookRegistry, FeedError, FeedResult, TopOfBook};

use crate::auth::subscribe_message_now;
use crate::config::FeedConfig;
use crate::parser::{FeedEventParser, ParsedFrame};
use crate::shutdown::Shutdown;
use crate::transport::{Transport, TransportEvent, ABNORMAL_CLOSURE};

/// Upper bound for a single backoff delay
pub const MAX_RECONNECT_DELAY: Duration = Duration::from_millis(30_000);

/// Doublings stop after this many attempts
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Lifecycle phase of the feed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
    Backoff,
    ShuttingDown,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: Phase,
    pub reconnect_attempt: u32,
}

/// Output of the supervisor, in processing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    TopOfBook {
        instrument_id: String,
        top: TopOfBook,
    },
    ConnectionState(Phase),
}

/// Delay before reconnect attempt `attempt` (1-based)
pub fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    initial
        .saturating_mul(1u32 << exponent)
        .min(MAX_RECONNECT_DELAY)
}

pub struct ConnectionSupervisor<T: Transport> {
    config: FeedConfig,
    transport: T,
    parser: FeedEventParser,
    books: BookRegistry,
    state: ConnectionState,
    shutdown: Shutdown,
    update_tx: mpsc::UnboundedSender<FeedUpdate>,
}

impl<T: Transport> ConnectionSupervisor<T> {
    /// Create a supervisor and the receiver for its updates
    pub fn new(
        config: FeedConfig,
        transport: T,
        shutdown: Shutdown,
    ) -> (Self, mpsc::UnboundedReceiver<FeedUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let parser = FeedEventParser::new(config.channel.clone());

        (
            Self {
                config,
                transport,
                parser,
                books: BookRegistry::new(),
                state: ConnectionState {
                    phase: Phase::Disconnected,
                    reconnect_attempt: 0,
                },
                shutdown,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn books(&self) -> &BookRegistry {
        &self.books
    }

    /// Run until shutdown or a fatal error.
    ///
    /// `Ok(())` means a requested shutdown; every `Err` is fatal and has
    /// already triggered the shared [`Shutdown`].
    pub async fn run(mut self) -> FeedResult<()> {
        let result = self.run_session().await;
        self.terminate(&result).await;
        result
    }

    async fn run_session(&mut self) -> FeedResult<()> {
        match self.open_session().await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(FeedError::TransientLink(reason)) => return Err(FeedError::Connect(reason)),
            Err(e) => return Err(e),
        }

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.wait() => return Ok(()),
                event = self.transport.next_event() => event,
            };

            let resumed = match event {
                Some(TransportEvent::Text(text)) => {
                    self.process_message(&text)?;
                    continue;
                }
                Some(TransportEvent::Closed {
                    code,
                    reason,
                    remote,
                }) => {
                    warn!(
                        "[Prime WS] WebSocket closed: {} (code: {}, remote: {})",
                        reason, code, remote
                    );
                    if self.shutdown.is_requested() {
                        info!("[Prime WS] WebSocket closed due to shutdown");
                        return Ok(());
                    }
                    if remote {
                        return Err(FeedError::RemoteClosed { code, reason });
                    }
                    self.reconnect().await?
                }
                Some(TransportEvent::Error(e)) => {
                    error!("[Prime WS] WebSocket error: {}", e);
                    self.reconnect().await?
                }
                None => {
                    warn!(
                        "[Prime WS] Transport closed without event (code: {})",
                        ABNORMAL_CLOSURE
                    );
                    self.reconnect().await?
                }
            };

            if !resumed {
                return Ok(());
            }
        }
    }

    /// Parse one inbound frame and apply it to the books.
    ///
    /// Malformed frames are logged and dropped. Only a subscription
    /// rejection is returned as an error.
    pub fn process_message(&mut self, text: &str) -> FeedResult<()> {
        match self.parser.parse(text) {
            Ok(ParsedFrame::Event(event)) => {
                if let Some(top) = self.books.apply_event(&event) {
                    let _ = self.update_tx.send(FeedUpdate::TopOfBook {
                        instrument_id: event.instrument_id,
                        top,
                    });
                }
            }
            Ok(ParsedFrame::NotApplicable(reason)) => {
                debug!("[Prime WS] Skipping frame: {:?}", reason);
            }
            Ok(ParsedFrame::Rejected(reason)) => {
                return Err(FeedError::rejected(reason));
            }
            Err(e) => {
                warn!("[Prime WS] Message parsing error: {}", e);
            }
        }
        Ok(())
    }

    /// Connect and subscribe. `Ok(false)` if shutdown interrupted the connect.
    async fn open_session(&mut self) -> FeedResult<bool> {
        if !self.transport.is_closed() {
            self.transport.close().await;
        }

        self.set_phase(Phase::Connecting);
        info!("[Prime WS] Connecting to {}", self.config.ws_url);

        let connected = tokio::select! {
            biased;
            _ = self.shutdown.wait() => return Ok(false),
            result = self.transport.connect(&self.config.ws_url, self.config.connect_timeout) => result,
        };
        connected?;

        info!("[Prime WS] WebSocket connected to {}", self.config.ws_url);
        self.state.reconnect_attempt = 0;
        self.set_phase(Phase::Subscribing);

        let message = subscribe_message_now(
            &self.config.credentials,
            &self.config.channel,
            &self.config.product_ids,
        )?;
        self.transport.send(message).await?;
        info!(
            "[Prime WS] Subscribed to {} for {}",
            self.config.channel,
            self.config.product_ids.join(", ")
        );

        self.set_phase(Phase::Streaming);
        Ok(true)
    }

    /// Walk the backoff ladder until a session is open again.
    ///
    /// `Ok(false)` if shutdown was requested on the way.
    async fn reconnect(&mut self) -> FeedResult<bool> {
        loop {
            if self.shutdown.is_requested() {
                return Ok(false);
            }

            let max = self.config.max_reconnect_attempts;
            if self.state.reconnect_attempt >= max {
                error!("[Prime WS] Max reconnection attempts reached. Shutting down.");
                return Err(FeedError::ReconnectExhausted {
                    attempts: self.state.reconnect_attempt,
                });
            }

            self.state.reconnect_attempt += 1;
            let attempt = self.state.reconnect_attempt;
            let delay = backoff_delay(self.config.initial_reconnect_delay, attempt);
            self.set_phase(Phase::Backoff);
            info!(
                "[Prime WS] Reconnecting in {} ms (attempt {}/{})",
                delay.as_millis(),
                attempt,
                max
            );

            tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    info!("[Prime WS] Reconnection interrupted by shutdown");
                    return Ok(false);
                }
                _ = tokio::time::sleep(delay) => {}
            }

            match self.open_session().await {
                Ok(resumed) => return Ok(resumed),
                Err(FeedError::TransientLink(reason)) => {
                    warn!("[Prime WS] Reconnection failed: {}", reason);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn terminate(&mut self, result: &FeedResult<()>) {
        if let Err(e) = result {
            error!("[Prime WS] Fatal: {}", e);
            self.shutdown.trigger();
        }

        self.set_phase(Phase::ShuttingDown);
        info!("[Prime WS] Shutting down WebSocket connection...");
        if !self.transport.is_closed() {
            self.transport.close().await;
        }
        self.set_phase(Phase::Terminated);
        info!("[Prime WS] Feed terminated");
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase == phase {
            return;
        }
        debug!("[Prime WS] {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
        let _ = self.update_tx.send(FeedUpdate::ConnectionState(phase));
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionSupervisor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}
