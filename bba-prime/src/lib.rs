//! Coinbase Prime integration for the Best Bid/Ask Printer
//!
//! This crate subscribes to the Prime `l2_data` WebSocket channel, keeps one
//! order book per product and publishes the best bid/ask after every event.
//!
//! Authentication uses these environment variables:
//! - `API_KEY` - Prime API access key
//! - `SECRET_KEY` - Prime API signing secret
//! - `PASSPHRASE` - Prime API passphrase
//! - `SVC_ACCOUNTID` - Prime service account id

pub mod auth;
pub mod config;
pub mod parser;
pub mod shutdown;
pub mod supervisor;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{build_subscribe_message, sign, Credentials};
pub use config::FeedConfig;
pub use parser::{FeedEventParser, ParsedFrame, SkipReason};
pub use shutdown::Shutdown;
pub use supervisor::{backoff_delay, ConnectionState, ConnectionSupervisor, FeedUpdate, Phase};
pub use transport::{Transport, TransportEvent, WsTransport};
