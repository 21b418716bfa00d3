//! Coinbase Prime WebSocket wire types

use serde::{Deserialize, Serialize};

/// Signed subscribe request; one per (re)connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub channel: String,
    pub access_key: String,
    pub api_key_id: String,
    /// Unix seconds, as a string
    pub timestamp: String,
    pub passphrase: String,
    pub signature: String,
    pub product_ids: Vec<String>,
}

/// Top-level frame received on the feed.
///
/// Events are kept as raw values so that only the first one has to be
/// well-formed.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimeMessage {
    #[serde(rename = "type", default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One event inside an `l2_data` frame
#[derive(Debug, Clone, Deserialize)]
pub struct L2Event {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub product_id: String,
    /// Absent on a malformed event
    pub updates: Option<Vec<L2Update>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct L2Update {
    pub side: String, // "bid" or "offer"
    pub px: String,
    pub qty: String,
}
