//! Normalized level-2 feed events

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Book side a level update applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    /// The venue spells the ask side `offer`; both are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bid" => Ok(Side::Bid),
            "ask" | "offer" => Ok(Side::Ask),
            _ => Err(format!("Unknown side: {}", s)),
        }
    }
}

/// Kind of book event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Full state; replaces every known level for the instrument
    Snapshot,
    /// Incremental insert/replace/remove of individual levels
    Update,
}

/// A single price-level change. A size of zero removes the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpdate {
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
}

impl LevelUpdate {
    pub fn new(side: Side, price: Decimal, size: Decimal) -> Self {
        Self { side, price, size }
    }
}

/// One parsed feed event; consumed immediately, never retained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub event_type: EventType,
    pub instrument_id: String,
    /// Level changes in feed order
    pub level_updates: Vec<LevelUpdate>,
}

impl FeedEvent {
    pub fn is_snapshot(&self) -> bool {
        self.event_type == EventType::Snapshot
    }
}
