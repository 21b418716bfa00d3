//! Decoding of raw `l2_data` frames into [`FeedEvent`]s

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use bba_core::{EventType, FeedError, FeedEvent, FeedResult, LevelUpdate, Side};

use crate::types::{L2Event, L2Update, PrimeMessage};

/// Why a well-formed frame produced no event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Frame belongs to another channel (e.g. `subscriptions`)
    ForeignChannel(String),
    NoEvents,
    NoInstrument,
}

/// Outcome of parsing one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame {
    Event(FeedEvent),
    NotApplicable(SkipReason),
    /// The venue answered with an error frame
    Rejected(String),
}

/// Parser bound to the subscribed channel
#[derive(Debug, Clone)]
pub struct FeedEventParser {
    channel: String,
}

impl FeedEventParser {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Parse a raw text frame.
    ///
    /// Only the first event of a frame is decoded; any further events are
    /// ignored.
    pub fn parse(&self, raw: &str) -> FeedResult<ParsedFrame> {
        let message: PrimeMessage = serde_json::from_str(raw)
            .map_err(|e| FeedError::parse(format!("invalid JSON: {}", e)))?;

        if message.msg_type.as_deref() == Some("error") {
            let reason = message.message.unwrap_or_else(|| raw.to_string());
            return Ok(ParsedFrame::Rejected(reason));
        }

        let channel = message.channel.unwrap_or_default();
        if channel != self.channel {
            return Ok(ParsedFrame::NotApplicable(SkipReason::ForeignChannel(channel)));
        }

        let mut events = message.events.into_iter();
        let Some(first) = events.next() else {
            return Ok(ParsedFrame::NotApplicable(SkipReason::NoEvents));
        };
        let ignored = events.len();
        if ignored > 0 {
            debug!("Ignoring {} trailing events in {} frame", ignored, self.channel);
        }

        let has_instrument = first
            .get("product_id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_instrument {
            return Ok(ParsedFrame::NotApplicable(SkipReason::NoInstrument));
        }

        let event: L2Event = serde_json::from_value(first)
            .map_err(|e| FeedError::parse(format!("malformed event: {}", e)))?;

        let event_type = match event.event_type.as_str() {
            "snapshot" => EventType::Snapshot,
            "update" => EventType::Update,
            other => {
                return Err(FeedError::parse(format!(
                    "unknown event type '{}' for {}",
                    other, event.product_id
                )))
            }
        };

        let updates = event.updates.ok_or_else(|| {
            FeedError::parse(format!("event for {} has no updates", event.product_id))
        })?;

        let level_updates = updates
            .iter()
            .map(convert_update)
            .collect::<FeedResult<Vec<_>>>()?;

        Ok(ParsedFrame::Event(FeedEvent {
            event_type,
            instrument_id: event.product_id,
            level_updates,
        }))
    }
}

fn convert_update(update: &L2Update) -> FeedResult<LevelUpdate> {
    let side = update.side.parse::<Side>().map_err(FeedError::parse)?;
    let price = update
        .px
        .parse::<Decimal>()
        .map_err(|e| FeedError::parse(format!("invalid px '{}': {}", update.px, e)))?;
    let size = update
        .qty
        .parse::<Decimal>()
        .map_err(|e| FeedError::parse(format!("invalid qty '{}': {}", update.qty, e)))?;
    Ok(LevelUpdate::new(side, price, size))
}
