//! Per-instrument level-2 order books
//!
//! Each [`OrderBook`] keeps one sorted map per side so the best level is
//! always the first entry. [`BookRegistry`] owns every book and creates them
//! lazily the first time an instrument is referenced.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event::{FeedEvent, Side};

/// Best bid and best ask of a two-sided book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid_price: Decimal,
    pub bid_size: Decimal,
    pub ask_price: Decimal,
    pub ask_size: Decimal,
}

/// Order book for a single instrument
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    /// Bids keyed by reversed price: highest price first
    bids: BTreeMap<Reverse<Decimal>, Decimal>,
    /// Asks keyed by price: lowest price first
    asks: BTreeMap<Decimal, Decimal>,
}

impl OrderBook {
    /// Create an empty order book
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every level on both sides
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Insert, replace or (for a zero size) remove a single level.
    ///
    /// Removing a price that is not in the book is a no-op.
    pub fn apply(&mut self, side: Side, price: Decimal, size: Decimal) {
        match (side, size.is_zero()) {
            (Side::Bid, true) => {
                self.bids.remove(&Reverse(price));
            }
            (Side::Bid, false) => {
                self.bids.insert(Reverse(price), size);
            }
            (Side::Ask, true) => {
                self.asks.remove(&price);
            }
            (Side::Ask, false) => {
                self.asks.insert(price, size);
            }
        }
    }

    /// Highest bid as `(price, size)`
    pub fn best_bid(&self) -> Option<(Decimal, Decimal)> {
        self.bids
            .first_key_value()
            .map(|(Reverse(price), size)| (*price, *size))
    }

    /// Lowest ask as `(price, size)`
    pub fn best_ask(&self) -> Option<(Decimal, Decimal)> {
        self.asks
            .first_key_value()
            .map(|(price, size)| (*price, *size))
    }

    /// Top of book, or `None` while either side is empty
    pub fn top(&self) -> Option<TopOfBook> {
        let (bid_price, bid_size) = self.best_bid()?;
        let (ask_price, ask_size) = self.best_ask()?;
        Some(TopOfBook {
            bid_price,
            bid_size,
            ask_price,
            ask_size,
        })
    }

    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

/// All books known to one feed session, keyed by instrument id
#[derive(Debug, Default)]
pub struct BookRegistry {
    books: HashMap<String, OrderBook>,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn book_mut(&mut self, instrument_id: &str) -> &mut OrderBook {
        self.books.entry(instrument_id.to_string()).or_default()
    }

    /// Clear both sides of the instrument's book
    pub fn apply_snapshot(&mut self, instrument_id: &str) {
        self.book_mut(instrument_id).clear();
    }

    /// Apply one level change to the instrument's book
    pub fn apply_level_update(
        &mut self,
        instrument_id: &str,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) {
        self.book_mut(instrument_id).apply(side, price, size);
    }

    /// Best bid/ask for the instrument; `None` if unknown or one-sided
    pub fn best_bid_ask(&self, instrument_id: &str) -> Option<TopOfBook> {
        self.books.get(instrument_id)?.top()
    }

    /// Apply a whole event and return the resulting top of book.
    ///
    /// A snapshot clears the book before any of its levels are applied;
    /// levels are applied in feed order so later entries for the same price
    /// win.
    pub fn apply_event(&mut self, event: &FeedEvent) -> Option<TopOfBook> {
        let book = self.book_mut(&event.instrument_id);
        if event.is_snapshot() {
            book.clear();
        }
        for update in &event.level_updates {
            book.apply(update.side, update.price, update.size);
        }
        book.top()
    }

    pub fn get(&self, instrument_id: &str) -> Option<&OrderBook> {
        self.books.get(instrument_id)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
