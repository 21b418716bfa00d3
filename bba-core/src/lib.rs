//! Core types for the Best Bid/Ask Printer
//!
//! This crate holds everything that does not touch the network: the
//! per-instrument order books, the normalized feed event model, the
//! top-of-book presenter and the shared error type.

pub mod book;
pub mod error;
pub mod event;
pub mod presenter;

pub use book::{BookRegistry, OrderBook, TopOfBook};
pub use error::{FeedError, FeedResult};
pub use event::{EventType, FeedEvent, LevelUpdate, Side};
pub use presenter::format_top_of_book;
