//! Scripted in-memory transport for supervisor tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bba_core::{FeedError, FeedResult};

use crate::transport::{Transport, TransportEvent};

/// Outcome of one `connect` call
#[derive(Debug, Clone)]
pub enum Script {
    Fail(String),
    /// Open, deliver these events, then stay silent
    Session(Vec<TransportEvent>),
}

/// Counters shared with the test body
#[derive(Debug, Default)]
pub struct Stats {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub sent: Mutex<Vec<String>>,
}

impl Stats {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

pub struct ScriptedTransport {
    scripts: VecDeque<Script>,
    events: VecDeque<TransportEvent>,
    open: bool,
    stats: Arc<Stats>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> (Self, Arc<Stats>) {
        let stats = Arc::new(Stats::default());
        (
            Self {
                scripts: scripts.into(),
                events: VecDeque::new(),
                open: false,
                stats: Arc::clone(&stats),
            },
            stats,
        )
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self, _url: &str, _timeout: Duration) -> FeedResult<()> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        match self.scripts.pop_front() {
            Some(Script::Session(events)) => {
                self.events = events.into();
                self.open = true;
                Ok(())
            }
            Some(Script::Fail(reason)) => Err(FeedError::link(reason)),
            None => Err(FeedError::link("no scripted connection left")),
        }
    }

    async fn send(&mut self, text: String) -> FeedResult<()> {
        if !self.open {
            return Err(FeedError::link("send on closed connection"));
        }
        self.stats.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.open = false;
    }

    fn is_closed(&self) -> bool {
        !self.open
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if !self.open {
            return None;
        }
        match self.events.pop_front() {
            Some(event) => {
                if matches!(event, TransportEvent::Closed { .. } | TransportEvent::Error(_)) {
                    self.open = false;
                }
                Some(event)
            }
            None => std::future::pending().await,
        }
    }
}
