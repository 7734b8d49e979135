//! Mock TLDR source for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{EnrichError, TldrLookup, TldrSource};

/// A mock source that replays queued responses and records the queries
/// it receives. An empty queue yields misses.
#[derive(Debug, Default)]
pub struct MockTldrSource {
    responses: Mutex<VecDeque<Result<TldrLookup, EnrichError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockTldrSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful lookup carrying a TLDR.
    pub fn push_tldr(&self, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(TldrLookup { tldr: Some(text.to_string()) }));
    }

    /// Queue a completed lookup without a TLDR.
    pub fn push_miss(&self) {
        self.responses.lock().unwrap().push_back(Ok(TldrLookup::default()));
    }

    /// Queue a failed lookup.
    pub fn push_error(&self, err: EnrichError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// The queries received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TldrSource for MockTldrSource {
    async fn lookup(&self, title: &str) -> Result<TldrLookup, EnrichError> {
        self.calls.lock().unwrap().push(title.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TldrLookup::default()))
    }
}
