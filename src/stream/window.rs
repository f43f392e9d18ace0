//! FIFO window of retained logs.

use std::collections::VecDeque;

use crate::log::Log;

/// Retained logs, oldest first, in non-decreasing timestamp order.
///
/// Only the oldest prefix can ever be removed; there are no gaps.
#[derive(Debug, Default)]
pub struct Window {
    logs: VecDeque<Log>,
    peak: usize,
}

impl Window {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, log: Log) {
        debug_assert!(
            self.logs
                .back()
                .map_or(true, |last| last.timestamp() <= log.timestamp()),
            "window must stay time-ordered"
        );
        self.logs.push_back(log);
        self.peak = self.peak.max(self.logs.len());
    }

    /// Drops the oldest `count` logs (clamped to the window length).
    pub fn evict_prefix(&mut self, count: usize) -> usize {
        let count = count.min(self.logs.len());
        self.logs.drain(..count);
        count
    }

    /// Logs whose changed set contains `signal`, oldest first.
    pub fn changed_for<'a>(&'a self, signal: &'a str) -> impl Iterator<Item = &'a Log> + 'a {
        self.logs.iter().filter(move |log| log.has_changed(signal))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    #[must_use]
    pub fn oldest(&self) -> Option<&Log> {
        self.logs.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Largest length the window has reached.
    #[must_use]
    pub const fn peak(&self) -> usize {
        self.peak
    }
}
