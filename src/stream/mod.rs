//! Windowed log stream.
//!
//! `LogStream` turns raw rows from a [`LogSource`] into [`Log`] values with
//! their changed-column sets, enforces timestamp order, and owns the FIFO
//! window the matchers query.

/// Log source trait and the bundled CSV / in-memory sources.
pub mod source;
/// FIFO window of retained logs.
pub mod window;

use std::collections::BTreeMap;

pub use source::{CsvLogSource, LogSource, RawRow, VecLogSource};
pub use window::Window;

use crate::error::SourceError;
use crate::log::Log;
use crate::time::Timestamp;

/// Sequential producer of logs plus the retained window.
#[derive(Debug)]
pub struct LogStream<S> {
    source: S,
    previous: Option<BTreeMap<String, String>>,
    last_timestamp: Option<Timestamp>,
    logs_read: usize,
    window: Window,
}

impl<S: LogSource> LogStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            previous: None,
            last_timestamp: None,
            logs_read: 0,
            window: Window::new(),
        }
    }

    /// Produces the next log in timestamp order, or `None` at end-of-stream.
    ///
    /// The changed set is computed against the previously produced row.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Log>, SourceError> {
        let Some(row) = self.source.next_row()? else {
            return Ok(None);
        };

        if let Some(previous) = self.last_timestamp {
            if row.timestamp < previous {
                return Err(SourceError::OutOfOrder {
                    row: self.logs_read + 1,
                    timestamp: row.timestamp,
                    previous,
                });
            }
        }

        let log = Log::diff(row.timestamp, row.values, self.previous.as_ref());
        self.previous = Some(log.values().clone());
        self.last_timestamp = Some(log.timestamp());
        self.logs_read += 1;
        Ok(Some(log))
    }
}

impl<S> LogStream<S> {
    /// Appends a log to the window's tail.
    pub fn retain(&mut self, log: Log) {
        self.window.push(log);
    }

    /// Window-resident logs where `signal` changed, oldest first.
    pub fn changed_logs_for<'a>(&'a self, signal: &'a str) -> impl Iterator<Item = &'a Log> + 'a {
        self.window.changed_for(signal)
    }

    /// Permanently discards the oldest `count` logs.
    pub fn evict_prefix(&mut self, count: usize) -> usize {
        self.window.evict_prefix(count)
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub const fn peak_window(&self) -> usize {
        self.window.peak()
    }

    /// Number of logs produced so far.
    #[must_use]
    pub const fn logs_read(&self) -> usize {
        self.logs_read
    }
}
