//! A single observation row of the recorded log.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// One timestamped row plus the signals that changed since the previous row.
///
/// Logs are built once by [`crate::stream::LogStream`] and never mutated
/// afterwards. `changed` is ordered so that per-signal processing is
/// deterministic across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    timestamp: Timestamp,
    values: BTreeMap<String, String>,
    changed: BTreeSet<String>,
}

impl Log {
    /// Builds a log by diffing `values` against the previous row.
    ///
    /// With no previous row nothing is considered changed: the first row only
    /// establishes the initial signal values.
    #[must_use]
    pub fn diff(
        timestamp: Timestamp,
        values: BTreeMap<String, String>,
        previous: Option<&BTreeMap<String, String>>,
    ) -> Self {
        let changed = match previous {
            None => BTreeSet::new(),
            Some(prev) => values
                .iter()
                .filter(|(signal, value)| prev.get(*signal) != Some(*value))
                .map(|(signal, _)| signal.clone())
                .collect(),
        };

        Self {
            timestamp,
            values,
            changed,
        }
    }

    /// Builds a log with an explicit changed set.
    #[must_use]
    pub fn with_changes<I, S>(timestamp: Timestamp, changed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            timestamp,
            values: BTreeMap::new(),
            changed: changed.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Value of `signal` at this row, if the column exists.
    #[must_use]
    pub fn value(&self, signal: &str) -> Option<&str> {
        self.values.get(signal).map(String::as_str)
    }

    /// Signals whose value differs from the previous row.
    #[must_use]
    pub const fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    #[must_use]
    pub fn has_changed(&self, signal: &str) -> bool {
        self.changed.contains(signal)
    }
}
