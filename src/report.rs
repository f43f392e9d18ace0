//! Run summary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counters collected while validating a log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Logs produced by the stream (including the initial row).
    pub logs_read: usize,
    /// Delay constraints evaluated.
    pub delay_checks: usize,
    /// Age constraints evaluated.
    pub age_checks: usize,
    /// Evaluations that found no pending stimulus or chain.
    pub unmatched: usize,
    /// Violations detected.
    pub violations: usize,
    /// Violations a sink shed under back-pressure.
    pub dropped_records: usize,
    /// Logs discarded by the reclaimer.
    pub evicted: usize,
}

/// Summary returned by a completed run.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// blake3 digest of the constraint definitions that were checked.
    pub constraint_digest: String,
    #[serde(flatten)]
    pub counters: RunCounters,
    /// Largest window length reached.
    pub peak_window: usize,
    /// Window length when the log ended (pending stimuli).
    pub final_window: usize,
}

impl ValidationReport {
    #[must_use]
    pub const fn has_violations(&self) -> bool {
        self.counters.violations > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_flat_counters() {
        let now = Utc::now();
        let report = ValidationReport {
            run_id: RunId::new(),
            started_at: now,
            finished_at: now,
            constraint_digest: "abc".to_string(),
            counters: RunCounters {
                logs_read: 10,
                violations: 2,
                ..RunCounters::default()
            },
            peak_window: 4,
            final_window: 1,
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["logs_read"], 10);
        assert_eq!(v["violations"], 2);
        assert_eq!(v["peak_window"], 4);
        assert!(report.has_violations());

        let back: ValidationReport = serde_json::from_value(v).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
