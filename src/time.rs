//! Log timestamps.
//!
//! Timestamps are plain numbers in whatever unit the recorded log uses
//! (after applying the configured scale). They must be totally ordered and
//! hashable because each constraint keeps a set of the timestamps it has
//! already consumed.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A point on the log's time axis.
///
/// # Examples
///
/// ```
/// use tempocheck::Timestamp;
///
/// let stimulus = Timestamp::new(10.0);
/// let response = Timestamp::new(14.5);
/// assert!(stimulus < response);
/// assert_eq!(response - stimulus, 4.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(OrderedFloat<f64>);

impl Timestamp {
    /// Smallest representable timestamp; every real log timestamp is greater.
    pub const MIN: Self = Self(OrderedFloat(f64::NEG_INFINITY));

    /// Wraps a raw numeric timestamp.
    ///
    /// Negative zero is folded into zero so both hash to the same occurrence.
    #[must_use]
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            Self(OrderedFloat(0.0))
        } else {
            Self(OrderedFloat(value))
        }
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0 .0
    }

    /// Elapsed time from `earlier` to `self`.
    #[must_use]
    pub fn since(self, earlier: Self) -> f64 {
        self.value() - earlier.value()
    }
}

impl From<f64> for Timestamp {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
