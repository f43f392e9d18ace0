//! Violation records and the sinks that receive them.
//!
//! The validator hands each record to a [`ViolationSink`] in discovery order.
//! Persistence and formatting are the sink's concern.

use std::io::Write;

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::constraint::{ConstraintId, ConstraintKind};
use crate::error::SinkError;
use crate::time::Timestamp;

/// One observed constraint violation.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint: ConstraintId,
    pub kind: ConstraintKind,
    /// First (or sole) stimulus signal.
    pub stimulus: String,
    pub stimulus_timestamp: Timestamp,
    /// Outermost (or sole) response signal.
    pub response: String,
    pub response_timestamp: Timestamp,
    /// Declared delay or age.
    pub expected: f64,
    /// Observed response − stimulus delta.
    pub actual: f64,
}

/// Outcome of handing a record to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The sink shed the record (back-pressure); the run continues.
    Dropped,
}

/// Receiver of violation records.
pub trait ViolationSink {
    fn record(&mut self, violation: &Violation) -> Result<Delivery, SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Collects violations in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    violations: Vec<Violation>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl ViolationSink for MemorySink {
    fn record(&mut self, violation: &Violation) -> Result<Delivery, SinkError> {
        self.violations.push(violation.clone());
        Ok(Delivery::Delivered)
    }
}

/// Writes one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ViolationSink for JsonLinesSink<W> {
    fn record(&mut self, violation: &Violation) -> Result<Delivery, SinkError> {
        serde_json::to_writer(&mut self.out, violation)?;
        self.out.write_all(b"\n")?;
        Ok(Delivery::Delivered)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

/// Forwards records to another thread over a bounded channel.
///
/// Never blocks the validation loop: a full or disconnected channel sheds
/// the record and reports [`Delivery::Dropped`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Violation>,
}

impl ChannelSink {
    #[must_use]
    pub const fn new(tx: Sender<Violation>) -> Self {
        Self { tx }
    }
}

impl ViolationSink for ChannelSink {
    fn record(&mut self, violation: &Violation) -> Result<Delivery, SinkError> {
        match self.tx.try_send(violation.clone()) {
            Ok(()) => Ok(Delivery::Delivered),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Ok(Delivery::Dropped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    fn sample() -> Violation {
        Violation {
            constraint: ConstraintId::new("DC_1"),
            kind: ConstraintKind::Delay,
            stimulus: "s".to_string(),
            stimulus_timestamp: Timestamp::new(1.0),
            response: "r".to_string(),
            response_timestamp: Timestamp::new(4.0),
            expected: 2.0,
            actual: 3.0,
        }
    }

    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.record(&sample()).unwrap();
        sink.record(&sample()).unwrap();
        sink.flush().unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["constraint"], "DC_1");
        assert_eq!(v["kind"], "delay");
        assert_eq!(v["stimulus_timestamp"], 1.0);
        assert_eq!(v["response_timestamp"], 4.0);
        assert_eq!(v["expected"], 2.0);
    }

    #[test]
    fn channel_sink_sheds_when_full() {
        let (tx, rx) = bounded(1);
        let mut sink = ChannelSink::new(tx);
        assert_eq!(sink.record(&sample()).unwrap(), Delivery::Delivered);
        assert_eq!(sink.record(&sample()).unwrap(), Delivery::Dropped);
        assert_eq!(rx.try_recv().unwrap(), sample());
    }

    #[test]
    fn channel_sink_sheds_when_disconnected() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        assert_eq!(sink.record(&sample()).unwrap(), Delivery::Dropped);
    }

    #[test]
    fn memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        let mut second = sample();
        second.constraint = ConstraintId::new("DC_2");
        sink.record(&sample()).unwrap();
        sink.record(&second).unwrap();
        let ids: Vec<_> = sink.violations().iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(ids, vec!["DC_1", "DC_2"]);
    }
}
