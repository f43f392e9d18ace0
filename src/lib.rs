//! # tempocheck - Streaming timing-constraint conformance checking
//!
//! tempocheck replays a recorded signal log and reports every place where the
//! recorded behaviour breaks a declared real-time constraint. It works online:
//! one pass over the log in timestamp order, keeping only the window of rows
//! that some pending constraint might still need.
//!
//! ## Core Concepts
//!
//! - **Log**: one timestamped row plus the signals that changed since the previous row
//! - **Delay constraint**: a response must follow one stimulus after exactly `value`
//! - **Age constraint**: a nested stimulus/response chain must span exactly `value`
//! - **Window**: FIFO of retained rows, reclaimed from the front once no constraint needs them
//! - **Violation**: a structured record handed to a sink in discovery order
//!
//! ## Usage
//!
//! ```rust
//! use tempocheck::{
//!     AnalyserConfig, ConstraintSet, DelayConstraint, MemorySink, RawRow, StimulusResponse,
//!     Validator, VecLogSource,
//! };
//!
//! let constraints = ConstraintSet::new(
//!     vec![DelayConstraint::new("DC_wiper", StimulusResponse::new("switch", "motor"), 20.0)?],
//!     Vec::new(),
//! )?;
//!
//! let rows = vec![
//!     RawRow::new(0.0, [("switch", "0"), ("motor", "0")]),
//!     RawRow::new(10.0, [("switch", "1"), ("motor", "0")]),
//!     RawRow::new(35.0, [("switch", "1"), ("motor", "1")]),
//! ];
//!
//! let mut validator = Validator::new(VecLogSource::new(rows), constraints, &AnalyserConfig::default());
//! let mut sink = MemorySink::new();
//! let report = validator.run(&mut sink)?;
//!
//! assert_eq!(report.counters.violations, 1);
//! assert_eq!(sink.violations()[0].actual, 25.0);
//! # Ok::<(), tempocheck::AnalyserError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod config;
pub mod constraint;
pub mod error;
pub mod log;
pub mod time;
pub mod violation;

// Streaming engine
pub mod matcher;
pub mod reclaim;
pub mod report;
pub mod stream;
pub mod validator;

// Re-export primary types at crate root for convenience
pub use config::AnalyserConfig;
pub use constraint::{
    AgeConstraint, ConstraintDocument, ConstraintId, ConstraintKind, ConstraintProvider,
    ConstraintSet, DelayConstraint, JsonConstraintProvider, StimulusResponse,
};
pub use error::{AnalyserError, AnalyserResult, ConfigError, ConstraintError, SinkError, SourceError};
pub use log::Log;
pub use matcher::{match_age, match_delay, MatchOutput};
pub use report::{RunCounters, RunId, ValidationReport};
pub use stream::{CsvLogSource, LogSource, LogStream, RawRow, VecLogSource, Window};
pub use time::Timestamp;
pub use validator::Validator;
pub use violation::{ChannelSink, Delivery, JsonLinesSink, MemorySink, Violation, ViolationSink};
