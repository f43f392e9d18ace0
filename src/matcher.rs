//! Constraint matching.
//!
//! Both matchers run when a constraint's terminal response changes in the
//! current log. They search the window for the occurrences that caused it,
//! consume them, and compare the observed span with the declared value.
//! The current log is not yet in the window while it is being matched.

use crate::constraint::{AgeConstraint, ConstraintKind, DelayConstraint, ProcessedSet};
use crate::log::Log;
use crate::stream::LogStream;
use crate::time::Timestamp;
use crate::violation::Violation;

/// Result of matching one constraint against the current log.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutput {
    /// No pending stimulus (or chain) explains the response change.
    NoMatch,
    /// Occurrences were consumed and the span was exact.
    Satisfied,
    /// Occurrences were consumed and the span differed.
    Violated(Violation),
}

impl MatchOutput {
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::Violated(_))
    }
}

/// Earliest window entry for `signal` later than `after` and not yet consumed.
fn first_unprocessed<S>(
    stream: &LogStream<S>,
    signal: &str,
    after: Timestamp,
    processed: &ProcessedSet,
) -> Option<Timestamp> {
    stream
        .changed_logs_for(signal)
        .map(Log::timestamp)
        .find(|ts| *ts > after && !processed.contains(*ts))
}

/// Single-hop delay check.
///
/// Takes the earliest unconsumed stimulus anywhere in the window, consumes it,
/// and requires `current − stimulus == value` exactly.
#[allow(clippy::float_cmp)]
pub fn match_delay<S>(
    constraint: &mut DelayConstraint,
    stream: &LogStream<S>,
    current: &Log,
) -> MatchOutput {
    let Some(stimulus_ts) = first_unprocessed(
        stream,
        constraint.leading_stimulus(),
        Timestamp::MIN,
        constraint.processed(),
    ) else {
        return MatchOutput::NoMatch;
    };

    constraint.processed_mut().insert(stimulus_ts);

    let actual = current.timestamp() - stimulus_ts;
    if actual == constraint.value() {
        return MatchOutput::Satisfied;
    }

    MatchOutput::Violated(Violation {
        constraint: constraint.id().clone(),
        kind: ConstraintKind::Delay,
        stimulus: constraint.pair().stimulus.clone(),
        stimulus_timestamp: stimulus_ts,
        response: constraint.pair().response.clone(),
        response_timestamp: current.timestamp(),
        expected: constraint.value(),
        actual,
    })
}

/// Multi-hop age chain check.
///
/// Finds strictly increasing occurrences `s0 < s1 < ... < sN < rN < ... < r1`
/// (the outermost response `r0` is the current log), picking the earliest
/// unconsumed candidate at every step. If any step fails nothing is consumed.
/// On success every collected timestamp is consumed and
/// `current − s0 == value` is required exactly.
#[allow(clippy::float_cmp)]
pub fn match_age<S>(
    constraint: &mut AgeConstraint,
    stream: &LogStream<S>,
    current: &Log,
) -> MatchOutput {
    let chain = constraint.chain();
    let mut last = Timestamp::MIN;
    let mut collected = Vec::with_capacity(chain.len() * 2 - 1);

    let stimuli = chain.iter().map(|p| p.stimulus.as_str());
    let inner_responses = chain.iter().skip(1).rev().map(|p| p.response.as_str());

    for signal in stimuli.chain(inner_responses) {
        let Some(ts) = first_unprocessed(stream, signal, last, constraint.processed()) else {
            return MatchOutput::NoMatch;
        };
        last = ts;
        collected.push(ts);
    }

    let first_stimulus = collected[0];
    for ts in &collected {
        constraint.processed_mut().insert(*ts);
    }

    let actual = current.timestamp() - first_stimulus;
    if actual == constraint.value() {
        return MatchOutput::Satisfied;
    }

    let outer = constraint.outermost();
    MatchOutput::Violated(Violation {
        constraint: constraint.id().clone(),
        kind: ConstraintKind::Age,
        stimulus: outer.stimulus.clone(),
        stimulus_timestamp: first_stimulus,
        response: outer.response.clone(),
        response_timestamp: current.timestamp(),
        expected: constraint.value(),
        actual,
    })
}
