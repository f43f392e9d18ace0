//! The validation loop.
//!
//! One log at a time: read it, run every constraint whose terminal response
//! changed in it, retain it in the window, then reclaim the window prefix no
//! constraint can still need. All state is owned by the loop.

use chrono::Utc;
use tracing::{debug, info, info_span, warn};

use crate::config::AnalyserConfig;
use crate::constraint::{ConstraintSet, ResponseIndex};
use crate::error::AnalyserResult;
use crate::log::Log;
use crate::matcher::{match_age, match_delay, MatchOutput};
use crate::reclaim::reclaim;
use crate::report::{RunCounters, RunId, ValidationReport};
use crate::stream::{LogSource, LogStream};
use crate::violation::{Delivery, Violation, ViolationSink};

/// Drives a log stream through a constraint set.
#[derive(Debug)]
pub struct Validator<S> {
    stream: LogStream<S>,
    constraints: ConstraintSet,
    index: ResponseIndex,
    window_warn_threshold: usize,
    above_threshold: bool,
    started: bool,
    counters: RunCounters,
}

impl<S: LogSource> Validator<S> {
    pub fn new(source: S, constraints: ConstraintSet, cfg: &AnalyserConfig) -> Self {
        let index = constraints.response_index();
        Self {
            stream: LogStream::new(source),
            constraints,
            index,
            window_warn_threshold: cfg.window_warn_threshold,
            above_threshold: false,
            started: false,
            counters: RunCounters::default(),
        }
    }

    /// Processes the next log. Returns `false` once the stream is exhausted.
    ///
    /// The first log only establishes initial signal values and is retained
    /// without validation.
    pub fn step(&mut self, sink: &mut dyn ViolationSink) -> AnalyserResult<bool> {
        let Some(log) = self.stream.next()? else {
            return Ok(false);
        };
        self.counters.logs_read = self.stream.logs_read();

        if !self.started {
            self.started = true;
            self.stream.retain(log);
            return Ok(true);
        }

        self.validate(&log, sink)?;
        self.stream.retain(log);
        self.check_window_growth();

        let (window, constraints) = (self.stream.window_mut(), &mut self.constraints);
        self.counters.evicted += reclaim(window, constraints);
        Ok(true)
    }

    /// Runs to end-of-stream and flushes the sink.
    pub fn run(&mut self, sink: &mut dyn ViolationSink) -> AnalyserResult<ValidationReport> {
        let run_id = RunId::new();
        let span = info_span!("validate", %run_id);
        let _guard = span.enter();

        let started_at = Utc::now();
        let constraint_digest = self.constraints.digest();
        info!(
            delay_constraints = self.constraints.delays().len(),
            age_constraints = self.constraints.ages().len(),
            digest = %constraint_digest,
            "validation started"
        );

        while self.step(sink)? {}
        sink.flush()?;

        let report = ValidationReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            constraint_digest,
            counters: self.counters,
            peak_window: self.stream.peak_window(),
            final_window: self.stream.window_len(),
        };
        info!(
            logs = report.counters.logs_read,
            violations = report.counters.violations,
            dropped = report.counters.dropped_records,
            peak_window = report.peak_window,
            final_window = report.final_window,
            "validation finished"
        );
        Ok(report)
    }
}

impl<S> Validator<S> {
    fn validate(&mut self, log: &Log, sink: &mut dyn ViolationSink) -> AnalyserResult<()> {
        let stream = &self.stream;

        for signal in log.changed() {
            for &i in self.index.ages_for(signal) {
                let constraint = &mut self.constraints.parts_mut().1[i];
                self.counters.age_checks += 1;
                let _span = tracing::debug_span!("age", constraint = %constraint.id()).entered();
                let out = match_age(constraint, stream, log);
                record(&mut self.counters, out, sink)?;
            }

            for &i in self.index.delays_for(signal) {
                let constraint = &mut self.constraints.parts_mut().0[i];
                self.counters.delay_checks += 1;
                let _span = tracing::debug_span!("delay", constraint = %constraint.id()).entered();
                let out = match_delay(constraint, stream, log);
                record(&mut self.counters, out, sink)?;
            }
        }
        Ok(())
    }

    fn check_window_growth(&mut self) {
        let len = self.stream.window_len();
        if len > self.window_warn_threshold {
            if !self.above_threshold {
                warn!(
                    window = len,
                    threshold = self.window_warn_threshold,
                    "window grew past threshold; many stimuli are still unresolved"
                );
            }
            self.above_threshold = true;
        } else {
            self.above_threshold = false;
        }
    }

    #[must_use]
    pub const fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Hands back the constraint set (with its matching state).
    #[must_use]
    pub fn into_constraints(self) -> ConstraintSet {
        self.constraints
    }

    #[must_use]
    pub const fn stream(&self) -> &LogStream<S> {
        &self.stream
    }

    #[must_use]
    pub const fn counters(&self) -> &RunCounters {
        &self.counters
    }
}

fn record(
    counters: &mut RunCounters,
    out: MatchOutput,
    sink: &mut dyn ViolationSink,
) -> AnalyserResult<()> {
    match out {
        MatchOutput::NoMatch => counters.unmatched += 1,
        MatchOutput::Satisfied => debug!("constraint satisfied"),
        MatchOutput::Violated(violation) => {
            counters.violations += 1;
            report_violation(&violation);
            if sink.record(&violation)? == Delivery::Dropped {
                counters.dropped_records += 1;
                warn!(constraint = %violation.constraint, "violation record dropped by sink");
            }
        }
    }
    Ok(())
}

fn report_violation(v: &Violation) {
    warn!(
        constraint = %v.constraint,
        kind = %v.kind,
        stimulus = %v.stimulus,
        stimulus_ts = %v.stimulus_timestamp,
        response = %v.response,
        response_ts = %v.response_timestamp,
        expected = v.expected,
        actual = v.actual,
        "timing constraint violated"
    );
    debug!(drift = v.actual - v.expected, "violation drift");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AgeConstraint, DelayConstraint, StimulusResponse};
    use crate::stream::{RawRow, VecLogSource};
    use crate::time::Timestamp;
    use crate::violation::MemorySink;

    /// Rows over signals `names`, starting from all zeros; each entry in
    /// `toggles` flips the comma-separated signals at the given time.
    fn rows(names: &[&str], toggles: &[(f64, &str)]) -> Vec<RawRow> {
        let mut state: Vec<(String, u8)> = names.iter().map(|n| ((*n).to_string(), 0)).collect();
        let mut out = vec![RawRow::new(
            -1.0,
            state.iter().map(|(n, v)| (n.clone(), v.to_string())),
        )];
        for (t, flips) in toggles {
            for (name, value) in &mut state {
                if flips.split(',').any(|f| f == name.as_str()) {
                    *value ^= 1;
                }
            }
            out.push(RawRow::new(
                *t,
                state.iter().map(|(n, v)| (n.clone(), v.to_string())),
            ));
        }
        out
    }

    fn delay_set(v: f64) -> ConstraintSet {
        ConstraintSet::new(
            vec![DelayConstraint::new("DC", StimulusResponse::new("s", "r"), v).unwrap()],
            Vec::new(),
        )
        .unwrap()
    }

    fn run(rows: Vec<RawRow>, set: ConstraintSet) -> (ValidationReport, Vec<Violation>, ConstraintSet) {
        let mut validator = Validator::new(VecLogSource::new(rows), set, &AnalyserConfig::default());
        let mut sink = MemorySink::new();
        let report = validator.run(&mut sink).unwrap();
        (report, sink.into_violations(), validator.into_constraints())
    }

    #[test]
    fn first_log_is_never_validated() {
        let (report, violations, _) = run(rows(&["s", "r"], &[]), delay_set(1.0));
        assert!(violations.is_empty());
        assert_eq!(report.counters.logs_read, 1);
        assert_eq!(report.counters.delay_checks, 0);
        assert_eq!(report.final_window, 1);
    }

    #[test]
    fn delay_violation_flows_to_sink() {
        let (report, violations, _) = run(
            rows(&["s", "r"], &[(0.0, "s"), (7.0, "r")]),
            delay_set(5.0),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].stimulus_timestamp, Timestamp::new(0.0));
        assert_eq!(violations[0].response_timestamp, Timestamp::new(7.0));
        assert_eq!(report.counters.violations, 1);
        assert_eq!(report.counters.delay_checks, 1);
    }

    #[test]
    fn consumed_stimulus_is_evicted_and_forgotten() {
        let (report, violations, set) = run(
            rows(&["s", "r"], &[(0.0, "s"), (5.0, "r"), (6.0, "")]),
            delay_set(5.0),
        );
        assert!(violations.is_empty());
        assert_eq!(report.final_window, 0);
        assert!(set.delays()[0].processed().is_empty());
    }

    #[test]
    fn completed_chain_is_evicted_and_forgotten() {
        let set = ConstraintSet::new(
            Vec::new(),
            vec![AgeConstraint::new(
                "AC",
                vec![StimulusResponse::new("s0", "r0"), StimulusResponse::new("s1", "r1")],
                9.0,
            )
            .unwrap()],
        )
        .unwrap();
        let (report, violations, set) = run(
            rows(
                &["s0", "s1", "r1", "r0"],
                &[(0.0, "s0"), (2.0, "s1"), (5.0, "r1"), (9.0, "r0"), (10.0, "")],
            ),
            set,
        );
        assert!(violations.is_empty());
        assert_eq!(report.counters.age_checks, 1);
        assert_eq!(report.counters.unmatched, 0);
        assert_eq!(report.final_window, 0);
        assert!(set.ages()[0].processed().is_empty());
    }

    #[test]
    fn unmatched_response_is_counted_not_reported() {
        let (report, violations, set) =
            run(rows(&["s", "r"], &[(3.0, "r")]), delay_set(5.0));
        assert!(violations.is_empty());
        assert_eq!(report.counters.unmatched, 1);
        assert!(set.delays()[0].processed().is_empty());
    }

    #[test]
    fn age_runs_before_delay_for_the_same_signal() {
        let set = ConstraintSet::new(
            vec![DelayConstraint::new("D", StimulusResponse::new("s", "r"), 1.0).unwrap()],
            vec![AgeConstraint::new("A", vec![StimulusResponse::new("s", "r")], 1.0).unwrap()],
        )
        .unwrap();
        let (_, violations, _) = run(rows(&["s", "r"], &[(0.0, "s"), (2.0, "r")]), set);
        let ids: Vec<_> = violations.iter().map(|v| v.constraint.as_str()).collect();
        assert_eq!(ids, vec!["A", "D"]);
    }

    #[test]
    fn pending_stimulus_pins_window() {
        let (report, _, _) = run(
            rows(&["s", "r", "x"], &[(0.0, "s"), (1.0, "x"), (2.0, "x")]),
            delay_set(5.0),
        );
        // Initial row reclaimed; s@0 and everything after it stay.
        assert_eq!(report.final_window, 3);
    }
}
