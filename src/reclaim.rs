//! Window reclamation.
//!
//! After each step the oldest contiguous prefix of the window is discarded as
//! long as no constraint could still use those logs as the root of a future
//! match. A log is pinned while it carries an unconsumed change of some
//! constraint's leading stimulus.

use tracing::trace;

use crate::constraint::ConstraintSet;
use crate::log::Log;
use crate::stream::Window;

/// True if some constraint may still claim `log` as its leading stimulus.
#[must_use]
pub fn is_pinned(log: &Log, constraints: &ConstraintSet) -> bool {
    let ts = log.timestamp();
    let pinned_by_age = constraints
        .ages()
        .iter()
        .any(|c| log.has_changed(c.leading_stimulus()) && !c.processed().contains(ts));
    let pinned_by_delay = constraints
        .delays()
        .iter()
        .any(|c| log.has_changed(c.leading_stimulus()) && !c.processed().contains(ts));
    pinned_by_age || pinned_by_delay
}

/// Number of oldest logs that can be discarded right now.
#[must_use]
pub fn deletable_prefix(window: &Window, constraints: &ConstraintSet) -> usize {
    window
        .iter()
        .take_while(|log| !is_pinned(log, constraints))
        .count()
}

/// Evicts the deletable prefix and forgets its timestamps.
///
/// Every constraint drops the evicted timestamps from its processed set:
/// those logs can never be referenced again. Returns the number of evicted
/// logs.
pub fn reclaim(window: &mut Window, constraints: &mut ConstraintSet) -> usize {
    let count = deletable_prefix(window, constraints);
    if count == 0 {
        return 0;
    }

    let (delays, ages) = constraints.parts_mut();
    for log in window.iter().take(count) {
        let ts = log.timestamp();
        for c in delays.iter_mut() {
            c.processed_mut().remove(ts);
        }
        for c in ages.iter_mut() {
            c.processed_mut().remove(ts);
        }
    }

    let evicted = window.evict_prefix(count);
    trace!(evicted, remaining = window.len(), "reclaimed window prefix");
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AgeConstraint, DelayConstraint, StimulusResponse};
    use crate::time::Timestamp;

    fn log(t: f64, changed: &[&str]) -> Log {
        Log::with_changes(Timestamp::new(t), changed.iter().copied())
    }

    fn set() -> ConstraintSet {
        ConstraintSet::new(
            vec![DelayConstraint::new("DC", StimulusResponse::new("s", "r"), 1.0).unwrap()],
            vec![AgeConstraint::new(
                "AC",
                vec![StimulusResponse::new("a0", "b0"), StimulusResponse::new("a1", "b1")],
                1.0,
            )
            .unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn unrelated_logs_are_reclaimed() {
        let mut w = Window::new();
        w.push(log(0.0, &[]));
        w.push(log(1.0, &["x"]));
        let mut c = set();
        assert_eq!(reclaim(&mut w, &mut c), 2);
        assert!(w.is_empty());
    }

    #[test]
    fn unconsumed_leading_stimulus_pins_the_rest() {
        let mut w = Window::new();
        w.push(log(0.0, &[]));
        w.push(log(1.0, &["s"]));
        w.push(log(2.0, &["x"]));
        let mut c = set();
        assert_eq!(reclaim(&mut w, &mut c), 1);
        assert_eq!(w.oldest().map(|l| l.timestamp().value()), Some(1.0));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn only_outermost_age_stimulus_pins() {
        let mut w = Window::new();
        w.push(log(0.0, &["a1"]));
        w.push(log(1.0, &["b1"]));
        let mut c = set();
        assert_eq!(reclaim(&mut w, &mut c), 2);
    }

    #[test]
    fn consumed_stimulus_is_released_and_forgotten() {
        let mut w = Window::new();
        w.push(log(1.0, &["s"]));
        w.push(log(2.0, &["a0"]));
        let mut c = set();
        {
            let (delays, _) = c.parts_mut();
            delays[0].processed_mut().insert(Timestamp::new(1.0));
        }
        assert_eq!(reclaim(&mut w, &mut c), 1);
        assert!(c.delays()[0].processed().is_empty());
        assert_eq!(w.oldest().map(|l| l.timestamp().value()), Some(2.0));
    }

    #[test]
    fn evicted_chain_timestamps_leave_age_processed_set() {
        let mut w = Window::new();
        w.push(log(1.0, &["a0"]));
        w.push(log(2.0, &["a1"]));
        w.push(log(3.0, &["b1"]));
        let mut c = set();
        {
            let (_, ages) = c.parts_mut();
            for t in [1.0, 2.0, 3.0] {
                ages[0].processed_mut().insert(Timestamp::new(t));
            }
        }
        assert_eq!(reclaim(&mut w, &mut c), 3);
        assert!(w.is_empty());
        assert!(c.ages()[0].processed().is_empty());
    }

    #[test]
    fn log_needed_by_any_constraint_stays() {
        let mut w = Window::new();
        w.push(log(1.0, &["s", "a0"]));
        let mut c = set();
        {
            let (delays, _) = c.parts_mut();
            delays[0].processed_mut().insert(Timestamp::new(1.0));
        }
        // The age constraint still needs a0@1.
        assert_eq!(reclaim(&mut w, &mut c), 0);
        assert!(c.delays()[0].processed().contains(Timestamp::new(1.0)));
    }
}
