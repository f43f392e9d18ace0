//! Timing constraint definitions and their per-run matching state.
//!
//! Two constraint shapes are supported:
//!
//! - [`DelayConstraint`]: one stimulus/response pair; the response must fire
//!   exactly `value` time units after the stimulus.
//! - [`AgeConstraint`]: a chain of nested stimulus/response pairs; the
//!   outermost response must fire exactly `value` after the first stimulus.
//!
//! Each constraint owns the set of timestamps it has already consumed, so
//! constraints sharing signals never interfere with one another.

/// Constraint providers (JSON documents, in-memory sets).
pub mod provider;

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;
use crate::time::Timestamp;

pub use provider::{ConstraintDocument, ConstraintProvider, JsonConstraintProvider};

/// Stable display identifier of a constraint (its short name in the model).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintId(String);

impl ConstraintId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of constraint a violation was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Delay,
    Age,
}

impl ConstraintKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::Age => "age",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stimulus signal and the response signal it must cause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusResponse {
    pub stimulus: String,
    pub response: String,
}

impl StimulusResponse {
    #[must_use]
    pub fn new(stimulus: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            stimulus: stimulus.into(),
            response: response.into(),
        }
    }

    fn validate(&self, constraint: &ConstraintId) -> Result<(), ConstraintError> {
        for (field, value) in [("stimulus", &self.stimulus), ("response", &self.response)] {
            if value.trim().is_empty() {
                return Err(ConstraintError::EmptyField {
                    constraint: constraint.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Timestamps a constraint has consumed and may not reuse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSet(HashSet<Timestamp>);

impl ProcessedSet {
    #[must_use]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.0.contains(&ts)
    }

    /// Returns false if `ts` was already consumed.
    pub fn insert(&mut self, ts: Timestamp) -> bool {
        self.0.insert(ts)
    }

    pub fn remove(&mut self, ts: Timestamp) -> bool {
        self.0.remove(&ts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Fixed delay between one stimulus change and one response change.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayConstraint {
    id: ConstraintId,
    pair: StimulusResponse,
    value: f64,
    processed: ProcessedSet,
}

impl DelayConstraint {
    /// Creates a validated delay constraint.
    pub fn new(
        id: impl Into<String>,
        pair: StimulusResponse,
        value: f64,
    ) -> Result<Self, ConstraintError> {
        let id = ConstraintId::new(id);
        validate_id(&id)?;
        pair.validate(&id)?;
        validate_value(&id, value)?;
        Ok(Self {
            id,
            pair,
            value,
            processed: ProcessedSet::default(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> &ConstraintId {
        &self.id
    }

    #[must_use]
    pub const fn pair(&self) -> &StimulusResponse {
        &self.pair
    }

    /// Required response − stimulus delta.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The stimulus a pending match would start from.
    #[must_use]
    pub fn leading_stimulus(&self) -> &str {
        &self.pair.stimulus
    }

    #[must_use]
    pub fn terminal_response(&self) -> &str {
        &self.pair.response
    }

    #[must_use]
    pub const fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub(crate) fn processed_mut(&mut self) -> &mut ProcessedSet {
        &mut self.processed
    }

    /// Clears matching state so the constraint can check a fresh log.
    pub fn reset(&mut self) {
        self.processed.clear();
    }
}

/// Fixed age over a nested chain of stimulus/response pairs.
///
/// The chain `(s0,r0),(s1,r1),...,(sN,rN)` is satisfied by occurrences in the
/// strictly increasing order `s0 < s1 < ... < sN < rN < ... < r1 < r0`, and
/// `value` is the required span from `s0` to `r0`.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeConstraint {
    id: ConstraintId,
    chain: Vec<StimulusResponse>,
    value: f64,
    processed: ProcessedSet,
}

impl AgeConstraint {
    /// Creates a validated age constraint; the chain must not be empty.
    pub fn new(
        id: impl Into<String>,
        chain: Vec<StimulusResponse>,
        value: f64,
    ) -> Result<Self, ConstraintError> {
        let id = ConstraintId::new(id);
        validate_id(&id)?;
        if chain.is_empty() {
            return Err(ConstraintError::EmptyChain {
                constraint: id.to_string(),
            });
        }
        for pair in &chain {
            pair.validate(&id)?;
        }
        validate_value(&id, value)?;
        Ok(Self {
            id,
            chain,
            value,
            processed: ProcessedSet::default(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> &ConstraintId {
        &self.id
    }

    #[must_use]
    pub fn chain(&self) -> &[StimulusResponse] {
        &self.chain
    }

    /// Required span from the first stimulus to the outermost response.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The outermost pair `(s0, r0)`.
    #[must_use]
    pub fn outermost(&self) -> &StimulusResponse {
        &self.chain[0]
    }

    #[must_use]
    pub fn leading_stimulus(&self) -> &str {
        &self.outermost().stimulus
    }

    #[must_use]
    pub fn terminal_response(&self) -> &str {
        &self.outermost().response
    }

    #[must_use]
    pub const fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    pub(crate) fn processed_mut(&mut self) -> &mut ProcessedSet {
        &mut self.processed
    }

    pub fn reset(&mut self) {
        self.processed.clear();
    }
}

/// The full set of constraints checked during one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    delays: Vec<DelayConstraint>,
    ages: Vec<AgeConstraint>,
}

impl ConstraintSet {
    /// Builds a set, rejecting ids declared more than once.
    pub fn new(
        delays: Vec<DelayConstraint>,
        ages: Vec<AgeConstraint>,
    ) -> Result<Self, ConstraintError> {
        let mut seen = HashSet::new();
        let ids = delays.iter().map(DelayConstraint::id).chain(ages.iter().map(AgeConstraint::id));
        for id in ids {
            if !seen.insert(id) {
                return Err(ConstraintError::DuplicateId {
                    constraint: id.to_string(),
                });
            }
        }
        Ok(Self { delays, ages })
    }

    /// Loads every definition from a provider.
    pub fn from_provider(provider: &dyn ConstraintProvider) -> Result<Self, ConstraintError> {
        Self::new(provider.delay_constraints()?, provider.age_constraints()?)
    }

    #[must_use]
    pub fn delays(&self) -> &[DelayConstraint] {
        &self.delays
    }

    #[must_use]
    pub fn ages(&self) -> &[AgeConstraint] {
        &self.ages
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [DelayConstraint], &mut [AgeConstraint]) {
        (&mut self.delays, &mut self.ages)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.delays.len() + self.ages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty() && self.ages.is_empty()
    }

    /// Keeps only constraints whose id matches `pattern`.
    pub fn retain_matching(&mut self, pattern: &Regex) {
        self.delays.retain(|c| pattern.is_match(c.id().as_str()));
        self.ages.retain(|c| pattern.is_match(c.id().as_str()));
    }

    /// Clears all per-run matching state.
    pub fn reset(&mut self) {
        self.delays.iter_mut().for_each(DelayConstraint::reset);
        self.ages.iter_mut().for_each(AgeConstraint::reset);
    }

    /// Index from terminal response signal to the constraints it triggers.
    ///
    /// Returned as positions into [`Self::delays`] and [`Self::ages`].
    #[must_use]
    pub fn response_index(&self) -> ResponseIndex {
        let mut index = ResponseIndex::default();
        for (i, c) in self.ages.iter().enumerate() {
            index
                .ages
                .entry(c.terminal_response().to_string())
                .or_default()
                .push(i);
        }
        for (i, c) in self.delays.iter().enumerate() {
            index
                .delays
                .entry(c.terminal_response().to_string())
                .or_default()
                .push(i);
        }
        index
    }

    /// Stable digest of the definitions (not the matching state).
    ///
    /// # Panics
    ///
    /// Never in practice: the document holds only strings and finite floats,
    /// which always serialize.
    #[must_use]
    pub fn digest(&self) -> String {
        let doc = ConstraintDocument::from(self);
        let bytes = serde_json::to_vec(&doc).expect("constraint document serializes");
        blake3::hash(&bytes).to_hex().to_string()
    }
}

/// Constraint positions keyed by the response signal that triggers them.
#[derive(Debug, Clone, Default)]
pub struct ResponseIndex {
    delays: HashMap<String, Vec<usize>>,
    ages: HashMap<String, Vec<usize>>,
}

impl ResponseIndex {
    #[must_use]
    pub fn delays_for(&self, signal: &str) -> &[usize] {
        self.delays.get(signal).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn ages_for(&self, signal: &str) -> &[usize] {
        self.ages.get(signal).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn validate_id(id: &ConstraintId) -> Result<(), ConstraintError> {
    if id.as_str().trim().is_empty() {
        return Err(ConstraintError::EmptyField {
            constraint: id.to_string(),
            field: "id".to_string(),
        });
    }
    Ok(())
}

fn validate_value(id: &ConstraintId, value: f64) -> Result<(), ConstraintError> {
    if !value.is_finite() {
        return Err(ConstraintError::InvalidValue {
            constraint: id.to_string(),
            value,
        });
    }
    Ok(())
}
