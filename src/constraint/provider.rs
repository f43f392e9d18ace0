//! Constraint providers.
//!
//! Constraint definitions are extracted from the model description by an
//! external tool. The validator only needs them as a ready-made list, which a
//! [`ConstraintProvider`] supplies. The bundled provider reads a JSON document
//! of already-extracted definitions:
//!
//! ```json
//! {
//!   "delay": [{ "id": "DC_wiper", "stimulus": "switch", "response": "motor", "value": 20 }],
//!   "age":   [{ "id": "AC_chain", "chain": [{ "stimulus": "s0", "response": "r0" }], "value": 12 }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;

use super::{AgeConstraint, ConstraintSet, DelayConstraint, StimulusResponse};

/// Read-only source of constraint definitions for a run.
pub trait ConstraintProvider {
    fn delay_constraints(&self) -> Result<Vec<DelayConstraint>, ConstraintError>;

    fn age_constraints(&self) -> Result<Vec<AgeConstraint>, ConstraintError>;
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayDefinition {
    pub id: String,
    pub stimulus: String,
    pub response: String,
    pub value: f64,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeDefinition {
    pub id: String,
    pub chain: Vec<StimulusResponse>,
    pub value: f64,
}

/// Serialized form of a constraint set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintDocument {
    #[serde(default)]
    pub delay: Vec<DelayDefinition>,
    #[serde(default)]
    pub age: Vec<AgeDefinition>,
}

impl From<&ConstraintSet> for ConstraintDocument {
    fn from(set: &ConstraintSet) -> Self {
        Self {
            delay: set
                .delays()
                .iter()
                .map(|c| DelayDefinition {
                    id: c.id().to_string(),
                    stimulus: c.pair().stimulus.clone(),
                    response: c.pair().response.clone(),
                    value: c.value(),
                })
                .collect(),
            age: set
                .ages()
                .iter()
                .map(|c| AgeDefinition {
                    id: c.id().to_string(),
                    chain: c.chain().to_vec(),
                    value: c.value(),
                })
                .collect(),
        }
    }
}

impl ConstraintProvider for ConstraintDocument {
    fn delay_constraints(&self) -> Result<Vec<DelayConstraint>, ConstraintError> {
        self.delay
            .iter()
            .map(|d| {
                DelayConstraint::new(
                    d.id.clone(),
                    StimulusResponse::new(d.stimulus.clone(), d.response.clone()),
                    d.value,
                )
            })
            .collect()
    }

    fn age_constraints(&self) -> Result<Vec<AgeConstraint>, ConstraintError> {
        self.age
            .iter()
            .map(|a| AgeConstraint::new(a.id.clone(), a.chain.clone(), a.value))
            .collect()
    }
}

/// Provider backed by a JSON constraint document.
#[derive(Debug, Clone)]
pub struct JsonConstraintProvider {
    document: ConstraintDocument,
}

impl JsonConstraintProvider {
    /// Parses a JSON document; definitions are validated when requested.
    pub fn from_json_str(raw: &str) -> Result<Self, ConstraintError> {
        Ok(Self {
            document: serde_json::from_str(raw)?,
        })
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ConstraintError> {
        Ok(Self {
            document: serde_json::from_reader(reader)?,
        })
    }

    #[must_use]
    pub const fn document(&self) -> &ConstraintDocument {
        &self.document
    }
}

impl ConstraintProvider for JsonConstraintProvider {
    fn delay_constraints(&self) -> Result<Vec<DelayConstraint>, ConstraintError> {
        self.document.delay_constraints()
    }

    fn age_constraints(&self) -> Result<Vec<AgeConstraint>, ConstraintError> {
        self.document.age_constraints()
    }
}
