/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::derivation::Operator;

#[derive(Serialize, Deserialize, Error, PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum UnitError {
    #[error("Incompatible dimensions: expected {expected}, found {found}")]
    DimensionMismatch { expected: String, found: String },
    #[error("Unsupported unit derivation: {left} {op} {right}")]
    UnsupportedDerivation {
        op: Operator,
        left: String,
        right: String,
    },
    #[error("Invalid conversion for unit {unit}: {reason}")]
    InvalidConversionDefinition { unit: String, reason: String },
    #[error(
        "Base unit for {dimension} is already {existing}, \
         cannot redefine as {requested}"
    )]
    BaseUnitRedefined {
        dimension: String,
        existing: String,
        requested: String,
    },
}

impl UnitError {
    /// Attach the offending unit's name to a conversion definition error.
    pub(crate) fn for_unit(self, name: &str) -> Self {
        match self {
            UnitError::InvalidConversionDefinition { reason, .. } => {
                UnitError::InvalidConversionDefinition {
                    unit: name.to_string(),
                    reason,
                }
            }
            e => e,
        }
    }
}
