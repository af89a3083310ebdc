/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::conversion::Conversion;
use super::dimension::{
    mult_name, mult_symbol, per_name, per_symbol, DimensionId,
};
use super::error::UnitError;
use super::unit::UnitDef;

/// Binary operator combining two units into a compound unit.
#[derive(
    Serialize,
    Deserialize,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Hash,
    Clone,
    Copy,
    Debug,
)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub enum Operator {
    Multiply,
    Divide,
}

impl Operator {
    pub fn dimension(self, lhs: DimensionId, rhs: DimensionId) -> DimensionId {
        match self {
            Operator::Multiply => DimensionId::mult(lhs, rhs),
            Operator::Divide => DimensionId::per(lhs, rhs),
        }
    }

    fn name(self, lhs: &str, rhs: &str) -> String {
        match self {
            Operator::Multiply => mult_name(lhs, rhs),
            Operator::Divide => per_name(lhs, rhs),
        }
    }

    fn symbol(self, lhs: &str, rhs: &str) -> String {
        match self {
            Operator::Multiply => mult_symbol(lhs, rhs),
            Operator::Divide => per_symbol(lhs, rhs),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Operator::Multiply => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
        }
    }
}

/// Name, symbol and conversion of a compound unit, before it is
/// given an identity.
pub(crate) struct Derived {
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) conversion: Conversion,
}

pub(crate) fn derive(
    op: Operator,
    lhs: &UnitDef,
    rhs: &UnitDef,
) -> Result<Derived, UnitError> {
    Ok(Derived {
        name: op.name(&lhs.name, &rhs.name),
        symbol: op.symbol(&lhs.symbol, &rhs.symbol),
        conversion: derive_conversion(op, lhs, rhs)?,
    })
}

/// Linear operands combine algebraically. A single non-linear
/// operand keeps its functions, scaled by the linear operand's
/// multiplier; this is only sound as a per-magnitude approximation.
/// Two non-linear operands, or a non-linear divisor, have no
/// meaningful combination.
fn derive_conversion(
    op: Operator,
    lhs: &UnitDef,
    rhs: &UnitDef,
) -> Result<Conversion, UnitError> {
    let unsupported = || UnitError::UnsupportedDerivation {
        op,
        left: lhs.name.clone(),
        right: rhs.name.clone(),
    };
    let invalid = |e: UnitError| e.for_unit(&op.name(&lhs.name, &rhs.name));
    match (op, &lhs.conversion, &rhs.conversion) {
        (Operator::Multiply, Conversion::Linear(a), Conversion::Linear(b)) => {
            Conversion::linear(a * b).map_err(invalid)
        }
        (Operator::Divide, Conversion::Linear(a), Conversion::Linear(b)) => {
            Conversion::linear(a / b).map_err(invalid)
        }
        (Operator::Multiply, general, Conversion::Linear(m))
        | (Operator::Multiply, Conversion::Linear(m), general) => {
            general.scaled(*m).map_err(invalid)
        }
        (Operator::Divide, general, Conversion::Linear(m)) => {
            general.scaled(m.recip()).map_err(invalid)
        }
        (Operator::Divide, Conversion::Linear(_), Conversion::General { .. })
        | (_, Conversion::General { .. }, Conversion::General { .. }) => {
            Err(unsupported())
        }
    }
}
