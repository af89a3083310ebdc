/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::conversion::Conversion;
use super::derivation::Operator;
use super::dimension::{Dimension, DimensionId};
use super::error::UnitError;
use super::measure::{Measure, Tolerance};
use super::registry::derive_shared;
use super::unit::{Unit, UnitDef};

/// A unit whose dimension is only known at runtime. Every operation
/// involving two units checks their dimensions.
#[derive(Clone)]
pub struct UntypedUnit {
    def: Arc<UnitDef>,
}

impl UntypedUnit {
    pub(crate) fn from_def(def: Arc<UnitDef>) -> Self {
        UntypedUnit { def }
    }

    pub(crate) fn def(&self) -> &Arc<UnitDef> {
        &self.def
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn symbol(&self) -> &str {
        &self.def.symbol
    }

    pub fn dimension(&self) -> &DimensionId {
        &self.def.dimension
    }

    pub fn conversion(&self) -> &Conversion {
        &self.def.conversion
    }

    pub fn of(&self, magnitude: f64) -> UntypedMeasure {
        UntypedMeasure::new(magnitude, self)
    }

    pub fn check_dimension(
        &self,
        other: &UntypedUnit,
    ) -> Result<(), UnitError> {
        match self.def.dimension == other.def.dimension {
            true => Ok(()),
            false => Err(UnitError::DimensionMismatch {
                expected: self.def.dimension.to_string(),
                found: other.def.dimension.to_string(),
            }),
        }
    }

    pub fn convert_to(
        &self,
        magnitude: f64,
        other: &UntypedUnit,
    ) -> Result<f64, UnitError> {
        self.check_dimension(other)?;
        Ok(self.def.conversion.convert(magnitude, &other.def.conversion))
    }

    /// False for units of different dimensions.
    pub fn is_equivalent(&self, other: &UntypedUnit) -> bool {
        self.def.is_equivalent(&other.def)
    }

    pub fn same_instance(&self, other: &UntypedUnit) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }

    pub fn mult(&self, other: &UntypedUnit) -> Result<UntypedUnit, UnitError> {
        derive_shared(Operator::Multiply, &self.def, &other.def)
            .map(UntypedUnit::from_def)
    }

    pub fn per(&self, other: &UntypedUnit) -> Result<UntypedUnit, UnitError> {
        derive_shared(Operator::Divide, &self.def, &other.def)
            .map(UntypedUnit::from_def)
    }

    /// Recover the static dimension.
    pub fn downcast<D: Dimension>(&self) -> Result<Unit<D>, UnitError> {
        let expected = D::id();
        match self.def.dimension == expected {
            true => Ok(Unit::from_def(self.def.clone())),
            false => Err(UnitError::DimensionMismatch {
                expected: expected.to_string(),
                found: self.def.dimension.to_string(),
            }),
        }
    }
}

impl<D: Dimension> From<Unit<D>> for UntypedUnit {
    fn from(unit: Unit<D>) -> Self {
        unit.erase()
    }
}

impl PartialEq for UntypedUnit {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) || self.def.key() == other.def.key()
    }
}

impl Eq for UntypedUnit {}

impl Hash for UntypedUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.def.key().hash(state)
    }
}

impl Debug for UntypedUnit {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("UntypedUnit")
            .field("name", &self.def.name)
            .field("symbol", &self.def.symbol)
            .field("dimension", &self.def.dimension)
            .field("conversion", &self.def.conversion)
            .finish()
    }
}

impl Display for UntypedUnit {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.def.symbol)
    }
}

/// A magnitude in a unit whose dimension is only known at runtime.
#[derive(Clone, Debug)]
pub struct UntypedMeasure {
    magnitude: f64,
    unit: UntypedUnit,
}

impl UntypedMeasure {
    pub fn new(magnitude: f64, unit: &UntypedUnit) -> Self {
        UntypedMeasure {
            magnitude,
            unit: unit.clone(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &UntypedUnit {
        &self.unit
    }

    pub fn dimension(&self) -> &DimensionId {
        self.unit.dimension()
    }

    pub fn base_magnitude(&self) -> f64 {
        self.unit.conversion().to_base(self.magnitude)
    }

    pub fn convert(&self, unit: &UntypedUnit) -> Result<Self, UnitError> {
        Ok(UntypedMeasure::new(
            self.unit.convert_to(self.magnitude, unit)?,
            unit,
        ))
    }

    pub fn plus(&self, other: &UntypedMeasure) -> Result<Self, UnitError> {
        self.unit.check_dimension(&other.unit)?;
        let rhs = other.unit.convert_to(other.magnitude, &self.unit)?;
        Ok(UntypedMeasure::new(self.magnitude + rhs, &self.unit))
    }

    pub fn minus(&self, other: &UntypedMeasure) -> Result<Self, UnitError> {
        self.unit.check_dimension(&other.unit)?;
        let rhs = other.unit.convert_to(other.magnitude, &self.unit)?;
        Ok(UntypedMeasure::new(self.magnitude - rhs, &self.unit))
    }

    pub fn times_scalar(&self, factor: f64) -> Self {
        UntypedMeasure::new(self.magnitude * factor, &self.unit)
    }

    pub fn times(&self, other: &UntypedMeasure) -> Result<Self, UnitError> {
        let unit = self.unit.mult(&other.unit)?;
        Ok(UntypedMeasure::new(self.magnitude * other.magnitude, &unit))
    }

    pub fn divide(&self, other: &UntypedMeasure) -> Result<Self, UnitError> {
        let unit = self.unit.per(&other.unit)?;
        Ok(UntypedMeasure::new(self.magnitude / other.magnitude, &unit))
    }

    /* Note: we cannot implement PartialOrd, because it does not allow
    for error conditions. */
    pub fn partial_cmp(
        &self,
        rhs: &Self,
    ) -> Result<Option<Ordering>, UnitError> {
        self.unit.check_dimension(&rhs.unit)?;
        Ok(self.base_magnitude().partial_cmp(&rhs.base_magnitude()))
    }

    pub fn is_equivalent(&self, rhs: &Self) -> Result<bool, UnitError> {
        self.is_equivalent_within(rhs, Tolerance::default())
    }

    pub fn is_equivalent_within<T: Into<Tolerance>>(
        &self,
        rhs: &Self,
        tolerance: T,
    ) -> Result<bool, UnitError> {
        self.unit.check_dimension(&rhs.unit)?;
        Ok(tolerance
            .into()
            .within(self.base_magnitude(), rhs.base_magnitude()))
    }

    pub fn downcast<D: Dimension>(&self) -> Result<Measure<D>, UnitError> {
        Ok(Measure::new(self.magnitude, &self.unit.downcast()?))
    }
}

impl<D: Dimension> From<Measure<D>> for UntypedMeasure {
    fn from(measure: Measure<D>) -> Self {
        measure.erase()
    }
}

impl Display for UntypedMeasure {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}
