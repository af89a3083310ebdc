/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use super::dimension::{Dimension, Mult, Per};
use super::error::UnitError;
use super::unit::Unit;
use super::untyped::UntypedMeasure;

/// Bounds for comparing floating-point magnitudes: two values match
/// if their difference is within `absolute`, or within `relative`
/// times the larger of the two.
#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct Tolerance {
    pub relative: f64,
    pub absolute: f64,
}

impl Tolerance {
    pub const fn new(relative: f64, absolute: f64) -> Self {
        Tolerance { relative, absolute }
    }

    pub fn within(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let diff = (a - b).abs();
        diff <= self.absolute || diff <= self.relative * a.abs().max(b.abs())
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::new(1e-9, 1e-12)
    }
}

impl From<f64> for Tolerance {
    fn from(tolerance: f64) -> Self {
        Tolerance::new(tolerance, tolerance)
    }
}

/// A magnitude in a unit of dimension `D`.
///
/// Measures are immutable: conversion and arithmetic produce new
/// values. Floating-point edge cases (NaN, infinities, division by
/// zero) propagate as usual and are not reported as errors.
pub struct Measure<D> {
    magnitude: f64,
    unit: Unit<D>,
}

impl<D: Dimension> Measure<D> {
    pub fn new(magnitude: f64, unit: &Unit<D>) -> Self {
        Measure {
            magnitude,
            unit: unit.clone(),
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit<D> {
        &self.unit
    }

    pub fn base_magnitude(&self) -> f64 {
        self.unit.to_base(self.magnitude)
    }

    /// The magnitude of this measure expressed in `unit`.
    pub fn in_units(&self, unit: &Unit<D>) -> f64 {
        self.unit.convert_to(self.magnitude, unit)
    }

    pub fn convert(&self, unit: &Unit<D>) -> Measure<D> {
        Measure::new(self.in_units(unit), unit)
    }

    /// Sum in this measure's unit.
    pub fn plus(&self, other: &Measure<D>) -> Measure<D> {
        Measure::new(self.magnitude + other.in_units(&self.unit), &self.unit)
    }

    pub fn minus(&self, other: &Measure<D>) -> Measure<D> {
        Measure::new(self.magnitude - other.in_units(&self.unit), &self.unit)
    }

    pub fn negate(&self) -> Measure<D> {
        Measure::new(-self.magnitude, &self.unit)
    }

    pub fn times_scalar(&self, factor: f64) -> Measure<D> {
        Measure::new(self.magnitude * factor, &self.unit)
    }

    pub fn divide_scalar(&self, divisor: f64) -> Measure<D> {
        Measure::new(self.magnitude / divisor, &self.unit)
    }

    /// Product of the magnitudes, each in its own unit, in the
    /// derived product unit.
    pub fn times<E: Dimension>(
        &self,
        other: &Measure<E>,
    ) -> Result<Measure<Mult<D, E>>, UnitError> {
        let unit = self.unit.mult(&other.unit)?;
        Ok(unit.of(self.magnitude * other.magnitude))
    }

    /// Quotient of the magnitudes, each in its own unit, in the
    /// derived quotient unit.
    pub fn divide<E: Dimension>(
        &self,
        other: &Measure<E>,
    ) -> Result<Measure<Per<D, E>>, UnitError> {
        let unit = self.unit.per(&other.unit)?;
        Ok(unit.of(self.magnitude / other.magnitude))
    }

    pub fn is_equivalent(&self, other: &Measure<D>) -> bool {
        self.is_equivalent_within(other, Tolerance::default())
    }

    pub fn is_equivalent_within<T: Into<Tolerance>>(
        &self,
        other: &Measure<D>,
        tolerance: T,
    ) -> bool {
        tolerance
            .into()
            .within(self.base_magnitude(), other.base_magnitude())
    }

    /// Within `fraction` of `other`, relative to the larger magnitude.
    pub fn is_near(&self, other: &Measure<D>, fraction: f64) -> bool {
        self.is_equivalent_within(other, Tolerance::new(fraction, 0.0))
    }

    pub fn max(&self, other: &Measure<D>) -> Measure<D> {
        match self.partial_cmp(other) {
            Some(Ordering::Less) => other.clone(),
            _ => self.clone(),
        }
    }

    pub fn min(&self, other: &Measure<D>) -> Measure<D> {
        match self.partial_cmp(other) {
            Some(Ordering::Greater) => other.clone(),
            _ => self.clone(),
        }
    }

    pub fn to_short_string(&self) -> String {
        self.to_string()
    }

    pub fn to_long_string(&self) -> String {
        format!("{} {}", self.magnitude, self.unit.name())
    }

    pub fn erase(&self) -> UntypedMeasure {
        UntypedMeasure::new(self.magnitude, &self.unit.erase())
    }
}

impl<D> Clone for Measure<D> {
    fn clone(&self) -> Self {
        Measure {
            magnitude: self.magnitude,
            unit: self.unit.clone(),
        }
    }
}

impl<D> Debug for Measure<D> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("Measure")
            .field("magnitude", &self.magnitude)
            .field("unit", &self.unit)
            .finish()
    }
}

impl<D> Display for Measure<D> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

/// Exact equality of base-unit magnitudes, consistent with the
/// ordering. Use `is_equivalent` to allow for rounding.
impl<D: Dimension> PartialEq for Measure<D> {
    fn eq(&self, other: &Self) -> bool {
        self.base_magnitude() == other.base_magnitude()
    }
}

impl<D: Dimension> PartialOrd for Measure<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.base_magnitude().partial_cmp(&other.base_magnitude())
    }
}

/* Operators. */

impl<D: Dimension> Add<&Measure<D>> for &Measure<D> {
    type Output = Measure<D>;
    fn add(self, rhs: &Measure<D>) -> Measure<D> {
        self.plus(rhs)
    }
}

impl<D: Dimension> Add<Measure<D>> for Measure<D> {
    type Output = Measure<D>;
    fn add(self, rhs: Measure<D>) -> Measure<D> {
        self.plus(&rhs)
    }
}

impl<D: Dimension> Sub<&Measure<D>> for &Measure<D> {
    type Output = Measure<D>;
    fn sub(self, rhs: &Measure<D>) -> Measure<D> {
        self.minus(rhs)
    }
}

impl<D: Dimension> Sub<Measure<D>> for Measure<D> {
    type Output = Measure<D>;
    fn sub(self, rhs: Measure<D>) -> Measure<D> {
        self.minus(&rhs)
    }
}

impl<D: Dimension> Neg for &Measure<D> {
    type Output = Measure<D>;
    fn neg(self) -> Measure<D> {
        self.negate()
    }
}

impl<D: Dimension> Neg for Measure<D> {
    type Output = Measure<D>;
    fn neg(self) -> Measure<D> {
        self.negate()
    }
}

impl<D: Dimension> Mul<f64> for &Measure<D> {
    type Output = Measure<D>;
    fn mul(self, rhs: f64) -> Measure<D> {
        self.times_scalar(rhs)
    }
}

impl<D: Dimension> Mul<f64> for Measure<D> {
    type Output = Measure<D>;
    fn mul(self, rhs: f64) -> Measure<D> {
        self.times_scalar(rhs)
    }
}

impl<D: Dimension> Div<f64> for &Measure<D> {
    type Output = Measure<D>;
    fn div(self, rhs: f64) -> Measure<D> {
        self.divide_scalar(rhs)
    }
}

impl<D: Dimension> Div<f64> for Measure<D> {
    type Output = Measure<D>;
    fn div(self, rhs: f64) -> Measure<D> {
        self.divide_scalar(rhs)
    }
}

/* Multiplication and division between measures need a derived
unit, which may not exist. */

impl<D: Dimension, E: Dimension> Mul<&Measure<E>> for &Measure<D> {
    type Output = Result<Measure<Mult<D, E>>, UnitError>;
    fn mul(self, rhs: &Measure<E>) -> Self::Output {
        self.times(rhs)
    }
}

impl<D: Dimension, E: Dimension> Mul<Measure<E>> for Measure<D> {
    type Output = Result<Measure<Mult<D, E>>, UnitError>;
    fn mul(self, rhs: Measure<E>) -> Self::Output {
        self.times(&rhs)
    }
}

impl<D: Dimension, E: Dimension> Div<&Measure<E>> for &Measure<D> {
    type Output = Result<Measure<Per<D, E>>, UnitError>;
    fn div(self, rhs: &Measure<E>) -> Self::Output {
        self.divide(rhs)
    }
}

impl<D: Dimension, E: Dimension> Div<Measure<E>> for Measure<D> {
    type Output = Result<Measure<Per<D, E>>, UnitError>;
    fn div(self, rhs: Measure<E>) -> Self::Output {
        self.divide(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Distance, Temperature, Time};
    use crate::UnitRegistry;

    #[test]
    fn tolerance_bounds() {
        let t = Tolerance::default();
        assert!(t.within(1.0, 1.0 + 1e-10));
        assert!(!t.within(1.0, 1.0 + 1e-6));
        assert!(t.within(0.0, 1e-13));
        assert!(t.within(f64::INFINITY, f64::INFINITY));
        assert!(!t.within(f64::NAN, f64::NAN));
        assert!(!t.within(1.0, f64::INFINITY));
        assert!(!t.within(f64::NEG_INFINITY, f64::INFINITY));
        assert!(!t.within(f64::NAN, 1.0));
        assert!(!Tolerance::from(1e300).within(0.0, f64::INFINITY));
        assert_eq!(Tolerance::from(0.5), Tolerance::new(0.5, 0.5));
    }

    #[test]
    fn scalar_arithmetic_keeps_unit() {
        let registry = UnitRegistry::new();
        let ms = registry.unit::<Time>("millisecond", "ms", 0.001).unwrap();
        let m = ms.of(250.0);
        assert_eq!((&m * 4.0).magnitude(), 1000.0);
        assert_eq!((&m / 2.0).magnitude(), 125.0);
        assert_eq!((-&m).magnitude(), -250.0);
        assert!((m.clone() * 4.0).unit().same_instance(&ms));
    }

    #[test]
    fn addition_uses_left_unit() {
        let registry = UnitRegistry::new();
        let s = registry.base_unit::<Time>();
        let ms = registry.unit::<Time>("millisecond", "ms", 0.001).unwrap();
        let sum = &s.of(1.0) + &ms.of(500.0);
        assert_eq!(sum.magnitude(), 1.5);
        assert!(sum.unit().same_instance(&s));
        let diff = ms.of(500.0) - s.of(1.0);
        assert_eq!(diff.magnitude(), -500.0);
        assert!(diff.unit().same_instance(&ms));
    }

    #[test]
    fn ordering_across_units() {
        let registry = UnitRegistry::new();
        let m = registry.base_unit::<Distance>();
        let km = registry.unit::<Distance>("kilometer", "km", 1000.0).unwrap();
        assert!(km.of(1.0) > m.of(999.0));
        assert!(km.of(1.0) < m.of(1001.0));
        assert_eq!(km.of(1.0), m.of(1000.0));
        assert_eq!(km.of(2.0).max(&m.of(10.0)).unit(), &km);
        assert_eq!(km.of(2.0).min(&m.of(10.0)).unit(), &m);
        assert_eq!(m.of(f64::NAN).partial_cmp(&m.of(1.0)), None);
    }

    #[test]
    fn temperature_conversion() {
        let registry = UnitRegistry::new();
        let k = registry.base_unit::<Temperature>();
        let c = registry.unit_with_functions::<Temperature, _, _>(
            "celsius",
            "°C",
            |c| c + 273.15,
            |k| k - 273.15,
        );
        let f = registry.unit_with_functions::<Temperature, _, _>(
            "fahrenheit",
            "°F",
            |f| (f + 459.67) * 5.0 / 9.0,
            |k| k * 9.0 / 5.0 - 459.67,
        );
        assert!(c.of(100.0).convert(&f).is_equivalent(&f.of(212.0)));
        assert!((c.of(-40.0).in_units(&f) + 40.0).abs() < 1e-9);
        assert!((k.of(0.0).in_units(&c) + 273.15).abs() < 1e-9);
        assert!(c.of(0.0) > f.of(0.0));
    }

    #[test]
    fn near_and_equivalent() {
        let registry = UnitRegistry::new();
        let s = registry.base_unit::<Time>();
        assert!(s.of(100.0).is_near(&s.of(101.0), 0.01));
        assert!(!s.of(100.0).is_near(&s.of(102.0), 0.01));
        assert!(s.of(0.1 + 0.2).is_equivalent(&s.of(0.3)));
        assert_ne!(s.of(0.1 + 0.2), s.of(0.3));
    }

    #[test]
    fn infinities_are_only_equivalent_to_themselves() {
        let registry = UnitRegistry::new();
        let s = registry.base_unit::<Time>();
        let m = registry.base_unit::<Distance>();
        assert!(!s.of(1.0).is_equivalent(&s.of(f64::INFINITY)));
        assert!(!s.of(f64::NEG_INFINITY).is_equivalent(&s.of(f64::INFINITY)));
        assert!(s.of(f64::INFINITY).is_equivalent(&s.of(f64::INFINITY)));
        assert!(!s.of(1.0).is_near(&s.of(f64::INFINITY), 0.5));

        let speed = m.of(1.0).divide(&s.of(0.0)).unwrap();
        let mps = m.per(&s).unwrap();
        assert_eq!(speed.magnitude(), f64::INFINITY);
        assert!(!speed.is_equivalent(&mps.of(5.0)));
    }

    #[test]
    fn formatting() {
        let registry = UnitRegistry::new();
        let ms = registry.unit::<Time>("millisecond", "ms", 0.001).unwrap();
        assert_eq!(ms.of(1.5).to_short_string(), "1.5 ms");
        assert_eq!(ms.of(1.5).to_long_string(), "1.5 millisecond");
    }
}
