/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::conversion::Conversion;
use super::derivation::Operator;
use super::dimension::{Dimension, DimensionId, Mult, Per};
use super::error::UnitError;
use super::measure::Measure;
use super::registry::{derive_shared_unit, RegistryShared, UnitRegistry};
use super::untyped::UntypedUnit;

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(0);

/// Immutable unit record shared by all handles to the same unit.
pub(crate) struct UnitDef {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) conversion: Conversion,
    pub(crate) dimension: DimensionId,
    pub(crate) registry: Weak<RegistryShared>,
}

/// Identity of a unit for equality, hashing and cache lookups.
/// Linear units are compared by value; function-pair units only
/// by instance.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub(crate) enum UnitKey {
    Linear {
        dimension: DimensionId,
        symbol: String,
        multiplier: u64,
    },
    Instance(u64),
}

impl UnitDef {
    pub(crate) fn new(
        name: String,
        symbol: String,
        conversion: Conversion,
        dimension: DimensionId,
        registry: Weak<RegistryShared>,
    ) -> Arc<Self> {
        Arc::new(UnitDef {
            id: NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed),
            name,
            symbol,
            conversion,
            dimension,
            registry,
        })
    }

    pub(crate) fn key(&self) -> UnitKey {
        match self.conversion {
            Conversion::Linear(m) => UnitKey::Linear {
                dimension: self.dimension.clone(),
                symbol: self.symbol.clone(),
                multiplier: m.to_bits(),
            },
            Conversion::General { .. } => UnitKey::Instance(self.id),
        }
    }

    pub(crate) fn is_equivalent(&self, other: &UnitDef) -> bool {
        self.dimension == other.dimension
            && (self.id == other.id
                || self.conversion.is_equivalent(&other.conversion))
    }

    pub(crate) fn registry(&self) -> Option<UnitRegistry> {
        self.registry.upgrade().map(UnitRegistry::from_shared)
    }
}

/// A unit of dimension `D`.
///
/// Handles are cheap to clone and share the underlying definition.
/// Units of different dimensions are different types, so
/// conversion between them cannot be expressed:
///
/// ```compile_fail
/// use typed_unit::{Distance, Time, UnitRegistry};
///
/// let registry = UnitRegistry::new();
/// let seconds = registry.base_unit::<Time>();
/// let meters = registry.base_unit::<Distance>();
/// let _ = seconds.of(5.0) + meters.of(3.0);
/// ```
pub struct Unit<D> {
    def: Arc<UnitDef>,
    _dimension: PhantomData<fn() -> D>,
}

impl<D: Dimension> Unit<D> {
    pub(crate) fn from_def(def: Arc<UnitDef>) -> Self {
        debug_assert_eq!(def.dimension, D::id());
        Unit {
            def,
            _dimension: PhantomData,
        }
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

    pub fn dimension(&self) -> DimensionId {
        D::id()
    }

    pub fn conversion(&self) -> &Conversion {
        &self.def.conversion
    }

    pub fn multiplier(&self) -> Option<f64> {
        self.def.conversion.multiplier()
    }

    pub fn is_linear(&self) -> bool {
        self.def.conversion.is_linear()
    }

    pub fn to_base(&self, magnitude: f64) -> f64 {
        self.def.conversion.to_base(magnitude)
    }

    pub fn from_base(&self, magnitude: f64) -> f64 {
        self.def.conversion.from_base(magnitude)
    }

    /// Wrap a magnitude in this unit. NaN and infinities pass
    /// through unchanged.
    pub fn of(&self, magnitude: f64) -> Measure<D> {
        Measure::new(magnitude, self)
    }

    /// Measure from a magnitude expressed in the base unit.
    pub fn of_base_units(&self, magnitude: f64) -> Measure<D> {
        self.of(self.from_base(magnitude))
    }

    pub fn zero(&self) -> Measure<D> {
        self.of(0.0)
    }

    pub fn one(&self) -> Measure<D> {
        self.of(1.0)
    }

    /// Express `magnitude` (in this unit) in `other`.
    pub fn convert_to(&self, magnitude: f64, other: &Unit<D>) -> f64 {
        self.def.conversion.convert(magnitude, &other.def.conversion)
    }

    /// Express `magnitude` (in `other`) in this unit.
    pub fn convert_from(&self, magnitude: f64, other: &Unit<D>) -> f64 {
        other.convert_to(magnitude, self)
    }

    /// Same conversion behaviour, regardless of name or instance.
    pub fn is_equivalent(&self, other: &Unit<D>) -> bool {
        self.def.is_equivalent(&other.def)
    }

    pub fn same_instance(&self, other: &Unit<D>) -> bool {
        Arc::ptr_eq(&self.def, &other.def)
    }

    pub fn registry(&self) -> Option<UnitRegistry> {
        self.def.registry()
    }

    pub fn base_unit(&self) -> Unit<D> {
        match self.registry() {
            Some(registry) => registry.base_unit(),
            None => Unit::from_def(UnitDef::new(
                D::base_name(),
                D::base_symbol(),
                Conversion::Linear(1.0),
                D::id(),
                Weak::new(),
            )),
        }
    }

    pub fn is_base_unit(&self) -> bool {
        self.is_equivalent(&self.base_unit())
    }

    /// A new unit of the same dimension, worth `factor` of this one.
    pub fn scaled(
        &self,
        factor: f64,
        name: &str,
        symbol: &str,
    ) -> Result<Unit<D>, UnitError> {
        let conversion = self
            .def
            .conversion
            .scaled(factor)
            .map_err(|e| e.for_unit(name))?;
        Ok(Unit::from_def(UnitDef::new(
            name.to_string(),
            symbol.to_string(),
            conversion,
            D::id(),
            self.def.registry.clone(),
        )))
    }

    pub fn mult<E: Dimension>(
        &self,
        other: &Unit<E>,
    ) -> Result<Unit<Mult<D, E>>, UnitError> {
        derive_shared_unit(Operator::Multiply, &self.def, &other.def)
    }

    pub fn per<E: Dimension>(
        &self,
        other: &Unit<E>,
    ) -> Result<Unit<Per<D, E>>, UnitError> {
        derive_shared_unit(Operator::Divide, &self.def, &other.def)
    }

    pub fn erase(&self) -> UntypedUnit {
        UntypedUnit::from_def(self.def.clone())
    }
}

impl<D> Clone for Unit<D> {
    fn clone(&self) -> Self {
        Unit {
            def: self.def.clone(),
            _dimension: PhantomData,
        }
    }
}

/// Two units are the same if they share symbol and multiplier;
/// function-pair units only equal themselves.
impl<D> PartialEq for Unit<D> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) || self.def.key() == other.def.key()
    }
}

impl<D> Eq for Unit<D> {}

impl<D> Hash for Unit<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.def.key().hash(state)
    }
}

impl<D> Debug for Unit<D> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("Unit")
            .field("name", &self.def.name)
            .field("symbol", &self.def.symbol)
            .field("dimension", &self.def.dimension)
            .field("conversion", &self.def.conversion)
            .finish()
    }
}

impl<D> Display for Unit<D> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.def.symbol)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::dimension::{Distance, Temperature, Time};
    use crate::UnitRegistry;

    #[test]
    fn equality_follows_symbol_and_multiplier() {
        let registry = UnitRegistry::new();
        let a = registry.unit::<Time>("millisecond", "ms", 0.001).unwrap();
        let b = registry.unit::<Time>("milliseconds", "ms", 0.001).unwrap();
        let c = registry.unit::<Time>("millisecond", "msec", 0.001).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_equivalent(&c));
        assert!(!a.same_instance(&b));

        let set: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn function_units_compare_by_instance() {
        let registry = UnitRegistry::new();
        let f = |c: f64| c + 273.15;
        let g = |k: f64| k - 273.15;
        let a = registry
            .unit_with_functions::<Temperature, _, _>("celsius", "°C", f, g);
        let b = registry
            .unit_with_functions::<Temperature, _, _>("celsius", "°C", f, g);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.is_equivalent(&b));
    }

    #[test]
    fn base_unit_is_lazy_and_shared() {
        let registry = UnitRegistry::new();
        let km = registry.unit::<Distance>("kilometer", "km", 1000.0).unwrap();
        assert!(!km.is_base_unit());
        let base = km.base_unit();
        assert_eq!(base.symbol(), "m");
        assert!(base.is_base_unit());
        assert!(base.same_instance(&registry.base_unit::<Distance>()));
    }

    #[test]
    fn scaled_units() {
        let registry = UnitRegistry::new();
        let seconds = registry.base_unit::<Time>();
        let minutes = seconds.scaled(60.0, "minute", "min").unwrap();
        let hours = minutes.scaled(60.0, "hour", "h").unwrap();
        assert_eq!(hours.multiplier(), Some(3600.0));
        assert_eq!(hours.convert_to(1.5, &minutes), 90.0);
        assert_eq!(minutes.convert_from(2.0, &hours), 120.0);
        assert!(hours.registry().is_some());
        assert!(seconds.scaled(f64::NAN, "bad", "bad").is_err());
    }

    #[test]
    fn display_is_symbol() {
        let registry = UnitRegistry::new();
        let ms = registry.unit::<Time>("millisecond", "ms", 0.001).unwrap();
        assert_eq!(ms.to_string(), "ms");
    }
}
