/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use lazy_static::lazy_static;
use log::{debug, trace, warn};
use parking_lot::RwLock;

use super::conversion::Conversion;
use super::derivation::{derive, Operator};
use super::dimension::{Dimension, DimensionId, Mult, Per};
use super::error::UnitError;
use super::unit::{Unit, UnitDef, UnitKey};
use super::untyped::UntypedUnit;

lazy_static! {
    static ref GLOBAL: UnitRegistry = UnitRegistry::new();
}

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
struct DerivationKey {
    op: Operator,
    lhs: UnitKey,
    rhs: UnitKey,
}

#[derive(Default)]
pub(crate) struct RegistryShared {
    base_units: RwLock<HashMap<DimensionId, Arc<UnitDef>>>,
    derived: RwLock<HashMap<DerivationKey, Arc<UnitDef>>>,
}

/// Shared state of a unit system: the base unit of every dimension
/// and the cache of derived compound units.
///
/// Registries are independent of each other; clones share state.
/// Units keep a weak handle to the registry that created them, so
/// that arithmetic on their measures can reach the derivation cache.
#[derive(Clone, Default)]
pub struct UnitRegistry {
    shared: Arc<RegistryShared>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, for catalogs that do not pass one
    /// around.
    pub fn global() -> &'static UnitRegistry {
        &GLOBAL
    }

    pub(crate) fn from_shared(shared: Arc<RegistryShared>) -> Self {
        UnitRegistry { shared }
    }

    fn handle(&self) -> Weak<RegistryShared> {
        Arc::downgrade(&self.shared)
    }

    pub fn same_registry(&self, other: &UnitRegistry) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /* Base units. */

    /// The base unit of `D`, created on first use.
    pub fn base_unit<D: Dimension>(&self) -> Unit<D> {
        let dimension = D::id();
        if let Some(def) = self.shared.base_units.read().get(&dimension) {
            return Unit::from_def(def.clone());
        }
        let def = UnitDef::new(
            D::base_name(),
            D::base_symbol(),
            Conversion::Linear(1.0),
            dimension.clone(),
            self.handle(),
        );
        let mut base_units = self.shared.base_units.write();
        Unit::from_def(
            base_units
                .entry(dimension)
                .or_insert_with(|| {
                    debug!(
                        "initialized base unit {} for {}",
                        def.symbol, def.dimension
                    );
                    def
                })
                .clone(),
        )
    }

    /// Fix the base unit of `D` under a different name and symbol.
    /// Fails if the dimension already has a different base unit.
    pub fn define_base_unit<D: Dimension>(
        &self,
        name: &str,
        symbol: &str,
    ) -> Result<Unit<D>, UnitError> {
        let dimension = D::id();
        let mut base_units = self.shared.base_units.write();
        match base_units.entry(dimension) {
            Entry::Occupied(ent) => {
                let def = ent.get();
                match def.name == name && def.symbol == symbol {
                    true => Ok(Unit::from_def(def.clone())),
                    false => Err(UnitError::BaseUnitRedefined {
                        dimension: def.dimension.to_string(),
                        existing: def.name.clone(),
                        requested: name.to_string(),
                    }),
                }
            }
            Entry::Vacant(ent) => {
                let def = UnitDef::new(
                    name.to_string(),
                    symbol.to_string(),
                    Conversion::Linear(1.0),
                    ent.key().clone(),
                    self.handle(),
                );
                debug!(
                    "defined base unit {} for {}",
                    def.symbol, def.dimension
                );
                Ok(Unit::from_def(ent.insert(def).clone()))
            }
        }
    }

    /* Unit construction. */

    /// Linear unit: `base = value * multiplier`.
    pub fn unit<D: Dimension>(
        &self,
        name: &str,
        symbol: &str,
        multiplier: f64,
    ) -> Result<Unit<D>, UnitError> {
        let conversion =
            Conversion::linear(multiplier).map_err(|e| e.for_unit(name))?;
        self.unit_with_conversion(name, symbol, conversion)
    }

    pub fn unit_with_functions<D, F, G>(
        &self,
        name: &str,
        symbol: &str,
        to_base: F,
        from_base: G,
    ) -> Unit<D>
    where
        D: Dimension,
        F: Fn(f64) -> f64 + Send + Sync + 'static,
        G: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.make_unit(name, symbol, Conversion::general(to_base, from_base))
    }

    pub fn unit_with_conversion<D: Dimension>(
        &self,
        name: &str,
        symbol: &str,
        conversion: Conversion,
    ) -> Result<Unit<D>, UnitError> {
        if let Conversion::Linear(m) = &conversion {
            Conversion::linear(*m).map_err(|e| e.for_unit(name))?;
        }
        Ok(self.make_unit(name, symbol, conversion))
    }

    fn make_unit<D: Dimension>(
        &self,
        name: &str,
        symbol: &str,
        conversion: Conversion,
    ) -> Unit<D> {
        self.base_unit::<D>();
        Unit::from_def(UnitDef::new(
            name.to_string(),
            symbol.to_string(),
            conversion,
            D::id(),
            self.handle(),
        ))
    }

    /* Derivation. */

    pub fn multiply<A: Dimension, B: Dimension>(
        &self,
        lhs: &Unit<A>,
        rhs: &Unit<B>,
    ) -> Result<Unit<Mult<A, B>>, UnitError> {
        self.derive_unit(Operator::Multiply, lhs.def(), rhs.def())
    }

    pub fn divide<A: Dimension, B: Dimension>(
        &self,
        lhs: &Unit<A>,
        rhs: &Unit<B>,
    ) -> Result<Unit<Per<A, B>>, UnitError> {
        self.derive_unit(Operator::Divide, lhs.def(), rhs.def())
    }

    /// Use `canonical` as the product of `lhs` and `rhs`.
    ///
    /// Register before the pair is first derived: once the cache holds
    /// a unit for the pair, that unit is returned and `canonical` is
    /// ignored.
    pub fn register_canonical_mult<A: Dimension, B: Dimension>(
        &self,
        lhs: &Unit<A>,
        rhs: &Unit<B>,
        canonical: &Unit<Mult<A, B>>,
    ) -> Result<Unit<Mult<A, B>>, UnitError> {
        self.register_canonical_def(
            Operator::Multiply,
            lhs.def(),
            rhs.def(),
            canonical.def(),
        )
        .map(Unit::from_def)
    }

    /// Use `canonical` as the quotient of `lhs` and `rhs`. See
    /// [`register_canonical_mult`](Self::register_canonical_mult).
    pub fn register_canonical_per<A: Dimension, B: Dimension>(
        &self,
        lhs: &Unit<A>,
        rhs: &Unit<B>,
        canonical: &Unit<Per<A, B>>,
    ) -> Result<Unit<Per<A, B>>, UnitError> {
        self.register_canonical_def(
            Operator::Divide,
            lhs.def(),
            rhs.def(),
            canonical.def(),
        )
        .map(Unit::from_def)
    }

    /// The cached derived unit for an operand pair, if any.
    pub fn lookup(
        &self,
        op: Operator,
        lhs: &UntypedUnit,
        rhs: &UntypedUnit,
    ) -> Option<UntypedUnit> {
        let key = DerivationKey {
            op,
            lhs: lhs.def().key(),
            rhs: rhs.def().key(),
        };
        self.shared
            .derived
            .read()
            .get(&key)
            .map(|def| UntypedUnit::from_def(def.clone()))
    }

    pub fn derived_count(&self) -> usize {
        self.shared.derived.read().len()
    }

    /// Derive a unit of the compound dimension `D`, whose base unit
    /// is initialized first.
    fn derive_unit<D: Dimension>(
        &self,
        op: Operator,
        lhs: &Arc<UnitDef>,
        rhs: &Arc<UnitDef>,
    ) -> Result<Unit<D>, UnitError> {
        self.base_unit::<D>();
        self.derive_def(op, lhs, rhs).map(Unit::from_def)
    }

    pub(crate) fn derive_def(
        &self,
        op: Operator,
        lhs: &Arc<UnitDef>,
        rhs: &Arc<UnitDef>,
    ) -> Result<Arc<UnitDef>, UnitError> {
        let key = DerivationKey {
            op,
            lhs: lhs.key(),
            rhs: rhs.key(),
        };
        if let Some(def) = self.shared.derived.read().get(&key) {
            trace!("derived unit cache hit: {}", def.symbol);
            return Ok(def.clone());
        }

        let dimension =
            op.dimension(lhs.dimension.clone(), rhs.dimension.clone());
        let derived = derive(op, lhs, rhs)?;
        let candidate = self.compound_base(
            lhs,
            rhs,
            UnitDef::new(
                derived.name,
                derived.symbol,
                derived.conversion,
                dimension,
                self.handle(),
            ),
        );

        let mut derived = self.shared.derived.write();
        match derived.entry(key) {
            Entry::Occupied(ent) => {
                trace!(
                    "derived unit {} inserted concurrently",
                    ent.get().symbol
                );
                Ok(ent.get().clone())
            }
            Entry::Vacant(ent) => {
                debug!(
                    "derived unit {} ({}) for {}",
                    candidate.symbol, candidate.name, candidate.dimension
                );
                Ok(ent.insert(candidate).clone())
            }
        }
    }

    /// The product or quotient of base units is the base unit of the
    /// compound dimension, whichever of the two is constructed first.
    fn compound_base(
        &self,
        lhs: &UnitDef,
        rhs: &UnitDef,
        candidate: Arc<UnitDef>,
    ) -> Arc<UnitDef> {
        let settle = |base: &Arc<UnitDef>, candidate: Arc<UnitDef>| {
            match base.key() == candidate.key() {
                true => base.clone(),
                false => candidate,
            }
        };
        {
            let base_units = self.shared.base_units.read();
            if let Some(base) = base_units.get(&candidate.dimension) {
                return settle(base, candidate);
            }
            let is_base = |def: &UnitDef| {
                base_units
                    .get(&def.dimension)
                    .map_or(false, |base| base.key() == def.key())
            };
            if !(is_base(lhs) && is_base(rhs)) {
                return candidate;
            }
        }
        let mut base_units = self.shared.base_units.write();
        let base = base_units
            .entry(candidate.dimension.clone())
            .or_insert_with(|| {
                debug!(
                    "initialized base unit {} for {}",
                    candidate.symbol, candidate.dimension
                );
                candidate.clone()
            });
        settle(&*base, candidate)
    }

    fn register_canonical_def(
        &self,
        op: Operator,
        lhs: &Arc<UnitDef>,
        rhs: &Arc<UnitDef>,
        canonical: &Arc<UnitDef>,
    ) -> Result<Arc<UnitDef>, UnitError> {
        match derive(op, lhs, rhs) {
            Ok(derived) => {
                if !derived.conversion.is_equivalent(&canonical.conversion) {
                    warn!(
                        "rejected canonical unit {} for {} {} {}",
                        canonical.symbol, lhs.symbol, op, rhs.symbol
                    );
                    return Err(UnitError::InvalidConversionDefinition {
                        unit: canonical.name.clone(),
                        reason: format!(
                            "not equivalent to {} {} {}",
                            lhs.name, op, rhs.name
                        ),
                    });
                }
            }
            /* The canonical unit supplies the conversion that
            derivation cannot. */
            Err(UnitError::UnsupportedDerivation { .. }) => (),
            Err(e) => return Err(e),
        }

        let key = DerivationKey {
            op,
            lhs: lhs.key(),
            rhs: rhs.key(),
        };
        let mut derived = self.shared.derived.write();
        match derived.entry(key) {
            Entry::Occupied(ent) => {
                let existing = ent.get();
                if !Arc::ptr_eq(existing, canonical) {
                    warn!(
                        "canonical unit {} for {} {} {} ignored: \
                         already resolved to {}",
                        canonical.symbol,
                        lhs.symbol,
                        op,
                        rhs.symbol,
                        existing.symbol
                    );
                }
                Ok(existing.clone())
            }
            Entry::Vacant(ent) => {
                debug!(
                    "registered canonical unit {} for {} {} {}",
                    canonical.symbol, lhs.symbol, op, rhs.symbol
                );
                Ok(ent.insert(canonical.clone()).clone())
            }
        }
    }
}

/// Derive through the registry of the left operand (or else the
/// right one). Units whose registry is gone get an uncached result.
pub(crate) fn derive_shared(
    op: Operator,
    lhs: &Arc<UnitDef>,
    rhs: &Arc<UnitDef>,
) -> Result<Arc<UnitDef>, UnitError> {
    match lhs.registry().or_else(|| rhs.registry()) {
        Some(registry) => registry.derive_def(op, lhs, rhs),
        None => derive_orphan(op, lhs, rhs),
    }
}

/// As [`derive_shared`], for a statically known result dimension.
pub(crate) fn derive_shared_unit<D: Dimension>(
    op: Operator,
    lhs: &Arc<UnitDef>,
    rhs: &Arc<UnitDef>,
) -> Result<Unit<D>, UnitError> {
    match lhs.registry().or_else(|| rhs.registry()) {
        Some(registry) => registry.derive_unit(op, lhs, rhs),
        None => derive_orphan(op, lhs, rhs).map(Unit::from_def),
    }
}

fn derive_orphan(
    op: Operator,
    lhs: &Arc<UnitDef>,
    rhs: &Arc<UnitDef>,
) -> Result<Arc<UnitDef>, UnitError> {
    warn!(
        "deriving {} {} {} without a registry",
        lhs.symbol, op, rhs.symbol
    );
    let derived = derive(op, lhs, rhs)?;
    Ok(UnitDef::new(
        derived.name,
        derived.symbol,
        derived.conversion,
        op.dimension(lhs.dimension.clone(), rhs.dimension.clone()),
        Weak::new(),
    ))
}
