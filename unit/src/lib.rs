/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

//! Statically dimensioned units and measurements.
//!
//! A [`Unit<D>`] describes one unit of dimension `D` by its
//! conversion to the dimension's base unit. A [`Measure<D>`] is a
//! magnitude in such a unit. Units and measures of different
//! dimensions are different types; multiplying or dividing measures
//! yields a measure in a derived unit of a compound dimension, which
//! the [`UnitRegistry`] caches so that the same operand pair always
//! produces the same unit.
//!
//! ```
//! use typed_unit::{Distance, Time, UnitRegistry, Velocity};
//!
//! let registry = UnitRegistry::new();
//! let meters = registry.base_unit::<Distance>();
//! let seconds = registry.base_unit::<Time>();
//!
//! let speed = meters.of(10.0).divide(&seconds.of(2.0)).unwrap();
//! assert_eq!(speed.magnitude(), 5.0);
//! assert_eq!(speed.unit().symbol(), "m/s");
//!
//! let kph = registry
//!     .unit::<Velocity<Distance>>(
//!         "kilometer per hour",
//!         "km/h",
//!         1000.0 / 3600.0,
//!     )
//!     .unwrap();
//! assert!((speed.in_units(&kph) - 18.0).abs() < 1e-9);
//! ```

pub mod conversion;
pub mod derivation;
pub mod dimension;
pub mod error;
pub mod measure;
pub mod registry;
pub mod unit;
pub mod untyped;

pub use conversion::{Conversion, ConversionFn};
pub use derivation::Operator;
pub use dimension::{
    Acceleration, Angle, Current, Dimension, DimensionId, Dimensionless,
    Distance, Energy, Mass, Mult, Per, Power, Temperature, Time, Velocity,
    Voltage,
};
pub use error::UnitError;
pub use measure::{Measure, Tolerance};
pub use registry::UnitRegistry;
pub use unit::Unit;
pub use untyped::{UntypedMeasure, UntypedUnit};
