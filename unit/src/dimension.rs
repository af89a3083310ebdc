/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::any::TypeId;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// Dimensions are a unit's "type": conversion and addition are
/// possible only between units of the same dimension. Dimensions
/// exist at the type level only; `id()` gives the runtime tag used
/// where the type is erased.
pub trait Dimension: Send + Sync + 'static {
    fn id() -> DimensionId;

    /// Name of the base unit of this dimension.
    fn base_name() -> String;

    /// Symbol of the base unit of this dimension.
    fn base_symbol() -> String;
}

/// Runtime dimension tag. Named dimensions are identified by their
/// marker type; compound dimensions structurally.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum DimensionId {
    Named {
        type_id: TypeId,
        name: &'static str,
    },
    Mult(Arc<DimensionId>, Arc<DimensionId>),
    Per(Arc<DimensionId>, Arc<DimensionId>),
}

impl DimensionId {
    pub fn named<D: 'static>(name: &'static str) -> Self {
        DimensionId::Named {
            type_id: TypeId::of::<D>(),
            name,
        }
    }

    pub fn mult(lhs: DimensionId, rhs: DimensionId) -> Self {
        DimensionId::Mult(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn per(lhs: DimensionId, rhs: DimensionId) -> Self {
        DimensionId::Per(Arc::new(lhs), Arc::new(rhs))
    }

    pub fn is_compound(&self) -> bool {
        !matches!(self, DimensionId::Named { .. })
    }
}

impl Display for DimensionId {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            DimensionId::Named { name, .. } => write!(f, "{}", name),
            DimensionId::Mult(a, b) => {
                write!(f, "{}\u{22c5}{}", Paren(a), Paren(b))
            }
            DimensionId::Per(a, b) => write!(f, "{}/{}", Paren(a), Paren(b)),
        }
    }
}

struct Paren<'a>(&'a DimensionId);

impl Display for Paren<'_> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self.0.is_compound() {
            true => write!(f, "({})", self.0),
            false => write!(f, "{}", self.0),
        }
    }
}

/// Product of two dimensions.
pub struct Mult<A, B>(PhantomData<fn() -> (A, B)>);

/// Quotient of two dimensions.
pub struct Per<A, B>(PhantomData<fn() -> (A, B)>);

pub type Velocity<D> = Per<D, Time>;
pub type Acceleration<D> = Per<Velocity<D>, Time>;

impl<A: Dimension, B: Dimension> Dimension for Mult<A, B> {
    fn id() -> DimensionId {
        DimensionId::mult(A::id(), B::id())
    }
    fn base_name() -> String {
        mult_name(&A::base_name(), &B::base_name())
    }
    fn base_symbol() -> String {
        mult_symbol(&A::base_symbol(), &B::base_symbol())
    }
}

impl<A: Dimension, B: Dimension> Dimension for Per<A, B> {
    fn id() -> DimensionId {
        DimensionId::per(A::id(), B::id())
    }
    fn base_name() -> String {
        per_name(&A::base_name(), &B::base_name())
    }
    fn base_symbol() -> String {
        per_symbol(&A::base_symbol(), &B::base_symbol())
    }
}

/* Naming of compound units. */

pub(crate) fn mult_name(a: &str, b: &str) -> String {
    format!("{}-{}", a, b)
}

pub(crate) fn mult_symbol(a: &str, b: &str) -> String {
    format!("{}\u{22c5}{}", a, b)
}

pub(crate) fn per_name(a: &str, b: &str) -> String {
    format!("{} per {}", a, b)
}

pub(crate) fn per_symbol(a: &str, b: &str) -> String {
    match b.contains('/') || b.contains('\u{22c5}') {
        true => format!("{}/({})", a, b),
        false => format!("{}/{}", a, b),
    }
}

/// Declare a named dimension marker with its base unit.
#[macro_export]
macro_rules! dimension {
    ($(#[$meta:meta])* $vis:vis $name:ident,
     $dim:literal, $base:literal, $symbol:literal) => {
        $(#[$meta])*
        $vis enum $name {}

        impl $crate::Dimension for $name {
            fn id() -> $crate::DimensionId {
                $crate::DimensionId::named::<$name>($dim)
            }
            fn base_name() -> String {
                String::from($base)
            }
            fn base_symbol() -> String {
                String::from($symbol)
            }
        }
    };
}

dimension!(pub Dimensionless, "dimensionless", "value", "");
dimension!(pub Time, "time", "second", "s");
dimension!(pub Distance, "distance", "meter", "m");
dimension!(pub Angle, "angle", "radian", "rad");
dimension!(pub Mass, "mass", "kilogram", "kg");
dimension!(pub Temperature, "temperature", "kelvin", "K");
dimension!(pub Current, "current", "ampere", "A");
dimension!(pub Voltage, "voltage", "volt", "V");
dimension!(pub Energy, "energy", "joule", "J");
dimension!(pub Power, "power", "watt", "W");
