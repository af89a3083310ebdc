/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use super::error::UnitError;
use super::measure::Tolerance;

/// Magnitudes at which two conversions are compared.
const EQUIVALENCE_SAMPLES: [f64; 9] =
    [-1000.0, -10.0, -1.0, -0.5, 0.0, 0.5, 1.0, 10.0, 1000.0];

/// Relative only: units of any scale are told apart.
const EQUIVALENCE_TOLERANCE: Tolerance = Tolerance::new(1e-9, 0.0);

pub type ConversionFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Mapping between a unit's magnitudes and the base unit of its
/// dimension.
///
/// `Linear` units satisfy `base = value * multiplier`. `General`
/// units carry an arbitrary function pair; `from_base` is expected
/// to invert `to_base`, but nothing checks it.
#[derive(Clone)]
pub enum Conversion {
    Linear(f64),
    General {
        to_base: ConversionFn,
        from_base: ConversionFn,
    },
}

impl Conversion {
    /// Linear conversion. The multiplier must be finite and non-zero.
    pub fn linear(multiplier: f64) -> Result<Self, UnitError> {
        check_multiplier(multiplier)?;
        Ok(Conversion::Linear(multiplier))
    }

    pub fn general<F, G>(to_base: F, from_base: G) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
        G: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Conversion::General {
            to_base: Arc::new(to_base),
            from_base: Arc::new(from_base),
        }
    }

    pub fn to_base(&self, value: f64) -> f64 {
        match self {
            Conversion::Linear(m) => value * m,
            Conversion::General { to_base, .. } => to_base(value),
        }
    }

    pub fn from_base(&self, value: f64) -> f64 {
        match self {
            Conversion::Linear(m) => value / m,
            Conversion::General { from_base, .. } => from_base(value),
        }
    }

    /// Convert a magnitude expressed through `self` into one expressed
    /// through `target`, passing through the base unit.
    pub fn convert(&self, value: f64, target: &Conversion) -> f64 {
        match (self, target) {
            (Conversion::Linear(a), Conversion::Linear(b)) => value * a / b,
            _ => target.from_base(self.to_base(value)),
        }
    }

    pub fn multiplier(&self) -> Option<f64> {
        match self {
            Conversion::Linear(m) => Some(*m),
            Conversion::General { .. } => None,
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Conversion::Linear(_))
    }

    /// Whether both conversions map the same magnitudes to the same
    /// base values, within a relative tolerance. Function pairs cannot
    /// be compared structurally, so they are sampled.
    pub fn is_equivalent(&self, other: &Conversion) -> bool {
        let tolerance = EQUIVALENCE_TOLERANCE;
        match (self, other) {
            (Conversion::Linear(a), Conversion::Linear(b)) => {
                tolerance.within(*a, *b)
            }
            (
                Conversion::General { to_base: f, .. },
                Conversion::General { to_base: g, .. },
            ) if Arc::ptr_eq(f, g) => true,
            _ => EQUIVALENCE_SAMPLES.iter().all(|x| {
                tolerance.within(self.to_base(*x), other.to_base(*x))
            }),
        }
    }

    /// A conversion whose base value is this one's multiplied by
    /// `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, UnitError> {
        check_multiplier(factor)?;
        match self {
            Conversion::Linear(m) => Conversion::linear(m * factor),
            Conversion::General { to_base, from_base } => {
                let (to_base, from_base) = (to_base.clone(), from_base.clone());
                Ok(Conversion::general(
                    move |x| to_base(x) * factor,
                    move |x| from_base(x / factor),
                ))
            }
        }
    }
}

impl Debug for Conversion {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Conversion::Linear(m) => write!(f, "Linear({})", m),
            Conversion::General { .. } => write!(f, "General(..)"),
        }
    }
}

fn check_multiplier(multiplier: f64) -> Result<(), UnitError> {
    let reason = if multiplier.is_nan() {
        "multiplier is NaN"
    } else if multiplier.is_infinite() {
        "multiplier is not finite"
    } else if multiplier == 0.0 {
        "multiplier is zero"
    } else {
        return Ok(());
    };
    Err(UnitError::InvalidConversionDefinition {
        unit: String::from("<unnamed>"),
        reason: format!("{} ({})", reason, multiplier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn celsius() -> Conversion {
        Conversion::general(|c| c + 273.15, |k| k - 273.15)
    }

    #[test]
    fn linear_round_trip() {
        let c = Conversion::linear(0.001).unwrap();
        for x in [0.0, 1.0, -42.5, 1e12, 3.3e-9] {
            let back = c.from_base(c.to_base(x));
            assert!((back - x).abs() <= x.abs() * 1e-12);
        }
    }

    #[test]
    fn rejects_degenerate_multipliers() {
        for m in [0.0, -0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                Conversion::linear(m),
                Err(UnitError::InvalidConversionDefinition { .. })
            ));
        }
        assert!(Conversion::linear(-2.0).is_ok());
    }

    #[test]
    fn convert_passes_through_base() {
        let ms = Conversion::linear(0.001).unwrap();
        let s = Conversion::linear(1.0).unwrap();
        assert_eq!(s.convert(2.0, &ms), 2000.0);
        assert_eq!(ms.convert(1500.0, &s), 1.5);

        let c = celsius();
        let k = Conversion::linear(1.0).unwrap();
        assert!((c.convert(100.0, &k) - 373.15).abs() < 1e-9);
        assert!((k.convert(0.0, &c) + 273.15).abs() < 1e-9);
    }

    #[test]
    fn scaled_general() {
        let c = celsius().scaled(2.0).unwrap();
        assert!(!c.is_linear());
        assert!((c.to_base(10.0) - 566.3).abs() < 1e-9);
        assert!((c.from_base(566.3) - 10.0).abs() < 1e-9);
        assert!(celsius().scaled(0.0).is_err());
    }

    #[test]
    fn equivalence_is_sampled() {
        let a = celsius();
        let b = Conversion::general(|c| 273.15 + c, |k| k - 273.15);
        let k = Conversion::linear(1.0).unwrap();
        assert!(a.is_equivalent(&a.clone()));
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&k));
        assert!(Conversion::general(|x| x * 2.0, |x| x / 2.0)
            .is_equivalent(&Conversion::linear(2.0).unwrap()));
    }

    #[test]
    fn equivalence_is_scale_independent() {
        let fs = Conversion::general(|x| x * 1e-15, |x| x / 1e-15);
        let two_fs = Conversion::linear(2e-15).unwrap();
        assert!(!fs.is_equivalent(&two_fs));
        assert!(!two_fs.is_equivalent(&fs));
        assert!(fs.is_equivalent(&Conversion::linear(1e-15).unwrap()));
        assert!(!Conversion::linear(1e-15)
            .unwrap()
            .is_equivalent(&two_fs));
    }

    #[test]
    fn scaled_linear() {
        let c = Conversion::linear(60.0).unwrap().scaled(60.0).unwrap();
        assert_eq!(c.multiplier(), Some(3600.0));
    }
}
