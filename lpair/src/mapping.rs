//! Maps unit-interval samples onto physical ranges.
//!
//! Every mapping returns the mapped value together with `|dvalue/du|`, so
//! that a flat density in `u` turns into the correct density in the
//! physical variable once multiplied by the Jacobian.

use crate::error::ConfigError;

/// Distribution shape of a mapped variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapping {
    Linear,
    /// Flat in `ln|value|`. Both bounds must have the same sign; negative
    /// ranges are used for momentum transfers.
    Logarithmic,
    /// Flat in `ln(x - y - z + sqrt((x - y - z)^2 - 4yz))`, which
    /// concentrates samples near the `x = y + z` branch point of a
    /// triangle-function denominator.
    Breakpoint { y: f64, z: f64 },
}

/// Closed interval of a mapped variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub fn new(min: f64, max: f64) -> Limits {
        Limits { min, max }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapped {
    pub value: f64,
    pub jacobian: f64,
}

/// One sampling dimension, as declared by the engine or by a process.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub label: &'static str,
    pub mapping: Mapping,
    pub limits: Limits,
}

impl Dimension {
    pub fn new(label: &'static str, mapping: Mapping, limits: Limits) -> Dimension {
        Dimension {
            label,
            mapping,
            limits,
        }
    }

    /// Setup-time validation of a fixed-range dimension.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mapping.accepts(&self.limits) {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                label: self.label.to_owned(),
                min: self.limits.min,
                max: self.limits.max,
            })
        }
    }

    #[inline]
    pub fn map(&self, u: f64) -> Mapped {
        self.mapping.map(u, &self.limits)
    }
}

impl Mapping {
    /// Whether `limits` is a non-empty range this shape can map onto.
    pub fn accepts(&self, limits: &Limits) -> bool {
        if !limits.is_valid() {
            return false;
        }
        match *self {
            Mapping::Linear => true,
            Mapping::Logarithmic => limits.min * limits.max > 0.,
            Mapping::Breakpoint { y, z } => {
                let c = -4. * y * z;
                let am = limits.min - y - z;
                let ap = limits.max - y - z;
                am * am + c >= 0. && ap * ap + c >= 0. && am + (am * am + c).sqrt() > 0.
            }
        }
    }

    /// Map `u` in [0, 1) onto `limits`. Callers with per-sample limits check
    /// `accepts` first; the result is not meaningful otherwise.
    #[inline]
    pub fn map(&self, u: f64, limits: &Limits) -> Mapped {
        match *self {
            Mapping::Linear => Mapped {
                value: limits.min + u * limits.width(),
                jacobian: limits.width(),
            },
            Mapping::Logarithmic => {
                let ratio_log = (limits.max / limits.min).ln();
                let value = limits.min * (u * ratio_log).exp();
                Mapped {
                    value,
                    jacobian: (value * ratio_log).abs(),
                }
            }
            Mapping::Breakpoint { y, z } => {
                let c = -4. * y * z;
                let xmb = limits.min - y - z;
                let xpb = limits.max - y - z;
                let alm = (xmb * xmb + c).sqrt();
                let alp = (xpb * xpb + c).sqrt();
                let am = xmb + alm;
                let ap = xpb + alp;
                let yy = ap / am;
                let zz = am * yy.powf(u);
                let value = y + z + (zz - c / zz) / 2.;
                let shifted = value - y - z;
                Mapped {
                    value,
                    jacobian: (shifted * shifted + c).sqrt() * yy.ln(),
                }
            }
        }
    }

    /// Map a sample and check the result, returning `None` for a range this
    /// shape cannot handle or a non-finite outcome.
    #[inline]
    pub fn try_map(&self, u: f64, limits: &Limits) -> Option<Mapped> {
        if !self.accepts(limits) {
            return None;
        }
        let mapped = self.map(u, limits);
        if mapped.value.is_finite() && mapped.jacobian.is_finite() && mapped.jacobian > 0. {
            Some(mapped)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn numerical_jacobian(mapping: Mapping, limits: &Limits, u: f64) -> f64 {
        let h = 1e-6;
        ((mapping.map(u + h, limits).value - mapping.map(u - h, limits).value) / (2. * h)).abs()
    }

    #[test]
    fn linear_and_logarithmic_endpoints() {
        let limits = Limits::new(2., 8.);
        let m = Mapping::Linear.map(0.25, &limits);
        assert_relative_eq!(m.value, 3.5);
        assert_relative_eq!(m.jacobian, 6.);

        let m = Mapping::Logarithmic.map(0.5, &limits);
        assert_relative_eq!(m.value, 4., max_relative = 1e-14);
        assert_relative_eq!(m.jacobian, 4. * 4f64.ln(), max_relative = 1e-14);
        assert_relative_eq!(Mapping::Logarithmic.map(0., &limits).value, 2.);
    }

    #[test]
    fn logarithmic_negative_range() {
        let limits = Limits::new(-100., -1e-4);
        assert!(Mapping::Logarithmic.accepts(&limits));
        for &u in &[0.1, 0.5, 0.9] {
            let m = Mapping::Logarithmic.map(u, &limits);
            assert!(m.value < -1e-4 && m.value > -100.);
            assert_relative_eq!(
                m.jacobian,
                numerical_jacobian(Mapping::Logarithmic, &limits, u),
                max_relative = 1e-6
            );
        }
        assert!(!Mapping::Logarithmic.accepts(&Limits::new(-1., 1.)));
    }

    #[test]
    fn breakpoint_is_flat_in_transformed_variable() {
        let (y, z) = (-0.3, 0.88);
        let mapping = Mapping::Breakpoint { y, z };
        let limits = Limits::new(2., 5000.);
        assert!(mapping.accepts(&limits));

        let transformed = |x: f64| {
            let d = x - y - z;
            (d + (d * d - 4. * y * z).sqrt()).ln()
        };
        let lo = transformed(limits.min);
        let hi = transformed(limits.max);
        for &u in &[0., 0.2, 0.5, 0.7, 0.99] {
            let m = mapping.map(u, &limits);
            assert_relative_eq!(transformed(m.value), lo + u * (hi - lo), max_relative = 1e-10);
            assert_relative_eq!(m.jacobian, numerical_jacobian(mapping, &limits, u), max_relative = 1e-5);
        }
        assert_relative_eq!(mapping.map(0., &limits).value, limits.min, max_relative = 1e-12);
    }

    #[test]
    fn degenerate_ranges_are_rejected() {
        assert!(!Mapping::Linear.accepts(&Limits::new(1., 1.)));
        assert!(!Mapping::Linear.accepts(&Limits::new(2., 1.)));
        assert!(!Mapping::Linear.accepts(&Limits::new(0., f64::NAN)));
        assert!(Mapping::Logarithmic.try_map(0.5, &Limits::new(0., 1.)).is_none());
        let dim = Dimension::new("w4", Mapping::Logarithmic, Limits::new(5., 5.));
        match dim.validate() {
            Err(ConfigError::InvalidRange { label, .. }) => assert_eq!(label, "w4"),
            r => panic!("unexpected validation result: {:?}", r),
        }
    }
}
