//! Solution of the invariants of `1 + 2 -> 3 + 4 + 5`, where 3 and 5 are
//! the outgoing beam-like systems and 4 is the central system, following
//! the Vermaseren parameterization.
//!
//! Conventions: `w_i` is the squared mass of particle `i`, `t1 = (p1 - p3)^2`
//! and `t2 = (p2 - p5)^2` are the momentum transfers, `s1 = (p3 + p4)^2` and
//! `s2 = (p4 + p5)^2` the sub-energies. The `dd*` quantities are the Gram
//! determinants bounding the transverse momenta of the outgoing systems.

use crate::cuts::Window;
use crate::error::ConfigError;
use crate::mapping::{Limits, Mapping};
use std::f64::consts::PI;

/// Källén triangle function.
#[inline]
pub fn lambda(a: f64, b: f64, c: f64) -> f64 {
    (a - b - c) * (a - b - c) - 4. * b * c
}

/// Where the `s2` sub-energy is sampled in the chain of invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubEnergyStrategy {
    /// Before `t1`, between the central-plus-remnant threshold and its
    /// kinematic maximum.
    Threshold,
    /// After `t2`, between the exact boundary roots.
    Bounded { breakpoint: bool },
    /// Before `t2`, between the larger of the threshold and the lower root
    /// and the upper root.
    Truncated { breakpoint: bool },
}

impl Default for SubEnergyStrategy {
    fn default() -> SubEnergyStrategy {
        SubEnergyStrategy::Threshold
    }
}

/// Squared masses of the outgoing systems for one phase-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutgoingMasses {
    pub w3: f64,
    pub w4: f64,
    pub w5: f64,
}

/// Invariants of one phase-space point. Recomputed for every sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Invariants {
    pub s: f64,
    pub w1: f64,
    pub w2: f64,
    pub w3: f64,
    pub w4: f64,
    pub w5: f64,
    /// `sqrt(lambda(s, w1, w2))`
    pub sl1: f64,
    pub t1: f64,
    pub t2: f64,
    pub s1: f64,
    pub s2: f64,
    pub sa1: f64,
    pub sa2: f64,
    pub g4: f64,
    pub dd1: f64,
    pub dd2: f64,
    pub dd3: f64,
    pub dd4: f64,
    pub dd5: f64,
    pub delta: f64,
    pub gram: f64,
    pub p12: f64,
    pub p13: f64,
    pub p14: f64,
    pub p15: f64,
    pub p23: f64,
    pub p24: f64,
    pub p25: f64,
    pub p34: f64,
    pub p35: f64,
    pub p45: f64,
    pub p1k2: f64,
    pub p2k1: f64,
    /// Product of the mapping Jacobians of `s2`, `t1`, `t2`, the central
    /// polar angle and the kinematic normalization.
    pub jacobian: f64,
}

/// Run-level part of the solver: the incoming system and the sampling
/// choices. Immutable once built.
#[derive(Debug, Clone)]
pub struct KinematicsSolver {
    s: f64,
    sqrt_s: f64,
    w1: f64,
    w2: f64,
    sl1: f64,
    q2: Window,
    strategy: SubEnergyStrategy,
}

/// Number of unit samples consumed per point.
pub const SOLVER_DIMENSIONS: usize = 4;

impl KinematicsSolver {
    pub fn new(
        s: f64,
        m1: f64,
        m2: f64,
        q2: Window,
        strategy: SubEnergyStrategy,
    ) -> Result<KinematicsSolver, ConfigError> {
        let (w1, w2) = (m1 * m1, m2 * m2);
        let rl1 = lambda(s, w1, w2);
        if !(rl1 > 0.) {
            return Err(ConfigError::IncomingKinematics(rl1));
        }

        Ok(KinematicsSolver {
            s,
            sqrt_s: s.sqrt(),
            w1,
            w2,
            sl1: rl1.sqrt(),
            q2,
            strategy,
        })
    }

    #[inline]
    pub fn sqrt_s(&self) -> f64 {
        self.sqrt_s
    }

    /// Map `s2` either logarithmically or with the breakpoint shape around
    /// the `(t1, w2)` branch point.
    #[inline]
    fn map_s2(&self, breakpoint: bool, t1: f64, u: f64, limits: Limits) -> Option<(f64, f64)> {
        let mapping = if breakpoint {
            Mapping::Breakpoint { y: t1, z: self.w2 }
        } else {
            Mapping::Logarithmic
        };
        let m = mapping.try_map(u, &limits)?;
        Some((m.value, m.jacobian))
    }

    /// Solve the invariants for the unit samples `u = [t1, t2, s2, theta4]`.
    /// Returns `None` whenever the point lies outside the physical region.
    pub fn solve(&self, masses: &OutgoingMasses, u: &[f64; SOLVER_DIMENSIONS]) -> Option<Invariants> {
        let (s, w1, w2, sl1) = (self.s, self.w1, self.w2, self.sl1);
        let OutgoingMasses { w3, w4, w5 } = *masses;

        let w31 = w3 - w1;
        let w52 = w5 - w2;
        let w12 = w1 - w2;
        let d6 = w4 - w5;
        let ss = s + w12;

        let sig = w4.sqrt() + w5.sqrt();
        let mut sig1 = sig * sig;
        let mut sig2 = sig1;

        let mut s2 = 0.;
        let mut ds2 = 0.;

        if self.strategy == SubEnergyStrategy::Threshold {
            let smax = s + w3 - 2. * w3.sqrt() * self.sqrt_s;
            let m = require_some!(
                Mapping::Logarithmic.try_map(u[2], &Limits::new(sig1, smax)),
                "no room for s2 in [{}, {}]", sig1, smax
            );
            s2 = m.value;
            ds2 = m.jacobian;
            sig1 = s2;
        }

        // t1 range
        let sp = s + w3 - sig1;
        let d3 = sig1 - w2;
        let rl2 = sp * sp - 4. * s * w3;
        require!(rl2 > 0., "lambda(s, w3, s2) = {} <= 0", rl2);
        let sl2 = rl2.sqrt();

        // t1min is the largest momentum transfer in magnitude
        let mut t1min = w1 + w3 - (ss * sp + sl1 * sl2) / (2. * s);
        let mut t1max = (w31 * d3 + (d3 - w31) * (d3 * w1 - w31 * w2) / s) / t1min;

        if let Some(q2min) = self.q2.min {
            t1max = t1max.min(-q2min);
        }
        if let Some(q2max) = self.q2.max {
            t1min = t1min.max(-q2max);
        }

        let m = require_some!(
            Mapping::Logarithmic.try_map(u[0], &Limits::new(t1min, t1max)),
            "empty t1 range [{}, {}]", t1min, t1max
        );
        let (t1, dt1) = (m.value, m.jacobian);

        let d4 = w4 - t1;
        let d8 = t1 - w2;
        let t13 = t1 - w1 - w3;

        let sa1 = -(t1 - w31) * (t1 - w31) / 4. + w1 * t1;
        require!(sa1 < 0., "sa1 = {} >= 0", sa1);
        let sl3 = (-sa1).sqrt();

        // upper s2 boundary and its companion root
        let (s2max, splus) = if w1 != 0. {
            let sb = (s * (t1 - w31) + w12 * t13) / (2. * w1) + w3;
            let sd = sl1 * sl3 / w1;
            let se = (s * (t1 * (s + t13 - w2) - w2 * w31) + w3 * (w12 * d8 + w2 * w3)) / w1;
            if ((sb - sd) / sd).abs() >= 1. {
                let splus = sb - sd;
                (se / splus, splus)
            } else {
                let s2max = sb + sd;
                (s2max, se / s2max)
            }
        } else {
            let s2max = (s * (t1 * (s + d8 - w3) - w2 * w3) + w2 * w3 * (w2 + w3 - t1)) / (ss * t13);
            (s2max, sig2)
        };

        let mut s2x = s2max;
        match self.strategy {
            SubEnergyStrategy::Threshold => s2x = s2,
            SubEnergyStrategy::Truncated { breakpoint } => {
                if splus > sig2 {
                    sig2 = splus;
                }
                let (value, jacobian) = require_some!(
                    self.map_s2(breakpoint, t1, u[2], Limits::new(sig2, s2max)),
                    "empty s2 range [{}, {}]", sig2, s2max
                );
                s2 = value;
                ds2 = jacobian;
                s2x = s2;
            }
            SubEnergyStrategy::Bounded { .. } => {}
        }

        // t2 range
        let r1 = s2x - d8;
        let r2 = s2x - d6;
        let rl4 = (r1 * r1 - 4. * w2 * s2x) * (r2 * r2 - 4. * w5 * s2x);
        require!(rl4 > 0., "rl4 = {} <= 0", rl4);
        let sl4 = rl4.sqrt();

        let t2min = w2 + w5 - (r1 * r2 + sl4) / (2. * s2x);
        let t2max = (w52 * d4 + (d4 - w52) * (d4 * w2 - w52 * t1) / s2x) / t2min;

        let m = require_some!(
            Mapping::Logarithmic.try_map(u[1], &Limits::new(t2min, t2max)),
            "empty t2 range [{}, {}]", t2min, t2max
        );
        let (t2, dt2) = (m.value, m.jacobian);

        let tau = t1 - t2;
        let r3 = d4 - t2;
        let r4 = w52 - t2;

        let b = r3 * r4 - 2. * (t1 + w2) * t2;
        let c = t2 * d6 * d8 + (d6 - d8) * (d6 * w2 - d8 * w5);
        let t25 = t2 - w2 - w5;

        let sa2 = -r4 * r4 / 4. + w2 * t2;
        require!(sa2 < 0., "sa2 = {} >= 0", sa2);
        let sl6 = 2. * (-sa2).sqrt();

        let g4 = -r3 * r3 / 4. + t1 * t2;
        require!(g4 < 0., "g4 = {} >= 0", g4);
        let sl7 = 2. * (-g4).sqrt();
        let sl5 = sl6 * sl7;

        // lower s2 boundary and its companion root
        let (s2p, s2min) = if ((sl5 - b) / sl5).abs() >= 1. {
            let s2p = (sl5 - b) / (2. * t2);
            (s2p, c / (t2 * s2p))
        } else {
            let s2min = (-sl5 - b) / (2. * t2);
            (c / (t2 * s2min), s2min)
        };

        if let SubEnergyStrategy::Bounded { breakpoint } = self.strategy {
            let (value, jacobian) = require_some!(
                self.map_s2(breakpoint, t1, u[2], Limits::new(s2min, s2max)),
                "empty s2 range [{}, {}]", s2min, s2max
            );
            s2 = value;
            ds2 = jacobian;
        }

        let ap = -(s2 + d8) * (s2 + d8) / 4. + s2 * t1;
        require!(ap < 0., "ap = {} >= 0", ap);

        let dd1 = if w1 != 0. {
            -w1 * (s2 - s2max) * (s2 - splus) / 4.
        } else {
            ss * t13 * (s2 - s2max) / 4.
        };
        let dd2 = -t2 * (s2 - s2p) * (s2 - s2min) / 4.;

        // central polar angle, flat in theta
        let theta4 = Mapping::Linear.map(u[3], &Limits::new(0., PI));
        let yy4 = theta4.value.cos();
        let dd = dd1 * dd2;
        require!(dd > 0., "dd1 * dd2 = {} <= 0", dd);

        let p12 = (s - w1 - w2) / 2.;
        let st = s2 - t1 - w2;
        let delb = (2. * w2 * r3 + r4 * st) * (4. * p12 * t1 - (t1 - w31) * st) / (16. * ap);
        let delta = delb - yy4 * st * dd.sqrt() / (2. * ap);
        let s1 = t2 + w1 + (2. * p12 * r3 - 4. * delta) / st;

        let jacobian = ds2 * dt1 * dt2 * theta4.jacobian / (8. * sl1 * (-ap).sqrt());
        require!(jacobian.is_finite() && jacobian > 0., "jacobian = {}", jacobian);

        let gram = (1. - yy4 * yy4) * dd / ap;
        require!(gram <= 0., "gram = {} > 0", gram);

        let p13 = -t13 / 2.;
        let p14 = (tau + s1 - w3) / 2.;
        let p15 = (s + t2 - s1 - w2) / 2.;
        let p23 = (s + t1 - s2 - w1) / 2.;
        let p24 = (s2 - tau - w5) / 2.;
        let p25 = -t25 / 2.;
        let p34 = (s1 - w3 - w4) / 2.;
        let p35 = (s + w4 - s1 - s2) / 2.;
        let p45 = (s2 - w4 - w5) / 2.;
        let p1k2 = (s1 - t2 - w1) / 2.;
        let p2k1 = st / 2.;

        let dd3 = if w2 != 0. {
            let sbb = (s * (t2 - w52) - w12 * t25) / (2. * w2) + w5;
            let sdd = sl1 * sl6 / (2. * w2);
            let see = (s * (t2 * (s + t25 - w1) - w1 * w52) + w5 * (w1 * w5 - w12 * (t2 - w1))) / w2;
            let (s1p, s1m) = if sbb / sdd >= 0. {
                let s1p = sbb + sdd;
                (s1p, see / s1p)
            } else {
                let s1m = sbb - sdd;
                (see / s1m, s1m)
            };
            -w2 * (s1p - s1) * (s1m - s1) / 4.
        } else {
            let s1p = (s * (t2 * (s - w5 + t2 - w1) - w1 * w5) + w1 * w5 * (w1 + w5 - t2)) / (t25 * (s - w12));
            -t25 * (s - w12) * (s1p - s1) / 4.
        };

        let ssb = t2 + w1 - r3 * (w31 - t1) / (2. * t1);
        let ssd = sl3 * sl7 / t1;
        let sse = (t2 - w1) * (w4 - w3) + (t2 - w4 + w31) * ((t2 - w1) * w3 - (w4 - w3) * w1) / t1;
        let (s1pp, s1pm) = if ssb / ssd >= 0. {
            let s1pp = ssb + ssd;
            (s1pp, sse / s1pp)
        } else {
            let s1pm = ssb - ssd;
            (sse / s1pm, s1pm)
        };
        let dd4 = -t1 * (s1 - s1pp) * (s1 - s1pm) / 4.;

        let dd5 = dd1
            + dd3
            + ((p12 * (t1 - w31) / 2. - w1 * p2k1) * (p2k1 * (t2 - w52) - w2 * r3)
                - delta * (2. * p12 * p2k1 - w2 * (t1 - w31)))
                / p2k1;

        require!(
            dd2.is_finite() && dd3.is_finite() && dd4.is_finite() && dd5.is_finite(),
            "non-finite Gram determinants: {} {} {} {}",
            dd2,
            dd3,
            dd4,
            dd5
        );

        Some(Invariants {
            s,
            w1,
            w2,
            w3,
            w4,
            w5,
            sl1,
            t1,
            t2,
            s1,
            s2,
            sa1,
            sa2,
            g4,
            dd1,
            dd2,
            dd3,
            dd4,
            dd5,
            delta,
            gram,
            p12,
            p13,
            p14,
            p15,
            p23,
            p24,
            p25,
            p34,
            p35,
            p45,
            p1k2,
            p2k1,
            jacobian,
        })
    }
}
