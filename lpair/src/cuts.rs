use crate::error::ConfigError;
use crate::mapping::Limits;
use serde::Deserialize;
use vector::LorentzVector;

/// Optional lower and upper bound on one observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Window {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Window {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Window {
        Window { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn intersect(&self, other: &Window) -> Window {
        let pick = |a: Option<f64>, b: Option<f64>, f: fn(f64, f64) -> f64| match (a, b) {
            (Some(a), Some(b)) => Some(f(a, b)),
            (a, None) => a,
            (None, b) => b,
        };
        Window {
            min: pick(self.min, other.min, f64::max),
            max: pick(self.max, other.max, f64::min),
        }
    }

    /// Window on the square of a non-negative observable.
    pub fn squared(&self) -> Window {
        Window {
            min: self.min.map(|m| m * m),
            max: self.max.map(|m| m * m),
        }
    }

    /// Restrict a sampling range to this window.
    pub fn clamp(&self, limits: Limits) -> Limits {
        Limits {
            min: self.min.map_or(limits.min, |m| limits.min.max(m)),
            max: self.max.map_or(limits.max, |m| limits.max.min(m)),
        }
    }

    /// Setup check: bounds must be finite and ordered, and non-negative when
    /// the observable is.
    pub fn validate(&self, label: &str, non_negative: bool) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidRange {
            label: label.to_owned(),
            min: self.min.unwrap_or(f64::NEG_INFINITY),
            max: self.max.unwrap_or(f64::INFINITY),
        };
        for bound in self.min.iter().chain(self.max.iter()) {
            if !bound.is_finite() || (non_negative && *bound < 0.) {
                return Err(invalid());
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid());
            }
        }
        Ok(())
    }
}

/// How the per-particle acceptance of the central system is combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    None,
    /// Fixed barrel-plus-endcap acceptance.
    Detector,
    /// Every central particle must pass.
    All,
    /// At least one central particle must pass.
    Any,
}

impl Default for CutMode {
    fn default() -> CutMode {
        CutMode::All
    }
}

/// Run-scoped acceptance. Read-only while sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cuts {
    pub mode: CutMode,
    pub pt: Window,
    pub energy: Window,
    /// Window on `pz / pt`, which covers both pseudorapidity and polar-angle
    /// cuts: `pz / pt = sinh(eta) = cot(theta)`.
    pub longitudinal: Window,
    /// Window on `-t` for both momentum transfers.
    pub q2: Window,
    pub central_mass: Window,
    pub remnant_mass: Window,
}

impl Cuts {
    pub fn longitudinal_from_eta(eta: &Window) -> Window {
        Window {
            min: eta.min.map(f64::sinh),
            max: eta.max.map(f64::sinh),
        }
    }

    /// Polar angles in degrees. Small angles are large `cot(theta)`.
    pub fn longitudinal_from_theta(theta: &Window) -> Window {
        let cot = |deg: f64| 1. / deg.to_radians().tan();
        Window {
            min: theta.max.filter(|&t| t < 180.).map(cot),
            max: theta.min.filter(|&t| t > 0.).map(cot),
        }
    }

    #[inline]
    pub fn accepts_momentum_transfers(&self, t1: f64, t2: f64) -> bool {
        self.q2.contains(-t1) && self.q2.contains(-t2)
    }

    /// Acceptance of the central system, given lab-frame momenta.
    pub fn accepts_central(&self, central: &[LorentzVector<f64>]) -> bool {
        match self.mode {
            CutMode::None => true,
            CutMode::Detector => central.iter().all(detector_acceptance),
            CutMode::All => central.iter().all(|p| self.accepts_particle(p)),
            CutMode::Any => central.iter().any(|p| self.accepts_particle(p)),
        }
    }

    #[inline]
    fn accepts_particle(&self, p: &LorentzVector<f64>) -> bool {
        let pt = p.pt();
        self.pt.contains(pt) && self.energy.contains(p.t) && self.longitudinal.contains(p.z / pt)
    }
}

fn detector_acceptance(p: &LorentzVector<f64>) -> bool {
    let cos_theta = p.cos_theta().abs();
    (cos_theta <= 0.75 && p.pt() >= 1.) || (cos_theta > 0.75 && cos_theta <= 0.95 && p.z.abs() > 1.)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn muon(pt: f64, eta: f64) -> LorentzVector<f64> {
        let pz = pt * eta.sinh();
        let m: f64 = 0.1056583755;
        LorentzVector::from_args((pt * pt + pz * pz + m * m).sqrt(), pt, 0., pz)
    }

    fn standard_cuts(mode: CutMode) -> Cuts {
        Cuts {
            mode,
            pt: Window::new(Some(15.), None),
            longitudinal: Cuts::longitudinal_from_eta(&Window::new(Some(-2.5), Some(2.5))),
            ..Cuts::default()
        }
    }

    #[test]
    fn window_operations() {
        let w = Window::new(Some(1.), Some(4.));
        assert!(w.contains(1.) && w.contains(4.) && !w.contains(4.5));
        assert!(!w.contains(f64::NAN));
        assert!(Window::default().contains(f64::NAN));
        assert_eq!(w.squared(), Window::new(Some(1.), Some(16.)));
        assert_eq!(
            w.intersect(&Window::new(Some(2.), None)),
            Window::new(Some(2.), Some(4.))
        );
        assert_eq!(w.clamp(Limits::new(0., 3.)), Limits::new(1., 3.));
        assert!(Window::new(Some(3.), Some(1.)).validate("pt", true).is_err());
        assert!(Window::new(Some(-1.), None).validate("pt", true).is_err());
        assert!(Window::new(Some(-1.), None).validate("eta", false).is_ok());
    }

    #[test]
    fn theta_and_eta_windows_agree() {
        let eta = 1.3f64;
        let theta = 2. * (-eta).exp().atan();
        let from_theta = Cuts::longitudinal_from_theta(&Window::new(
            Some(theta.to_degrees()),
            Some(180. - theta.to_degrees()),
        ));
        let from_eta = Cuts::longitudinal_from_eta(&Window::new(Some(-eta), Some(eta)));
        assert_relative_eq!(from_theta.min.unwrap(), from_eta.min.unwrap(), max_relative = 1e-12);
        assert_relative_eq!(from_theta.max.unwrap(), from_eta.max.unwrap(), max_relative = 1e-12);
        assert!(Cuts::longitudinal_from_theta(&Window::new(Some(0.), Some(180.))).is_open());
    }

    #[test]
    fn combination_modes() {
        let central = [muon(20., 0.5), muon(10., 0.5)];
        assert!(!standard_cuts(CutMode::All).accepts_central(&central));
        assert!(standard_cuts(CutMode::Any).accepts_central(&central));
        assert!(standard_cuts(CutMode::None).accepts_central(&central));

        let forward = [muon(20., 3.), muon(20., -0.1)];
        assert!(!standard_cuts(CutMode::All).accepts_central(&forward));
    }

    #[test]
    fn detector_acceptance_regions() {
        let cuts = Cuts {
            mode: CutMode::Detector,
            ..Cuts::default()
        };
        assert!(cuts.accepts_central(&[muon(2., 0.), muon(1.5, 0.5)]));
        // central but too soft
        assert!(!cuts.accepts_central(&[muon(0.5, 0.), muon(2., 0.)]));
        // forward: |cos theta| ~ 0.9, pz well above 1 GeV
        assert!(cuts.accepts_central(&[muon(2., 1.5), muon(2., -1.5)]));
        // beyond the acceptance
        assert!(!cuts.accepts_central(&[muon(2., 3.), muon(2., 0.)]));
    }

    #[test]
    fn momentum_transfer_window() {
        let cuts = Cuts {
            q2: Window::new(Some(0.5), Some(10.)),
            ..Cuts::default()
        };
        assert!(cuts.accepts_momentum_transfers(-1., -9.));
        assert!(!cuts.accepts_momentum_transfers(-0.1, -9.));
        assert!(!cuts.accepts_momentum_transfers(-1., -11.));
    }
}
