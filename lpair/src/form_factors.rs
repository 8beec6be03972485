//! Photon-emission vertices of the beam-like particles.
//!
//! Each parameterization returns the pair `(u1, u2)` weighting the two
//! independent tensor structures of the peripheral matrix element (roughly
//! magnetic and electric couplings of the emitting system).

use serde::Deserialize;

/// Inelastic structure functions used for dissociated hadrons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureFunctions {
    SuriYennie,
}

impl Default for StructureFunctions {
    fn default() -> StructureFunctions {
        StructureFunctions::SuriYennie
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormFactors {
    /// Structureless fermion.
    PointLike,
    /// Dipole electric and magnetic form factors of an elastic proton.
    ElasticDipole,
    /// Suri-Yennie fit of the dissociative proton structure functions.
    SuriYennie,
}

impl FormFactors {
    pub fn from_structure_functions(sf: StructureFunctions) -> FormFactors {
        match sf {
            StructureFunctions::SuriYennie => FormFactors::SuriYennie,
        }
    }

    /// Vertex weights at momentum transfer `t < 0`, for an incoming particle
    /// of squared mass `w_in` and an outgoing system of squared mass `w_out`.
    pub fn terms(&self, t: f64, w_in: f64, w_out: f64) -> (f64, f64) {
        match *self {
            FormFactors::PointLike => (1., 1.),
            FormFactors::ElasticDipole => {
                let xt = (1. - t / 0.71).powi(2);
                let tau = t / (4. * w_in);
                let u1 = (2.79 / xt).powi(2);
                let u2 = (1. / (xt * xt) - u1 * tau) / (1. - tau);
                (u1, u2)
            }
            FormFactors::SuriYennie => {
                const RHO: f64 = 0.585;
                const C1: f64 = 0.86926;
                const C2: f64 = 2.23422;
                const D1: f64 = 0.12549;
                const CP: f64 = 0.96;
                const BP: f64 = 0.63;

                let dw = w_out - w_in;
                let x = t / (t - w_out);
                let en = dw - t;
                let tau = t / (4. * w_in);
                let rhot = RHO - t;

                let u1 = (-C1 * (RHO / rhot).powi(2) * dw
                    - C2 * w_in * (1. - x).powi(4) / (x * (x * CP - 2. * BP) + 1.))
                    / t;
                let u2 = (-tau * u1 - D1 * dw * t * (RHO / rhot) * (dw / en).powi(2) / (rhot * w_in))
                    / (1. - en * en / (4. * w_in * t));
                (u1, u2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MP2: f64 = 0.938272088 * 0.938272088;

    #[test]
    fn dipole_at_zero_transfer() {
        let (u1, u2) = FormFactors::ElasticDipole.terms(0., MP2, MP2);
        assert_relative_eq!(u1, 2.79 * 2.79);
        assert_relative_eq!(u2, 1.);
    }

    #[test]
    fn dipole_falls_with_virtuality() {
        let (a, _) = FormFactors::ElasticDipole.terms(-0.1, MP2, MP2);
        let (b, _) = FormFactors::ElasticDipole.terms(-1., MP2, MP2);
        assert!(a > b && b > 0.);
    }

    #[test]
    fn suri_yennie_is_positive_in_the_physical_region() {
        for &t in &[-0.01, -0.5, -5., -50.] {
            for &mx in &[1.2, 3., 20.] {
                let (u1, u2) = FormFactors::SuriYennie.terms(t, MP2, mx * mx);
                assert!(u1 > 0. && u1.is_finite(), "u1 = {} at t = {}, mx = {}", u1, t, mx);
                assert!(u2.is_finite());
            }
        }
        assert_eq!(FormFactors::PointLike.terms(-3., 0., 0.), (1., 1.));
    }
}
