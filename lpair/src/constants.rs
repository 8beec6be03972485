//! Physical constants and unit conversions, in GeV-based natural units.

/// Conversion factor from GeV^-2 to picobarn.
pub const GEVM2_TO_PB: f64 = 0.389379304e9;

/// Fine-structure constant.
pub const ALPHA_EM: f64 = 1. / 137.036;

/// `2 pi^3 / alpha^4`: the overall normalization of the two-photon phase space.
pub const PHASE_SPACE_NORMALIZATION: f64 = 2.1868465e10;

/// Lightest dissociated hadronic system: a proton and a neutral pion.
pub const MIN_REMNANT_MASS: f64 = 0.938272088 + 0.1349768;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn normalization_matches_alpha() {
        assert_relative_eq!(
            PHASE_SPACE_NORMALIZATION,
            2. * PI.powi(3) / ALPHA_EM.powi(4),
            max_relative = 1e-6
        );
    }
}
