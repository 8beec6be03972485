use super::{DecayAngles, Process, ProcessParameters};
use crate::event::Event;
use crate::kinematics::Invariants;
use crate::mapping::{Dimension, Limits, Mapping};
use crate::particles::PdgId;
use std::f64::consts::PI;

/// Unit matrix element: integrates to the phase-space volume of the
/// requested final state.
#[derive(Debug, Clone)]
pub struct PhaseSpaceVolume {
    central: PdgId,
}

impl PhaseSpaceVolume {
    pub fn new(parameters: &ProcessParameters) -> PhaseSpaceVolume {
        PhaseSpaceVolume {
            central: parameters.central,
        }
    }
}

impl Process for PhaseSpaceVolume {
    fn name(&self) -> &str {
        "phase_space"
    }

    fn central_system(&self) -> [PdgId; 2] {
        [self.central, -self.central]
    }

    fn dimensions(&self) -> Vec<Dimension> {
        vec![
            Dimension::new("cos_theta6", Mapping::Linear, Limits::new(-1., 1.)),
            Dimension::new("phi6", Mapping::Linear, Limits::new(0., 2. * PI)),
        ]
    }

    fn decay_angles(&self, values: &[f64], _inv: &Invariants) -> Option<DecayAngles> {
        Some(DecayAngles {
            cos_theta: values[0],
            phi: values[1],
            jacobian: 1.,
        })
    }

    fn evaluate(&self, _event: &Event, _inv: &Invariants) -> f64 {
        1.
    }
}
