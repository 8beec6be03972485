//! Physical reactions pluggable into the phase-space engine.

use crate::error::ConfigError;
use crate::event::Event;
use crate::form_factors::StructureFunctions;
use crate::kinematics::Invariants;
use crate::mapping::Dimension;
use crate::particles::{ParticleRegistry, PdgId};
use crate::run_card::Beam;

pub mod dilepton;
pub mod phase_space;

pub use self::dilepton::DileptonProduction;
pub use self::phase_space::PhaseSpaceVolume;

/// The first two declared dimensions of every process drive the two-body
/// decay of the central system.
pub const DECAY_DIMENSIONS: usize = 2;

/// Decay angles of the central system in its rest frame, relative to the
/// direction of the first exchanged mediator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayAngles {
    pub cos_theta: f64,
    pub phi: f64,
    /// Shape Jacobian on top of the mapping Jacobians of the dimensions.
    pub jacobian: f64,
}

/// Run parameters forwarded to process builders.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessParameters {
    pub central: PdgId,
    pub peaked_decay: bool,
    pub structure_functions: StructureFunctions,
}

pub trait Process: Send + Sync {
    fn name(&self) -> &str;

    /// Identities of the two particles of the central system.
    fn central_system(&self) -> [PdgId; 2];

    /// Ordered sampling dimensions. The first `DECAY_DIMENSIONS` are handed
    /// to `decay_angles`.
    fn dimensions(&self) -> Vec<Dimension>;

    /// One-time setup, run before any sample is drawn.
    fn prepare(&mut self, _beams: &[Beam; 2], _registry: &ParticleRegistry) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Decay angles from the mapped values of the declared dimensions.
    fn decay_angles(&self, values: &[f64], invariants: &Invariants) -> Option<DecayAngles>;

    /// Unnormalized squared matrix element. `event` is in the centre-of-mass
    /// frame of the beams.
    fn evaluate(&self, event: &Event, invariants: &Invariants) -> f64;
}

pub type ProcessBuilder = fn(&ProcessParameters) -> Box<dyn Process>;

fn build_dilepton(parameters: &ProcessParameters) -> Box<dyn Process> {
    Box::new(DileptonProduction::new(parameters))
}

fn build_phase_space(parameters: &ProcessParameters) -> Box<dyn Process> {
    Box::new(PhaseSpaceVolume::new(parameters))
}

/// Explicit name-to-builder table, assembled at startup.
pub struct ProcessRegistry {
    builders: Vec<(&'static str, ProcessBuilder)>,
}

impl ProcessRegistry {
    pub fn empty() -> ProcessRegistry {
        ProcessRegistry { builders: vec![] }
    }

    pub fn standard() -> ProcessRegistry {
        let mut registry = ProcessRegistry::empty();
        registry.register("lpair", build_dilepton);
        registry.register("phase_space", build_phase_space);
        registry
    }

    pub fn register(&mut self, name: &'static str, builder: ProcessBuilder) {
        self.builders.retain(|(n, _)| *n != name);
        self.builders.push((name, builder));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.builders.iter().map(|(n, _)| *n).collect()
    }

    pub fn build(&self, name: &str, parameters: &ProcessParameters) -> Result<Box<dyn Process>, ConfigError> {
        self.builders
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, builder)| builder(parameters))
            .ok_or_else(|| ConfigError::UnknownProcess(name.to_owned()))
    }
}
