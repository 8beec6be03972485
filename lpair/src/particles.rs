use crate::error::ConfigError;
use std::collections::HashMap;

pub type PdgId = i64;

pub const ELECTRON: PdgId = 11;
pub const MUON: PdgId = 13;
pub const TAU: PdgId = 15;
pub const PHOTON: PdgId = 22;
pub const PROTON: PdgId = 2212;
pub const NEUTRON: PdgId = 2112;
pub const PI0: PdgId = 111;
/// Placeholder identity of a dissociated beam remnant.
pub const REMNANT: PdgId = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleProperties {
    pub pdg: PdgId,
    pub name: &'static str,
    pub mass: f64,
    /// Electric charge in units of e/3.
    pub charge: i32,
    pub hadronic: bool,
}

lazy_static! {
    static ref DEFAULT_PARTICLES: Vec<ParticleProperties> = vec![
        ParticleProperties { pdg: REMNANT, name: "u", mass: 2.16e-3, charge: 2, hadronic: true },
        ParticleProperties { pdg: ELECTRON, name: "e", mass: 0.51099895e-3, charge: -3, hadronic: false },
        ParticleProperties { pdg: MUON, name: "mu", mass: 0.1056583755, charge: -3, hadronic: false },
        ParticleProperties { pdg: TAU, name: "tau", mass: 1.77686, charge: -3, hadronic: false },
        ParticleProperties { pdg: PHOTON, name: "gamma", mass: 0., charge: 0, hadronic: false },
        ParticleProperties { pdg: PI0, name: "pi0", mass: 0.1349768, charge: 0, hadronic: true },
        ParticleProperties { pdg: PROTON, name: "p", mass: 0.938272088, charge: 3, hadronic: true },
        ParticleProperties { pdg: NEUTRON, name: "n", mass: 0.93956542, charge: 0, hadronic: true },
    ];
}

/// Read-only particle properties for one run. Built once at setup and
/// handed to whoever needs masses; never mutated while sampling.
#[derive(Debug, Clone)]
pub struct ParticleRegistry {
    table: HashMap<PdgId, ParticleProperties>,
}

impl ParticleRegistry {
    pub fn standard() -> ParticleRegistry {
        ParticleRegistry {
            table: DEFAULT_PARTICLES
                .iter()
                .map(|p| (p.pdg, p.clone()))
                .collect(),
        }
    }

    pub fn insert(&mut self, properties: ParticleProperties) {
        self.table.insert(properties.pdg, properties);
    }

    /// Antiparticles share the properties of their particle.
    pub fn get(&self, pdg: PdgId) -> Result<&ParticleProperties, ConfigError> {
        self.table
            .get(&pdg.abs())
            .ok_or(ConfigError::UnknownParticle(pdg))
    }

    pub fn mass(&self, pdg: PdgId) -> Result<f64, ConfigError> {
        Ok(self.get(pdg)?.mass)
    }

    pub fn is_hadronic(&self, pdg: PdgId) -> Result<bool, ConfigError> {
        Ok(self.get(pdg)?.hadronic)
    }
}
