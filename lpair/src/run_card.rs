use crate::cuts::{CutMode, Cuts, Window};
use crate::error::ConfigError;
use crate::event::LabFrame;
use crate::form_factors::StructureFunctions;
use crate::integrator::IntegrationSettings;
use crate::kinematics::{lambda, SubEnergyStrategy};
use crate::particles::{ParticleRegistry, PdgId, MUON};
use crate::process::ProcessParameters;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

/// Which of the two beams stay intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KinematicsMode {
    ElasticElastic,
    ElasticInelastic,
    InelasticElastic,
    InelasticInelastic,
}

impl Default for KinematicsMode {
    fn default() -> KinematicsMode {
        KinematicsMode::ElasticElastic
    }
}

impl KinematicsMode {
    pub fn elastic(&self) -> [bool; 2] {
        match *self {
            KinematicsMode::ElasticElastic => [true, true],
            KinematicsMode::ElasticInelastic => [true, false],
            KinematicsMode::InelasticElastic => [false, true],
            KinematicsMode::InelasticInelastic => [false, false],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum S2Strategy {
    Threshold,
    Bounded,
    Truncated,
}

impl Default for S2Strategy {
    fn default() -> S2Strategy {
        S2Strategy::Threshold
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeamsCard {
    pub pdg: [PdgId; 2],
    #[serde(default)]
    pub pz: Option<[f64; 2]>,
    #[serde(default)]
    pub sqrt_s: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseSpaceCard {
    pub s2_strategy: S2Strategy,
    pub breakpoint: bool,
    pub peaked_decay: bool,
}

impl Default for PhaseSpaceCard {
    fn default() -> PhaseSpaceCard {
        PhaseSpaceCard {
            s2_strategy: S2Strategy::Threshold,
            breakpoint: false,
            peaked_decay: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CutsCard {
    pub mode: CutMode,
    pub pt: Window,
    pub energy: Window,
    pub eta: Window,
    /// Polar angle in degrees.
    pub theta: Window,
    pub q2: Window,
    pub central_mass: Window,
    pub remnant_mass: Window,
}

fn default_process() -> String {
    "lpair".to_owned()
}

fn default_central() -> PdgId {
    MUON
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunCard {
    #[serde(default = "default_process")]
    pub process: String,
    pub beams: BeamsCard,
    #[serde(default)]
    pub mode: KinematicsMode,
    #[serde(default = "default_central")]
    pub central: PdgId,
    #[serde(default)]
    pub structure_functions: StructureFunctions,
    #[serde(default)]
    pub phase_space: PhaseSpaceCard,
    #[serde(default)]
    pub cuts: CutsCard,
    #[serde(default)]
    pub integration: IntegrationSettings,
}

/// One incoming beam, resolved against the particle registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beam {
    pub pdg: PdgId,
    pub mass: f64,
    /// Signed longitudinal momentum in the lab frame.
    pub pz: f64,
    pub elastic: bool,
}

impl Beam {
    pub fn energy(&self) -> f64 {
        (self.pz * self.pz + self.mass * self.mass).sqrt()
    }

    pub fn velocity(&self) -> f64 {
        self.pz / self.energy()
    }
}

/// Frozen run-level configuration. Nothing in it changes once sampling
/// starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub process: String,
    pub parameters: ProcessParameters,
    pub beams: [Beam; 2],
    pub mode: KinematicsMode,
    pub cuts: Cuts,
    pub strategy: SubEnergyStrategy,
    pub integration: IntegrationSettings,
}

impl RunConfig {
    pub fn s(&self) -> f64 {
        let energy = self.beams[0].energy() + self.beams[1].energy();
        let pz = self.beams[0].pz + self.beams[1].pz;
        energy * energy - pz * pz
    }

    pub fn sqrt_s(&self) -> f64 {
        self.s().sqrt()
    }

    /// Boost from the centre-of-mass frame of the beams to the lab.
    pub fn lab_frame(&self) -> LabFrame {
        LabFrame::new(
            self.beams[0].energy() + self.beams[1].energy(),
            self.beams[0].pz + self.beams[1].pz,
            self.sqrt_s(),
        )
    }
}

impl RunCard {
    pub fn from_file(filename: &str) -> Result<RunCard, ConfigError> {
        let f = File::open(filename)?;
        let reader = BufReader::new(f);
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml(content: &str) -> Result<RunCard, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve particle properties and validate every range.
    pub fn resolve(&self, registry: &ParticleRegistry) -> Result<RunConfig, ConfigError> {
        let masses = [registry.mass(self.beams.pdg[0])?, registry.mass(self.beams.pdg[1])?];
        registry.get(self.central)?;

        let pz = match (self.beams.pz, self.beams.sqrt_s) {
            (Some(pz), _) => pz,
            (None, Some(sqrt_s)) => {
                let s = sqrt_s * sqrt_s;
                let rl = lambda(s, masses[0] * masses[0], masses[1] * masses[1]);
                if !(sqrt_s > 0. && rl > 0.) {
                    return Err(ConfigError::IncomingKinematics(rl));
                }
                let p = rl.sqrt() / (2. * sqrt_s);
                [p, -p]
            }
            (None, None) => return Err(ConfigError::MissingBeamMomenta),
        };

        let elastic = self.mode.elastic();
        let beams = [
            Beam {
                pdg: self.beams.pdg[0],
                mass: masses[0],
                pz: pz[0],
                elastic: elastic[0],
            },
            Beam {
                pdg: self.beams.pdg[1],
                mass: masses[1],
                pz: pz[1],
                elastic: elastic[1],
            },
        ];
        // beam 1 defines the +z axis of the centre-of-mass frame
        if !pz.iter().all(|p| p.is_finite()) || !(beams[0].velocity() > beams[1].velocity()) {
            return Err(ConfigError::InvalidRange {
                label: "beams.pz".to_owned(),
                min: pz[1],
                max: pz[0],
            });
        }

        let cuts = self.resolve_cuts()?;

        let strategy = match self.phase_space.s2_strategy {
            S2Strategy::Threshold => SubEnergyStrategy::Threshold,
            S2Strategy::Bounded => SubEnergyStrategy::Bounded {
                breakpoint: self.phase_space.breakpoint,
            },
            S2Strategy::Truncated => SubEnergyStrategy::Truncated {
                breakpoint: self.phase_space.breakpoint,
            },
        };

        if self.integration.chunks == 0 {
            return Err(ConfigError::InvalidRange {
                label: "integration.chunks".to_owned(),
                min: 1.,
                max: 0.,
            });
        }

        Ok(RunConfig {
            process: self.process.clone(),
            parameters: ProcessParameters {
                central: self.central,
                peaked_decay: self.phase_space.peaked_decay,
                structure_functions: self.structure_functions,
            },
            beams,
            mode: self.mode,
            cuts,
            strategy,
            integration: self.integration.clone(),
        })
    }

    fn resolve_cuts(&self) -> Result<Cuts, ConfigError> {
        let card = &self.cuts;
        card.pt.validate("cuts.pt", true)?;
        card.energy.validate("cuts.energy", true)?;
        card.eta.validate("cuts.eta", false)?;
        card.theta.validate("cuts.theta", true)?;
        if card.theta.max.map_or(false, |t| t > 180.) {
            return Err(ConfigError::InvalidRange {
                label: "cuts.theta".to_owned(),
                min: card.theta.min.unwrap_or(0.),
                max: card.theta.max.unwrap_or(180.),
            });
        }
        card.q2.validate("cuts.q2", true)?;
        card.central_mass.validate("cuts.central_mass", true)?;
        card.remnant_mass.validate("cuts.remnant_mass", true)?;

        let longitudinal = Cuts::longitudinal_from_eta(&card.eta)
            .intersect(&Cuts::longitudinal_from_theta(&card.theta));
        longitudinal.validate("cuts.eta/theta", false)?;

        Ok(Cuts {
            mode: card.mode,
            pt: card.pt,
            energy: card.energy,
            longitudinal,
            q2: card.q2,
            central_mass: card.central_mass,
            remnant_mass: card.remnant_mass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::PROTON;
    use approx::assert_relative_eq;

    const CARD: &str = "
beams:
  pdg: [2212, 2212]
  sqrt_s: 13000
mode: elastic-inelastic
cuts:
  pt: {min: 15}
  eta: {min: -2.5, max: 2.5}
phase_space:
  s2_strategy: bounded
  breakpoint: true
integration:
  samples: 1000
";

    #[test]
    fn card_resolves_to_head_on_beams() {
        let registry = ParticleRegistry::standard();
        let config = RunCard::from_yaml(CARD).unwrap().resolve(&registry).unwrap();

        assert_eq!(config.process, "lpair");
        assert_eq!(config.parameters.central, MUON);
        assert!(config.parameters.peaked_decay);
        assert_eq!(config.beams[0].pdg, PROTON);
        assert_eq!([config.beams[0].elastic, config.beams[1].elastic], [true, false]);
        assert_relative_eq!(config.sqrt_s(), 13000., max_relative = 1e-12);
        assert_relative_eq!(config.beams[0].pz, -config.beams[1].pz);
        assert_eq!(config.strategy, SubEnergyStrategy::Bounded { breakpoint: true });
        assert_eq!(config.integration.samples, 1000);
        assert_eq!(config.integration.chunks, 64);

        assert_eq!(config.cuts.mode, CutMode::All);
        assert_relative_eq!(config.cuts.longitudinal.max.unwrap(), 2.5f64.sinh());
        assert_eq!(config.lab_frame().beta_gamma, 0.);
    }

    #[test]
    fn asymmetric_beams() {
        let registry = ParticleRegistry::standard();
        let card = RunCard::from_yaml("beams: {pdg: [11, 2212], pz: [27.5, -920]}").unwrap();
        // beam 1 must move along +z faster than beam 2
        assert!(card.resolve(&registry).is_ok());

        let card = RunCard::from_yaml("beams: {pdg: [11, 2212], pz: [-27.5, 920]}").unwrap();
        match card.resolve(&registry) {
            Err(ConfigError::InvalidRange { label, .. }) => assert_eq!(label, "beams.pz"),
            r => panic!("unexpected result {:?}", r.map(|c| c.beams)),
        }
    }

    #[test]
    fn invalid_cards_are_rejected() {
        let registry = ParticleRegistry::standard();
        let resolve = |yaml: &str| RunCard::from_yaml(yaml).and_then(|c| c.resolve(&registry));

        assert!(matches!(
            resolve("beams: {pdg: [2212, 2212]}"),
            Err(ConfigError::MissingBeamMomenta)
        ));
        assert!(matches!(
            resolve("beams: {pdg: [2212, 24], sqrt_s: 100}"),
            Err(ConfigError::UnknownParticle(24))
        ));
        assert!(matches!(
            resolve("beams: {pdg: [2212, 2212], sqrt_s: 1}"),
            Err(ConfigError::IncomingKinematics(_))
        ));
        assert!(matches!(
            resolve("beams: {pdg: [2212, 2212], sqrt_s: 100}\ncuts: {pt: {min: 20, max: 10}}"),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert!(matches!(
            resolve("beams: {pdg: [2212, 2212], sqrt_s: 100}\nmode: quasi-elastic"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(RunCard::from_file("/nonexistent/card.yaml"), Err(ConfigError::Io(_))));
    }
}
