use crate::particles::PdgId;
use thiserror::Error;

/// Errors raised while setting up a run. Nothing in the sampling path
/// returns one of these: a forbidden phase-space point is a zero weight.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown particle with PDG id {0}")]
    UnknownParticle(PdgId),
    #[error("unknown process '{0}'")]
    UnknownProcess(String),
    #[error("invalid range for {label}: [{min}, {max}]")]
    InvalidRange { label: String, min: f64, max: f64 },
    #[error("centre-of-mass energy {sqrt_s} GeV is below the production threshold of {threshold} GeV")]
    BelowThreshold { sqrt_s: f64, threshold: f64 },
    #[error("incoming beams do not form a valid two-body system (lambda = {0})")]
    IncomingKinematics(f64),
    #[error("beam {beam} (PDG id {pdg}) cannot dissociate")]
    InvalidDissociation { beam: usize, pdg: PdgId },
    #[error("process '{process}' declares {found} dimensions but at least {expected} are required")]
    MissingDimensions {
        process: String,
        found: usize,
        expected: usize,
    },
    #[error("beam momenta must be given either as 'pz' or 'sqrt_s'")]
    MissingBeamMomenta,
    #[error("could not read run card: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse run card: {0}")]
    Parse(#[from] serde_yaml::Error),
}
