use crate::particles::PdgId;
use serde::Serialize;
use std::fmt;
use std::ops::{Index, IndexMut};
use vector::LorentzVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    IncomingBeam1,
    IncomingBeam2,
    OutgoingBeam1,
    OutgoingBeam2,
    CentralParticle1,
    CentralParticle2,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::IncomingBeam1,
        Role::IncomingBeam2,
        Role::OutgoingBeam1,
        Role::OutgoingBeam2,
        Role::CentralParticle1,
        Role::CentralParticle2,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn is_incoming(self) -> bool {
        self == Role::IncomingBeam1 || self == Role::IncomingBeam2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Incoming,
    Outgoing,
    /// Remnant of a dissociated beam, to be fragmented downstream.
    Dissociated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    pub role: Role,
    pub pdg: PdgId,
    pub status: Status,
    pub mass: f64,
    pub momentum: LorentzVector<f64>,
}

/// All particles of one phase-space point, indexed by role. The identities
/// are fixed at setup; masses of remnants and all momenta are overwritten
/// in place for every sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    particles: [Particle; 6],
}

impl Event {
    /// Build the event template from `(pdg, status, mass)` per role, in the
    /// order of `Role::ALL`.
    pub fn new(content: [(PdgId, Status, f64); 6]) -> Event {
        let mut particles = [Particle {
            role: Role::IncomingBeam1,
            pdg: 0,
            status: Status::Incoming,
            mass: 0.,
            momentum: LorentzVector::default(),
        }; 6];
        for (particle, (&role, &(pdg, status, mass))) in
            particles.iter_mut().zip(Role::ALL.iter().zip(content.iter()))
        {
            particle.role = role;
            particle.pdg = pdg;
            particle.status = status;
            particle.mass = mass;
        }
        Event { particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn momentum(&self, role: Role) -> &LorentzVector<f64> {
        &self[role].momentum
    }

    #[inline]
    pub fn central(&self) -> [LorentzVector<f64>; 2] {
        [
            self[Role::CentralParticle1].momentum,
            self[Role::CentralParticle2].momentum,
        ]
    }

    /// Sum of incoming minus sum of outgoing momenta.
    pub fn momentum_balance(&self) -> LorentzVector<f64> {
        self.particles.iter().fold(LorentzVector::default(), |acc, p| {
            if p.role.is_incoming() {
                acc + p.momentum
            } else {
                acc - p.momentum
            }
        })
    }

    pub fn boost(&mut self, frame: &LabFrame) {
        for p in self.particles.iter_mut() {
            p.momentum = frame.apply(&p.momentum);
        }
    }
}

impl Index<Role> for Event {
    type Output = Particle;

    #[inline]
    fn index(&self, role: Role) -> &Particle {
        &self.particles[role.index()]
    }
}

impl IndexMut<Role> for Event {
    #[inline]
    fn index_mut(&mut self, role: Role) -> &mut Particle {
        &mut self.particles[role.index()]
    }
}

/// Longitudinal boost from the centre-of-mass frame of the beams to the lab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabFrame {
    pub gamma: f64,
    pub beta_gamma: f64,
}

impl LabFrame {
    /// `energy` and `pz` are the lab-frame totals of the two beams.
    pub fn new(energy: f64, pz: f64, sqrt_s: f64) -> LabFrame {
        LabFrame {
            gamma: energy / sqrt_s,
            beta_gamma: pz / sqrt_s,
        }
    }

    #[inline]
    pub fn apply(&self, p: &LorentzVector<f64>) -> LorentzVector<f64> {
        p.boost_z(self.gamma, self.beta_gamma)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kinematic configuration:\n")?;

        writeln!(f, " role              pdg   status           E                        p_x                      p_y                      p_z                       M")?;
        writeln!(f, " ------------------------------------------------------------------------------------------------------------------------------------------------------------")?;

        for p in self.particles.iter() {
            writeln!(
                f,
                " {:<16}{:>6}   {:<12}{:25.16e}{:25.16e}{:25.16e}{:25.16e}{:25.16e}",
                format!("{:?}", p.role),
                p.pdg,
                format!("{:?}", p.status),
                p.momentum.t,
                p.momentum.x,
                p.momentum.y,
                p.momentum.z,
                p.mass
            )?;
        }
        writeln!(f, " ------------------------------------------------------------------------------------------------------------------------------------------------------------")?;

        let balance = self.momentum_balance();
        writeln!(f, " Momentum balance: {:e}", balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{MUON, PROTON};
    use approx::assert_relative_eq;

    fn template() -> Event {
        let mp = 0.938272088;
        let mmu = 0.1056583755;
        Event::new([
            (PROTON, Status::Incoming, mp),
            (PROTON, Status::Incoming, mp),
            (PROTON, Status::Outgoing, mp),
            (PROTON, Status::Outgoing, mp),
            (MUON, Status::Outgoing, mmu),
            (-MUON, Status::Outgoing, mmu),
        ])
    }

    #[test]
    fn roles_index_their_particles() {
        let mut event = template();
        for &role in Role::ALL.iter() {
            assert_eq!(event[role].role, role);
        }
        event[Role::CentralParticle2].momentum = LorentzVector::from_args(1., 0., 0., 0.5);
        assert_eq!(event.central()[1].z, 0.5);
        assert_eq!(event[Role::CentralParticle2].pdg, -MUON);
    }

    #[test]
    fn lab_boost_of_symmetric_beams_is_identity() {
        let frame = LabFrame::new(100., 0., 100.);
        let p = LorentzVector::from_args(3., 1., 2., -1.);
        assert_eq!(frame.apply(&p), p);
    }

    #[test]
    fn asymmetric_beams_are_boosted_back() {
        let (e1, e2): (f64, f64) = (50., 8.);
        let sqrt_s = 2. * (e1 * e2).sqrt();
        let frame = LabFrame::new(e1 + e2, e1 - e2, sqrt_s);

        let half = sqrt_s / 2.;
        let p1 = frame.apply(&LorentzVector::from_args(half, 0., 0., half));
        assert_relative_eq!(p1.t, e1, max_relative = 1e-12);
        assert_relative_eq!(p1.z, e1, max_relative = 1e-12);
        let p2 = frame.apply(&LorentzVector::from_args(half, 0., 0., -half));
        assert_relative_eq!(p2.t, e2, max_relative = 1e-12);
    }

    #[test]
    fn display_lists_every_role() {
        let text = format!("{}", template());
        for &role in Role::ALL.iter() {
            assert!(text.contains(&format!("{:?}", role)));
        }
    }
}
