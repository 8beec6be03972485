//! Two-photon production of a lepton pair, `γγ → l⁺l⁻`, with the full
//! off-shell peripheral matrix element.

use super::{DecayAngles, Process, ProcessParameters};
use crate::error::ConfigError;
use crate::event::{Event, Role};
use crate::form_factors::{FormFactors, StructureFunctions};
use crate::kinematics::Invariants;
use crate::mapping::{Dimension, Limits, Mapping};
use crate::particles::{ParticleRegistry, PdgId};
use crate::run_card::Beam;
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct DileptonProduction {
    lepton: PdgId,
    ml2: f64,
    peaked: bool,
    structure_functions: StructureFunctions,
    form_factors: [FormFactors; 2],
}

impl DileptonProduction {
    pub fn new(parameters: &ProcessParameters) -> DileptonProduction {
        DileptonProduction {
            lepton: parameters.central,
            ml2: 0.,
            peaked: parameters.peaked_decay,
            structure_functions: parameters.structure_functions,
            form_factors: [FormFactors::PointLike; 2],
        }
    }

    /// Sample `cos(theta*)` close to the poles of the lepton propagators.
    /// The density in `x` follows `1 / (a^2 - b^2 cos^2)`.
    fn peaked_cosine(&self, x: f64, inv: &Invariants) -> Option<(f64, f64)> {
        let w4 = inv.w4;
        let a = 0.5 * (w4 - inv.t1 - inv.t2);
        let b2 = ((w4 - inv.t1 - inv.t2).powi(2) - 4. * inv.t1 * inv.t2) * (1. - 4. * self.ml2 / w4);
        require!(b2 > 0., "no room for the lepton pair: b^2 = {}", b2);
        let b = 0.5 * b2.sqrt();
        require!(a > b, "propagator poles inside the physical region: a = {}, b = {}", a, b);

        let ymap = (a + b) / (a - b);
        let beta = ymap.powf(2. * x - 1.);
        let xx6 = (0.5 * (1. + a / b * (beta - 1.) / (beta + 1.))).max(0.).min(1.);
        let cos_theta = 1. - 2. * xx6;
        let jacobian = (a * a - b * b * cos_theta * cos_theta) / (a * b) * ymap.ln();
        Some((cos_theta, jacobian))
    }

    /// Peripheral `γ*γ* → l⁺l⁻` matrix element, from the centre-of-mass
    /// momenta and the invariants they were built from.
    fn peripheral(&self, event: &Event, inv: &Invariants) -> f64 {
        let ml2 = self.ml2;
        let (t1, t2, w4) = (inv.t1, inv.t2, inv.w4);
        let mc4 = w4.sqrt();

        let p1 = event.momentum(Role::IncomingBeam1);
        let p2 = event.momentum(Role::IncomingBeam2);
        let p3 = event.momentum(Role::OutgoingBeam1);
        let p5 = event.momentum(Role::OutgoingBeam2);
        let [p6, p7] = event.central();

        let (ep1, ep2, p) = (p1.t, p2.t, p1.z);
        let de3 = ep1 - p3.t;
        let de5 = ep2 - p5.t;

        let q1 = *p1 - *p3;
        let qve = p6 - p7;

        // lepton angle with respect to the first photon, in the pair frame
        let eg = (w4 + t1 - t2) / (2. * mc4);
        let pg = (eg * eg - t1).sqrt();
        let pcm6 = (0.25 * w4 - ml2).sqrt();
        let q1dq = q1.dot(&qve);
        let ct6 = -q1dq / (2. * pg * pcm6);
        let st6_2 = 1. - ct6 * ct6;

        let q1dq2 = 0.5 * (w4 - t1 - t2);
        let bb = t1 * t2 + (w4 * st6_2 + 4. * ml2 * ct6 * ct6) * pg * pg;

        let pt3 = p3.pt();
        let pt5 = p5.pt();
        if !(pt3 > 0. && pt5 > 0.) {
            return 0.;
        }
        let (cos_phi3, sin_phi3) = (p3.x / pt3, p3.y / pt3);
        let (cos_phi5, sin_phi5) = (p5.x / pt5, p5.y / pt5);

        let c1 = pt3 * (qve.x * sin_phi3 - qve.y * cos_phi3);
        let c2 = pt3 * (qve.z * ep1 - qve.t * p);
        let c3 = (inv.w3 - inv.w1) * ep1 * ep1 + 2. * inv.w1 * de3 * ep1 - inv.w1 * de3 * de3 + pt3 * pt3 * ep1 * ep1;
        let c3 = c3 / (p3.t * p + p3.z * ep1);

        let b1 = pt5 * (qve.x * sin_phi5 - qve.y * cos_phi5);
        let b2 = pt5 * (qve.z * ep2 + qve.t * p);
        let b3 = (inv.w5 - inv.w2) * ep2 * ep2 + 2. * inv.w2 * de5 * ep2 - inv.w2 * de5 * de5 + pt5 * pt5 * ep2 * ep2;
        let b3 = b3 / (ep2 * p5.z - p5.t * p);

        let r12 = c2 * sin_phi3 + qve.y * c3;
        let r13 = -c2 * cos_phi3 - qve.x * c3;
        let r22 = b2 * sin_phi5 + qve.y * b3;
        let r23 = -b2 * cos_phi5 - qve.x * b3;

        let epsi = inv.p12 * c1 * b1 + r12 * r22 + r13 * r23;
        let g5 = inv.w1 * c1 * c1 + r12 * r12 + r13 * r13;
        let g6 = inv.w2 * b1 * b1 + r22 * r22 + r23 * r23;

        let cc = cos_phi3 * cos_phi5 + sin_phi3 * sin_phi5;
        let a5 = -(qve.x * cos_phi3 + qve.y * sin_phi3) * pt3 * inv.p1k2
            - (ep1 * qve.t - p * qve.z) * cc * pt3 * pt5
            + (de5 * qve.z + qve.t * (p + p5.z)) * c3;
        let a6 = -(qve.x * cos_phi5 + qve.y * sin_phi5) * pt5 * inv.p2k1
            - (ep2 * qve.t + p * qve.z) * cc * pt3 * pt5
            + (de3 * qve.z - qve.t * (p - p3.z)) * b3;

        let qqq = q1dq * q1dq;
        let qdq = 4. * ml2 - w4;
        let (sa1, sa2) = (inv.sa1, inv.sa2);

        let t11 = 64.
            * (bb * (qqq - inv.g4 - qdq * (t1 + t2 + 2. * ml2))
                - 2. * (t1 + 2. * ml2) * (t2 + 2. * ml2) * qqq)
            * t1
            * t2;
        let t12 = 128. * (-bb * (inv.dd2 + g6) - 2. * (t1 + 2. * ml2) * (sa2 * qqq + a6 * a6)) * t1;
        let t21 = 128. * (-bb * (inv.dd4 + g5) - 2. * (t2 + 2. * ml2) * (sa1 * qqq + a5 * a5)) * t2;
        let t22 = 512.
            * (bb * (inv.delta * inv.delta - inv.gram)
                - (epsi - inv.delta * (qdq + q1dq2)).powi(2)
                - sa1 * a6 * a6
                - sa2 * a5 * a5
                - sa1 * sa2 * qqq);

        let (u1, u2) = self.form_factors[0].terms(t1, inv.w1, inv.w3);
        let (v1, v2) = self.form_factors[1].terms(t2, inv.w2, inv.w5);

        (u1 * v1 * t11 + u2 * v1 * t21 + u1 * v2 * t12 + u2 * v2 * t22) / (t1 * t2 * bb).powi(2) * 0.25
    }
}

impl Process for DileptonProduction {
    fn name(&self) -> &str {
        "lpair"
    }

    fn central_system(&self) -> [PdgId; 2] {
        [self.lepton, -self.lepton]
    }

    fn dimensions(&self) -> Vec<Dimension> {
        vec![
            Dimension::new("x_theta6", Mapping::Linear, Limits::new(0., 1.)),
            Dimension::new("phi6", Mapping::Linear, Limits::new(0., 2. * PI)),
        ]
    }

    fn prepare(&mut self, beams: &[Beam; 2], registry: &ParticleRegistry) -> Result<(), ConfigError> {
        let ml = registry.mass(self.lepton)?;
        self.ml2 = ml * ml;

        for (form_factors, beam) in self.form_factors.iter_mut().zip(beams.iter()) {
            *form_factors = if !registry.is_hadronic(beam.pdg)? {
                FormFactors::PointLike
            } else if beam.elastic {
                FormFactors::ElasticDipole
            } else {
                FormFactors::from_structure_functions(self.structure_functions)
            };
        }
        debug!("lpair form factors: {:?}", self.form_factors);
        Ok(())
    }

    fn decay_angles(&self, values: &[f64], inv: &Invariants) -> Option<DecayAngles> {
        let (cos_theta, jacobian) = if self.peaked {
            self.peaked_cosine(values[0], inv)?
        } else {
            (1. - 2. * values[0], 2.)
        };
        Some(DecayAngles {
            cos_theta,
            phi: values[1],
            jacobian,
        })
    }

    fn evaluate(&self, event: &Event, inv: &Invariants) -> f64 {
        self.peripheral(event, inv)
    }
}
