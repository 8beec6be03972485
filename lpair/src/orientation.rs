//! Explicit momenta in the centre-of-mass frame from the solved invariants.
//!
//! Beam 1 moves along `+z`. The central system is placed in the `xz` plane
//! with positive `px`; the outgoing beam-like systems balance it.

use crate::event::{Event, Role};
use crate::kinematics::Invariants;
use crate::process::DecayAngles;
use vector::LorentzVector;

/// The central system, before its two-body decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralSystem {
    pub momentum: LorentzVector<f64>,
    pub mass: f64,
}

#[derive(Debug, Clone)]
pub struct OrientationReconstructor {
    sqrt_s: f64,
}

/// `sqrt(1 - x^2)` for a sine or cosine, `None` outside of `[-1, 1]`.
#[inline]
fn complement(x: f64) -> Option<f64> {
    if x.abs() <= 1. {
        Some((1. - x * x).sqrt())
    } else {
        None
    }
}

impl OrientationReconstructor {
    pub fn new(sqrt_s: f64) -> OrientationReconstructor {
        OrientationReconstructor { sqrt_s }
    }

    /// Fill the beams and the outgoing beam-like systems of `event`, and
    /// return the central system. `None` for an unphysical point.
    pub fn reconstruct(&self, inv: &Invariants, event: &mut Event) -> Option<CentralSystem> {
        let s = inv.s;
        let re = 0.5 / self.sqrt_s;
        let w12 = inv.w1 - inv.w2;

        let ep1 = re * (s + w12);
        let ep2 = re * (s - w12);
        let p = re * inv.sl1;

        let de3 = re * (inv.s2 - inv.w3 + w12);
        let de5 = re * (inv.s1 - inv.w5 - w12);

        let ep3 = ep1 - de3;
        let ep5 = ep2 - de5;
        let ec4 = de3 + de5;

        let mc4 = inv.w4.sqrt();
        require!(ec4 >= mc4, "central energy {} below its mass {}", ec4, mc4);
        let pc4 = (ec4 * ec4 - inv.w4).sqrt();
        require!(pc4 > 0., "central system at rest");

        let pp3 = (ep3 * ep3 - inv.w3).sqrt();
        let pt3 = (inv.dd1 / s).sqrt() / p;
        let pp5 = (ep5 * ep5 - inv.w5).sqrt();
        let pt5 = (inv.dd3 / s).sqrt() / p;

        let st3 = pt3 / pp3;
        let st5 = pt5 / pp5;
        let mut ct3 = require_some!(complement(st3), "sin(theta3) = {}", st3);
        let mut ct5 = require_some!(complement(st5), "sin(theta5) = {}", st5);

        if ep1 * ep3 < inv.p13 {
            ct3 = -ct3;
        }
        if ep2 * ep5 > inv.p25 {
            ct5 = -ct5;
        }

        require!(inv.dd5 >= 0., "dd5 = {} < 0", inv.dd5);
        let pt4 = (inv.dd5 / s).sqrt() / p;
        let st4 = pt4 / pc4;
        let mut ct4 = require_some!(complement(st4), "sin(theta4) = {}", st4);
        if ep1 * ec4 < inv.p14 {
            ct4 = -ct4;
        }

        // azimuths of the outgoing beam-like systems
        let rr = (-inv.gram / s).sqrt() / (p * pt4);
        let sin_phi3 = rr / pt3;
        let sin_phi5 = -rr / pt5;
        let cos_phi3 = -require_some!(complement(sin_phi3), "sin(phi3) = {}", sin_phi3);
        let cos_phi5 = -require_some!(complement(sin_phi5), "sin(phi5) = {}", sin_phi5);

        let mut p3 = LorentzVector::from_args(ep3, pt3 * cos_phi3, pt3 * sin_phi3, pp3 * ct3);
        let mut p5 = LorentzVector::from_args(ep5, pt5 * cos_phi5, pt5 * sin_phi5, pp5 * ct5);

        // one of the two x-projections may need mirroring to balance pt4
        let a1 = p3.x - p5.x;
        if (pt4 + p3.x + p5.x).abs() >= (a1.abs() - pt4).abs() {
            if a1 < 0. {
                p5.x = -p5.x;
            } else {
                p3.x = -p3.x;
            }
        }

        event[Role::IncomingBeam1].momentum = LorentzVector::from_args(ep1, 0., 0., p);
        event[Role::IncomingBeam2].momentum = LorentzVector::from_args(ep2, 0., 0., -p);
        event[Role::OutgoingBeam1].momentum = p3;
        event[Role::OutgoingBeam2].momentum = p5;

        Some(CentralSystem {
            momentum: LorentzVector::from_args(ec4, pt4, 0., pc4 * ct4),
            mass: mc4,
        })
    }

    /// Decay the central system into the two central particles of `event`.
    /// The angles are measured in the central rest frame with respect to
    /// the direction of the first exchanged mediator. Returns the momentum
    /// of the decay products in that frame.
    pub fn decay_central(
        &self,
        event: &mut Event,
        central: &CentralSystem,
        angles: &DecayAngles,
    ) -> Option<f64> {
        let m6 = event[Role::CentralParticle1].mass;
        let m7 = event[Role::CentralParticle2].mass;
        let mc4 = central.mass;

        let e6 = (mc4 * mc4 + m6 * m6 - m7 * m7) / (2. * mc4);
        let p_star = (e6 * e6 - m6 * m6).sqrt();
        require!(p_star > 0., "central system below its decay threshold");

        let sin_theta = require_some!(complement(angles.cos_theta), "cos(theta*) = {}", angles.cos_theta);

        let q1 = event.momentum(Role::IncomingBeam1) - event.momentum(Role::OutgoingBeam1);
        let axis = q1.boost_to_rest_frame(&central.momentum, mc4);
        let axis_length = axis.spatial_distance();
        require!(axis_length > 0., "mediator at rest in the central frame");

        let cos_axis = axis.z / axis_length;
        let sin_axis = (1. - cos_axis * cos_axis).max(0.).sqrt();
        let axis_pt = axis.pt();
        let (cos_phi_axis, sin_phi_axis) = if axis_pt > 0. {
            (axis.x / axis_pt, axis.y / axis_pt)
        } else {
            (1., 0.)
        };

        let p6_rest = LorentzVector::from_args(
            e6,
            p_star * sin_theta * angles.phi.cos(),
            p_star * sin_theta * angles.phi.sin(),
            p_star * angles.cos_theta,
        )
        .rotate_y(cos_axis, sin_axis)
        .rotate_z(cos_phi_axis, sin_phi_axis);

        let p6 = p6_rest.boost_from_rest_frame(&central.momentum, mc4);
        event[Role::CentralParticle1].momentum = p6;
        event[Role::CentralParticle2].momentum = central.momentum - p6;

        Some(p_star)
    }
}
