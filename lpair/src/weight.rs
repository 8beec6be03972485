//! Final assembly of the per-sample weight, in picobarn.

use crate::constants::{GEVM2_TO_PB, PHASE_SPACE_NORMALIZATION};
use crate::cuts::Cuts;
use crate::event::{Event, LabFrame};
use crate::kinematics::Invariants;
use crate::process::Process;

#[derive(Debug, Clone)]
pub struct WeightEvaluator {
    cuts: Cuts,
    lab: LabFrame,
    normalization: f64,
}

impl WeightEvaluator {
    pub fn new(cuts: Cuts, lab: LabFrame, s: f64) -> WeightEvaluator {
        WeightEvaluator {
            cuts,
            lab,
            normalization: GEVM2_TO_PB / (PHASE_SPACE_NORMALIZATION * s),
        }
    }

    pub fn lab_frame(&self) -> &LabFrame {
        &self.lab
    }

    #[inline]
    fn accepts_invariants(&self, inv: &Invariants) -> bool {
        self.cuts.accepts_momentum_transfers(inv.t1, inv.t2)
    }

    /// Cuts on the central particles, evaluated in the lab frame. `event`
    /// itself stays in the centre-of-mass frame.
    pub fn accepts_event(&self, event: &Event) -> bool {
        let [p6, p7] = event.central();
        self.cuts
            .accepts_central(&[self.lab.apply(&p6), self.lab.apply(&p7)])
    }

    /// Weight of one reconstructed point. Zero whenever the point is
    /// outside the physical region or the acceptance, never negative.
    pub fn weight(&self, event: &Event, inv: &Invariants, jacobian: f64, process: &dyn Process) -> f64 {
        if !(jacobian > 0.) {
            return 0.;
        }
        if !self.accepts_invariants(inv) {
            debug!("momentum transfers ({}, {}) outside the q2 window", inv.t1, inv.t2);
            return 0.;
        }
        if !self.accepts_event(event) {
            debug!("central system outside the acceptance");
            return 0.;
        }

        let me = process.evaluate(event, inv);
        if !me.is_finite() {
            warn!("non-finite matrix element {} for '{}', weight set to zero", me, process.name());
            return 0.;
        }
        if me <= 0. {
            return 0.;
        }

        let weight = self.normalization * jacobian * me;
        if weight.is_finite() {
            weight
        } else {
            warn!("non-finite weight: jacobian = {}, |M|^2 = {}", jacobian, me);
            0.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::{CutMode, Window};
    use crate::event::{Role, Status};
    use crate::mapping::Dimension;
    use crate::particles::{MUON, PROTON};
    use crate::process::DecayAngles;
    use approx::assert_relative_eq;
    use vector::LorentzVector;

    struct Constant(f64);

    impl Process for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn central_system(&self) -> [i64; 2] {
            [MUON, -MUON]
        }

        fn dimensions(&self) -> Vec<Dimension> {
            vec![]
        }

        fn decay_angles(&self, _values: &[f64], _inv: &Invariants) -> Option<DecayAngles> {
            None
        }

        fn evaluate(&self, _event: &Event, _inv: &Invariants) -> f64 {
            self.0
        }
    }

    fn event() -> Event {
        let mut event = Event::new([
            (PROTON, Status::Incoming, 0.938),
            (PROTON, Status::Incoming, 0.938),
            (PROTON, Status::Outgoing, 0.938),
            (PROTON, Status::Outgoing, 0.938),
            (MUON, Status::Outgoing, 0.1057),
            (-MUON, Status::Outgoing, 0.1057),
        ]);
        event[Role::CentralParticle1].momentum = LorentzVector::from_args(25., 20., 0., 15.);
        event[Role::CentralParticle2].momentum = LorentzVector::from_args(25., -20., 0., -15.);
        event
    }

    fn invariants() -> Invariants {
        Invariants {
            t1: -2.,
            t2: -0.5,
            ..Invariants::default()
        }
    }

    fn evaluator(cuts: Cuts) -> WeightEvaluator {
        WeightEvaluator::new(cuts, LabFrame::new(100., 0., 100.), 1e4)
    }

    #[test]
    fn weight_is_normalized_product() {
        let w = evaluator(Cuts::default()).weight(&event(), &invariants(), 3., &Constant(2.));
        assert_relative_eq!(w, GEVM2_TO_PB / (PHASE_SPACE_NORMALIZATION * 1e4) * 6., max_relative = 1e-14);
    }

    #[test]
    fn invalid_inputs_give_zero() {
        let evaluator = evaluator(Cuts::default());
        let (event, inv) = (event(), invariants());
        assert_eq!(evaluator.weight(&event, &inv, 0., &Constant(1.)), 0.);
        assert_eq!(evaluator.weight(&event, &inv, f64::NAN, &Constant(1.)), 0.);
        assert_eq!(evaluator.weight(&event, &inv, 1., &Constant(-1.)), 0.);
        assert_eq!(evaluator.weight(&event, &inv, 1., &Constant(f64::NAN)), 0.);
        assert_eq!(evaluator.weight(&event, &inv, 1., &Constant(f64::INFINITY)), 0.);
    }

    #[test]
    fn cuts_are_applied_before_the_matrix_element() {
        let q2 = evaluator(Cuts {
            q2: Window::new(Some(1.), None),
            ..Cuts::default()
        });
        assert_eq!(q2.weight(&event(), &invariants(), 1., &Constant(1.)), 0.);

        let hard = evaluator(Cuts {
            mode: CutMode::All,
            pt: Window::new(Some(25.), None),
            ..Cuts::default()
        });
        assert_eq!(hard.weight(&event(), &invariants(), 1., &Constant(1.)), 0.);

        let soft = evaluator(Cuts {
            pt: Window::new(Some(15.), None),
            ..Cuts::default()
        });
        assert!(soft.weight(&event(), &invariants(), 1., &Constant(1.)) > 0.);
    }

    #[test]
    fn energy_cuts_use_the_lab_frame() {
        let cuts = Cuts {
            energy: Window::new(Some(30.), None),
            ..Cuts::default()
        };
        // at rest in the centre-of-mass frame both muons have 25 GeV
        assert!(!evaluator(cuts.clone()).accepts_event(&event()));

        let (e1, e2): (f64, f64) = (200., 12.5);
        let sqrt_s = 2. * (e1 * e2).sqrt();
        let boosted = WeightEvaluator::new(cuts, LabFrame::new(e1 + e2, e1 - e2, sqrt_s), sqrt_s * sqrt_s);
        let mut forward = event();
        forward[Role::CentralParticle2].momentum = LorentzVector::from_args(25., -20., 0., 15.);
        assert!(boosted.accepts_event(&forward));
    }
}
