//! Entry point of the external integrator: one weight per unit sample.

use crate::constants::MIN_REMNANT_MASS;
use crate::error::ConfigError;
use crate::event::{Event, Role, Status};
use crate::kinematics::{KinematicsSolver, OutgoingMasses, SOLVER_DIMENSIONS};
use crate::mapping::{Dimension, Limits, Mapping};
use crate::orientation::OrientationReconstructor;
use crate::particles::{ParticleRegistry, REMNANT};
use crate::process::{Process, ProcessRegistry, DECAY_DIMENSIONS};
use crate::run_card::RunConfig;
use crate::weight::WeightEvaluator;

/// Index of the central-mass dimension in the sample vector.
const CENTRAL_MASS_DIMENSION: usize = SOLVER_DIMENSIONS;

/// Per-worker scratch space. The event template is copied in once; every
/// evaluation overwrites the momenta and remnant masses in place.
#[derive(Debug, Clone)]
pub struct Workspace {
    event: Event,
    values: Vec<f64>,
    accepted: bool,
}

impl Workspace {
    /// The last evaluated event, in the lab frame when accepted.
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Frozen run: built once by the guarded setup, then shared read-only by
/// every worker.
pub struct Integrand {
    process: Box<dyn Process>,
    solver: KinematicsSolver,
    reconstructor: OrientationReconstructor,
    evaluator: WeightEvaluator,
    layout: Vec<Dimension>,
    template: Event,
    /// Sample index of the remnant mass of each dissociated beam.
    remnants: [Option<usize>; 2],
    elastic_w: [f64; 2],
    process_offset: usize,
}

impl Integrand {
    pub fn new(
        config: &RunConfig,
        registry: &ParticleRegistry,
        processes: &ProcessRegistry,
    ) -> Result<Integrand, ConfigError> {
        let process = processes.build(&config.process, &config.parameters)?;
        Integrand::with_process(config, registry, process)
    }

    /// Run-level setup. Any inconsistency is reported here, before the first
    /// sample is drawn.
    pub fn with_process(
        config: &RunConfig,
        registry: &ParticleRegistry,
        mut process: Box<dyn Process>,
    ) -> Result<Integrand, ConfigError> {
        let beams = &config.beams;
        for (i, beam) in beams.iter().enumerate() {
            if !beam.elastic && !registry.is_hadronic(beam.pdg)? {
                return Err(ConfigError::InvalidDissociation { beam: i + 1, pdg: beam.pdg });
            }
        }

        process.prepare(beams, registry)?;
        let central = process.central_system();
        let central_masses = [registry.mass(central[0])?, registry.mass(central[1])?];

        let process_dimensions = process.dimensions();
        if process_dimensions.len() < DECAY_DIMENSIONS {
            return Err(ConfigError::MissingDimensions {
                process: process.name().to_owned(),
                found: process_dimensions.len(),
                expected: DECAY_DIMENSIONS,
            });
        }
        for dimension in &process_dimensions {
            dimension.validate()?;
        }

        let s = config.s();
        let sqrt_s = s.sqrt();
        let cuts = &config.cuts;

        // lightest outgoing systems on each side
        let remnant_min = cuts.remnant_mass.min.map_or(MIN_REMNANT_MASS, |m| m.max(MIN_REMNANT_MASS));
        let outgoing_min = [
            if beams[0].elastic { beams[0].mass } else { remnant_min },
            if beams[1].elastic { beams[1].mass } else { remnant_min },
        ];
        let pair_threshold = central_masses[0] + central_masses[1];
        let central_min = cuts.central_mass.min.map_or(pair_threshold, |m| m.max(pair_threshold));
        let threshold = outgoing_min[0] + outgoing_min[1] + central_min;
        if !(sqrt_s > threshold) {
            return Err(ConfigError::BelowThreshold { sqrt_s, threshold });
        }

        let w4_limits = cuts.central_mass.squared().clamp(Limits::new(
            pair_threshold * pair_threshold,
            (sqrt_s - outgoing_min[0] - outgoing_min[1]).powi(2),
        ));
        if !Mapping::Logarithmic.accepts(&w4_limits) {
            return Err(ConfigError::BelowThreshold { sqrt_s, threshold });
        }

        let mut layout = vec![
            Dimension::new("t1", Mapping::Linear, Limits::new(0., 1.)),
            Dimension::new("t2", Mapping::Linear, Limits::new(0., 1.)),
            Dimension::new("s2", Mapping::Linear, Limits::new(0., 1.)),
            Dimension::new("theta4", Mapping::Linear, Limits::new(0., 1.)),
            Dimension::new("w4", Mapping::Logarithmic, w4_limits),
        ];

        let mut remnants = [None, None];
        for (i, label) in ["mx2", "my2"].iter().enumerate() {
            if beams[i].elastic {
                continue;
            }
            let max = sqrt_s - outgoing_min[1 - i] - central_min;
            let limits = cuts
                .remnant_mass
                .squared()
                .clamp(Limits::new(MIN_REMNANT_MASS * MIN_REMNANT_MASS, max * max));
            let dimension = Dimension::new(*label, Mapping::Logarithmic, limits);
            dimension.validate()?;
            remnants[i] = Some(layout.len());
            layout.push(dimension);
        }

        let process_offset = layout.len();
        layout.extend(process_dimensions);

        let solver = KinematicsSolver::new(s, beams[0].mass, beams[1].mass, cuts.q2, config.strategy)?;

        let outgoing = |i: usize| {
            if beams[i].elastic {
                (beams[i].pdg, Status::Outgoing, beams[i].mass)
            } else {
                (REMNANT, Status::Dissociated, 0.)
            }
        };
        let template = Event::new([
            (beams[0].pdg, Status::Incoming, beams[0].mass),
            (beams[1].pdg, Status::Incoming, beams[1].mass),
            outgoing(0),
            outgoing(1),
            (central[0], Status::Outgoing, central_masses[0]),
            (central[1], Status::Outgoing, central_masses[1]),
        ]);

        info!(
            "Process '{}': beams {} ({:+} GeV) and {} ({:+} GeV), sqrt(s) = {} GeV, mode {:?}",
            process.name(),
            beams[0].pdg,
            beams[0].pz,
            beams[1].pdg,
            beams[1].pz,
            sqrt_s,
            config.mode
        );
        info!(
            "Central system {:?}: w4 in [{:e}, {:e}] GeV^2",
            central, w4_limits.min, w4_limits.max
        );
        for (i, remnant) in remnants.iter().enumerate() {
            if let Some(index) = remnant {
                let limits = layout[*index].limits;
                info!("Beam {} dissociates: M^2 in [{:e}, {:e}] GeV^2", i + 1, limits.min, limits.max);
            }
        }
        info!(
            "{} dimensions: {:?}",
            layout.len(),
            layout.iter().map(|d| d.label).collect::<Vec<_>>()
        );

        Ok(Integrand {
            solver,
            reconstructor: OrientationReconstructor::new(sqrt_s),
            evaluator: WeightEvaluator::new(cuts.clone(), config.lab_frame(), s),
            layout,
            template,
            remnants,
            elastic_w: [beams[0].mass * beams[0].mass, beams[1].mass * beams[1].mass],
            process_offset,
            process,
        })
    }

    /// Length of the sample vector.
    pub fn dimensions(&self) -> usize {
        self.layout.len()
    }

    pub fn layout(&self) -> &[Dimension] {
        &self.layout
    }

    pub fn sqrt_s(&self) -> f64 {
        self.solver.sqrt_s()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace {
            event: self.template.clone(),
            values: vec![0.; self.layout.len() - self.process_offset],
            accepted: false,
        }
    }

    /// Weight in picobarn of the sample `x`, of length `dimensions()`. On a
    /// non-zero weight the workspace holds the lab-frame event.
    pub fn evaluate(&self, x: &[f64], workspace: &mut Workspace) -> f64 {
        debug_assert_eq!(x.len(), self.layout.len());
        workspace.accepted = false;

        let weight = self.evaluate_point(x, workspace).unwrap_or(0.);
        if weight > 0. {
            workspace.event.boost(self.evaluator.lab_frame());
            workspace.accepted = true;
            weight
        } else {
            0.
        }
    }

    fn outgoing_mass(&self, beam: usize, x: &[f64], jacobian: &mut f64) -> f64 {
        match self.remnants[beam] {
            Some(index) => {
                let mapped = self.layout[index].map(x[index]);
                *jacobian *= mapped.jacobian;
                mapped.value
            }
            None => self.elastic_w[beam],
        }
    }

    fn evaluate_point(&self, x: &[f64], workspace: &mut Workspace) -> Option<f64> {
        let central_mass = self.layout[CENTRAL_MASS_DIMENSION].map(x[CENTRAL_MASS_DIMENSION]);
        let mut jacobian = central_mass.jacobian;

        let masses = OutgoingMasses {
            w3: self.outgoing_mass(0, x, &mut jacobian),
            w4: central_mass.value,
            w5: self.outgoing_mass(1, x, &mut jacobian),
        };
        require!(
            masses.w3.sqrt() + masses.w4.sqrt() + masses.w5.sqrt() < self.solver.sqrt_s(),
            "outgoing masses above sqrt(s)"
        );

        let u = [x[0], x[1], x[2], x[3]];
        let inv = self.solver.solve(&masses, &u)?;
        jacobian *= inv.jacobian;

        let event = &mut workspace.event;
        event[Role::OutgoingBeam1].mass = masses.w3.sqrt();
        event[Role::OutgoingBeam2].mass = masses.w5.sqrt();
        let central = self.reconstructor.reconstruct(&inv, event)?;

        for ((value, dimension), &u) in workspace
            .values
            .iter_mut()
            .zip(&self.layout[self.process_offset..])
            .zip(&x[self.process_offset..])
        {
            let mapped = dimension.map(u);
            *value = mapped.value;
            jacobian *= mapped.jacobian;
        }

        let angles = self.process.decay_angles(&workspace.values, &inv)?;
        let p_star = self.reconstructor.decay_central(event, &central, &angles)?;
        jacobian *= p_star * angles.jacobian / (4. * central.mass);

        Some(self.evaluator.weight(event, &inv, jacobian, self.process.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_card::RunCard;
    use approx::assert_relative_eq;

    fn integrand(yaml: &str) -> Result<Integrand, ConfigError> {
        let registry = ParticleRegistry::standard();
        let config = RunCard::from_yaml(yaml)?.resolve(&registry)?;
        Integrand::new(&config, &registry, &ProcessRegistry::standard())
    }

    #[test]
    fn layout_depends_on_the_dissociation_mode() {
        let elastic = integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}").unwrap();
        assert_eq!(elastic.dimensions(), 7);
        let labels: Vec<_> = elastic.layout().iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["t1", "t2", "s2", "theta4", "w4", "x_theta6", "phi6"]);

        let double = integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}\nmode: inelastic-inelastic").unwrap();
        assert_eq!(double.dimensions(), 9);
        assert_eq!(double.layout()[5].label, "mx2");
        assert_eq!(double.layout()[6].label, "my2");
        assert_relative_eq!(double.layout()[5].limits.min, MIN_REMNANT_MASS * MIN_REMNANT_MASS);

        let single = integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}\nmode: inelastic-elastic").unwrap();
        assert_eq!(single.layout()[5].label, "mx2");
        assert_eq!(single.dimensions(), 8);
    }

    #[test]
    fn setup_errors() {
        assert!(matches!(
            integrand("beams: {pdg: [11, 2212], pz: [27.5, -920]}\nmode: inelastic-elastic"),
            Err(ConfigError::InvalidDissociation { beam: 1, pdg: 11 })
        ));
        assert!(matches!(
            integrand("beams: {pdg: [2212, 2212], sqrt_s: 2}"),
            Err(ConfigError::BelowThreshold { .. })
        ));
        assert!(matches!(
            integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}\ncuts: {central_mass: {min: 99}}"),
            Err(ConfigError::BelowThreshold { .. })
        ));
        assert!(matches!(
            integrand("process: ww\nbeams: {pdg: [2212, 2212], sqrt_s: 100}"),
            Err(ConfigError::UnknownProcess(_))
        ));
    }

    #[test]
    fn central_mass_window_restricts_the_range() {
        let integrand =
            integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}\ncuts: {central_mass: {min: 5, max: 20}}").unwrap();
        let w4 = integrand.layout()[CENTRAL_MASS_DIMENSION].limits;
        assert_relative_eq!(w4.min, 25.);
        assert_relative_eq!(w4.max, 400.);
    }

    #[test]
    fn q2_window_bounds_both_momentum_transfers() {
        use rand::prelude::*;

        let integrand = integrand("beams: {pdg: [2212, 2212], sqrt_s: 100}\ncuts: {mode: none, q2: {max: 4}}").unwrap();
        let mut workspace = integrand.workspace();
        let mut rng = StdRng::seed_from_u64(17);
        let mut x = vec![0.; integrand.dimensions()];

        let mut accepted = 0;
        for _ in 0..5000 {
            for xi in x.iter_mut() {
                *xi = rng.gen();
            }
            if integrand.evaluate(&x, &mut workspace) == 0. {
                continue;
            }
            accepted += 1;
            let event = workspace.event();
            let t1 = (event.momentum(Role::IncomingBeam1) - event.momentum(Role::OutgoingBeam1)).square();
            let t2 = (event.momentum(Role::IncomingBeam2) - event.momentum(Role::OutgoingBeam2)).square();
            assert!(-t1 <= 4. + 1e-6 && -t2 <= 4. + 1e-6, "t1 = {}, t2 = {}", t1, t2);
        }
        assert!(accepted > 0);
    }

    #[test]
    fn accepted_samples_hold_a_lab_frame_event() {
        let integrand = integrand("beams: {pdg: [11, 2212], pz: [27.5, -920]}").unwrap();
        let mut workspace = integrand.workspace();
        let mut x = vec![0.5; integrand.dimensions()];
        x[4] = 0.1;

        let weight = integrand.evaluate(&x, &mut workspace);
        assert!(weight > 0.);
        assert!(workspace.is_accepted());
        assert_relative_eq!(workspace.event().momentum(Role::IncomingBeam1).z, 27.5, max_relative = 1e-9);
        assert_relative_eq!(workspace.event().momentum(Role::IncomingBeam2).z, -920., max_relative = 1e-9);

        x[0] = f64::NAN;
        assert_eq!(integrand.evaluate(&x, &mut workspace), 0.);
        assert!(!workspace.is_accepted());
    }
}
