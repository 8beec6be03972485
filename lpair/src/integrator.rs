//! Plain Monte-Carlo driver. Samples are split into independently seeded
//! chunks, evaluated in parallel with one workspace per chunk.

use crate::integrand::Integrand;
use rand::prelude::*;
use rayon::prelude::*;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationSettings {
    pub samples: usize,
    pub seed: u64,
    pub chunks: usize,
}

impl Default for IntegrationSettings {
    fn default() -> IntegrationSettings {
        IntegrationSettings {
            samples: 100000,
            seed: 1,
            chunks: 64,
        }
    }
}

/// Cross-section estimate in picobarn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub error: f64,
    pub evaluated: usize,
    pub accepted: usize,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6e} +/- {:.6e} pb ({} of {} samples accepted)",
            self.value, self.error, self.accepted, self.evaluated
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    sum_squared: f64,
    evaluated: usize,
    accepted: usize,
}

impl Accumulator {
    #[inline]
    fn add(&mut self, weight: f64) {
        self.sum += weight;
        self.sum_squared += weight * weight;
        self.evaluated += 1;
        if weight > 0. {
            self.accepted += 1;
        }
    }

    fn merge(mut self, other: &Accumulator) -> Accumulator {
        self.sum += other.sum;
        self.sum_squared += other.sum_squared;
        self.evaluated += other.evaluated;
        self.accepted += other.accepted;
        self
    }

    fn estimate(&self) -> Estimate {
        let n = self.evaluated as f64;
        let (value, error) = if self.evaluated > 1 {
            let mean = self.sum / n;
            let variance = (self.sum_squared / n - mean * mean).max(0.) / (n - 1.);
            (mean, variance.sqrt())
        } else if self.evaluated == 1 {
            (self.sum, self.sum.abs())
        } else {
            (0., 0.)
        };
        Estimate {
            value,
            error,
            evaluated: self.evaluated,
            accepted: self.accepted,
        }
    }
}

pub struct Integrator<'a> {
    integrand: &'a Integrand,
    settings: IntegrationSettings,
    stop: Arc<AtomicBool>,
}

impl<'a> Integrator<'a> {
    pub fn new(integrand: &'a Integrand, settings: IntegrationSettings) -> Integrator<'a> {
        Integrator {
            integrand,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the flag stops every chunk before its next sample. Samples
    /// already drawn are kept in the estimate.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn integrate(&self) -> Estimate {
        let chunks = self.settings.chunks.max(1);
        let samples = self.settings.samples;
        info!(
            "Integrating {} samples over {} dimensions in {} chunks (seed {})",
            samples,
            self.integrand.dimensions(),
            chunks,
            self.settings.seed
        );

        let start = Instant::now();
        // fixed merge order keeps the sum independent of the thread count
        let partial: Vec<Accumulator> = (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let size = samples / chunks + if chunk < samples % chunks { 1 } else { 0 };
                self.run_chunk(chunk, size)
            })
            .collect();
        let total = partial
            .iter()
            .fold(Accumulator::default(), |acc, p| acc.merge(p));

        let estimate = total.estimate();
        if self.stop.load(Ordering::Relaxed) {
            info!("Integration stopped after {} samples", estimate.evaluated);
        }
        info!("Result: {} in {:?}", estimate, start.elapsed());
        estimate
    }

    fn run_chunk(&self, chunk: usize, size: usize) -> Accumulator {
        let mut rng = StdRng::seed_from_u64(self.settings.seed.wrapping_add(chunk as u64));
        let mut workspace = self.integrand.workspace();
        let mut x = vec![0.; self.integrand.dimensions()];
        let mut acc = Accumulator::default();

        for _ in 0..size {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            for xi in x.iter_mut() {
                *xi = rng.gen::<f64>();
            }
            acc.add(self.integrand.evaluate(&x, &mut workspace));
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn accumulator_statistics() {
        let mut acc = Accumulator::default();
        for &w in &[0., 1., 2., 3.] {
            acc.add(w);
        }
        let estimate = acc.estimate();
        assert_relative_eq!(estimate.value, 1.5);
        // sample variance 5/3, divided by the number of samples
        assert_relative_eq!(estimate.error, (5. / 12.0f64).sqrt(), max_relative = 1e-12);
        assert_eq!((estimate.evaluated, estimate.accepted), (4, 3));

        let merged = acc.merge(&acc);
        assert_eq!(merged.evaluated, 8);
        assert_relative_eq!(merged.estimate().value, 1.5);
        assert_eq!(Accumulator::default().estimate().value, 0.);
    }

    #[test]
    fn settings_defaults_fill_missing_fields() {
        let settings: IntegrationSettings = serde_yaml::from_str("samples: 10").unwrap();
        assert_eq!(
            settings,
            IntegrationSettings {
                samples: 10,
                ..IntegrationSettings::default()
            }
        );
    }
}
