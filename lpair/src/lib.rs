#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
pub extern crate vector;

/// Reject the current phase-space point: log why and bail out with `None`.
/// Written as `!(cond)` so that a NaN condition also rejects.
macro_rules! require {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            debug!($($arg)+);
            return None;
        }
    };
}

/// Unwrap an `Option`, rejecting the current phase-space point on `None`.
macro_rules! require_some {
    ($opt:expr, $($arg:tt)+) => {
        match $opt {
            Some(v) => v,
            None => {
                debug!($($arg)+);
                return None;
            }
        }
    };
}

pub mod constants;
pub mod cuts;
pub mod error;
pub mod event;
pub mod form_factors;
pub mod integrand;
pub mod integrator;
pub mod kinematics;
pub mod mapping;
pub mod orientation;
pub mod particles;
pub mod process;
pub mod run_card;
pub mod weight;

pub use crate::error::ConfigError;
pub use crate::integrand::{Integrand, Workspace};
pub use crate::run_card::{RunCard, RunConfig};
