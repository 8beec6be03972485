extern crate clap;
extern crate env_logger;
extern crate lpair;
extern crate rand;

use lpair::integrator::{IntegrationSettings, Integrator};
use lpair::particles::ParticleRegistry;
use lpair::process::ProcessRegistry;
use lpair::{Integrand, RunCard};

use clap::{App, Arg, ArgMatches, SubCommand};
use rand::prelude::*;
use std::error::Error;
use std::str::FromStr;
use std::time::Instant;

fn parse_arg<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, String> {
    match matches.value_of(name) {
        Some(x) => T::from_str(x)
            .map(Some)
            .map_err(|_| format!("invalid value '{}' for --{}", x, name)),
        None => Ok(None),
    }
}

/// Perform a single core benchmark.
fn bench(integrand: &Integrand, settings: &IntegrationSettings) {
    let mut x = vec![0.; integrand.dimensions()];
    let mut workspace = integrand.workspace();
    let mut rng = rand::thread_rng();

    let mut accepted = 0;
    let now = Instant::now();
    for _ in 0..settings.samples {
        for xi in x.iter_mut() {
            *xi = rng.gen();
        }

        if integrand.evaluate(&x, &mut workspace) > 0. {
            accepted += 1;
        }
    }

    let elapsed = now.elapsed();
    println!(
        "{} samples ({} accepted) in {:#?}, {:.3} us per sample",
        settings.samples,
        accepted,
        elapsed,
        elapsed.as_secs_f64() * 1e6 / settings.samples.max(1) as f64
    );
}

/// Inspect a single point.
fn inspect(integrand: &Integrand, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let x = matches
        .values_of("point")
        .into_iter()
        .flatten()
        .map(|x| f64::from_str(x).map_err(|_| format!("invalid coordinate '{}'", x)))
        .collect::<Result<Vec<_>, _>>()?;
    if x.len() != integrand.dimensions() {
        return Err(format!(
            "Dimension of the input point is incorrect. It should be {} but is {}.",
            integrand.dimensions(),
            x.len()
        )
        .into());
    }
    if let Some(u) = x.iter().find(|u| !(**u >= 0. && **u < 1.)) {
        return Err(format!("coordinate {} is outside of [0, 1)", u).into());
    }

    let mut workspace = integrand.workspace();
    let weight = integrand.evaluate(&x, &mut workspace);
    println!("Weight = {:e} pb", weight);

    if workspace.is_accepted() {
        if matches.is_present("yaml") {
            print!("{}", serde_yaml::to_string(workspace.event())?);
        } else {
            println!("{}", workspace.event());
        }
    } else {
        println!("The point is rejected.");
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = App::new("lpair")
        .version("0.1")
        .about("Two-photon exclusive production in hadron and lepton collisions")
        .arg(
            Arg::with_name("card")
                .long("card")
                .value_name("CARD")
                .default_value("Cards/run_card.yaml")
                .help("Set the run card"),
        )
        .arg(
            Arg::with_name("cores")
                .short("c")
                .long("cores")
                .value_name("NUMCORES")
                .help("Set the number of cores"),
        )
        .arg(
            Arg::with_name("samples")
                .short("s")
                .long("samples")
                .value_name("SAMPLES")
                .help("Number of samples"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Specify the integration seed"),
        )
        .subcommand(SubCommand::with_name("bench").about("Run a benchmark"))
        .subcommand(
            SubCommand::with_name("inspect")
                .about("Inspect a single input point")
                .arg(Arg::with_name("point").required(true).min_values(7))
                .arg(
                    Arg::with_name("yaml")
                        .long("yaml")
                        .help("Print the event as YAML"),
                ),
        )
        .get_matches();

    let card = RunCard::from_file(matches.value_of("card").unwrap_or("Cards/run_card.yaml"))?;
    let registry = ParticleRegistry::standard();
    let mut config = card.resolve(&registry)?;

    if let Some(seed) = parse_arg(&matches, "seed")? {
        config.integration.seed = seed;
    }
    if let Some(samples) = parse_arg(&matches, "samples")? {
        config.integration.samples = samples;
    }
    if let Some(cores) = parse_arg::<usize>(&matches, "cores")? {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cores)
            .build_global()?;
    }

    let integrand = Integrand::new(&config, &registry, &ProcessRegistry::standard())?;

    if matches.subcommand_matches("bench").is_some() {
        bench(&integrand, &config.integration);
        return Ok(());
    }

    if let Some(matches) = matches.subcommand_matches("inspect") {
        return inspect(&integrand, matches);
    }

    let estimate = Integrator::new(&integrand, config.integration.clone()).integrate();
    println!("sigma = {}", estimate);
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
