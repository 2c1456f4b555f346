/* 3rd party libraries */
use clap::{value_parser, Arg, ArgMatches, Command};
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

/* Custom libraries */
use elevator_sim::config::{load_config, Config};
use elevator_sim::shared::sync::lock;
use elevator_sim::sim::{LoadGenerator, StatusReporter};
use elevator_sim::unwrap_or_exit;
use elevator_sim::{Building, Runtime, SimClock};

/// Simulated time given to the elevators to park after the run.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

fn cli() -> Command<'static> {
    Command::new("elevator-sim")
        .about("Multi-elevator building simulation")
        .arg(
            Arg::new("config")
                .long("config")
                .takes_value(true)
                .default_value("config.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .help("Random seed for rider spawns and destinations"),
        )
        .arg(
            Arg::new("duration")
                .long("duration")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .help("Simulated run time in seconds"),
        )
        .arg(
            Arg::new("speedup")
                .long("speedup")
                .takes_value(true)
                .value_parser(value_parser!(f64))
                .help("Simulated milliseconds per real millisecond, 0 runs unpaced"),
        )
        .arg(
            Arg::new("density")
                .long("density")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .help("Longest interval between two new riders, in ms"),
        )
}

/// Command-line values take precedence over the file.
fn apply_overrides(config: &mut Config, matches: &ArgMatches) {
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.simulation.seed = *seed;
    }
    if let Some(duration) = matches.get_one::<u64>("duration") {
        config.simulation.duration_secs = *duration;
    }
    if let Some(speedup) = matches.get_one::<f64>("speedup") {
        config.simulation.speedup = *speedup;
    }
    if let Some(density) = matches.get_one::<u64>("density") {
        config.simulation.density_ms = *density;
    }
}

/* Main */
fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Load the configuration
    let matches = cli().get_matches();
    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = unwrap_or_exit!(load_config(&config_path));
    apply_overrides(&mut config, &matches);
    unwrap_or_exit!(config.validate());

    // Build the building and its control loops
    let mut runtime = Runtime::new(
        SimClock::new(),
        config.simulation.workers,
        config.simulation.speedup,
    );
    let building = unwrap_or_exit!(Building::new(&config, &mut runtime));

    let generator = LoadGenerator::new(building.clone(), &config.simulation);
    let stats = generator.stats();
    runtime.spawn(generator);
    runtime.spawn(StatusReporter::new(
        building.clone(),
        Duration::from_millis(config.simulation.status_interval_ms),
    ));

    info!(
        "Running for {} s of simulated time (seed {}, speedup {})",
        config.simulation.duration_secs, config.simulation.seed, config.simulation.speedup
    );
    runtime.run_for(Duration::from_secs(config.simulation.duration_secs));

    // Park every elevator before reporting
    building.stop_all();
    runtime.run_for(SHUTDOWN_GRACE);

    let stats = lock(&stats).clone();
    info!(
        "Done: {} riders spawned, {} journeys completed, mean wait {:?}, mean journey {:?}",
        stats.spawned,
        stats.completed,
        stats.mean_wait().unwrap_or_default(),
        stats.mean_journey().unwrap_or_default()
    );
}
