use std::path::PathBuf;

use clap::{Args, Parser};
use directories::BaseDirs;
use shardsim_rebalance::Simulation;
use shardsim_shard::{generate, Md5SeedDeriver, Resharder};
use tracing::{info, Level};

mod config;
mod report;

use config::SimConfig;

/// Offline shuffle-shard rebalancing simulator.
#[derive(Parser)]
#[command(name = "shardsimctl", author, version, about = "Shuffle-shard rebalancing simulator", long_about = None)]
struct Cli {
    /// Simulation config (default: $HOME/.shardsim.yaml when present).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    #[command(flatten)]
    population: PopulationOverrides,

    /// Snapshots shown in the longitudinal summary.
    #[arg(long)]
    samples: Option<usize>,

    /// Write the full report as JSON.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[command(flatten)]
    log: LogOptions,
}

#[derive(Args)]
struct PopulationOverrides {
    /// Number of ingesters.
    #[arg(long)]
    ingesters: Option<usize>,
    /// Number of tenants.
    #[arg(long)]
    tenants: Option<usize>,
    /// Population seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct LogOptions {
    /// Directory for JSON log files; logs go to stderr when unset.
    #[arg(long = "log-dir")]
    log_dir: Option<PathBuf>,
    /// Default log level.
    #[arg(long = "log-level", default_value_t = Level::INFO)]
    log_level: Level,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    shardsim_log::init(cli.log.log_dir.as_deref(), cli.log.log_level)?;

    let config_path = cli.config.or_else(|| {
        BaseDirs::new()
            .map(|b| b.home_dir().join(".shardsim.yaml"))
            .filter(|p| p.exists())
    });
    let mut config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loaded config");
            SimConfig::load(&path)?
        }
        None => SimConfig::default(),
    };
    if let Some(ingesters) = cli.population.ingesters {
        config.population.ingesters = ingesters;
    }
    if let Some(tenants) = cli.population.tenants {
        config.population.tenants = tenants;
    }
    if let Some(seed) = cli.population.seed {
        config.population.seed = seed;
    }
    if let Some(samples) = cli.samples {
        config.samples = samples;
    }

    let mut state = generate(&config.population)?;
    let resharder = Resharder::new(Md5SeedDeriver)
        .with_namespace(config.namespace.clone())
        .with_drift(config.drift);
    resharder.reshard(&mut state);

    let rounds = config.rounds(state.total_ingester_load());
    info!(
        ingesters = state.ingesters().len(),
        tenants = state.tenants().len(),
        rounds = rounds.len(),
        "starting simulation"
    );
    let report = Simulation::new(state, resharder).run(&rounds)?;

    print!("{}", report::render(&report, config.samples));
    if let Some(path) = cli.output {
        report::write_json(&report, &path)?;
        info!(path = %path.display(), "wrote report");
    }
    Ok(())
}
