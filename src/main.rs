use std::fs;
use std::path::PathBuf;

use ai_rover::arena::load_map;
use ai_rover::db::{BrainStore, JsonFileStore, SqliteStore};
use ai_rover::{SimConfig, Simulation, log};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "ai_rover")]
#[command(author, version, about = "Evolve ray-sensing rovers toward a target", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON simulation config (defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite file holding the best brain
    #[arg(short, long, global = true, default_value = "ai_rover.db")]
    store: PathBuf,

    /// Keep the best brain as a JSON file in this directory instead of SQLite
    #[arg(long, global = true)]
    json_dir: Option<PathBuf>,

    /// Append log lines to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the population headless
    Run {
        /// JSON obstacle map
        #[arg(short, long)]
        map: Option<PathBuf>,

        /// Ticks per epoch
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Epochs; each one restarts from the stored brain
        #[arg(short, long, default_value = "1")]
        epochs: u32,

        /// Store the champion's brain at the end of every epoch
        #[arg(long)]
        save_best: bool,

        /// Write the final world state as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print a summary of the stored brain
    Show,

    /// Delete the stored brain
    Discard,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    log::init(cli.verbose, cli.log_file.as_deref()).context("opening log file")?;

    let config = match &cli.config {
        Some(path) => SimConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    let mut store = open_store(&cli, &config.store_key)?;

    match cli.command {
        Commands::Run {
            map,
            ticks,
            epochs,
            save_best,
            snapshot,
        } => {
            let obstacles = match map {
                Some(path) => load_map(&path).with_context(|| format!("loading map {}", path.display()))?,
                None => Vec::new(),
            };
            run(config, obstacles, store.as_mut(), ticks, epochs, save_best, snapshot)?;
        }
        Commands::Show => match store.load()? {
            Some(brain) => println!(
                "stored brain: {} inputs, {} hidden, {} outputs, {} parameters",
                brain.input_size(),
                brain.hidden_size(),
                brain.output_size(),
                brain.parameter_count()
            ),
            None => println!("no stored brain under key {}", config.store_key),
        },
        Commands::Discard => {
            store.clear()?;
            println!("discarded brain under key {}", config.store_key);
        }
    }
    Ok(())
}

fn open_store(cli: &Cli, key: &str) -> Result<Box<dyn BrainStore>> {
    match &cli.json_dir {
        Some(dir) => Ok(Box::new(JsonFileStore::new(dir, key))),
        None => {
            let store = SqliteStore::open(&cli.store, key)
                .with_context(|| format!("opening store {}", cli.store.display()))?;
            Ok(Box::new(store))
        }
    }
}

fn run(
    config: SimConfig,
    obstacles: Vec<ai_rover::Obstacle>,
    store: &mut dyn BrainStore,
    ticks: u64,
    epochs: u32,
    save_best: bool,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    let mut sim = Simulation::bootstrap(config, obstacles, store)?;

    for epoch in 0..epochs {
        for _ in 0..ticks {
            sim.step();
            if sim.population().damaged_count() == sim.population().len() {
                break;
            }
        }

        let population = sim.population();
        let step = u64::from(epoch);
        if let Some(champion) = population.champion() {
            info!(
                epoch,
                ticks = sim.tick_count(),
                champion = champion.index,
                displacement = champion.displacement,
                damaged = population.damaged_count(),
                "epoch finished"
            );
            log::scalar(step, "champion_displacement", champion.displacement);
        }
        log::scalar(
            step,
            "damaged_fraction",
            population.damaged_count() as f64 / population.len() as f64,
        );

        if save_best {
            sim.save_best(store)?;
        }
        if epoch + 1 < epochs {
            sim.restart(store);
        }
    }

    if let Some(path) = snapshot {
        let json = serde_json::to_string_pretty(&sim.snapshot())?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "snapshot written");
    }
    Ok(())
}
