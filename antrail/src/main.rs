use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use antrail::simulation::{UNKNOWN_PATH, UNREACHABLE};
use antrail::{World, load_config};

/// Command-line arguments for antrail.
#[derive(Parser)]
#[command(name = "antrail", version, about = "Headless ant foraging simulation")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of steps to run.
    #[arg(short, long, default_value_t = 1000)]
    steps: u64,

    /// Log a census every this many steps (0 disables it).
    #[arg(short, long, default_value_t = 100)]
    report_every: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    info!(?config, "Starting simulation");
    let mut world = World::new(&config);

    for step in 1..=cli.steps {
        if !world.step() {
            break;
        }
        if cli.report_every > 0 && step % cli.report_every == 0 {
            info!(step, census = %world.census(), "Progress");
        }
    }

    summarize(&world);
    Ok(())
}

/// Compare the best trips the ants found against the reference paths.
fn summarize(world: &World) {
    info!(ticks = world.tick(), census = %world.census(), "Finished");

    let reference = world.reference_shortest_paths();
    for (i, food) in world.food_coordinates().iter().enumerate() {
        let best = world
            .best_known_paths()
            .get(food)
            .copied()
            .filter(|&p| p != UNKNOWN_PATH);
        let shortest = reference.get(i).copied().filter(|&p| p != UNREACHABLE);
        match (best, shortest) {
            (Some(best), Some(shortest)) => {
                info!(%food, best, shortest, excess = i64::from(best) - i64::from(shortest), "Path")
            }
            (Some(best), None) => info!(%food, best, "Path"),
            (None, Some(shortest)) => info!(%food, shortest, "Path not found by ants yet"),
            (None, None) => info!(%food, "Path not found by ants yet"),
        }
    }
}
