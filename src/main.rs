#![warn(non_snake_case)]
//! # citygen
//!
//! Runs one generation pass and prints every placement as JSON.
//!
//! ```text
//! citygen [CONFIG.json] [--seed N]
//! ```
//!
//! Without a config file the built-in defaults are used. Set `RUST_LOG=debug`
//! to follow the partitioner and the grammar.

use city_grammar::{CityGenerator, GeneratorConfig, PassStats, PlacedUnit, RecordingSink};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, Box<dyn Error>> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                parsed.seed = Some(value.parse::<u64>()?);
            }
            "-h" | "--help" => {
                println!("usage: citygen [CONFIG.json] [--seed N]");
                std::process::exit(0);
            }
            _ if parsed.config.is_none() && !arg.starts_with("--") => {
                parsed.config = Some(PathBuf::from(arg));
            }
            _ => return Err(format!("unexpected argument '{}'", arg).into()),
        }
    }
    Ok(parsed)
}

#[derive(Serialize)]
struct Output<'a> {
    seed: u64,
    stats: PassStats,
    placements: &'a [PlacedUnit],
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = parse_args(std::env::args().skip(1))?;

    let mut config = match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            GeneratorConfig::from_path(path)?
        }
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut generator = CityGenerator::new(config)?;
    let mut sink = RecordingSink::new();
    let stats = generator.generate(&mut sink)?;
    info!(
        "seed {}: {} plots, {} buildings, {} roads, {} placements, {} overlay tiles",
        generator.config().seed,
        stats.plots,
        stats.buildings,
        stats.roads,
        stats.placements,
        stats.overlay_tiles
    );

    let output = Output { seed: generator.config().seed, stats, placements: &sink.placed };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
