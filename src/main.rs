//! Wheelie Rush headless runner
//!
//! Runs the simulation with the autopilot riding and prints a JSON summary.
//!
//! Usage:
//!   wheelie-rush --seed 42 --difficulty hard --seconds 120
//!   RUST_LOG=debug wheelie-rush --mode free-roam --tuning tuning.json --snapshot

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use wheelie_rush::consts::{DEFAULT_SEED, SIM_DT};
use wheelie_rush::runner::{RunConfig, run_headless};
use wheelie_rush::sim::ModeKind;
use wheelie_rush::{Difficulty, Tuning};

#[derive(Parser)]
#[command(name = "wheelie-rush")]
#[command(about = "Run a headless Wheelie Rush session driven by the autopilot")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// easy, normal or hard
    #[arg(long, default_value = "normal")]
    difficulty: String,
    /// linear or free-roam
    #[arg(long, default_value = "linear")]
    mode: String,
    /// Simulated seconds to run unless the bike crashes first
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,
    /// Frame delta fed to the fixed-step accumulator
    #[arg(long, default_value_t = SIM_DT)]
    frame_dt: f32,
    /// JSON tuning override (missing fields keep their defaults)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Include the final simulation snapshot in the output
    #[arg(long)]
    snapshot: bool,
    /// Print the effective tuning as JSON and exit
    #[arg(long)]
    dump_tuning: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let difficulty = Difficulty::from_name(&args.difficulty)
        .ok_or_else(|| anyhow!("unknown difficulty '{}'", args.difficulty))?;
    let mode =
        ModeKind::from_name(&args.mode).ok_or_else(|| anyhow!("unknown mode '{}'", args.mode))?;
    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("failed to load tuning from {}", path.display()))?,
        None => Tuning::default(),
    };

    if args.dump_tuning {
        println!("{}", tuning.to_json()?);
        return Ok(());
    }

    log::info!("Wheelie Rush (headless) starting...");
    let summary = run_headless(&RunConfig {
        seed: args.seed,
        difficulty,
        mode,
        seconds: args.seconds,
        frame_dt: args.frame_dt,
        tuning,
        keep_snapshot: args.snapshot,
    })?;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("failed to encode run summary")?
    );
    Ok(())
}
