//! Fixed-step driver
//!
//! Converts variable frame deltas into whole simulation ticks, and runs
//! complete headless sessions with the autopilot at the controls.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::sim::{BikeMode, ModeKind, Simulation, SimulationSnapshot, autopilot_input};
use crate::tuning::{Difficulty, Tuning};

/// Shortest frame delta a headless run accepts
pub const MIN_FRAME_DT: f32 = 1.0e-4;

/// Frame-time accumulator feeding the fixed timestep
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame's elapsed time; returns how many ticks to run now.
    ///
    /// Long frames are capped so a stall can't spiral into ever more substeps.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog rather than carry it into the next frame
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Fraction of a tick left over, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Parameters for a headless session
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: u64,
    pub difficulty: Difficulty,
    pub mode: ModeKind,
    /// Simulated seconds to run unless the bike crashes first
    pub seconds: f32,
    /// Wall-clock frame delta fed to the stepper
    pub frame_dt: f32,
    pub tuning: Tuning,
    /// Include the final snapshot in the summary
    pub keep_snapshot: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: crate::consts::DEFAULT_SEED,
            difficulty: Difficulty::Normal,
            mode: ModeKind::Linear,
            seconds: 60.0,
            frame_dt: SIM_DT,
            tuning: Tuning::default(),
            keep_snapshot: false,
        }
    }
}

/// Outcome of a headless session
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub difficulty: &'static str,
    pub mode: &'static str,
    pub ticks: u64,
    pub frames: u64,
    pub seconds: f64,
    pub distance: f32,
    pub score: f64,
    pub peak_speed_kmh: f32,
    pub peak_wheelie_angle: f32,
    pub peak_combined_multiplier: f64,
    /// Seconds spent with the front up
    pub wheelie_seconds: f64,
    /// Survivable hits taken
    pub skids: u32,
    pub crashed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_snapshot: Option<SimulationSnapshot>,
}

/// Run one autopilot session to completion
pub fn run_headless(config: &RunConfig) -> Result<RunSummary> {
    if !config.seconds.is_finite() || config.seconds <= 0.0 {
        bail!("seconds must be > 0 (got {})", config.seconds);
    }
    if !(MIN_FRAME_DT..=MAX_FRAME_DT).contains(&config.frame_dt) {
        bail!(
            "frame_dt must be within [{MIN_FRAME_DT}, {MAX_FRAME_DT}] (got {})",
            config.frame_dt
        );
    }
    config
        .tuning
        .validate()
        .context("tuning rejected before run")?;

    let max_ticks = (config.seconds / SIM_DT).round() as u64;
    let mut sim = Simulation::with_tuning(
        config.seed,
        config.tuning.clone(),
        config.difficulty,
        config.mode,
    );
    let mut stepper = FixedStepper::new();

    let mut frames = 0u64;
    let mut peak_speed_kmh: f32 = 0.0;
    let mut peak_wheelie_angle: f32 = 0.0;
    let mut peak_combined_multiplier: f64 = 1.0;
    let mut wheelie_ticks = 0u64;
    let mut skids = 0u32;
    let mut last_mode = BikeMode::Grounded;
    let mut snapshot = sim.snapshot();

    log::info!(
        "Headless run: seed {:#x}, {} / {}, {} ticks",
        config.seed,
        config.difficulty.as_str(),
        config.mode.as_str(),
        max_ticks
    );

    'frames: while sim.time_ticks() < max_ticks {
        frames += 1;
        for _ in 0..stepper.advance(config.frame_dt) {
            let input = autopilot_input(&sim);
            snapshot = sim.tick(&input, SIM_DT);

            peak_speed_kmh = peak_speed_kmh.max(snapshot.speed_kmh);
            peak_wheelie_angle = peak_wheelie_angle.max(snapshot.wheelie_angle);
            peak_combined_multiplier = peak_combined_multiplier.max(snapshot.combined_multiplier);
            if snapshot.mode == BikeMode::Wheelie {
                wheelie_ticks += 1;
            }
            if snapshot.mode == BikeMode::Skidding && last_mode != BikeMode::Skidding {
                skids += 1;
            }
            last_mode = snapshot.mode;

            if snapshot.crashed || sim.time_ticks() >= max_ticks {
                break 'frames;
            }
        }
    }

    log::info!(
        "Run finished after {} ticks: distance {:.1}, score {:.1}, crashed {}",
        snapshot.tick,
        snapshot.distance,
        snapshot.score,
        snapshot.crashed
    );

    Ok(RunSummary {
        seed: config.seed,
        difficulty: config.difficulty.as_str(),
        mode: config.mode.as_str(),
        ticks: snapshot.tick,
        frames,
        seconds: snapshot.tick as f64 * SIM_DT as f64,
        distance: snapshot.distance,
        score: snapshot.score,
        peak_speed_kmh,
        peak_wheelie_angle,
        peak_combined_multiplier,
        wheelie_seconds: wheelie_ticks as f64 * SIM_DT as f64,
        skids,
        crashed: snapshot.crashed,
        final_snapshot: config.keep_snapshot.then_some(snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepper_runs_whole_ticks() {
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(SIM_DT * 0.5), 0);
        assert!(stepper.alpha() > 0.4 && stepper.alpha() < 0.6);
        assert_eq!(stepper.advance(SIM_DT * 0.5), 1);
        assert_eq!(stepper.advance(SIM_DT * 3.0 + SIM_DT * 0.01), 3);
    }

    #[test]
    fn test_stepper_caps_long_frames() {
        let mut stepper = FixedStepper::new();
        let ticks = stepper.advance(5.0);
        assert!(ticks <= MAX_SUBSTEPS);
        assert!(stepper.alpha() <= 1.0);
        assert_eq!(stepper.advance(f32::NAN), 0);
        stepper.reset();
        assert_eq!(stepper.alpha(), 0.0);
    }

    #[test]
    fn test_run_headless_is_reproducible() {
        let config = RunConfig {
            seed: 2024,
            seconds: 20.0,
            frame_dt: 1.0 / 30.0,
            keep_snapshot: true,
            ..Default::default()
        };
        let a = run_headless(&config).unwrap();
        let b = run_headless(&config).unwrap();
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.final_snapshot, b.final_snapshot);
        assert!(a.ticks <= 20 * 60);
        assert!(a.distance > 0.0);
    }

    #[test]
    fn test_run_headless_rejects_bad_config() {
        let bad_seconds = RunConfig {
            seconds: 0.0,
            ..Default::default()
        };
        assert!(run_headless(&bad_seconds).is_err());

        let bad_tuning = RunConfig {
            tuning: Tuning {
                chunk_length: -1.0,
                ..Tuning::default()
            },
            ..Default::default()
        };
        assert!(run_headless(&bad_tuning).is_err());
    }

    #[test]
    fn test_summary_serializes_without_snapshot() {
        let summary = run_headless(&RunConfig {
            seconds: 1.0,
            ..Default::default()
        })
        .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("final_snapshot").is_none());
        assert_eq!(json["difficulty"], "Normal");
    }
}
