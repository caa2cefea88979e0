//! Wheelie Rush - endless-runner wheelie simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bike dynamics, world streaming, obstacles, scoring)
//! - `tuning`: Data-driven game balance
//! - `runner`: Fixed-step driver for headless runs
//!
//! Rendering, input capture, persistence and networking live outside this crate;
//! they consume [`sim::SimulationSnapshot`] values produced once per tick.

pub mod runner;
pub mod sim;
pub mod tuning;

pub use sim::{InputIntent, Simulation, SimulationSnapshot};
pub use tuning::{Difficulty, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, tuning values assume this rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Display conversion: one world unit per tick reads as 50 km/h
    pub const KMH_PER_UNIT: f32 = 50.0;

    /// Seed used when none is supplied
    pub const DEFAULT_SEED: u64 = 0x5EED_B1CE;
}

/// Convert a per-tick speed to the km/h readout used by speed bands
#[inline]
pub fn speed_to_kmh(speed: f32) -> f32 {
    speed * consts::KMH_PER_UNIT
}

/// Convert a km/h readout back to a per-tick speed
#[inline]
pub fn kmh_to_speed(kmh: f32) -> f32 {
    kmh / consts::KMH_PER_UNIT
}
