//! Simulation state and the published snapshot
//!
//! One [`Simulation`] owns everything a run needs. Nothing else mutates it;
//! renderers and UI read [`SimulationSnapshot`] values taken at tick end.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bike::{BikeMode, BikeState};
use super::mode::{GameMode, ModeKind};
use super::obstacle::{ObstacleField, ObstacleKind};
use super::scoring::ScoreState;
use super::world::WorldStream;
use crate::consts::DEFAULT_SEED;
use crate::tuning::{Difficulty, Tuning};

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Bike crashed, waiting for reset
    GameOver,
}

/// One live chunk as seen by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChunkView {
    pub index: u64,
    pub start: f32,
    pub end: f32,
}

/// One obstacle inside a live chunk
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleView {
    /// Arena slot, stable while the obstacle exists
    pub id: u32,
    pub kind: ObstacleKind,
    pub lateral: f32,
    pub along: f32,
    pub yaw: f32,
    pub active: bool,
}

/// Immutable view of the simulation at the end of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub phase: RunPhase,
    pub mode: BikeMode,
    pub game_mode: ModeKind,

    // Bike transform
    pub distance: f32,
    pub lateral_position: f32,
    pub lateral_velocity: f32,
    pub heading: f32,
    pub roll: f32,
    pub speed: f32,
    pub speed_kmh: f32,
    pub wheelie_angle: f32,
    pub wheelie_angular_velocity: f32,
    pub wheelie_percentage: f64,

    // World
    pub chunks: Vec<ChunkView>,
    pub obstacles: Vec<ObstacleView>,

    // Score
    pub score: f64,
    pub angle_multiplier: f64,
    pub time_multiplier: f64,
    pub speed_multiplier: f64,
    pub combined_multiplier: f64,
    pub sustained_wheelie_time: f64,

    pub crashed: bool,
}

/// Owner of all run state
#[derive(Debug, Clone)]
pub struct Simulation<R: Rng = Pcg32> {
    pub(crate) tuning: Tuning,
    pub(crate) difficulty: Difficulty,
    pub(crate) mode: GameMode,
    pub(crate) phase: RunPhase,
    pub(crate) bike: BikeState,
    pub(crate) world: WorldStream,
    pub(crate) obstacles: ObstacleField,
    pub(crate) score: ScoreState,
    pub(crate) rng: R,
    /// Simulation tick counter
    pub(crate) time_ticks: u64,
}

impl Simulation<Pcg32> {
    /// Default tuning, normal difficulty, linear mode
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default(), Difficulty::Normal, ModeKind::Linear)
    }

    pub fn with_tuning(seed: u64, tuning: Tuning, difficulty: Difficulty, mode: ModeKind) -> Self {
        Self::with_rng(Pcg32::seed_from_u64(seed), tuning, difficulty, mode)
    }

    /// Reseed and reset; two restarts with the same seed replay identically
    pub fn restart(&mut self, seed: u64, difficulty: Difficulty, mode: ModeKind) {
        self.rng = Pcg32::seed_from_u64(seed);
        self.reset(difficulty, mode);
    }
}

impl Default for Simulation<Pcg32> {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl<R: Rng> Simulation<R> {
    /// Build a simulation around an injected random source
    pub fn with_rng(rng: R, tuning: Tuning, difficulty: Difficulty, mode: ModeKind) -> Self {
        let world = WorldStream::new(&tuning);
        Self {
            bike: BikeState::new(&tuning),
            world,
            obstacles: ObstacleField::new(),
            score: ScoreState::default(),
            mode: GameMode::fresh(mode),
            phase: RunPhase::Playing,
            time_ticks: 0,
            tuning,
            difficulty,
            rng,
        }
    }

    /// Reinitialise all owned state. The random source carries on.
    pub fn reset(&mut self, difficulty: Difficulty, mode: ModeKind) {
        self.difficulty = difficulty;
        self.mode = GameMode::fresh(mode);
        self.phase = RunPhase::Playing;
        self.bike = BikeState::new(&self.tuning);
        self.world = WorldStream::new(&self.tuning);
        self.obstacles.clear();
        self.score = ScoreState::default();
        self.time_ticks = 0;
        log::info!(
            "Run reset: difficulty {}, mode {}",
            difficulty.as_str(),
            mode.as_str()
        );
    }

    /// Swap tuning; takes effect from a fresh run
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.reset(self.difficulty, self.mode.kind());
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.phase = match (self.phase, paused) {
            (RunPhase::Playing, true) => RunPhase::Paused,
            (RunPhase::Paused, false) => RunPhase::Playing,
            (phase, _) => phase,
        };
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(self.phase == RunPhase::Playing);
    }

    pub(crate) fn end_run(&mut self, cause: &str) {
        self.phase = RunPhase::GameOver;
        log::info!(
            "Game over ({}) after {} ticks: distance {:.1}, score {:.1}",
            cause,
            self.time_ticks,
            self.bike.distance,
            self.score.score
        );
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == RunPhase::GameOver
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn bike(&self) -> &BikeState {
        &self.bike
    }

    pub fn world(&self) -> &WorldStream {
        &self.world
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Capture the current state for external observers
    pub fn snapshot(&self) -> SimulationSnapshot {
        let bike = &self.bike;
        let chunks = self
            .world
            .chunks()
            .map(|c| ChunkView {
                index: c.index,
                start: c.start,
                end: c.end(),
            })
            .collect();
        let obstacles = self
            .world
            .chunks()
            .flat_map(|c| c.obstacles.iter())
            .filter_map(|&h| {
                self.obstacles.get(h).map(|o| ObstacleView {
                    id: h.index(),
                    kind: o.kind,
                    lateral: o.pos.x,
                    along: o.pos.y,
                    yaw: o.yaw,
                    active: o.active,
                })
            })
            .collect();

        SimulationSnapshot {
            tick: self.time_ticks,
            phase: self.phase,
            mode: bike.mode(),
            game_mode: self.mode.kind(),
            distance: bike.distance,
            lateral_position: bike.lateral_position,
            lateral_velocity: bike.lateral_velocity,
            heading: self.mode.heading(),
            roll: bike.roll(),
            speed: bike.speed,
            speed_kmh: bike.speed_kmh(),
            wheelie_angle: bike.wheelie_angle,
            wheelie_angular_velocity: bike.wheelie_angular_velocity,
            wheelie_percentage: ScoreState::wheelie_percentage(
                bike.wheelie_angle,
                self.tuning.max_angle,
            ),
            chunks,
            obstacles,
            score: self.score.score,
            angle_multiplier: self.score.angle_multiplier,
            time_multiplier: self.score.time_multiplier,
            speed_multiplier: self.score.speed_multiplier,
            combined_multiplier: self.score.combined_multiplier(),
            sustained_wheelie_time: self.score.sustained_wheelie_time,
            crashed: bike.is_crashed(),
        }
    }
}
