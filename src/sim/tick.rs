//! Fixed timestep simulation tick
//!
//! Core game loop that advances the run deterministically. Within one tick the
//! order is fixed: dynamics, streaming, collisions, scoring.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bike::BikeMode;
use super::collision::CollisionOutcome;
use super::state::{RunPhase, Simulation, SimulationSnapshot};
use crate::consts::MAX_FRAME_DT;

/// Analog inputs at or below this count as released
pub const INPUT_DEADZONE: f32 = 0.05;

/// Input intent for a single tick (deterministic)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputIntent {
    /// -1 full left .. 1 full right
    pub steer: f32,
    /// 0..=1
    pub throttle: f32,
    /// 0..=1
    pub brake: f32,
    /// Wheelie assist held
    pub wheelie: bool,
    /// Pause toggle
    pub pause: bool,
}

impl InputIntent {
    /// Digital keyboard mapping
    pub fn from_keys(left: bool, right: bool, up: bool, down: bool, wheelie: bool) -> Self {
        let steer = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        Self {
            steer,
            throttle: if up { 1.0 } else { 0.0 },
            brake: if down { 1.0 } else { 0.0 },
            wheelie,
            pause: false,
        }
    }

    /// Clamp every axis into range; NaN reads as released
    pub fn sanitized(&self) -> Self {
        fn axis(v: f32, lo: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(lo, 1.0) }
        }
        Self {
            steer: axis(self.steer, -1.0),
            throttle: axis(self.throttle, 0.0),
            brake: axis(self.brake, 0.0),
            ..*self
        }
    }

    #[inline]
    pub fn throttle_active(&self) -> bool {
        self.throttle > INPUT_DEADZONE
    }

    #[inline]
    pub fn braking(&self) -> bool {
        self.brake > INPUT_DEADZONE
    }
}

impl<R: Rng> Simulation<R> {
    /// Advance the run by one fixed timestep and publish the result
    pub fn tick(&mut self, input: &InputIntent, dt: f32) -> SimulationSnapshot {
        let input = input.sanitized();
        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };

        if input.pause {
            self.toggle_pause();
        }
        // Don't tick if paused or game over
        if self.phase != RunPhase::Playing {
            return self.snapshot();
        }

        self.time_ticks += 1;

        // Dynamics
        let step = self.bike.step(&input, &mut self.mode, &self.tuning, dt);
        if step.crashed {
            self.end_run("wheelie overflow");
            return self.snapshot();
        }

        // Streaming
        self.world.ensure_streamed(
            self.bike.distance,
            &mut self.obstacles,
            self.difficulty,
            &self.tuning,
            &mut self.rng,
        );

        // Collisions
        for event in self.obstacles.check_collisions(&self.bike, &self.tuning) {
            match event.outcome {
                CollisionOutcome::Cleared => self.bike.land(),
                CollisionOutcome::Hit => {
                    if self.bike.register_hit(&self.tuning) == BikeMode::Crashed {
                        self.end_run("obstacle hit");
                        return self.snapshot();
                    }
                    log::debug!("Skidding after hit at {:.1}", self.bike.distance);
                }
            }
        }

        // Amortized cleanup
        if self.time_ticks % u64::from(self.tuning.sweep_interval_ticks.max(1)) == 0 {
            self.obstacles
                .sweep(self.bike.distance, self.tuning.cleanup_distance);
        }

        // Scoring
        self.score.accrue(
            self.bike.wheelie_angle,
            self.bike.speed_kmh(),
            self.difficulty,
            &self.tuning,
            dt,
        );

        self.debug_check_invariants();
        self.snapshot()
    }

    fn debug_check_invariants(&self) {
        let t = &self.tuning;
        let bike = &self.bike;
        debug_assert!(
            (0.0..=t.max_angle).contains(&bike.wheelie_angle),
            "wheelie angle {} out of range",
            bike.wheelie_angle
        );
        debug_assert!(
            (t.min_speed..=t.max_speed).contains(&bike.speed),
            "speed {} out of range",
            bike.speed
        );
        debug_assert!(
            bike.lateral_velocity.abs() <= t.max_lateral_speed,
            "lateral velocity {} out of range",
            bike.lateral_velocity
        );
        debug_assert!(self.world.is_contiguous(), "chunk window lost contiguity");
        debug_assert!(self.world.len() <= t.max_live_chunks as usize);
    }
}
