//! Score accrual
//!
//! Score grows with time spent at speed, multiplied by how high the front is,
//! how long a high wheelie has been held, how fast the bike is going and the
//! difficulty. Score never decreases during a run.

use serde::{Deserialize, Serialize};

use crate::tuning::{Difficulty, Tuning};

/// Fraction of `max_angle` above which the sustain clock runs
pub const SUSTAIN_BAND_RATIO: f32 = 0.5;
/// Time multiplier as soon as the sustain clock starts
pub const TIME_MULTIPLIER_START: f64 = 2.0;
/// Extra time multiplier gained over one ramp period
pub const TIME_MULTIPLIER_RAMP: f64 = 3.0;
/// Seconds of sustained wheelie for one full ramp
pub const SUSTAIN_RAMP_SECONDS: f64 = 30.0;
pub const TIME_MULTIPLIER_CAP: f64 = 5.0;

/// Running score and its multipliers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: f64,
    /// 1.0 level, 2.0 at max angle
    pub angle_multiplier: f64,
    /// Seconds continuously above the sustain band
    pub sustained_wheelie_time: f64,
    /// 1.0 outside the band, 2.0..=5.0 inside it
    pub time_multiplier: f64,
    /// 1.0 at the activity threshold up to the configured max
    pub speed_multiplier: f64,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            score: 0.0,
            angle_multiplier: 1.0,
            sustained_wheelie_time: 0.0,
            time_multiplier: 1.0,
            speed_multiplier: 1.0,
        }
    }
}

impl ScoreState {
    pub fn combined_multiplier(&self) -> f64 {
        self.angle_multiplier * self.time_multiplier
    }

    /// Wheelie height as a percentage of the crash angle
    pub fn wheelie_percentage(angle: f32, max_angle: f32) -> f64 {
        (angle / max_angle).clamp(0.0, 1.0) as f64 * 100.0
    }

    /// Accrue one tick; returns the increment (0 below the activity threshold)
    pub fn accrue(
        &mut self,
        angle: f32,
        speed_kmh: f32,
        difficulty: Difficulty,
        tuning: &Tuning,
        dt: f32,
    ) -> f64 {
        if speed_kmh <= tuning.activity_threshold_kmh {
            return 0.0;
        }
        let dt = dt as f64;

        self.angle_multiplier = 1.0 + Self::wheelie_percentage(angle, tuning.max_angle) / 100.0;

        if angle > SUSTAIN_BAND_RATIO * tuning.max_angle {
            self.sustained_wheelie_time += dt;
            self.time_multiplier = (TIME_MULTIPLIER_START
                + (self.sustained_wheelie_time / SUSTAIN_RAMP_SECONDS) * TIME_MULTIPLIER_RAMP)
                .min(TIME_MULTIPLIER_CAP);
        } else {
            // No grace period
            self.sustained_wheelie_time = 0.0;
            self.time_multiplier = 1.0;
        }

        let span = (tuning.speed_cap_kmh - tuning.activity_threshold_kmh) as f64;
        let t = ((speed_kmh - tuning.activity_threshold_kmh) as f64 / span).clamp(0.0, 1.0);
        self.speed_multiplier = 1.0 + t * (tuning.speed_multiplier_max as f64 - 1.0);

        let increment = dt
            * self.angle_multiplier
            * self.time_multiplier
            * self.speed_multiplier
            * difficulty.score_multiplier();
        self.score += increment;
        increment
    }
}
