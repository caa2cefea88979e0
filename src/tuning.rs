//! Game balance: tunable constants and difficulty presets
//!
//! Every number the simulation reads lives in [`Tuning`]. Defaults reproduce the
//! shipped game; a JSON file can override any subset of fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::tiers::TierTable;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Obstacle slots rolled for each new chunk
    pub fn obstacles_per_chunk(&self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Normal => 4,
            Difficulty::Hard => 5,
        }
    }

    /// Chance that a rolled slot actually places an obstacle
    pub fn spawn_probability(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.6,
            Difficulty::Normal => 0.9,
            Difficulty::Hard => 1.0,
        }
    }

    /// Flat score multiplier
    pub fn score_multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// Errors raised while loading or validating tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunable constants
///
/// Speeds are world units per tick, angles are radians, per-tick factors assume
/// the fixed 60 Hz step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Corridor ===
    /// Bike lateral clamp (half the usable lane)
    pub lane_half_width: f32,
    /// Obstacles spawn within ± this lateral offset
    pub obstacle_lateral_spread: f32,

    // === Longitudinal ===
    pub max_speed: f32,
    pub min_speed: f32,
    pub base_acceleration: f32,
    /// Coast-down per tick when neither throttle nor brake is held
    pub deceleration: f32,
    pub brake_force: f32,
    /// Acceleration factor by speed (aerodynamic drag)
    pub accel_tiers: TierTable,
    /// Brake factor by speed (tire grip loss)
    pub brake_tiers: TierTable,

    // === Lateral ===
    pub lateral_accel: f32,
    /// Per-tick velocity retention
    pub lateral_friction: f32,
    pub max_lateral_speed: f32,

    // === Wheelie ===
    /// Lift per tick by speed (stopped / normal / fast)
    pub lift_tiers: TierTable,
    /// Lift removed per tick while braking
    pub brake_lift_penalty: f32,
    pub gravity: f32,
    /// Per-tick angular velocity retention
    pub angular_damping: f32,
    pub balance_point: f32,
    pub sweet_spot_width: f32,
    /// Lift factor inside the sweet spot
    pub sweet_spot_damping: f32,
    /// Crash threshold
    pub max_angle: f32,
    /// Angle (fraction of `max_angle`) above which an obstacle is wheelied over
    pub safe_clearance_ratio: f32,

    // === Skid ===
    /// Seconds of reduced control after a survivable hit
    pub skid_duration: f32,
    /// Per-tick speed retention while skidding
    pub skid_speed_decay: f32,

    // === Free roam ===
    /// Heading change per tick at full steer (radians)
    pub free_roam_turn_rate: f32,
    pub free_roam_max_heading: f32,
    /// Per-tick heading retention with no steer input
    pub free_roam_recenter: f32,
    pub free_roam_half_width: f32,

    // === World streaming ===
    pub chunk_length: f32,
    /// Along-axis start of the first chunk
    pub chunk_origin: f32,
    pub initial_chunks: u32,
    pub max_live_chunks: u32,
    /// Stream a new chunk once the last chunk's far edge is closer than this
    pub lookahead_threshold: f32,

    // === Obstacles ===
    /// Minimum along-axis gap between obstacles of one chunk
    pub min_obstacle_gap: f32,
    /// Inactive obstacles this far behind the bike are purged
    pub cleanup_distance: f32,
    pub sweep_interval_ticks: u32,

    // === Bike footprint ===
    pub bike_half_width: f32,
    pub bike_front_reach: f32,
    pub bike_rear_reach: f32,
    /// Footprint shrink on every side before testing
    pub collision_shrink: f32,

    // === Scoring ===
    /// No score accrues at or below this speed
    pub activity_threshold_kmh: f32,
    /// Speed at which the speed multiplier tops out
    pub speed_cap_kmh: f32,
    pub speed_multiplier_max: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lane_half_width: 9.0,
            obstacle_lateral_spread: 7.0,

            max_speed: 2.8,
            min_speed: 0.0,
            base_acceleration: 0.006,
            deceleration: 0.005,
            brake_force: 0.03,
            accel_tiers: TierTable::new(
                1.0,
                &[(60.0, 0.85), (80.0, 0.7), (100.0, 0.5), (120.0, 0.3), (130.0, 0.15)],
            ),
            brake_tiers: TierTable::new(1.0, &[(100.0, 0.75), (120.0, 0.5)]),

            lateral_accel: 0.05,
            lateral_friction: 0.92,
            max_lateral_speed: 0.7,

            lift_tiers: TierTable::new(0.004, &[(0.0, 0.008), (110.0, 0.012)]),
            brake_lift_penalty: 0.016,
            gravity: 0.0015,
            angular_damping: 0.98,
            balance_point: 1.2,
            sweet_spot_width: 0.2,
            sweet_spot_damping: 0.5,
            max_angle: 1.6,
            safe_clearance_ratio: 0.2,

            skid_duration: 1.0,
            skid_speed_decay: 0.96,

            free_roam_turn_rate: 0.03,
            free_roam_max_heading: 0.6,
            free_roam_recenter: 0.95,
            free_roam_half_width: 30.0,

            chunk_length: 100.0,
            chunk_origin: -50.0,
            initial_chunks: 4,
            max_live_chunks: 6,
            lookahead_threshold: 100.0,

            min_obstacle_gap: 12.0,
            cleanup_distance: 150.0,
            sweep_interval_ticks: 30,

            bike_half_width: 0.95,
            bike_front_reach: 4.0,
            bike_rear_reach: 0.8,
            collision_shrink: 0.4,

            activity_threshold_kmh: 10.0,
            speed_cap_kmh: 140.0,
            speed_multiplier_max: 1.3,
        }
    }
}

fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), TuningError> {
    if ok {
        Ok(())
    } else {
        Err(TuningError::Invalid { field, reason })
    }
}

impl Tuning {
    /// Parse and validate a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TuningError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning = Self::from_json(&json).inspect_err(|e| {
            log::warn!("Rejected tuning file {}: {}", path.display(), e);
        })?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Wheelie angle at which an obstacle is cleared instead of hit
    pub fn safe_clearance_angle(&self) -> f32 {
        self.max_angle * self.safe_clearance_ratio
    }

    /// Check the constraints the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let retention = |v: f32| v.is_finite() && v > 0.0 && v <= 1.0;

        check(positive(self.lane_half_width), "lane_half_width", "must be positive")?;
        check(
            self.obstacle_lateral_spread.is_finite() && self.obstacle_lateral_spread >= 0.0,
            "obstacle_lateral_spread",
            "must be non-negative",
        )?;

        check(
            self.min_speed.is_finite() && self.min_speed >= 0.0,
            "min_speed",
            "must be non-negative",
        )?;
        check(
            self.max_speed.is_finite() && self.max_speed > self.min_speed,
            "max_speed",
            "must exceed min_speed",
        )?;
        check(positive(self.base_acceleration), "base_acceleration", "must be positive")?;
        check(positive(self.deceleration), "deceleration", "must be positive")?;
        check(positive(self.brake_force), "brake_force", "must be positive")?;
        check(self.accel_tiers.is_ordered(), "accel_tiers", "thresholds must increase")?;
        check(
            self.accel_tiers.is_non_increasing(),
            "accel_tiers",
            "factors must not grow with speed",
        )?;
        check(self.brake_tiers.is_ordered(), "brake_tiers", "thresholds must increase")?;
        check(
            self.brake_tiers.is_non_increasing(),
            "brake_tiers",
            "factors must not grow with speed",
        )?;

        check(positive(self.lateral_accel), "lateral_accel", "must be positive")?;
        check(retention(self.lateral_friction), "lateral_friction", "must be in (0, 1]")?;
        check(positive(self.max_lateral_speed), "max_lateral_speed", "must be positive")?;

        check(self.lift_tiers.is_ordered(), "lift_tiers", "thresholds must increase")?;
        check(positive(self.gravity), "gravity", "must be positive")?;
        check(retention(self.angular_damping), "angular_damping", "must be in (0, 1]")?;
        check(positive(self.max_angle), "max_angle", "must be positive")?;
        check(
            positive(self.balance_point) && self.balance_point < self.max_angle,
            "balance_point",
            "must lie between 0 and max_angle",
        )?;
        check(
            self.sweet_spot_width.is_finite() && self.sweet_spot_width >= 0.0,
            "sweet_spot_width",
            "must be non-negative",
        )?;
        check(retention(self.sweet_spot_damping), "sweet_spot_damping", "must be in (0, 1]")?;
        check(
            self.safe_clearance_ratio.is_finite()
                && (0.0..1.0).contains(&self.safe_clearance_ratio),
            "safe_clearance_ratio",
            "must be in [0, 1)",
        )?;

        check(positive(self.skid_duration), "skid_duration", "must be positive")?;
        check(retention(self.skid_speed_decay), "skid_speed_decay", "must be in (0, 1]")?;

        check(positive(self.free_roam_turn_rate), "free_roam_turn_rate", "must be positive")?;
        check(
            positive(self.free_roam_max_heading)
                && self.free_roam_max_heading < std::f32::consts::FRAC_PI_2,
            "free_roam_max_heading",
            "must be below a right angle",
        )?;
        check(retention(self.free_roam_recenter), "free_roam_recenter", "must be in (0, 1]")?;
        check(positive(self.free_roam_half_width), "free_roam_half_width", "must be positive")?;

        check(positive(self.chunk_length), "chunk_length", "must be positive")?;
        check(self.chunk_origin.is_finite(), "chunk_origin", "must be finite")?;
        check(self.initial_chunks >= 1, "initial_chunks", "must be at least 1")?;
        check(
            self.max_live_chunks >= self.initial_chunks.max(2),
            "max_live_chunks",
            "must hold the initial chunks",
        )?;
        check(positive(self.lookahead_threshold), "lookahead_threshold", "must be positive")?;

        check(
            self.min_obstacle_gap.is_finite() && self.min_obstacle_gap >= 0.0,
            "min_obstacle_gap",
            "must be non-negative",
        )?;
        check(positive(self.cleanup_distance), "cleanup_distance", "must be positive")?;
        check(self.sweep_interval_ticks >= 1, "sweep_interval_ticks", "must be at least 1")?;

        check(positive(self.bike_half_width), "bike_half_width", "must be positive")?;
        check(positive(self.bike_front_reach), "bike_front_reach", "must be positive")?;
        check(
            self.bike_rear_reach.is_finite() && self.bike_rear_reach >= 0.0,
            "bike_rear_reach",
            "must be non-negative",
        )?;
        check(
            self.collision_shrink.is_finite() && self.collision_shrink >= 0.0,
            "collision_shrink",
            "must be non-negative",
        )?;

        check(
            self.activity_threshold_kmh.is_finite() && self.activity_threshold_kmh >= 0.0,
            "activity_threshold_kmh",
            "must be non-negative",
        )?;
        check(
            self.speed_cap_kmh.is_finite() && self.speed_cap_kmh > self.activity_threshold_kmh,
            "speed_cap_kmh",
            "must exceed activity_threshold_kmh",
        )?;
        check(
            self.speed_multiplier_max.is_finite() && self.speed_multiplier_max >= 1.0,
            "speed_multiplier_max",
            "must be at least 1",
        )?;

        Ok(())
    }
}
