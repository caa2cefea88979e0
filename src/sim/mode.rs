//! Game modes and their steering models
//!
//! Both modes share the wheelie, gravity and speed model in [`super::bike`];
//! only the way steering input moves the bike sideways differs.

use serde::{Deserialize, Serialize};

use super::bike::BikeState;
use crate::tuning::Tuning;

/// Mode selector used by `reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModeKind {
    #[default]
    Linear,
    FreeRoam,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Linear => "linear",
            ModeKind::FreeRoam => "free-roam",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(ModeKind::Linear),
            "free-roam" | "freeroam" | "free_roam" | "free" => Some(ModeKind::FreeRoam),
            _ => None,
        }
    }
}

/// Lane-bound runner: steering pushes lateral velocity directly
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearState;

/// Steering turns a heading; the bike drifts sideways along it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FreeRoamState {
    /// Radians off the travel axis, positive to the right
    pub heading: f32,
}

/// Active game mode with its per-mode state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameMode {
    Linear(LinearState),
    FreeRoam(FreeRoamState),
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::Linear(LinearState)
    }
}

impl GameMode {
    /// Fresh mode state for a new run
    pub fn fresh(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Linear => GameMode::Linear(LinearState),
            ModeKind::FreeRoam => GameMode::FreeRoam(FreeRoamState::default()),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            GameMode::Linear(_) => ModeKind::Linear,
            GameMode::FreeRoam(_) => ModeKind::FreeRoam,
        }
    }

    /// Heading in radians (always 0 in linear mode)
    pub fn heading(&self) -> f32 {
        match self {
            GameMode::Linear(_) => 0.0,
            GameMode::FreeRoam(state) => state.heading,
        }
    }

    /// Apply one tick of steering and move the bike sideways.
    ///
    /// Returns the fraction of longitudinal speed that becomes forward
    /// progress this tick.
    pub(crate) fn steer(&mut self, bike: &mut BikeState, steer: f32, tuning: &Tuning) -> f32 {
        match self {
            GameMode::Linear(_) => {
                steer_linear(bike, steer, tuning);
                1.0
            }
            GameMode::FreeRoam(state) => steer_free_roam(state, bike, steer, tuning),
        }
    }
}

fn steer_linear(bike: &mut BikeState, steer: f32, tuning: &Tuning) {
    bike.lateral_velocity += steer * tuning.lateral_accel;
    // Per-tick decay, not per-second
    bike.lateral_velocity *= tuning.lateral_friction;
    bike.lateral_velocity = bike
        .lateral_velocity
        .clamp(-tuning.max_lateral_speed, tuning.max_lateral_speed);
    bike.lateral_position += bike.lateral_velocity;
    clamp_to_wall(bike, tuning.lane_half_width);
}

fn steer_free_roam(
    state: &mut FreeRoamState,
    bike: &mut BikeState,
    steer: f32,
    tuning: &Tuning,
) -> f32 {
    if steer == 0.0 {
        state.heading *= tuning.free_roam_recenter;
    } else {
        state.heading += steer * tuning.free_roam_turn_rate;
    }
    state.heading = state
        .heading
        .clamp(-tuning.free_roam_max_heading, tuning.free_roam_max_heading);

    bike.lateral_velocity = (bike.speed * state.heading.sin())
        .clamp(-tuning.max_lateral_speed, tuning.max_lateral_speed);
    bike.lateral_position += bike.lateral_velocity;
    clamp_to_wall(bike, tuning.free_roam_half_width);

    state.heading.cos()
}

/// Hard wall: stop at the edge, no bounce
fn clamp_to_wall(bike: &mut BikeState, half_width: f32) {
    if bike.lateral_position > half_width {
        bike.lateral_position = half_width;
        bike.lateral_velocity = 0.0;
    } else if bike.lateral_position < -half_width {
        bike.lateral_position = -half_width;
        bike.lateral_velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_wall_stops_bike() {
        let tuning = Tuning::default();
        let mut mode = GameMode::fresh(ModeKind::Linear);
        let mut bike = BikeState::default();
        for _ in 0..200 {
            mode.steer(&mut bike, 1.0, &tuning);
        }
        assert_eq!(bike.lateral_position, tuning.lane_half_width);
        assert_eq!(bike.lateral_velocity, 0.0);
    }

    #[test]
    fn test_linear_velocity_capped() {
        let tuning = Tuning {
            lateral_accel: 5.0,
            ..Tuning::default()
        };
        let mut mode = GameMode::default();
        let mut bike = BikeState::default();
        mode.steer(&mut bike, -1.0, &tuning);
        assert_eq!(bike.lateral_velocity, -tuning.max_lateral_speed);
    }

    #[test]
    fn test_free_roam_heading_bounded_and_recenters() {
        let tuning = Tuning::default();
        let mut mode = GameMode::fresh(ModeKind::FreeRoam);
        let mut bike = BikeState {
            speed: 2.0,
            ..Default::default()
        };

        for _ in 0..100 {
            mode.steer(&mut bike, 1.0, &tuning);
        }
        assert_eq!(mode.heading(), tuning.free_roam_max_heading);
        assert!(bike.lateral_position > 0.0);

        let turned = mode.heading();
        let forward = mode.steer(&mut bike, 0.0, &tuning);
        assert!(mode.heading() < turned);
        assert!(forward < 1.0 && forward > 0.0);
    }

    #[test]
    fn test_free_roam_stationary_bike_does_not_drift() {
        let tuning = Tuning::default();
        let mut mode = GameMode::fresh(ModeKind::FreeRoam);
        let mut bike = BikeState::default();
        for _ in 0..50 {
            mode.steer(&mut bike, 1.0, &tuning);
        }
        assert_eq!(bike.lateral_position, 0.0);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(ModeKind::from_name("Free-Roam"), Some(ModeKind::FreeRoam));
        assert_eq!(ModeKind::from_name("linear"), Some(ModeKind::Linear));
        assert_eq!(ModeKind::from_name("sideways"), None);
        assert_eq!(GameMode::fresh(ModeKind::FreeRoam).kind(), ModeKind::FreeRoam);
    }
}
