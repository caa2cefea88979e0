//! Idle/demo mode: a simple rider that plays the game
//!
//! Reads the current run state and produces the [`InputIntent`] a player
//! might. Used by the attract screen and the headless runner.

use rand::Rng;

use super::mode::ModeKind;
use super::state::Simulation;
use super::tick::InputIntent;

/// How far ahead obstacles are considered
pub const SCAN_DISTANCE: f32 = 40.0;
/// Extra lateral room kept around obstacles
pub const SIDE_MARGIN: f32 = 1.0;
/// Ticks of angular velocity assumed to still carry the front up
pub const ROTATION_LEAD_TICKS: f32 = 25.0;

/// Pick inputs for the next tick
pub fn autopilot_input<R: Rng>(sim: &Simulation<R>) -> InputIntent {
    let bike = sim.bike();
    let t = sim.tuning();
    let mut input = InputIntent {
        throttle: 1.0,
        ..Default::default()
    };

    // Hover around the balance point, leading on angular velocity
    let predicted = bike.wheelie_angle + bike.wheelie_angular_velocity * ROTATION_LEAD_TICKS;
    input.wheelie = predicted < t.balance_point;
    if predicted > t.balance_point + t.sweet_spot_width {
        input.brake = 0.5;
    }

    // Nearest active obstacle in our path
    let threat = sim
        .obstacles()
        .iter()
        .map(|(_, o)| o)
        .filter(|o| o.active)
        .filter(|o| {
            let ahead = o.pos.y - bike.distance;
            ahead > 0.0 && ahead < SCAN_DISTANCE
        })
        .filter(|o| {
            (o.pos.x - bike.lateral_position).abs()
                < t.bike_half_width + o.kind.half_extent() + SIDE_MARGIN
        })
        .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    if let Some(obstacle) = threat {
        let clears = bike.wheelie_angle > t.safe_clearance_angle() + 0.1;
        if !clears {
            // Swerve toward the side with more room
            let half_width = match sim.mode().kind() {
                ModeKind::Linear => t.lane_half_width,
                ModeKind::FreeRoam => t.free_roam_half_width,
            };
            let room_left = obstacle.pos.x + half_width;
            let room_right = half_width - obstacle.pos.x;
            input.steer = if room_right > room_left { 1.0 } else { -1.0 };
        }
    } else if sim.mode().heading() != 0.0 {
        // Straighten out once clear
        input.steer = (-sim.mode().heading() * 4.0).clamp(-1.0, 1.0);
    }

    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::obstacle::{Obstacle, ObstacleKind};
    use glam::Vec2;

    #[test]
    fn test_holds_throttle_and_lifts_from_level() {
        let sim = Simulation::new(1);
        let input = autopilot_input(&sim);
        assert_eq!(input.throttle, 1.0);
        assert!(input.wheelie);
        assert_eq!(input.steer, 0.0);
    }

    #[test]
    fn test_steers_away_from_obstacle_ahead() {
        let mut sim = Simulation::new(1);
        sim.obstacles.insert(Obstacle {
            pos: Vec2::new(2.0, 20.0),
            kind: ObstacleKind::Crate,
            yaw: 0.0,
            active: true,
            chunk: 0,
        });
        // More room on the left of an obstacle right of centre
        assert_eq!(autopilot_input(&sim).steer, -1.0);

        // High enough to clear it: no swerve
        sim.bike.wheelie_angle = sim.tuning.balance_point;
        assert_eq!(autopilot_input(&sim).steer, 0.0);
    }

    #[test]
    fn test_releases_wheelie_when_rising_fast() {
        let mut sim = Simulation::new(1);
        sim.bike.wheelie_angle = 1.0;
        sim.bike.wheelie_angular_velocity = 0.05;
        let input = autopilot_input(&sim);
        assert!(!input.wheelie);
        assert!(input.brake > 0.0);
    }

    #[test]
    fn test_drives_forward_through_grace_zone() {
        let mut sim = Simulation::new(7);
        for _ in 0..200 {
            let input = autopilot_input(&sim);
            sim.tick(&input, SIM_DT);
        }
        assert!(sim.bike().distance > 0.0);
        assert!(sim.score().score > 0.0 || sim.is_game_over());
    }
}
