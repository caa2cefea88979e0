//! Bike dynamics
//!
//! Per-tick integration of speed, lateral motion and wheelie rotation from an
//! [`InputIntent`]. Values assume the fixed 60 Hz step: accelerations are
//! "per tick", frictions and dampings are per-tick retention factors.

use serde::{Deserialize, Serialize};

use super::mode::GameMode;
use super::tick::InputIntent;
use crate::speed_to_kmh;
use crate::tuning::Tuning;

/// Stored condition of the bike
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BikeStatus {
    #[default]
    Riding,
    /// Survivable hit: steering locked and speed bleeding off until the timer runs out
    Skidding { remaining: f32 },
    /// Terminal until reset
    Crashed,
}

/// Observable mode, derived from status and wheelie angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BikeMode {
    Grounded,
    Wheelie,
    Skidding,
    Crashed,
}

/// Result of a single dynamics step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// Forward progress this tick
    pub advanced: f32,
    /// The wheelie went past the crash threshold
    pub crashed: bool,
}

/// The rider's bike
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BikeState {
    /// Longitudinal speed (units per tick), within [min_speed, max_speed]
    pub speed: f32,
    /// Offset from the corridor centre line
    pub lateral_position: f32,
    /// Units per tick, within ±max_lateral_speed
    pub lateral_velocity: f32,
    /// Radians, within [0, max_angle]
    pub wheelie_angle: f32,
    pub wheelie_angular_velocity: f32,
    /// Distance along the travel axis, never decreases
    pub distance: f32,
    pub status: BikeStatus,
}

impl BikeState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            speed: tuning.min_speed,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> BikeMode {
        match self.status {
            BikeStatus::Crashed => BikeMode::Crashed,
            BikeStatus::Skidding { .. } => BikeMode::Skidding,
            BikeStatus::Riding if self.wheelie_angle > 0.0 => BikeMode::Wheelie,
            BikeStatus::Riding => BikeMode::Grounded,
        }
    }

    #[inline]
    pub fn speed_kmh(&self) -> f32 {
        speed_to_kmh(self.speed)
    }

    #[inline]
    pub fn is_crashed(&self) -> bool {
        matches!(self.status, BikeStatus::Crashed)
    }

    #[inline]
    pub fn is_skidding(&self) -> bool {
        matches!(self.status, BikeStatus::Skidding { .. })
    }

    /// Visual lean into the lateral motion
    pub fn roll(&self) -> f32 {
        -self.lateral_velocity * 0.5
    }

    /// Angle lies inside the balance band where lift is damped
    pub fn in_sweet_spot(&self, tuning: &Tuning) -> bool {
        self.wheelie_angle > tuning.balance_point - tuning.sweet_spot_width
            && self.wheelie_angle < tuning.balance_point + tuning.sweet_spot_width
    }

    /// Advance one tick. A crashed bike does not move.
    pub fn step(
        &mut self,
        input: &InputIntent,
        mode: &mut GameMode,
        tuning: &Tuning,
        dt: f32,
    ) -> StepOutcome {
        if self.is_crashed() {
            return StepOutcome::default();
        }
        let skidding = self.is_skidding();
        let kmh = self.speed_kmh();

        // Lateral (control locked while skidding)
        let steer = if skidding { 0.0 } else { input.steer };
        let forward = mode.steer(self, steer, tuning);

        // Lift and brake
        let mut lift = 0.0;
        if !skidding && input.wheelie && input.throttle_active() {
            lift = tuning.lift_tiers.lookup(kmh);
            if self.in_sweet_spot(tuning) {
                lift *= tuning.sweet_spot_damping;
            }
        }
        if input.braking() {
            lift -= tuning.brake_lift_penalty * input.brake;
            let bleed = tuning.brake_force * tuning.brake_tiers.lookup(kmh) * input.brake;
            self.speed = (self.speed - bleed).max(tuning.min_speed);
        }

        // Rotation
        if self.integrate_rotation(lift, tuning) {
            log::info!(
                "Wheelie overflow at {:.1} km/h, distance {:.1}",
                kmh,
                self.distance
            );
            return StepOutcome {
                advanced: 0.0,
                crashed: true,
            };
        }

        // Longitudinal
        if skidding {
            self.speed *= tuning.skid_speed_decay;
        } else if input.throttle_active() {
            if self.speed < tuning.max_speed {
                self.speed += tuning.base_acceleration * tuning.accel_tiers.lookup(kmh) * input.throttle;
            }
        } else if !input.braking() && self.speed > tuning.min_speed {
            self.speed -= tuning.deceleration;
        }
        self.speed = self.speed.clamp(tuning.min_speed, tuning.max_speed);

        let advanced = self.speed * forward;
        self.distance += advanced;

        if let BikeStatus::Skidding { remaining } = self.status {
            let remaining = remaining - dt;
            self.status = if remaining <= 0.0 {
                log::debug!("Skid recovered at distance {:.1}", self.distance);
                BikeStatus::Riding
            } else {
                BikeStatus::Skidding { remaining }
            };
        }

        StepOutcome {
            advanced,
            crashed: false,
        }
    }

    /// Integrate wheelie rotation; returns true on overflow (bike crashed)
    fn integrate_rotation(&mut self, lift: f32, tuning: &Tuning) -> bool {
        self.wheelie_angular_velocity += lift - tuning.gravity;
        self.wheelie_angular_velocity *= tuning.angular_damping;
        self.wheelie_angle += self.wheelie_angular_velocity;

        if self.wheelie_angle < 0.0 {
            self.wheelie_angle = 0.0;
            self.wheelie_angular_velocity = 0.0;
        }

        if self.wheelie_angle > tuning.max_angle {
            self.wheelie_angle = tuning.max_angle;
            self.crash();
            return true;
        }
        false
    }

    /// Enter the terminal state
    pub fn crash(&mut self) {
        self.status = BikeStatus::Crashed;
        self.wheelie_angular_velocity = 0.0;
    }

    /// Obstacle wheelied over: the front slams back down
    pub fn land(&mut self) {
        self.wheelie_angle = 0.0;
        self.wheelie_angular_velocity = 0.0;
    }

    /// Resolve an obstacle hit (two-strike rule). Returns the resulting mode.
    ///
    /// A grounded bike crashes outright; a bike in a low wheelie survives into a
    /// skid; any hit while skidding is fatal.
    pub fn register_hit(&mut self, tuning: &Tuning) -> BikeMode {
        match self.mode() {
            BikeMode::Wheelie => {
                self.land();
                self.status = BikeStatus::Skidding {
                    remaining: tuning.skid_duration,
                };
            }
            BikeMode::Grounded | BikeMode::Skidding => self.crash(),
            BikeMode::Crashed => {}
        }
        self.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::mode::ModeKind;

    fn wheelie_input() -> InputIntent {
        InputIntent {
            throttle: 1.0,
            wheelie: true,
            ..Default::default()
        }
    }

    fn step(bike: &mut BikeState, input: &InputIntent, tuning: &Tuning) -> StepOutcome {
        let mut mode = GameMode::fresh(ModeKind::Linear);
        bike.step(input, &mut mode, tuning, SIM_DT)
    }

    #[test]
    fn test_idle_bike_stays_put() {
        let tuning = Tuning::default();
        let mut bike = BikeState::new(&tuning);
        for _ in 0..600 {
            step(&mut bike, &InputIntent::default(), &tuning);
        }
        assert_eq!(bike.lateral_position, 0.0);
        assert_eq!(bike.wheelie_angle, 0.0);
        assert_eq!(bike.wheelie_angular_velocity, 0.0);
        assert_eq!(bike.mode(), BikeMode::Grounded);
    }

    #[test]
    fn test_throttle_accelerates_with_drag() {
        let tuning = Tuning::default();
        let mut slow = BikeState::new(&tuning);
        step(
            &mut slow,
            &InputIntent {
                throttle: 1.0,
                ..Default::default()
            },
            &tuning,
        );
        let slow_gain = slow.speed;

        let mut fast = BikeState {
            speed: crate::kmh_to_speed(125.0),
            ..BikeState::new(&tuning)
        };
        let before = fast.speed;
        step(
            &mut fast,
            &InputIntent {
                throttle: 1.0,
                ..Default::default()
            },
            &tuning,
        );
        let fast_gain = fast.speed - before;

        assert!((slow_gain - tuning.base_acceleration).abs() < 1e-6);
        assert!((fast_gain - tuning.base_acceleration * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_speed_clamped_to_max() {
        let tuning = Tuning::default();
        let mut bike = BikeState::new(&tuning);
        let input = InputIntent {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..5_000 {
            step(&mut bike, &input, &tuning);
            assert!(bike.speed <= tuning.max_speed);
        }
        assert_eq!(bike.speed, tuning.max_speed);
    }

    #[test]
    fn test_coasting_returns_to_min_speed() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            speed: 1.0,
            ..BikeState::new(&tuning)
        };
        for _ in 0..400 {
            step(&mut bike, &InputIntent::default(), &tuning);
        }
        assert_eq!(bike.speed, tuning.min_speed);
    }

    #[test]
    fn test_brake_loses_bite_at_high_speed() {
        let tuning = Tuning::default();
        let brake = InputIntent {
            brake: 1.0,
            ..Default::default()
        };

        let mut slow = BikeState {
            speed: crate::kmh_to_speed(50.0),
            ..BikeState::new(&tuning)
        };
        let before = slow.speed;
        step(&mut slow, &brake, &tuning);
        let slow_bleed = before - slow.speed;

        let mut fast = BikeState {
            speed: crate::kmh_to_speed(135.0),
            ..BikeState::new(&tuning)
        };
        let before = fast.speed;
        step(&mut fast, &brake, &tuning);
        let fast_bleed = before - fast.speed;

        assert!(fast_bleed < slow_bleed);
        assert!(fast_bleed > 0.0);
    }

    #[test]
    fn test_wheelie_crosses_balance_point_before_crash() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            speed: tuning.max_speed,
            ..BikeState::new(&tuning)
        };
        let mut peak: f32 = 0.0;
        for _ in 0..600 {
            let outcome = step(&mut bike, &wheelie_input(), &tuning);
            if outcome.crashed {
                break;
            }
            peak = peak.max(bike.wheelie_angle);
        }
        assert!(peak > tuning.balance_point);
        assert!(bike.is_crashed(), "held lift must eventually overflow");
        assert_eq!(bike.wheelie_angle, tuning.max_angle);
    }

    #[test]
    fn test_sweet_spot_slows_rotation() {
        let tuning = Tuning::default();
        let base = BikeState {
            speed: tuning.max_speed,
            ..BikeState::new(&tuning)
        };

        let mut outside = BikeState {
            wheelie_angle: tuning.balance_point - 2.0 * tuning.sweet_spot_width,
            ..base.clone()
        };
        let mut inside = BikeState {
            wheelie_angle: tuning.balance_point,
            ..base
        };
        assert!(!outside.in_sweet_spot(&tuning));
        assert!(inside.in_sweet_spot(&tuning));

        step(&mut outside, &wheelie_input(), &tuning);
        step(&mut inside, &wheelie_input(), &tuning);

        let outside_gain = outside.wheelie_angular_velocity;
        let inside_gain = inside.wheelie_angular_velocity;
        assert!(inside_gain > 0.0);
        assert!(
            inside_gain < outside_gain * 0.6,
            "inside {inside_gain} vs outside {outside_gain}"
        );
    }

    #[test]
    fn test_brake_drops_the_front() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            speed: 2.0,
            wheelie_angle: 0.5,
            ..BikeState::new(&tuning)
        };
        let input = InputIntent {
            throttle: 1.0,
            brake: 1.0,
            wheelie: true,
            ..Default::default()
        };
        step(&mut bike, &input, &tuning);
        assert!(bike.wheelie_angular_velocity < 0.0);
    }

    #[test]
    fn test_angle_never_negative() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            wheelie_angle: 0.01,
            wheelie_angular_velocity: -0.5,
            ..BikeState::new(&tuning)
        };
        step(&mut bike, &InputIntent::default(), &tuning);
        assert_eq!(bike.wheelie_angle, 0.0);
        assert_eq!(bike.wheelie_angular_velocity, 0.0);
    }

    #[test]
    fn test_hit_rules() {
        let tuning = Tuning::default();

        let mut grounded = BikeState::new(&tuning);
        assert_eq!(grounded.register_hit(&tuning), BikeMode::Crashed);

        let mut low_wheelie = BikeState {
            wheelie_angle: 0.1,
            ..BikeState::new(&tuning)
        };
        assert_eq!(low_wheelie.register_hit(&tuning), BikeMode::Skidding);
        assert_eq!(low_wheelie.wheelie_angle, 0.0);

        assert_eq!(low_wheelie.register_hit(&tuning), BikeMode::Crashed);
    }

    #[test]
    fn test_skid_locks_steering_and_expires() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            speed: 2.0,
            status: BikeStatus::Skidding {
                remaining: tuning.skid_duration,
            },
            ..BikeState::new(&tuning)
        };
        let input = InputIntent {
            steer: 1.0,
            throttle: 1.0,
            ..Default::default()
        };

        let before = bike.speed;
        step(&mut bike, &input, &tuning);
        assert_eq!(bike.lateral_position, 0.0);
        assert!((bike.speed - before * tuning.skid_speed_decay).abs() < 1e-6);

        let ticks = (tuning.skid_duration / SIM_DT).ceil() as usize + 1;
        for _ in 0..ticks {
            step(&mut bike, &input, &tuning);
        }
        assert_eq!(bike.status, BikeStatus::Riding);
        assert!(bike.lateral_position > 0.0);
    }

    #[test]
    fn test_crashed_bike_is_frozen() {
        let tuning = Tuning::default();
        let mut bike = BikeState {
            speed: 1.0,
            status: BikeStatus::Crashed,
            ..BikeState::new(&tuning)
        };
        let outcome = step(&mut bike, &wheelie_input(), &tuning);
        assert_eq!(outcome.advanced, 0.0);
        assert_eq!(bike.distance, 0.0);
    }
}
