//! Collision detection between the bike and obstacles
//!
//! Everything is tested on the ground plane: `x` is the lateral offset, `y` is
//! the distance along the travel axis. Footprints are axis-aligned boxes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bike::BikeState;
use crate::tuning::Tuning;

/// Axis-aligned bounding box on the ground plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Shrink every side by `amount`, collapsing to the centre rather than inverting
    pub fn shrink(&self, amount: f32) -> Self {
        let center = (self.min + self.max) * 0.5;
        let min = (self.min + Vec2::splat(amount)).min(center);
        let max = (self.max - Vec2::splat(amount)).max(center);
        Self { min, max }
    }

    /// Overlap test; touching edges count as contact
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// How a contact between bike and obstacle resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// Wheelied over it: obstacle consumed, front lands
    Cleared,
    /// Ran into it
    Hit,
}

/// Decide a contact from the wheelie angle at the moment of impact
#[inline]
pub fn resolve_contact(wheelie_angle: f32, tuning: &Tuning) -> CollisionOutcome {
    if wheelie_angle > tuning.safe_clearance_angle() {
        CollisionOutcome::Cleared
    } else {
        CollisionOutcome::Hit
    }
}

/// Bike footprint, already shrunk for forgiving contacts.
///
/// The rear axle sits at `distance`; lifting the front pulls the front wheel
/// back toward it.
pub fn bike_footprint(bike: &BikeState, tuning: &Tuning) -> Aabb {
    let front = tuning.bike_front_reach * bike.wheelie_angle.cos().max(0.0);
    Aabb::new(
        Vec2::new(
            bike.lateral_position - tuning.bike_half_width,
            bike.distance - tuning.bike_rear_reach,
        ),
        Vec2::new(
            bike.lateral_position + tuning.bike_half_width,
            bike.distance + front.max(tuning.bike_rear_reach),
        ),
    )
    .shrink(tuning.collision_shrink)
}
