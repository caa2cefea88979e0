//! Obstacle placement, collision resolution and cleanup
//!
//! Obstacles live in a generational arena. Chunks hold [`ObstacleHandle`]s, so
//! an obstacle purged by the periodic sweep simply stops resolving instead of
//! leaving a dangling reference behind.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bike::BikeState;
use super::collision::{Aabb, CollisionOutcome, bike_footprint, resolve_contact};
use crate::tuning::{Difficulty, Tuning};

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    TrashBag,
    Crate,
    Tire,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::TrashBag, ObstacleKind::Crate, ObstacleKind::Tire];

    /// Ground footprint half extent before any rotation
    pub fn half_extent(&self) -> f32 {
        match self {
            ObstacleKind::TrashBag => 1.0,
            ObstacleKind::Crate => 0.75,
            // Lying flat: ring radius plus tube radius
            ObstacleKind::Tire => 0.85,
        }
    }
}

/// Stable reference into the [`ObstacleField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObstacleHandle {
    index: u32,
    generation: u32,
}

impl ObstacleHandle {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// An obstacle on the road
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// `x` lateral offset, `y` distance along the travel axis
    pub pos: Vec2,
    pub kind: ObstacleKind,
    /// Rotation about the vertical axis (crates only)
    pub yaw: f32,
    /// False once cleared or hit
    pub active: bool,
    /// Sequence index of the owning chunk
    pub chunk: u64,
}

impl Obstacle {
    pub fn footprint(&self) -> Aabb {
        let half = self.kind.half_extent();
        let half = match self.kind {
            ObstacleKind::Crate => half * (self.yaw.cos().abs() + self.yaw.sin().abs()),
            _ => half,
        };
        Aabb::from_center(self.pos, Vec2::splat(half))
    }
}

/// One resolved contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub handle: ObstacleHandle,
    pub outcome: CollisionOutcome,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    obstacle: Option<Obstacle>,
}

/// Arena of obstacles with stable handles
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored obstacles (active or not)
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn active_count(&self) -> usize {
        self.iter().filter(|(_, o)| o.active).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.live = 0;
    }

    pub fn insert(&mut self, obstacle: Obstacle) -> ObstacleHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.obstacle = Some(obstacle);
            ObstacleHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                obstacle: Some(obstacle),
            });
            ObstacleHandle {
                index,
                generation: 0,
            }
        }
    }

    pub fn get(&self, handle: ObstacleHandle) -> Option<&Obstacle> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.obstacle.as_ref())
    }

    pub fn get_mut(&mut self, handle: ObstacleHandle) -> Option<&mut Obstacle> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.obstacle.as_mut())
    }

    /// Remove an obstacle; stale handles return `None`
    pub fn remove(&mut self, handle: ObstacleHandle) -> Option<Obstacle> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let obstacle = slot.obstacle.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(obstacle)
    }

    /// Drop every obstacle an evicted chunk still references
    pub fn release(&mut self, handles: &[ObstacleHandle]) -> usize {
        handles.iter().filter(|&&h| self.remove(h).is_some()).count()
    }

    /// Stored obstacles in slot order (stable, deterministic)
    pub fn iter(&self) -> impl Iterator<Item = (ObstacleHandle, &Obstacle)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.obstacle.as_ref().map(|o| {
                (
                    ObstacleHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    o,
                )
            })
        })
    }

    /// Place obstacles inside `[start, end)` for chunk `chunk`.
    ///
    /// Rolls `difficulty.obstacles_per_chunk()` slots, each kept with the
    /// difficulty's spawn probability. Survivors are sorted along the chunk and
    /// pushed forward to keep `min_obstacle_gap` between neighbours; any pushed
    /// past the chunk end are dropped.
    pub fn spawn_for_span<R: Rng>(
        &mut self,
        chunk: u64,
        start: f32,
        end: f32,
        difficulty: Difficulty,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Vec<ObstacleHandle> {
        if end <= start {
            return Vec::new();
        }

        let mut alongs: Vec<f32> = (0..difficulty.obstacles_per_chunk())
            .filter_map(|_| {
                let along = rng.random_range(start..end);
                rng.random_bool(difficulty.spawn_probability())
                    .then_some(along)
            })
            .collect();
        alongs.sort_by(f32::total_cmp);

        let mut placed = Vec::with_capacity(alongs.len());
        let mut last: Option<f32> = None;
        for along in alongs {
            let along = match last {
                Some(prev) if along - prev < tuning.min_obstacle_gap => prev + tuning.min_obstacle_gap,
                _ => along,
            };
            if along >= end {
                break;
            }
            last = Some(along);

            let kind = ObstacleKind::ALL[rng.random_range(0..ObstacleKind::ALL.len())];
            let spread = tuning.obstacle_lateral_spread;
            let lateral = if spread > 0.0 {
                rng.random_range(-spread..=spread)
            } else {
                0.0
            };
            let yaw = match kind {
                ObstacleKind::Crate => rng.random_range(0.0..1.0),
                _ => 0.0,
            };

            placed.push(self.insert(Obstacle {
                pos: Vec2::new(lateral, along),
                kind,
                yaw,
                active: true,
                chunk,
            }));
        }

        log::debug!(
            "Chunk {} [{:.0}, {:.0}): placed {} obstacles",
            chunk,
            start,
            end,
            placed.len()
        );
        placed
    }

    /// Test every active obstacle against the bike.
    ///
    /// Contacts are resolved in slot order. Each touched obstacle is deactivated,
    /// so it resolves exactly once. A clearance drops the front, so a second
    /// contact in the same tick is judged at angle zero.
    pub fn check_collisions(&mut self, bike: &BikeState, tuning: &Tuning) -> Vec<CollisionEvent> {
        let footprint = bike_footprint(bike, tuning);
        let mut angle = bike.wheelie_angle;
        let mut events = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(obstacle) = slot.obstacle.as_mut() else {
                continue;
            };
            if !obstacle.active || !footprint.intersects(&obstacle.footprint()) {
                continue;
            }

            let outcome = resolve_contact(angle, tuning);
            if outcome == CollisionOutcome::Cleared {
                angle = 0.0;
            }
            obstacle.active = false;
            log::trace!(
                "{:?} {:?} at ({:.2}, {:.2})",
                outcome,
                obstacle.kind,
                obstacle.pos.x,
                obstacle.pos.y
            );
            events.push(CollisionEvent {
                handle: ObstacleHandle {
                    index: index as u32,
                    generation: slot.generation,
                },
                outcome,
            });
        }
        events
    }

    /// Purge inactive obstacles more than `cleanup_distance` behind `distance`
    pub fn sweep(&mut self, distance: f32, cleanup_distance: f32) -> usize {
        let cutoff = distance - cleanup_distance;
        let stale: Vec<ObstacleHandle> = self
            .iter()
            .filter(|(_, o)| !o.active && o.pos.y < cutoff)
            .map(|(h, _)| h)
            .collect();
        let purged = self.release(&stale);
        if purged > 0 {
            log::debug!("Swept {} spent obstacles behind {:.0}", purged, cutoff);
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn obstacle_at(lateral: f32, along: f32) -> Obstacle {
        Obstacle {
            pos: Vec2::new(lateral, along),
            kind: ObstacleKind::Tire,
            yaw: 0.0,
            active: true,
            chunk: 0,
        }
    }

    #[test]
    fn test_stale_handles_do_not_resolve() {
        let mut field = ObstacleField::new();
        let a = field.insert(obstacle_at(0.0, 10.0));
        assert!(field.remove(a).is_some());
        assert!(field.get(a).is_none());
        assert!(field.remove(a).is_none());

        // Slot is reused under a new generation
        let b = field.insert(obstacle_at(1.0, 20.0));
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(field.get(a).is_none());
        assert_eq!(field.get(b).map(|o| o.pos.x), Some(1.0));
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_spawn_respects_span_spread_and_gap() {
        let tuning = Tuning::default();
        let mut field = ObstacleField::new();
        let mut rng = Pcg32::seed_from_u64(7);

        for chunk in 0..50u64 {
            let start = chunk as f32 * tuning.chunk_length;
            let end = start + tuning.chunk_length;
            let handles =
                field.spawn_for_span(chunk, start, end, Difficulty::Hard, &tuning, &mut rng);
            assert!(handles.len() <= Difficulty::Hard.obstacles_per_chunk() as usize);

            let alongs: Vec<f32> = handles
                .iter()
                .map(|&h| field.get(h).expect("fresh handle").pos.y)
                .collect();
            for pair in alongs.windows(2) {
                assert!(pair[1] - pair[0] >= tuning.min_obstacle_gap - 1e-3);
            }
            for &h in &handles {
                let o = field.get(h).unwrap();
                assert!(o.pos.y >= start && o.pos.y < end);
                assert!(o.pos.x.abs() <= tuning.obstacle_lateral_spread);
                assert!(o.active);
                assert_eq!(o.chunk, chunk);
            }
        }
    }

    #[test]
    fn test_spawn_is_deterministic() {
        let tuning = Tuning::default();
        let run = || {
            let mut field = ObstacleField::new();
            let mut rng = Pcg32::seed_from_u64(42);
            field.spawn_for_span(3, 300.0, 400.0, Difficulty::Normal, &tuning, &mut rng);
            field.iter().map(|(_, o)| o.clone()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_hit_deactivates_once() {
        let tuning = Tuning::default();
        let mut field = ObstacleField::new();
        let h = field.insert(obstacle_at(0.0, 2.0));
        let bike = BikeState::default();

        let events = field.check_collisions(&bike, &tuning);
        assert_eq!(
            events,
            vec![CollisionEvent {
                handle: h,
                outcome: CollisionOutcome::Hit
            }]
        );
        assert!(!field.get(h).unwrap().active);

        // Still overlapping, but spent
        assert!(field.check_collisions(&bike, &tuning).is_empty());
    }

    #[test]
    fn test_high_wheelie_clears_then_second_contact_hits() {
        let tuning = Tuning::default();
        let mut field = ObstacleField::new();
        field.insert(obstacle_at(0.0, 0.5));
        field.insert(obstacle_at(0.0, 1.0));
        let bike = BikeState {
            wheelie_angle: 0.5 * tuning.max_angle,
            ..Default::default()
        };

        let outcomes: Vec<_> = field
            .check_collisions(&bike, &tuning)
            .into_iter()
            .map(|e| e.outcome)
            .collect();
        assert_eq!(outcomes, vec![CollisionOutcome::Cleared, CollisionOutcome::Hit]);
    }

    #[test]
    fn test_miss_when_laterally_apart() {
        let tuning = Tuning::default();
        let mut field = ObstacleField::new();
        field.insert(obstacle_at(5.0, 2.0));
        assert!(field.check_collisions(&BikeState::default(), &tuning).is_empty());
        assert_eq!(field.active_count(), 1);
    }

    #[test]
    fn test_rotated_crate_grows_footprint() {
        let mut crate_box = obstacle_at(0.0, 0.0);
        crate_box.kind = ObstacleKind::Crate;
        let square = crate_box.footprint();
        crate_box.yaw = std::f32::consts::FRAC_PI_4;
        let rotated = crate_box.footprint();
        assert!(rotated.max.x > square.max.x);
    }

    #[test]
    fn test_sweep_only_purges_spent_obstacles_behind() {
        let mut field = ObstacleField::new();
        let spent_behind = field.insert(obstacle_at(0.0, 10.0));
        let live_behind = field.insert(obstacle_at(0.0, 20.0));
        let spent_ahead = field.insert(obstacle_at(0.0, 900.0));
        field.get_mut(spent_behind).unwrap().active = false;
        field.get_mut(spent_ahead).unwrap().active = false;

        assert_eq!(field.sweep(500.0, 150.0), 1);
        assert!(field.get(spent_behind).is_none());
        assert!(field.get(live_behind).is_some());
        assert!(field.get(spent_ahead).is_some());
    }
}
