//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (arena slot order, chunk sequence order)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod bike;
pub mod collision;
pub mod mode;
pub mod obstacle;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod tiers;
pub mod world;

pub use autopilot::autopilot_input;
pub use bike::{BikeMode, BikeState, BikeStatus};
pub use collision::{Aabb, CollisionOutcome};
pub use mode::{FreeRoamState, GameMode, LinearState, ModeKind};
pub use obstacle::{CollisionEvent, Obstacle, ObstacleField, ObstacleHandle, ObstacleKind};
pub use scoring::ScoreState;
pub use state::{ChunkView, ObstacleView, RunPhase, Simulation, SimulationSnapshot};
pub use tick::InputIntent;
pub use tiers::{SpeedBand, TierTable};
pub use world::{Chunk, StreamEvent, WorldStream};
