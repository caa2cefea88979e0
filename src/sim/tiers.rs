//! Speed-band lookup tables
//!
//! Acceleration drag, brake effectiveness and wheelie lift all change in steps
//! as the bike gets faster. Each is an ordered list of `(above_kmh, value)`
//! bands: the value of the highest band whose threshold is strictly below the
//! current speed wins, and `floor` applies below the first band.

use serde::{Deserialize, Serialize};

/// One step of a [`TierTable`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    /// Band applies when speed is strictly greater than this (km/h)
    pub above_kmh: f32,
    pub value: f32,
}

/// Ordered speed-band table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    /// Value used at or below the first threshold
    pub floor: f32,
    /// Bands sorted by strictly increasing `above_kmh`
    pub bands: Vec<SpeedBand>,
}

impl TierTable {
    pub fn new(floor: f32, bands: &[(f32, f32)]) -> Self {
        Self {
            floor,
            bands: bands
                .iter()
                .map(|&(above_kmh, value)| SpeedBand { above_kmh, value })
                .collect(),
        }
    }

    /// Value for the given speed
    pub fn lookup(&self, kmh: f32) -> f32 {
        self.bands
            .iter()
            .rev()
            .find(|band| kmh > band.above_kmh)
            .map_or(self.floor, |band| band.value)
    }

    /// Thresholds strictly increasing and every value finite
    pub fn is_ordered(&self) -> bool {
        self.floor.is_finite()
            && self
                .bands
                .iter()
                .all(|b| b.above_kmh.is_finite() && b.value.is_finite())
            && self
                .bands
                .windows(2)
                .all(|pair| pair[0].above_kmh < pair[1].above_kmh)
    }

    /// Values never grow as speed increases (drag-like tables)
    pub fn is_non_increasing(&self) -> bool {
        let mut prev = self.floor;
        for band in &self.bands {
            if band.value > prev {
                return false;
            }
            prev = band.value;
        }
        true
    }
}
