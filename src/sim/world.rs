//! World streaming
//!
//! The road is a sliding window of fixed-length chunks. Chunks are appended
//! one at a time ahead of the bike and evicted from the back once the window
//! is full. Chunks stay sorted, contiguous and non-overlapping at all times.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::{ObstacleField, ObstacleHandle};
use crate::tuning::{Difficulty, Tuning};

/// One streamed road segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Monotonic sequence number
    pub index: u64,
    /// Along-axis position of the near edge
    pub start: f32,
    pub length: f32,
    /// Obstacles placed when this chunk was generated
    pub obstacles: Vec<ObstacleHandle>,
}

impl Chunk {
    #[inline]
    pub fn end(&self) -> f32 {
        self.start + self.length
    }
}

/// What a streaming pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamEvent {
    pub spawned: Option<u64>,
    pub evicted: Option<u64>,
}

/// Ordered window of live chunks
#[derive(Debug, Clone)]
pub struct WorldStream {
    chunks: VecDeque<Chunk>,
    next_index: u64,
}

impl WorldStream {
    /// Build the initial window. The opening chunks carry no obstacles.
    pub fn new(tuning: &Tuning) -> Self {
        let mut world = Self {
            chunks: VecDeque::with_capacity(tuning.max_live_chunks as usize + 1),
            next_index: 0,
        };
        let mut start = tuning.chunk_origin;
        for _ in 0..tuning.initial_chunks {
            start = world.push_chunk(start, tuning.chunk_length);
        }
        world
    }

    /// Append an empty chunk; returns its far edge
    fn push_chunk(&mut self, start: f32, length: f32) -> f32 {
        let chunk = Chunk {
            index: self.next_index,
            start,
            length,
            obstacles: Vec::new(),
        };
        self.next_index += 1;
        let end = chunk.end();
        self.chunks.push_back(chunk);
        end
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Far edge of the newest chunk
    pub fn far_edge(&self) -> f32 {
        self.chunks.back().map_or(0.0, Chunk::end)
    }

    /// Near edge of the oldest chunk
    pub fn near_edge(&self) -> f32 {
        self.chunks.front().map_or(0.0, |c| c.start)
    }

    /// Keep the lookahead window populated.
    ///
    /// Generates at most one chunk per call, so a fast bike spreads the cost
    /// over several ticks. Obstacles of an evicted chunk are released from
    /// `obstacles`.
    pub fn ensure_streamed<R: Rng>(
        &mut self,
        distance: f32,
        obstacles: &mut ObstacleField,
        difficulty: Difficulty,
        tuning: &Tuning,
        rng: &mut R,
    ) -> StreamEvent {
        let mut event = StreamEvent::default();
        if self.far_edge() - distance >= tuning.lookahead_threshold {
            return event;
        }

        let index = self.next_index;
        let start = self.far_edge();
        let end = self.push_chunk(start, tuning.chunk_length);
        let placed = obstacles.spawn_for_span(index, start, end, difficulty, tuning, rng);
        if let Some(chunk) = self.chunks.back_mut() {
            chunk.obstacles = placed;
        }
        event.spawned = Some(index);

        if self.chunks.len() > tuning.max_live_chunks as usize {
            if let Some(old) = self.chunks.pop_front() {
                let released = obstacles.release(&old.obstacles);
                log::debug!(
                    "Evicted chunk {} at {:.0}, released {} obstacles",
                    old.index,
                    old.start,
                    released
                );
                event.evicted = Some(old.index);
            }
        }

        debug_assert!(self.is_contiguous(), "chunk window lost contiguity");
        event
    }

    /// Adjacent chunks touch exactly, in increasing order
    pub fn is_contiguous(&self) -> bool {
        self.chunks
            .iter()
            .zip(self.chunks.iter().skip(1))
            .all(|(a, b)| a.end() == b.start && a.index + 1 == b.index)
    }
}
