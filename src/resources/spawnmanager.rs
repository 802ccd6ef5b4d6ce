//! Pool of reusable spawn coordinates.
//!
//! Every registered point sits in exactly one of two places: the `available`
//! list or the `taken` map keyed by the claiming participant. No operation
//! creates or loses a point, so `available_len() + taken_len()` always equals
//! the number of registered points.
//!
//! | Operation | Effect |
//! |---|---|
//! | `claim(id)` | random available point moves to `taken[id]`; an id that already holds one gets the same point back |
//! | `release(id)` | `taken[id]` moves back to `available` |
//! | `respawn(id)` | old point returns to `available`, then a new one is drawn (may be the same) |
//!
//! An empty pool is not fatal: `claim`/`respawn` return `None` and the caller
//! retries later.

use bevy_ecs::prelude::*;
use fastrand::Rng;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::entityid::PlayerId;
use crate::math::Vec2;

#[derive(Resource, Debug, Clone)]
pub struct SpawnManager {
    available: Vec<Vec2>,
    taken: FxHashMap<PlayerId, Vec2>,
    rng: Rng,
}

impl Default for SpawnManager {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SpawnManager {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            available: Vec::new(),
            taken: FxHashMap::default(),
            rng: Rng::with_seed(seed),
        }
    }

    pub fn with_points(seed: u64, points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut manager = Self::with_seed(seed);
        for point in points {
            manager.register(point);
        }
        manager
    }

    /// Add a new point to the pool.
    pub fn register(&mut self, point: Vec2) {
        self.available.push(point);
    }

    pub fn claim(&mut self, id: PlayerId) -> Option<Vec2> {
        if let Some(point) = self.taken.get(&id) {
            debug!("{} already holds spawn point {:?}", id, point);
            return Some(*point);
        }
        if self.available.is_empty() {
            warn!("no spawn point available for {}", id);
            return None;
        }
        let index = self.rng.usize(..self.available.len());
        let point = self.available.swap_remove(index);
        self.taken.insert(id, point);
        Some(point)
    }

    pub fn release(&mut self, id: PlayerId) -> Option<Vec2> {
        match self.taken.remove(&id) {
            Some(point) => {
                self.available.push(point);
                Some(point)
            }
            None => {
                debug!("{} holds no spawn point, nothing to release", id);
                None
            }
        }
    }

    pub fn respawn(&mut self, id: PlayerId) -> Option<Vec2> {
        self.release(id);
        self.claim(id)
    }

    pub fn claimed_by(&self, id: PlayerId) -> Option<Vec2> {
        self.taken.get(&id).copied()
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn taken_len(&self) -> usize {
        self.taken.len()
    }

    pub fn total(&self) -> usize {
        self.available.len() + self.taken.len()
    }

    /// Return every claimed point to the pool.
    pub fn release_all(&mut self) {
        self.available.extend(self.taken.drain().map(|(_, p)| p));
    }
}
