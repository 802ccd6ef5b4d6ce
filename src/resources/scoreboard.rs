//! Participant score table.
//!
//! One [`ScorePlayer`] per participant, the local one under the session's
//! configured `player_id`. The leader is recomputed on every change: highest
//! score wins, ties go to the lowest id, and [`PlayerId::NO_LEADER`] never
//! leads.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;

use crate::components::entityid::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePlayer {
    pub id: PlayerId,
    pub name: String,
    pub score: i64,
}

#[derive(Resource, Debug, Default, Clone)]
pub struct ScoreBoard {
    // Ordered by id so the leader scan meets the lowest id first.
    players: BTreeMap<PlayerId, ScorePlayer>,
    leader: Option<PlayerId>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant with a zero score. Re-registering only renames.
    pub fn register(&mut self, id: PlayerId, name: impl Into<String>) {
        let name = name.into();
        self.players
            .entry(id)
            .and_modify(|p| p.name = name.clone())
            .or_insert(ScorePlayer { id, name, score: 0 });
        self.recompute_leader();
    }

    pub fn unregister(&mut self, id: PlayerId) -> Option<ScorePlayer> {
        let removed = self.players.remove(&id);
        self.recompute_leader();
        removed
    }

    /// Overwrite a participant's score. Returns `false` for unknown ids.
    pub fn set_score(&mut self, id: PlayerId, score: i64) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        player.score = score;
        self.recompute_leader();
        true
    }

    /// Add to a participant's score and return the new total.
    pub fn add(&mut self, id: PlayerId, amount: i64) -> Option<i64> {
        let player = self.players.get_mut(&id)?;
        player.score += amount;
        let score = player.score;
        self.recompute_leader();
        Some(score)
    }

    pub fn get(&self, id: PlayerId) -> Option<&ScorePlayer> {
        self.players.get(&id)
    }

    pub fn score(&self, id: PlayerId) -> Option<i64> {
        self.players.get(&id).map(|p| p.score)
    }

    pub fn leader(&self) -> Option<PlayerId> {
        self.leader
    }

    pub fn players(&self) -> impl Iterator<Item = &ScorePlayer> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn recompute_leader(&mut self) {
        let mut best: Option<&ScorePlayer> = None;
        for player in self.players.values() {
            if player.id == PlayerId::NO_LEADER {
                continue;
            }
            // Strictly greater: an equal score never displaces a lower id.
            if best.is_none_or(|b| player.score > b.score) {
                best = Some(player);
            }
        }
        self.leader = best.map(|p| p.id);
    }
}
