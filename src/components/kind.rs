//! Closed set of entity kinds.
//!
//! The kind selects an [`Archetype`](crate::archetype::Archetype), which in
//! turn decides the body shape and which capability components an entity gets.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Walks towards players and hits them up close.
    Grunt,
    /// Stands still and lobs projectiles.
    Thrower,
    /// Large, tough, throws in bursts.
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Gem,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy(EnemyKind),
    Item(ItemKind),
    Projectile,
    Static,
}

/// Side an actor fights for; used for target selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Players,
    Enemies,
}

impl EntityKind {
    pub fn faction(self) -> Option<Faction> {
        match self {
            EntityKind::Player => Some(Faction::Players),
            EntityKind::Enemy(_) => Some(Faction::Enemies),
            _ => None,
        }
    }

    pub fn is_actor(self) -> bool {
        self.faction().is_some()
    }
}

impl Faction {
    pub fn opponent(self) -> Faction {
        match self {
            Faction::Players => Faction::Enemies,
            Faction::Enemies => Faction::Players,
        }
    }
}
