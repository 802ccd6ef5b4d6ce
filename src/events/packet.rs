//! Logical network packet vocabulary.
//!
//! These are payload shapes, not a wire format: the transport serializes them
//! however it likes (they derive serde for convenience). Every entity event
//! names its target by [`EntityId`].
//!
//! | Packet | Direction |
//! |---|---|
//! | `EntityCreated` | authoritative → replicas |
//! | `EntityRemoved` | authoritative → replicas |
//! | `EntityPosition` | either |
//! | `EntityDamage` | attacker → target's authority |
//! | `EntityStateChange` | authority → replicas |
//! | `ScoreChanged` | either |
//! | `ChatMessage` | either |

use serde::{Deserialize, Serialize};

use crate::components::brain::StateTag;
use crate::components::entityid::{EntityId, PlayerId};
use crate::components::kind::EntityKind;
use crate::math::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    EntityCreated {
        id: EntityId,
        kind: EntityKind,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        flip_x: bool,
    },
    EntityRemoved {
        id: EntityId,
    },
    EntityPosition {
        id: EntityId,
        x: f32,
        y: f32,
        velocity: Option<Vec2>,
    },
    EntityDamage {
        target_id: EntityId,
        amount: f32,
        dir_x: f32,
        dir_y: f32,
        knockback: f32,
    },
    EntityStateChange {
        id: EntityId,
        animation: String,
        flip_x: bool,
        state: StateTag,
        extra: Option<String>,
    },
    ScoreChanged {
        player_id: PlayerId,
        score: i64,
    },
    ChatMessage {
        sender: String,
        text: String,
    },
}

impl Packet {
    /// Entity this packet is about, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Packet::EntityCreated { id, .. }
            | Packet::EntityRemoved { id }
            | Packet::EntityPosition { id, .. }
            | Packet::EntityStateChange { id, .. } => Some(*id),
            Packet::EntityDamage { target_id, .. } => Some(*target_id),
            Packet::ScoreChanged { .. } | Packet::ChatMessage { .. } => None,
        }
    }
}
