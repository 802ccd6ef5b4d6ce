//! Identity components.
//!
//! [`EntityId`] is the process-wide, network-visible id of a simulated
//! entity. It is distinct from the ECS [`Entity`](bevy_ecs::entity::Entity),
//! which is local to this world and never leaves the process.
//!
//! [`PlayerId`] identifies a session participant (score table, spawn claims).
//! A session whose config names no participant id plays as [`PlayerId::LOCAL`].

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl PlayerId {
    /// Default participant id of a session.
    pub const LOCAL: PlayerId = PlayerId(-1);
    /// Reserved id that never takes part in leader computation.
    pub const NO_LEADER: PlayerId = PlayerId(i64::MIN);
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Which session decides this entity's behaviour.
///
/// `Local` entities run their brains and replicate changes outwards.
/// `Remote` entities are replicas driven by inbound packets.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authority {
    #[default]
    Local,
    Remote,
}

impl Authority {
    pub fn is_local(self) -> bool {
        matches!(self, Authority::Local)
    }
}

/// Participant controlling an entity (players, and projectiles they fire).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controller(pub PlayerId);
