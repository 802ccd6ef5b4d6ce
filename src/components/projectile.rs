use bevy_ecs::prelude::Component;

use crate::components::entityid::EntityId;
use crate::components::kind::Faction;

/// Damage payload carried by a thrown projectile.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub damage: f32,
    pub knockback: f32,
    /// Entity that fired it; never hit by its own projectile.
    pub shooter: Option<EntityId>,
    /// Side that fired it; projectiles do not hurt their own side.
    pub faction: Faction,
}
