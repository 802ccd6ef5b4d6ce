//! Attack capability.
//!
//! [`Combat`] holds the tuning of an actor's attack and the cooldown left
//! before it may attack again. The cooldown ticks down in
//! [`actor_brain_system`](crate::systems::brain::actor_brain_system) regardless
//! of which state the actor is in.

use bevy_ecs::prelude::Component;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackKind {
    /// Hit the target directly when within `range`.
    Melee,
    /// Fire `count` projectiles at `speed` towards the target.
    Throw { speed: f32, count: u32 },
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Combat {
    pub attack: AttackKind,
    /// Distance at which an attack is started.
    pub range: f32,
    pub damage: f32,
    pub knockback: f32,
    /// Seconds between attacks.
    pub cooldown: f32,
    /// Seconds left until the next attack is allowed.
    pub cooldown_left: f32,
    /// Seconds the attack state lasts.
    pub windup: f32,
}

impl Combat {
    pub fn melee(range: f32, damage: f32, knockback: f32, cooldown: f32) -> Self {
        Self {
            attack: AttackKind::Melee,
            range,
            damage,
            knockback,
            cooldown,
            cooldown_left: 0.0,
            windup: 0.4,
        }
    }

    pub fn throw(range: f32, damage: f32, speed: f32, count: u32, cooldown: f32) -> Self {
        Self {
            attack: AttackKind::Throw { speed, count },
            range,
            damage,
            knockback: 4.0,
            cooldown,
            cooldown_left: 0.0,
            windup: 0.6,
        }
    }

    pub fn ready(&self) -> bool {
        self.cooldown_left <= 0.0
    }

    pub fn trigger(&mut self) {
        self.cooldown_left = self.cooldown;
    }

    pub fn tick(&mut self, delta: f32) {
        self.cooldown_left = (self.cooldown_left - delta).max(0.0);
    }
}
