//! Per-kind capability table.
//!
//! Entities are not a class hierarchy. Each [`EntityKind`] maps to an
//! [`Archetype`]: the body to build and the set of capability components
//! (damageable, mover, combat, pickup, ttl) the entity is spawned with, plus
//! the items it drops on death and the brain that drives it.
//!
//! | Kind | Body | Health | Mover | Combat | Brain states |
//! |---|---|---|---|---|---|
//! | Player | dynamic | 5 | walk + jump | melee | Idle Walk Jump Attack Damage |
//! | Grunt | dynamic | 3 | walk | melee | Idle Walk Attack Damage |
//! | Thrower | dynamic | 2 | – | throw ×1 | Idle Attack Damage |
//! | Boss | dynamic | 20 | walk | throw ×3 | Idle Walk Attack Damage |
//! | Coin / Gem | kinematic sensor | – | – | – | – |
//! | Projectile | dynamic sensor | – | – | – | – |
//! | Static | static | – | – | – | – |

use crate::components::brain::Brain;
use crate::components::combat::Combat;
use crate::components::kind::{EnemyKind, EntityKind, ItemKind};
use crate::components::mover::Mover;
use crate::math::Vec2;
use crate::resources::physics::{BodyDef, BodyType, FixtureDef};
use crate::states;

/// Seconds a thrown projectile lives before it is removed.
pub const PROJECTILE_TTL: f32 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub body_type: BodyType,
    pub half_extents: Vec2,
    pub sensor: bool,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub health: Option<f32>,
    pub mover: Option<Mover>,
    pub combat: Option<Combat>,
    /// Score value when collected.
    pub pickup: Option<i64>,
    pub ttl: Option<f32>,
    /// Items created where the entity dies.
    pub drops: &'static [ItemKind],
}

const INERT: Archetype = Archetype {
    body_type: BodyType::Static,
    half_extents: Vec2::new(0.5, 0.5),
    sensor: false,
    gravity_scale: 1.0,
    linear_damping: 0.0,
    health: None,
    mover: None,
    combat: None,
    pickup: None,
    ttl: None,
    drops: &[],
};

impl Archetype {
    pub fn of(kind: EntityKind) -> Archetype {
        match kind {
            EntityKind::Player => Archetype {
                body_type: BodyType::Dynamic,
                half_extents: Vec2::new(0.4, 0.9),
                health: Some(5.0),
                mover: Some(Mover {
                    speed: 6.0,
                    jump_impulse: 14.0,
                }),
                combat: Some(Combat::melee(1.4, 1.0, 6.0, 0.35)),
                ..INERT
            },
            EntityKind::Enemy(EnemyKind::Grunt) => Archetype {
                body_type: BodyType::Dynamic,
                half_extents: Vec2::new(0.45, 0.8),
                health: Some(3.0),
                mover: Some(Mover {
                    speed: 2.5,
                    jump_impulse: 0.0,
                }),
                combat: Some(Combat::melee(1.1, 1.0, 5.0, 1.0)),
                drops: &[ItemKind::Coin],
                ..INERT
            },
            EntityKind::Enemy(EnemyKind::Thrower) => Archetype {
                body_type: BodyType::Dynamic,
                half_extents: Vec2::new(0.45, 0.8),
                health: Some(2.0),
                combat: Some(Combat::throw(8.0, 1.0, 10.0, 1, 2.0)),
                drops: &[ItemKind::Coin, ItemKind::Coin],
                ..INERT
            },
            EntityKind::Enemy(EnemyKind::Boss) => Archetype {
                body_type: BodyType::Dynamic,
                half_extents: Vec2::new(1.2, 1.6),
                health: Some(20.0),
                mover: Some(Mover {
                    speed: 1.5,
                    jump_impulse: 0.0,
                }),
                combat: Some(Combat::throw(10.0, 2.0, 8.0, 3, 3.0)),
                drops: &[ItemKind::Gem, ItemKind::Gem, ItemKind::Gem],
                ..INERT
            },
            EntityKind::Item(item) => Archetype {
                body_type: BodyType::Kinematic,
                half_extents: Vec2::new(0.3, 0.3),
                sensor: true,
                pickup: Some(match item {
                    ItemKind::Coin => 10,
                    ItemKind::Gem => 50,
                }),
                ..INERT
            },
            EntityKind::Projectile => Archetype {
                body_type: BodyType::Dynamic,
                half_extents: Vec2::new(0.2, 0.2),
                sensor: true,
                gravity_scale: 0.5,
                ttl: Some(PROJECTILE_TTL),
                ..INERT
            },
            EntityKind::Static => INERT,
        }
    }

    pub fn body_def(&self, position: Vec2, velocity: Vec2) -> BodyDef {
        BodyDef::new(self.body_type, position)
            .with_velocity(velocity)
            .with_gravity_scale(self.gravity_scale)
            .with_damping(self.linear_damping)
    }

    pub fn fixture_def(&self) -> FixtureDef {
        if self.sensor {
            FixtureDef::sensor(self.half_extents.x, self.half_extents.y)
        } else {
            FixtureDef::solid(self.half_extents.x, self.half_extents.y)
        }
    }

    pub fn is_damageable(&self) -> bool {
        self.health.is_some()
    }
}

/// The brain driving an entity of `kind`, if it is an actor.
pub fn brain_for(kind: EntityKind) -> Option<Brain> {
    match kind {
        EntityKind::Player => Some(states::build_player_brain()),
        EntityKind::Enemy(enemy) => Some(states::build_enemy_brain(enemy)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::brain::StateTag;

    #[test]
    fn test_only_actors_are_damageable() {
        assert!(Archetype::of(EntityKind::Player).is_damageable());
        assert!(Archetype::of(EntityKind::Enemy(EnemyKind::Boss)).is_damageable());
        assert!(!Archetype::of(EntityKind::Item(ItemKind::Coin)).is_damageable());
        assert!(!Archetype::of(EntityKind::Static).is_damageable());
    }

    #[test]
    fn test_thrower_has_no_walk_state() {
        let thrower = brain_for(EntityKind::Enemy(EnemyKind::Thrower)).unwrap();
        assert!(!thrower.supports(StateTag::Walk));
        assert!(thrower.supports(StateTag::Attack));
        let grunt = brain_for(EntityKind::Enemy(EnemyKind::Grunt)).unwrap();
        assert!(grunt.supports(StateTag::Walk));
        assert!(brain_for(EntityKind::Projectile).is_none());
    }

    #[test]
    fn test_boss_drops_three_gems() {
        let boss = Archetype::of(EntityKind::Enemy(EnemyKind::Boss));
        assert_eq!(boss.drops, &[ItemKind::Gem; 3]);
    }
}
