//! Concrete actor states.
//!
//! Each actor family registers its states once, when its [`Brain`] is built;
//! the tag→state map is never re-matched per frame.
//!
//! - [`player`] – input-driven states for player characters
//! - [`enemy`] – AI states shared by every enemy archetype
//!
//! Archetypes differ only in which states they register and in the capability
//! components they carry: a Thrower has no Walk state, so its Idle never asks
//! for one.

pub mod enemy;
pub mod player;

use crate::archetype::Archetype;
use crate::components::brain::{ActorCtx, Brain, EnemyState, PlayerState};
use crate::components::kind::{EnemyKind, EntityKind};
use crate::components::statemachine::StateMachine;
use crate::lifecycle::CreateEntity;
use crate::math::Vec2;

/// Seconds an actor stays in DAMAGE before it may act (or die).
pub const DAMAGE_WINDOW: f32 = 0.5;

pub fn build_player_brain() -> Brain {
    Brain::player(
        StateMachine::new()
            .with_state(PlayerState::Idle, player::PlayerIdle::default())
            .with_state(PlayerState::Walk, player::PlayerWalk::default())
            .with_state(PlayerState::Jump, player::PlayerJump::default())
            .with_state(PlayerState::Attack, player::PlayerAttack::default())
            .with_state(PlayerState::Damage, player::PlayerDamage::default()),
    )
}

pub fn build_enemy_brain(kind: EnemyKind) -> Brain {
    let walks = !matches!(kind, EnemyKind::Thrower);
    let mut machine = StateMachine::new()
        .with_state(EnemyState::Idle, enemy::EnemyIdle::new(walks))
        .with_state(EnemyState::Attack, enemy::EnemyAttack::default())
        .with_state(EnemyState::Damage, enemy::EnemyDamage::default());
    if walks {
        machine = machine.with_state(EnemyState::Walk, enemy::EnemyWalk::default());
    }
    Brain::enemy(machine)
}

/// Drop this actor's items where it stands, then remove it.
pub(crate) fn die_with_drops(ctx: &ActorCtx<'_>) {
    let drops = Archetype::of(ctx.kind).drops;
    let spread = 0.6;
    let first = -(drops.len().saturating_sub(1) as f32) * spread * 0.5;
    for (i, item) in drops.iter().enumerate() {
        let offset = Vec2::new(first + i as f32 * spread, 0.0);
        ctx.spawn(CreateEntity::new(EntityKind::Item(*item), ctx.position + offset));
    }
    ctx.remove_self();
}
