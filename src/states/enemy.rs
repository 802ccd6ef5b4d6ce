//! Enemy AI states.
//!
//! Shared rules for every enemy archetype:
//!
//! - IDLE → WALK after the idle time (archetypes that walk)
//! - WALK → IDLE after the walk time
//! - IDLE/WALK → ATTACK when the nearest player is in range and the cooldown is ready
//! - ATTACK → IDLE once the attack window is over
//! - any → DAMAGE through [`apply_damage`](crate::lifecycle::apply_damage)
//! - DAMAGE → IDLE after [`DAMAGE_WINDOW`]; a dead enemy drops its items and is removed instead
//!
//! Idle and walk durations are drawn from the session RNG on entry.

use log::debug;

use crate::components::brain::{ActorCtx, EnemyOwner, EnemyState, StateTag};
use crate::components::combat::AttackKind;
use crate::components::kind::{EntityKind, Faction};
use crate::components::projectile::Projectile;
use crate::components::statemachine::State;
use crate::lifecycle::CreateEntity;
use crate::math::Vec2;
use crate::states::{DAMAGE_WINDOW, die_with_drops};

const IDLE_TIME: (f32, f32) = (0.8, 1.6);
const WALK_TIME: (f32, f32) = (1.0, 2.0);

fn roll(ctx: &mut ActorCtx<'_>, (min, max): (f32, f32)) -> f32 {
    min + ctx.rng.f32() * (max - min)
}

pub struct EnemyIdle {
    walks: bool,
    elapsed: f32,
    duration: f32,
}

impl EnemyIdle {
    pub fn new(walks: bool) -> Self {
        Self {
            walks,
            elapsed: 0.0,
            duration: IDLE_TIME.0,
        }
    }
}

impl State<EnemyOwner> for EnemyIdle {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        self.duration = roll(ctx, IDLE_TIME);
        ctx.set_velocity_x(0.0);
        ctx.announce(StateTag::Idle, "idle");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<EnemyState> {
        self.elapsed += delta;
        if ctx.can_attack() {
            return Some(EnemyState::Attack);
        }
        if self.walks && self.elapsed >= self.duration {
            return Some(EnemyState::Walk);
        }
        None
    }
}

#[derive(Default)]
pub struct EnemyWalk {
    elapsed: f32,
    duration: f32,
}

impl State<EnemyOwner> for EnemyWalk {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        self.duration = roll(ctx, WALK_TIME);
        let mut direction = ctx.direction_to_target();
        if direction == 0.0 {
            direction = if ctx.rng.bool() { 1.0 } else { -1.0 };
        }
        ctx.face(direction);
        let speed = ctx.mover.map_or(0.0, |m| m.speed);
        ctx.set_velocity_x(direction * speed);
        ctx.announce(StateTag::Walk, "walk");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<EnemyState> {
        self.elapsed += delta;
        if ctx.can_attack() {
            return Some(EnemyState::Attack);
        }
        (self.elapsed >= self.duration).then_some(EnemyState::Idle)
    }

    fn end(&mut self, ctx: &mut ActorCtx<'_>) {
        ctx.set_velocity_x(0.0);
    }
}

#[derive(Default)]
pub struct EnemyAttack {
    elapsed: f32,
    window: f32,
}

impl State<EnemyOwner> for EnemyAttack {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        let direction = ctx.direction_to_target();
        ctx.face(direction);
        ctx.set_velocity_x(0.0);
        ctx.announce(StateTag::Attack, "attack");

        let Some(combat) = ctx.combat.as_deref_mut() else {
            return;
        };
        combat.trigger();
        let combat = *combat;
        self.window = combat.windup;

        let facing = ctx.facing.sign();
        match combat.attack {
            AttackKind::Melee => {
                if let Some(target) = ctx.target.filter(|t| t.distance <= combat.range) {
                    let dir = Vec2::new(facing, 0.3);
                    ctx.damage(target.id, combat.damage, dir, combat.knockback);
                }
            }
            AttackKind::Throw { speed, count } => {
                let muzzle = ctx.position + Vec2::new(facing * 0.8, 0.4);
                for i in 0..count {
                    let lift = 2.0 + i as f32 * 1.5;
                    ctx.spawn(
                        CreateEntity::new(EntityKind::Projectile, muzzle)
                            .with_velocity(Vec2::new(facing * speed, lift))
                            .flipped(ctx.facing.flip_x)
                            .with_projectile(Projectile {
                                damage: combat.damage,
                                knockback: combat.knockback,
                                shooter: Some(ctx.id),
                                faction: Faction::Enemies,
                            }),
                    );
                }
                debug!("{} threw {} projectile(s)", ctx.id, count);
            }
        }
    }

    fn update(&mut self, _ctx: &mut ActorCtx<'_>, delta: f32) -> Option<EnemyState> {
        self.elapsed += delta;
        (self.elapsed >= self.window).then_some(EnemyState::Idle)
    }
}

#[derive(Default)]
pub struct EnemyDamage {
    elapsed: f32,
    dying: bool,
}

impl State<EnemyOwner> for EnemyDamage {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        self.dying = false;
        ctx.announce(StateTag::Damage, "hurt");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<EnemyState> {
        self.elapsed += delta;
        if self.elapsed < DAMAGE_WINDOW || self.dying {
            return None;
        }
        if ctx.is_dead() {
            self.dying = true;
            debug!("{} died", ctx.id);
            die_with_drops(ctx);
            return None;
        }
        Some(EnemyState::Idle)
    }
}
