//! Player states, driven by [`InputState`](crate::resources::input::InputState).
//!
//! Only the session controlling a player runs these updates; replicas mirror
//! the state through `EntityStateChange` packets.

use crate::components::brain::{ActorCtx, PlayerOwner, PlayerState, StateTag};
use crate::components::statemachine::State;
use crate::math::Vec2;
use crate::resources::input::Action;
use crate::states::DAMAGE_WINDOW;

/// Minimum air time before a landing is detected.
const MIN_AIR_TIME: f32 = 0.15;

fn on_ground(ctx: &ActorCtx<'_>) -> bool {
    ctx.velocity.y.abs() < 0.01
}

fn speed(ctx: &ActorCtx<'_>) -> f32 {
    ctx.mover.map_or(0.0, |m| m.speed)
}

fn combat_ready(ctx: &ActorCtx<'_>) -> bool {
    ctx.combat.as_deref().is_some_and(|c| c.ready())
}

/// Transitions every grounded state shares.
fn grounded_action(ctx: &ActorCtx<'_>) -> Option<PlayerState> {
    if ctx.is_dead() {
        return Some(PlayerState::Damage);
    }
    if ctx.input.just_pressed(Action::Attack) && combat_ready(ctx) {
        return Some(PlayerState::Attack);
    }
    let can_jump = ctx.mover.is_some_and(|m| m.jump_impulse > 0.0);
    if can_jump && ctx.input.just_pressed(Action::Jump) && on_ground(ctx) {
        return Some(PlayerState::Jump);
    }
    None
}

#[derive(Default)]
pub struct PlayerIdle;

impl State<PlayerOwner> for PlayerIdle {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        ctx.set_velocity_x(0.0);
        ctx.announce(StateTag::Idle, "idle");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, _delta: f32) -> Option<PlayerState> {
        if let Some(next) = grounded_action(ctx) {
            return Some(next);
        }
        (ctx.input.horizontal() != 0.0).then_some(PlayerState::Walk)
    }
}

#[derive(Default)]
pub struct PlayerWalk;

impl State<PlayerOwner> for PlayerWalk {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        let horizontal = ctx.input.horizontal();
        ctx.face(horizontal);
        ctx.announce(StateTag::Walk, "walk");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, _delta: f32) -> Option<PlayerState> {
        if let Some(next) = grounded_action(ctx) {
            return Some(next);
        }
        let horizontal = ctx.input.horizontal();
        if horizontal == 0.0 {
            return Some(PlayerState::Idle);
        }
        let was_flipped = ctx.facing.flip_x;
        ctx.face(horizontal);
        if ctx.facing.flip_x != was_flipped {
            ctx.announce(StateTag::Walk, "walk");
        }
        ctx.set_velocity_x(horizontal * speed(ctx));
        None
    }

    fn end(&mut self, ctx: &mut ActorCtx<'_>) {
        ctx.set_velocity_x(0.0);
    }
}

#[derive(Default)]
pub struct PlayerJump {
    elapsed: f32,
}

impl State<PlayerOwner> for PlayerJump {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        if let Some(mover) = ctx.mover {
            ctx.apply_impulse(Vec2::new(0.0, mover.jump_impulse));
        }
        ctx.announce(StateTag::Jump, "jump");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<PlayerState> {
        self.elapsed += delta;
        if ctx.is_dead() {
            return Some(PlayerState::Damage);
        }
        let horizontal = ctx.input.horizontal();
        ctx.face(horizontal);
        ctx.set_velocity_x(horizontal * speed(ctx));
        if self.elapsed >= MIN_AIR_TIME && on_ground(ctx) {
            return Some(if horizontal != 0.0 {
                PlayerState::Walk
            } else {
                PlayerState::Idle
            });
        }
        None
    }
}

#[derive(Default)]
pub struct PlayerAttack {
    elapsed: f32,
    window: f32,
}

impl State<PlayerOwner> for PlayerAttack {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        ctx.set_velocity_x(0.0);
        ctx.announce(StateTag::Attack, "attack");

        let facing = ctx.facing.sign();
        let target = ctx.target;
        let Some(combat) = ctx.combat.as_deref_mut() else {
            return;
        };
        combat.trigger();
        let combat = *combat;
        self.window = combat.windup;

        // Only hits what is in front of the player.
        if let Some(target) = target.filter(|t| t.distance <= combat.range) {
            let ahead = (target.position.x - ctx.position.x) * facing >= 0.0;
            if ahead {
                ctx.damage(
                    target.id,
                    combat.damage,
                    Vec2::new(facing, 0.3),
                    combat.knockback,
                );
            }
        }
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<PlayerState> {
        self.elapsed += delta;
        if ctx.is_dead() {
            return Some(PlayerState::Damage);
        }
        (self.elapsed >= self.window).then_some(PlayerState::Idle)
    }
}

#[derive(Default)]
pub struct PlayerDamage {
    elapsed: f32,
}

impl State<PlayerOwner> for PlayerDamage {
    fn start(&mut self, ctx: &mut ActorCtx<'_>) {
        self.elapsed = 0.0;
        ctx.announce(StateTag::Damage, "hurt");
    }

    fn update(&mut self, ctx: &mut ActorCtx<'_>, delta: f32) -> Option<PlayerState> {
        self.elapsed += delta;
        if self.elapsed < DAMAGE_WINDOW {
            return None;
        }
        if ctx.is_dead() {
            // Idle sends the player back here if no spawn point was free.
            ctx.respawn_self();
        }
        Some(PlayerState::Idle)
    }
}
