//! Actor behaviour component.
//!
//! Every player and enemy carries a [`Brain`]: a tagged union over the
//! state machines of the two actor families plus a pending transition
//! request. The request slot plays the role of `next` in a phase machine:
//! code outside the brain tick (damage, network overrides) only *asks* for a
//! transition, and [`actor_brain_system`] applies it at the start of the
//! actor's next tick, where a full [`ActorCtx`] is available.
//!
//! # Side effects
//!
//! States never touch physics directly. [`ActorCtx`] exposes enqueue-only
//! helpers that push mutations to the deferred queue. On replicas
//! (`authoritative == false`) those helpers do nothing, so a replica can run
//! `start`/`end` for presentation without re-deriving authoritative effects.
//!
//! [`actor_brain_system`]: crate::systems::brain::actor_brain_system

use bevy_ecs::prelude::Component;
use fastrand::Rng;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::components::combat::Combat;
use crate::components::entityid::EntityId;
use crate::components::facing::Facing;
use crate::components::health::Health;
use crate::components::kind::EntityKind;
use crate::components::mover::Mover;
use crate::components::presentation::Presentation;
use crate::components::statemachine::{Owner, StateMachine};
use crate::error::SimError;
use crate::events::packet::Packet;
use crate::lifecycle::{self, CreateEntity};
use crate::math::Vec2;
use crate::resources::deferredworld::MutationSender;
use crate::resources::input::InputState;
use crate::resources::netbridge::Outbox;
use crate::resources::physics::{BodyHandle, PhysicsWorld};

/// Family-independent state tag, as carried by `EntityStateChange` packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    Idle,
    Walk,
    Jump,
    Attack,
    Damage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    Walk,
    Jump,
    Attack,
    Damage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyState {
    Idle,
    Walk,
    Attack,
    Damage,
}

impl From<PlayerState> for StateTag {
    fn from(state: PlayerState) -> Self {
        match state {
            PlayerState::Idle => StateTag::Idle,
            PlayerState::Walk => StateTag::Walk,
            PlayerState::Jump => StateTag::Jump,
            PlayerState::Attack => StateTag::Attack,
            PlayerState::Damage => StateTag::Damage,
        }
    }
}

impl PlayerState {
    pub fn from_tag(tag: StateTag) -> Self {
        match tag {
            StateTag::Idle => PlayerState::Idle,
            StateTag::Walk => PlayerState::Walk,
            StateTag::Jump => PlayerState::Jump,
            StateTag::Attack => PlayerState::Attack,
            StateTag::Damage => PlayerState::Damage,
        }
    }
}

impl From<EnemyState> for StateTag {
    fn from(state: EnemyState) -> Self {
        match state {
            EnemyState::Idle => StateTag::Idle,
            EnemyState::Walk => StateTag::Walk,
            EnemyState::Attack => StateTag::Attack,
            EnemyState::Damage => StateTag::Damage,
        }
    }
}

impl EnemyState {
    pub fn from_tag(tag: StateTag) -> Option<Self> {
        match tag {
            StateTag::Idle => Some(EnemyState::Idle),
            StateTag::Walk => Some(EnemyState::Walk),
            StateTag::Attack => Some(EnemyState::Attack),
            StateTag::Damage => Some(EnemyState::Damage),
            StateTag::Jump => None,
        }
    }
}

pub struct PlayerOwner;

impl Owner for PlayerOwner {
    type Tag = PlayerState;
    type Ctx<'a> = ActorCtx<'a>;
}

pub struct EnemyOwner;

impl Owner for EnemyOwner {
    type Tag = EnemyState;
    type Ctx<'a> = ActorCtx<'a>;
}

/// Nearest opposing actor, as seen at the start of the brain tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: EntityId,
    pub position: Vec2,
    pub distance: f32,
}

/// Everything an actor state may read or request during a callback.
pub struct ActorCtx<'a> {
    pub id: EntityId,
    pub kind: EntityKind,
    pub body: BodyHandle,
    pub position: Vec2,
    pub velocity: Vec2,
    /// False on replicas: side-effect helpers become no-ops.
    pub authoritative: bool,
    pub facing: &'a mut Facing,
    pub presentation: &'a mut Presentation,
    pub health: Option<Health>,
    pub mover: Option<Mover>,
    pub combat: Option<&'a mut Combat>,
    pub target: Option<Target>,
    pub input: &'a InputState,
    pub queue: &'a MutationSender,
    pub outbox: &'a mut Outbox,
    pub rng: &'a mut Rng,
}

impl ActorCtx<'_> {
    pub fn is_dead(&self) -> bool {
        self.health.is_some_and(|h| h.is_dead())
    }

    /// Target within attack range with the cooldown elapsed.
    pub fn can_attack(&self) -> bool {
        match (&self.combat, self.target) {
            (Some(combat), Some(target)) => combat.ready() && target.distance <= combat.range,
            _ => false,
        }
    }

    /// Horizontal direction (-1, 0, +1) towards the target.
    pub fn direction_to_target(&self) -> f32 {
        match self.target {
            Some(t) if t.position.x < self.position.x => -1.0,
            Some(t) if t.position.x > self.position.x => 1.0,
            _ => 0.0,
        }
    }

    /// Turn towards `dx`. Replicas keep the facing their owner sent.
    pub fn face(&mut self, dx: f32) {
        if self.authoritative {
            self.facing.look_towards(dx);
        }
    }

    /// Record the presentation for this state and replicate it.
    pub fn announce(&mut self, state: StateTag, animation: &str) {
        self.presentation.animation.clear();
        self.presentation.animation.push_str(animation);
        if self.authoritative {
            self.outbox.push(Packet::EntityStateChange {
                id: self.id,
                animation: animation.to_string(),
                flip_x: self.facing.flip_x,
                state,
                extra: self.presentation.extra.clone(),
            });
        }
    }

    /// Set horizontal velocity, keeping whatever vertical velocity the body has.
    pub fn set_velocity_x(&self, vx: f32) {
        if !self.authoritative {
            return;
        }
        let body = self.body;
        self.queue.enqueue(move |world| {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            let vy = physics.velocity(body).ok_or(SimError::BodyNotFound(body))?.y;
            physics
                .engine_mut()
                .set_linear_velocity(body, Vec2::new(vx, vy));
            Ok(())
        });
    }

    pub fn apply_impulse(&self, impulse: Vec2) {
        if !self.authoritative {
            return;
        }
        let body = self.body;
        self.queue.enqueue(move |world| {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            if physics.engine_mut().apply_linear_impulse(body, impulse) {
                Ok(())
            } else {
                Err(SimError::BodyNotFound(body))
            }
        });
    }

    /// Hit another entity. Resolved through the registry in the next drain.
    pub fn damage(&self, target: EntityId, amount: f32, direction: Vec2, knockback: f32) {
        if !self.authoritative {
            return;
        }
        self.queue.enqueue(move |world| {
            lifecycle::apply_damage(world, target, amount, direction, knockback);
            Ok(())
        });
    }

    pub fn spawn(&self, request: CreateEntity) {
        if !self.authoritative {
            return;
        }
        self.queue.enqueue(move |world| {
            lifecycle::create_entity(world, request);
            Ok(())
        });
    }

    pub fn remove_self(&self) {
        if !self.authoritative {
            return;
        }
        let id = self.id;
        self.queue.enqueue(move |world| {
            lifecycle::remove_entity(world, id);
            Ok(())
        });
    }

    pub fn respawn_self(&self) {
        if !self.authoritative {
            return;
        }
        let id = self.id;
        self.queue
            .enqueue(move |world| lifecycle::respawn_player(world, id));
    }
}

pub enum Machine {
    Player(StateMachine<PlayerOwner>),
    Enemy(StateMachine<EnemyOwner>),
}

#[derive(Component)]
pub struct Brain {
    machine: Machine,
    requested: Option<StateTag>,
}

impl Brain {
    /// New brains start by entering `Idle` on their first tick.
    pub fn player(machine: StateMachine<PlayerOwner>) -> Self {
        Self {
            machine: Machine::Player(machine),
            requested: Some(StateTag::Idle),
        }
    }

    pub fn enemy(machine: StateMachine<EnemyOwner>) -> Self {
        Self {
            machine: Machine::Enemy(machine),
            requested: Some(StateTag::Idle),
        }
    }

    pub fn current(&self) -> Option<StateTag> {
        match &self.machine {
            Machine::Player(fsm) => fsm.get_state().map(StateTag::from),
            Machine::Enemy(fsm) => fsm.get_state().map(StateTag::from),
        }
    }

    pub fn requested(&self) -> Option<StateTag> {
        self.requested
    }

    /// True if the actor is in `tag` or will enter it on its next tick.
    pub fn is_in_or_entering(&self, tag: StateTag) -> bool {
        self.requested == Some(tag) || self.current() == Some(tag)
    }

    pub fn supports(&self, tag: StateTag) -> bool {
        match &self.machine {
            Machine::Player(fsm) => fsm.has_state(PlayerState::from_tag(tag)),
            Machine::Enemy(fsm) => EnemyState::from_tag(tag).is_some_and(|s| fsm.has_state(s)),
        }
    }

    /// Ask for a transition on the next tick. Returns `false` if this actor
    /// family has no such state.
    pub fn request(&mut self, tag: StateTag) -> bool {
        if !self.supports(tag) {
            warn!("state {:?} not supported by this actor, request ignored", tag);
            return false;
        }
        if let Some(pending) = self.requested {
            debug!("transition request {:?} replaced by {:?}", pending, tag);
        }
        self.requested = Some(tag);
        true
    }

    /// Apply any pending request, then (when `drive` is set) update the
    /// current state.
    pub fn run(&mut self, ctx: &mut ActorCtx<'_>, delta: f32, drive: bool) {
        let requested = self.requested.take();
        match &mut self.machine {
            Machine::Player(fsm) => {
                fsm.set_state(requested.map(PlayerState::from_tag), ctx);
                if drive {
                    fsm.update(ctx, delta);
                }
            }
            Machine::Enemy(fsm) => {
                fsm.set_state(requested.and_then(EnemyState::from_tag), ctx);
                if drive {
                    fsm.update(ctx, delta);
                }
            }
        }
    }
}
