//! Actor brain tick.
//!
//! Runs once per tick, after the drain. For every actor:
//!
//! 1. ticks the attack cooldown
//! 2. builds an [`ActorCtx`] with the body state read from physics and the
//!    nearest living opponent as target
//! 3. applies any pending transition request, then updates the current state
//!
//! Replicas update only while in ATTACK or DAMAGE. Those windows end on their
//! own timer and refuse network overrides, so the replica has to close them
//! itself; every other transition comes from the owner's packets. Side effects
//! are suppressed either way.
//!
//! Targets come from a roster snapshot taken before any brain runs, so the
//! order actors are visited in does not change what they see.

use bevy_ecs::prelude::*;

use crate::components::body::PhysicsBody;
use crate::components::brain::{ActorCtx, Brain, StateTag, Target};
use crate::components::combat::Combat;
use crate::components::despawning::Despawning;
use crate::components::entityid::{Authority, EntityId};
use crate::components::facing::Facing;
use crate::components::health::Health;
use crate::components::kind::{EntityKind, Faction};
use crate::components::mover::Mover;
use crate::components::presentation::Presentation;
use crate::math::Vec2;
use crate::resources::deferredworld::MutationSender;
use crate::resources::input::InputState;
use crate::resources::netbridge::Outbox;
use crate::resources::physics::PhysicsWorld;
use crate::resources::simrng::SimRng;
use crate::resources::worldtime::WorldTime;

type ActorQuery = (
    &'static EntityId,
    &'static EntityKind,
    &'static Authority,
    &'static PhysicsBody,
    &'static mut Facing,
    &'static mut Presentation,
    Option<&'static Health>,
    Option<&'static Mover>,
    Option<&'static mut Combat>,
    &'static mut Brain,
);

struct RosterEntry {
    id: EntityId,
    faction: Faction,
    position: Vec2,
}

fn nearest(roster: &[RosterEntry], faction: Faction, from: Vec2) -> Option<Target> {
    roster
        .iter()
        .filter(|e| e.faction == faction)
        .map(|e| Target {
            id: e.id,
            position: e.position,
            distance: e.position.distance(from),
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

pub fn actor_brain_system(
    mut actors: Query<ActorQuery, Without<Despawning>>,
    physics: Res<PhysicsWorld>,
    input: Res<InputState>,
    queue: Res<MutationSender>,
    time: Res<WorldTime>,
    mut outbox: ResMut<Outbox>,
    mut rng: ResMut<SimRng>,
) {
    let delta = time.delta;

    let roster: Vec<RosterEntry> = actors
        .iter()
        .filter(|(.., health, _, _, _)| !health.is_some_and(|h| h.is_dead()))
        .filter_map(|(id, kind, _, body, ..)| {
            Some(RosterEntry {
                id: *id,
                faction: kind.faction()?,
                position: physics.position(body.handle)?,
            })
        })
        .collect();

    for (
        id,
        kind,
        authority,
        body,
        mut facing,
        mut presentation,
        health,
        mover,
        mut combat,
        mut brain,
    ) in actors.iter_mut()
    {
        if let Some(combat) = combat.as_mut() {
            combat.tick(delta);
        }

        let position = physics.position(body.handle).unwrap_or_default();
        let target = kind
            .faction()
            .and_then(|f| nearest(&roster, f.opponent(), position));

        let mut ctx = ActorCtx {
            id: *id,
            kind: *kind,
            body: body.handle,
            position,
            velocity: physics.velocity(body.handle).unwrap_or_default(),
            authoritative: authority.is_local(),
            facing: &mut facing,
            presentation: &mut presentation,
            health: health.copied(),
            mover: mover.copied(),
            combat: combat.as_deref_mut(),
            target,
            input: &input,
            queue: &queue,
            outbox: &mut outbox,
            rng: &mut rng.0,
        };
        let drive = authority.is_local()
            || brain.current().is_some_and(|s| matches!(s, StateTag::Attack | StateTag::Damage));
        brain.run(&mut ctx, delta, drive);
    }
}
