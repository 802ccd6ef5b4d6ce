//! Inbound side of the network contract.
//!
//! [`apply_inbound`] maps one received [`Packet`] onto registry operations.
//! It always runs on the simulation thread inside the drain: transports hand
//! packets to [`SessionHandle::deliver`](crate::session::SessionHandle::deliver),
//! which enqueues this function as a mutation.
//!
//! | Packet | Effect |
//! |---|---|
//! | `EntityCreated` | create a remote replica with the given id |
//! | `EntityRemoved` | remove locally, no echo |
//! | `EntityPosition` | transform/velocity write (never for our own player) |
//! | `EntityDamage` | damage, if this session owns the target |
//! | `EntityStateChange` | request the state on a replica unless it is mid-ATTACK/DAMAGE |
//! | `ScoreChanged` | overwrite the participant's score |
//! | `ChatMessage` | append to the [`ChatLog`] |
//!
//! Rejected packets come back as `Err` so the drain counts them; none of them
//! stops the session.

use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::brain::{Brain, StateTag};
use crate::components::entityid::{Authority, EntityId};
use crate::components::facing::Facing;
use crate::components::presentation::Presentation;
use crate::error::{SimError, SimResult};
use crate::events::packet::Packet;
use crate::lifecycle::{self, CreateEntity};
use crate::math::Vec2;
use crate::resources::chatlog::ChatLog;
use crate::resources::registry::EntityRegistry;

pub fn apply_inbound(world: &mut World, packet: Packet) -> SimResult {
    match packet {
        Packet::EntityCreated {
            id,
            kind,
            x,
            y,
            vx,
            vy,
            flip_x,
        } => {
            let request = CreateEntity::new(kind, Vec2::new(x, y))
                .with_velocity(Vec2::new(vx, vy))
                .with_id(id)
                .flipped(flip_x)
                .remote();
            lifecycle::create_entity(world, request)
                .map(|_| ())
                .ok_or(SimError::DuplicateId(id))
        }
        Packet::EntityRemoved { id } => {
            if lifecycle::remove_entity_local(world, id) {
                Ok(())
            } else {
                Err(SimError::EntityNotFound(id))
            }
        }
        Packet::EntityPosition { id, x, y, velocity } => {
            if !world.resource::<EntityRegistry>().contains(id) {
                return Err(SimError::EntityNotFound(id));
            }
            lifecycle::sync_position(world, id, Vec2::new(x, y), velocity);
            Ok(())
        }
        Packet::EntityDamage {
            target_id,
            amount,
            dir_x,
            dir_y,
            knockback,
        } => {
            let entity = world
                .resource::<EntityRegistry>()
                .get(target_id)
                .ok_or(SimError::EntityNotFound(target_id))?;
            if !world.get::<Authority>(entity).is_some_and(|a| a.is_local()) {
                debug!("damage for {} is not ours to apply", target_id);
                return Ok(());
            }
            lifecycle::apply_damage(world, target_id, amount, Vec2::new(dir_x, dir_y), knockback);
            Ok(())
        }
        Packet::EntityStateChange {
            id,
            animation,
            flip_x,
            state,
            extra,
        } => apply_state_change(world, id, animation, flip_x, state, extra),
        Packet::ScoreChanged { player_id, score } => {
            if lifecycle::sync_score(world, player_id, score) {
                Ok(())
            } else {
                Err(SimError::UnknownParticipant(player_id))
            }
        }
        Packet::ChatMessage { sender, text } => {
            info!("[chat] {}: {}", sender, text);
            world.resource_mut::<ChatLog>().push(sender, text);
            Ok(())
        }
    }
}

fn apply_state_change(
    world: &mut World,
    id: EntityId,
    animation: String,
    flip_x: bool,
    state: StateTag,
    extra: Option<String>,
) -> SimResult {
    let entity = world
        .resource::<EntityRegistry>()
        .get(id)
        .ok_or(SimError::EntityNotFound(id))?;
    if world.get::<Authority>(entity).is_some_and(|a| a.is_local()) {
        debug!("state override for {} ignored, this session owns it", id);
        return Ok(());
    }

    if let Some(mut brain) = world.get_mut::<Brain>(entity) {
        if brain.is_in_or_entering(StateTag::Attack) || brain.is_in_or_entering(StateTag::Damage) {
            debug!("{} is busy, state override to {:?} refused", id, state);
            return Ok(());
        }
        brain.request(state);
    }
    if let Some(mut facing) = world.get_mut::<Facing>(entity) {
        facing.flip_x = flip_x;
    }
    if let Some(mut presentation) = world.get_mut::<Presentation>(entity) {
        presentation.animation = animation;
        presentation.extra = extra;
    }
    Ok(())
}
