//! Outbound replication.
//!
//! - [`broadcast_positions`] queues `EntityPosition` packets for this
//!   session's actors every `position_sync_interval` ticks
//! - [`flush_outbox`] hands everything queued during the tick to the
//!   [`NetBridge`] sink, in emission order
//!
//! `flush_outbox` runs last in the schedule so a tick's packets leave
//! together.

use bevy_ecs::prelude::*;
use log::trace;

use crate::components::body::PhysicsBody;
use crate::components::brain::Brain;
use crate::components::despawning::Despawning;
use crate::components::entityid::{Authority, EntityId};
use crate::events::packet::Packet;
use crate::resources::netbridge::{NetBridge, Outbox};
use crate::resources::physics::PhysicsWorld;
use crate::resources::sessionconfig::SessionConfig;
use crate::resources::worldtime::WorldTime;

pub fn broadcast_positions(
    config: Res<SessionConfig>,
    time: Res<WorldTime>,
    physics: Res<PhysicsWorld>,
    actors: Query<(&EntityId, &Authority, &PhysicsBody), (With<Brain>, Without<Despawning>)>,
    mut outbox: ResMut<Outbox>,
) {
    let interval = u64::from(config.position_sync_interval);
    if interval == 0 || time.tick % interval != 0 {
        return;
    }
    for (id, authority, body) in actors.iter() {
        if !authority.is_local() {
            continue;
        }
        let Some(position) = physics.position(body.handle) else {
            continue;
        };
        outbox.push(Packet::EntityPosition {
            id: *id,
            x: position.x,
            y: position.y,
            velocity: physics.velocity(body.handle),
        });
    }
}

pub fn flush_outbox(bridge: Res<NetBridge>, mut outbox: ResMut<Outbox>) {
    if outbox.is_empty() {
        return;
    }
    trace!("flushing {} packets", outbox.len());
    for packet in outbox.drain() {
        bridge.send(packet);
    }
}
