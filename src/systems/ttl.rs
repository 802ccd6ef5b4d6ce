//! TTL (Time-to-live) system.
//!
//! This module provides the [`ttl_system`] that counts down TTL timers and
//! removes entities when their time runs out.
//!
//! # System Flow
//!
//! Each tick:
//!
//! 1. `ttl_system` iterates all locally owned entities with [`Ttl`]
//! 2. Decrements `remaining` by the tick delta
//! 3. When it expires, queues [`remove_entity`](crate::lifecycle::remove_entity)
//!
//! Replicas never expire on their own: the owning session's `EntityRemoved`
//! removes them.
//!
//! # Time Scaling
//!
//! The countdown uses [`WorldTime::delta`], which is already scaled, so
//! slow-motion effects affect TTL duration.

use bevy_ecs::prelude::*;
use log::trace;

use crate::components::despawning::Despawning;
use crate::components::entityid::{Authority, EntityId};
use crate::components::ttl::Ttl;
use crate::lifecycle;
use crate::resources::deferredworld::MutationSender;
use crate::resources::worldtime::WorldTime;

pub fn ttl_system(
    world_time: Res<WorldTime>,
    queue: Res<MutationSender>,
    mut query: Query<(&EntityId, &Authority, &mut Ttl), Without<Despawning>>,
) {
    let dt = world_time.delta;
    for (id, authority, mut ttl) in query.iter_mut() {
        if !authority.is_local() {
            continue;
        }
        if ttl.tick(dt) {
            let id = *id;
            trace!("{} expired", id);
            queue.enqueue(move |world| {
                lifecycle::remove_entity(world, id);
                Ok(())
            });
        }
    }
}
