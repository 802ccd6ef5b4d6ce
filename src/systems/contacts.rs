//! Contact resolution.
//!
//! Reads the contacts the engine reported for the last step and turns the
//! interesting ones into deferred mutations:
//!
//! - a projectile touching an opposing actor damages it and is removed
//! - a projectile touching level geometry is removed
//! - an item touching a player is removed and credits the player's score
//!
//! Projectiles are resolved by the session that owns them. Pickups are
//! resolved by the session that owns the player, whoever owns the item: the
//! removal it broadcasts reaches the item's owner. Entities already being
//! removed are skipped, and each projectile or item is consumed at most once
//! per tick.

use bevy_ecs::prelude::*;
use log::debug;
use rustc_hash::FxHashSet;

use crate::components::despawning::Despawning;
use crate::components::entityid::{Authority, Controller, EntityId};
use crate::components::kind::EntityKind;
use crate::components::pickup::Pickup;
use crate::components::projectile::Projectile;
use crate::lifecycle;
use crate::resources::deferredworld::MutationSender;
use crate::resources::physics::{BodyHandle, PhysicsWorld};
use crate::resources::registry::EntityRegistry;

pub fn resolve_contacts_system(
    physics: Res<PhysicsWorld>,
    registry: Res<EntityRegistry>,
    queue: Res<MutationSender>,
    entities: Query<(&EntityKind, &Authority, Option<&Controller>), Without<Despawning>>,
    projectiles: Query<&Projectile, Without<Despawning>>,
    pickups: Query<&Pickup, Without<Despawning>>,
) {
    let mut consumed: FxHashSet<EntityId> = FxHashSet::default();

    let resolve = |body: BodyHandle| -> Option<(EntityId, Entity)> {
        let id = registry.by_body(body)?;
        Some((id, registry.get(id)?))
    };

    for contact in physics.engine().contacts() {
        for (this, other) in [(contact.a, contact.b), (contact.b, contact.a)] {
            let (Some((this_id, this_entity)), Some((other_id, other_entity))) =
                (resolve(this), resolve(other))
            else {
                continue;
            };
            if consumed.contains(&this_id) {
                continue;
            }
            let Ok((_, this_authority, _)) = entities.get(this_entity) else {
                continue;
            };
            let Ok((other_kind, other_authority, other_controller)) = entities.get(other_entity)
            else {
                continue;
            };

            if let Ok(projectile) = projectiles.get(this_entity) {
                if !this_authority.is_local() || projectile.shooter == Some(other_id) {
                    continue;
                }
                match other_kind {
                    EntityKind::Static => {
                        consumed.insert(this_id);
                        queue.enqueue(move |world| {
                            lifecycle::remove_entity(world, this_id);
                            Ok(())
                        });
                    }
                    kind if kind.faction() == Some(projectile.faction.opponent()) => {
                        consumed.insert(this_id);
                        let (damage, knockback) = (projectile.damage, projectile.knockback);
                        let direction = match (physics.position(other), physics.position(this)) {
                            (Some(to), Some(from)) => to - from,
                            _ => Default::default(),
                        };
                        debug!("projectile {} hit {}", this_id, other_id);
                        queue.enqueue(move |world| {
                            lifecycle::apply_damage(world, other_id, damage, direction, knockback);
                            lifecycle::remove_entity(world, this_id);
                            Ok(())
                        });
                    }
                    _ => {}
                }
            } else if let Ok(pickup) = pickups.get(this_entity) {
                if !other_authority.is_local() {
                    continue;
                }
                let (EntityKind::Player, Some(Controller(player))) = (other_kind, other_controller)
                else {
                    continue;
                };
                consumed.insert(this_id);
                let (value, player) = (pickup.value, *player);
                debug!("{} picked up {} worth {}", player, this_id, value);
                queue.enqueue(move |world| {
                    if lifecycle::remove_entity(world, this_id) {
                        lifecycle::add_score(world, player, value);
                    }
                    Ok(())
                });
            }
        }
    }
}
