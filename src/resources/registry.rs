//! Entity bookkeeping.
//!
//! [`EntityRegistry`] maps network-visible [`EntityId`]s to ECS entities and
//! physics bodies back to ids. It never touches physics itself; the
//! operations that build and tear down entities live in
//! [`crate::lifecycle`] and run inside the drain phase.
//!
//! An id moves through two stages:
//!
//! 1. **reserved** – `create_entity` accepted it and queued the build
//! 2. **live** – the build ran and the ECS entity exists
//!
//! Ids in either stage count as taken, so a duplicate create is detected even
//! when it arrives before the first one has been drained.
//!
//! Every reservation carries a [`Ticket`]. A queued build only proceeds while
//! its ticket still holds, so a creation that was cancelled and then reissued
//! under the same id builds the second request, not the first.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::entityid::{EntityId, PlayerId};
use crate::resources::physics::BodyHandle;

/// Identifies one reservation of an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// A reserved id that has not been built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub ticket: Ticket,
    /// Player whose spawn point the pending build holds.
    pub controller: Option<PlayerId>,
}

#[derive(Resource, Debug, Default)]
pub struct EntityRegistry {
    next_id: i64,
    next_ticket: u64,
    live: FxHashMap<EntityId, Entity>,
    bodies: FxHashMap<BodyHandle, EntityId>,
    reserved: FxHashMap<EntityId, Reservation>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose counter starts at `base`.
    ///
    /// Sessions sharing a game give each other disjoint bases so ids they
    /// allocate locally never collide with replicated ones.
    pub fn with_id_base(base: i64) -> Self {
        Self {
            next_id: base,
            ..Self::default()
        }
    }

    /// Draw the next id from the counter and reserve it.
    ///
    /// Ids already taken by explicit (replicated) creates are skipped.
    pub fn allocate(&mut self, controller: Option<PlayerId>) -> (EntityId, Ticket) {
        loop {
            let id = EntityId(self.next_id);
            self.next_id += 1;
            if let Some(ticket) = self.reserve(id, controller) {
                return (id, ticket);
            }
        }
    }

    /// Reserve an explicit id. Returns `None` if it is live or reserved.
    pub fn reserve(&mut self, id: EntityId, controller: Option<PlayerId>) -> Option<Ticket> {
        if self.is_taken(id) {
            return None;
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.reserved.insert(id, Reservation { ticket, controller });
        Some(ticket)
    }

    /// Drop a reservation whose build never happened.
    pub fn unreserve(&mut self, id: EntityId) -> Option<Reservation> {
        self.reserved.remove(&id)
    }

    /// Whether `ticket` is still the current reservation of `id`.
    pub fn holds(&self, id: EntityId, ticket: Ticket) -> bool {
        self.reserved.get(&id).is_some_and(|r| r.ticket == ticket)
    }

    /// Promote a reserved id to live.
    pub fn insert(&mut self, id: EntityId, entity: Entity, body: BodyHandle) {
        self.reserved.remove(&id);
        self.live.insert(id, entity);
        self.bodies.insert(body, id);
    }

    /// Forget a live id. The caller is responsible for the body and the ECS entity.
    pub fn remove(&mut self, id: EntityId, body: Option<BodyHandle>) -> Option<Entity> {
        if let Some(body) = body {
            self.bodies.remove(&body);
        }
        self.live.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<Entity> {
        self.live.get(&id).copied()
    }

    pub fn by_body(&self, body: BodyHandle) -> Option<EntityId> {
        self.bodies.get(&body).copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn is_reserved(&self, id: EntityId) -> bool {
        self.reserved.contains_key(&id)
    }

    pub fn is_taken(&self, id: EntityId) -> bool {
        self.contains(id) || self.is_reserved(id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.keys().copied()
    }

    /// Forget everything, including pending reservations. The id counter keeps
    /// running so ids are never reused within a process.
    pub fn clear(&mut self) {
        self.live.clear();
        self.bodies.clear();
        self.reserved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_monotonic_and_skips_taken() {
        let mut registry = EntityRegistry::new();
        assert!(registry.reserve(EntityId(1), None).is_some());
        assert_eq!(registry.allocate(None).0, EntityId(0));
        assert_eq!(registry.allocate(None).0, EntityId(2));
    }

    #[test]
    fn test_id_base() {
        let mut registry = EntityRegistry::with_id_base(1000);
        assert_eq!(registry.allocate(None).0, EntityId(1000));
    }

    #[test]
    fn test_reserve_rejects_duplicates() {
        let mut registry = EntityRegistry::new();
        assert!(registry.reserve(EntityId(42), None).is_some());
        assert!(registry.reserve(EntityId(42), None).is_none());

        let mut world = World::new();
        let entity = world.spawn_empty().id();
        registry.insert(EntityId(42), entity, BodyHandle(3));
        assert!(!registry.is_reserved(EntityId(42)));
        assert!(registry.reserve(EntityId(42), None).is_none());
        assert_eq!(registry.by_body(BodyHandle(3)), Some(EntityId(42)));
    }

    #[test]
    fn test_remove_forgets_body_mapping() {
        let mut registry = EntityRegistry::new();
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let (id, _) = registry.allocate(None);
        registry.insert(id, entity, BodyHandle(0));
        assert_eq!(registry.remove(id, Some(BodyHandle(0))), Some(entity));
        assert_eq!(registry.by_body(BodyHandle(0)), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reissued_reservation_gets_a_new_ticket() {
        let mut registry = EntityRegistry::new();
        let first = registry.reserve(EntityId(5), None).unwrap();
        let cancelled = registry.unreserve(EntityId(5)).unwrap();
        assert_eq!(cancelled.ticket, first);

        let second = registry.reserve(EntityId(5), Some(PlayerId(2))).unwrap();
        assert_ne!(first, second);
        assert!(!registry.holds(EntityId(5), first));
        assert!(registry.holds(EntityId(5), second));
        assert_eq!(
            registry.unreserve(EntityId(5)).and_then(|r| r.controller),
            Some(PlayerId(2))
        );
    }
}
