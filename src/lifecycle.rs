//! Entity lifecycle operations.
//!
//! Everything that creates, destroys or changes a simulated entity goes
//! through the functions here. They take `&mut World` so they can be called
//! both synchronously on the simulation thread (session wrappers, systems
//! running after the drain) and from inside deferred mutations (inbound
//! packets, actor side effects).
//!
//! Bookkeeping (registry reservations, scores, health, transition requests,
//! outbound packets) happens immediately. Anything touching physics is
//! enqueued on the [`MutationSender`] and runs in the drain phase. When the
//! caller is itself a mutation, entity builds and teardowns run on the spot,
//! so the mutations queued behind it (the rest of an inbound packet batch)
//! already see the result; other physics writes are drained in the same step.
//!
//! # Failure policy
//!
//! Network packets can arrive after an entity is gone, so unknown ids,
//! duplicate ids and missing capabilities are logged and skipped. Nothing
//! here panics on bad input.
//!
//! # Related
//!
//! - [`crate::resources::registry::EntityRegistry`] – id bookkeeping
//! - [`crate::archetype`] – what each kind is built with
//! - [`crate::replication`] – maps inbound packets onto these operations

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::archetype::{self, Archetype};
use crate::components::body::PhysicsBody;
use crate::components::brain::{Brain, StateTag};
use crate::components::despawning::Despawning;
use crate::components::entityid::{Authority, Controller, EntityId, PlayerId};
use crate::components::facing::Facing;
use crate::components::health::Health;
use crate::components::kind::EntityKind;
use crate::components::pickup::Pickup;
use crate::components::presentation::Presentation;
use crate::components::projectile::Projectile;
use crate::components::ttl::Ttl;
use crate::error::{SimError, SimResult};
use crate::events::packet::Packet;
use crate::math::Vec2;
use crate::resources::deferredworld::MutationSender;
use crate::resources::netbridge::Outbox;
use crate::resources::physics::{BodyHandle, PhysicsWorld, StepPhase};
use crate::resources::registry::{EntityRegistry, Ticket};
use crate::resources::scoreboard::ScoreBoard;
use crate::resources::spawnmanager::SpawnManager;

/// Parameters of one entity creation.
#[derive(Debug, Clone)]
pub struct CreateEntity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Explicit id for replicated creation; drawn from the counter otherwise.
    pub id: Option<EntityId>,
    pub flip_x: bool,
    pub authority: Authority,
    pub controller: Option<PlayerId>,
    /// Damage payload, for projectiles fired by this session.
    pub projectile: Option<Projectile>,
}

impl CreateEntity {
    pub fn new(kind: EntityKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            velocity: Vec2::ZERO,
            id: None,
            flip_x: false,
            authority: Authority::Local,
            controller: None,
            projectile: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn flipped(mut self, flip_x: bool) -> Self {
        self.flip_x = flip_x;
        self
    }

    /// Replica of an entity owned by another session.
    pub fn remote(mut self) -> Self {
        self.authority = Authority::Remote;
        self
    }

    pub fn controlled_by(mut self, player: PlayerId) -> Self {
        self.controller = Some(player);
        self
    }

    pub fn with_projectile(mut self, projectile: Projectile) -> Self {
        self.projectile = Some(projectile);
        self
    }
}

/// Result of [`apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Health reduced, DAMAGE requested and knockback queued.
    Applied,
    /// Target is a replica; an `EntityDamage` packet went to its authority.
    Forwarded,
    /// Unknown, not damageable, already hurt or already being removed.
    Ignored,
}

/// Read-only view of one live entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub authority: Authority,
    pub controller: Option<PlayerId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub flip_x: bool,
    pub state: Option<StateTag>,
    pub health: Option<f32>,
    pub animation: String,
}

fn sender(world: &World) -> MutationSender {
    world.resource::<MutationSender>().clone()
}

/// Whether the caller is a mutation running at the safe point, where physics
/// may be written directly.
fn in_drain(world: &World) -> bool {
    world.resource::<PhysicsWorld>().phase() == StepPhase::Draining
}

fn emit(world: &mut World, packet: Packet) {
    world.resource_mut::<Outbox>().push(packet);
}

/// Accept a creation request and queue the build.
///
/// Returns the id the entity will have, or `None` when an explicit id is
/// already live or reserved. The entity exists in the registry only once the
/// build has run in a drain.
pub fn create_entity(world: &mut World, request: CreateEntity) -> Option<EntityId> {
    // Only players hold a spawn claim while their build is pending.
    let controller = request.controller.filter(|_| request.kind == EntityKind::Player);
    let (id, ticket) = {
        let mut registry = world.resource_mut::<EntityRegistry>();
        match request.id {
            Some(id) => {
                let Some(ticket) = registry.reserve(id, controller) else {
                    warn!("duplicate entity id {}, {:?} not created", id, request.kind);
                    return None;
                };
                (id, ticket)
            }
            None => registry.allocate(controller),
        }
    };
    if in_drain(world) {
        // Later mutations of this drain (the rest of a packet batch) must see it.
        if let Err(e) = build_entity(world, id, ticket, request) {
            warn!("building {} failed: {}", id, e);
        }
        return Some(id);
    }
    debug!("queued creation of {:?} {} at {:?}", request.kind, id, request.position);
    sender(world).enqueue(move |world| build_entity(world, id, ticket, request));
    Some(id)
}

fn build_entity(
    world: &mut World,
    id: EntityId,
    ticket: Ticket,
    request: CreateEntity,
) -> SimResult {
    if !world.resource::<EntityRegistry>().holds(id, ticket) {
        debug!("creation of {} was cancelled before it was built", id);
        return Ok(());
    }

    let archetype = Archetype::of(request.kind);
    let body = {
        let mut physics = world.resource_mut::<PhysicsWorld>();
        let engine = physics.engine_mut();
        let body = engine.create_body(&archetype.body_def(request.position, request.velocity));
        engine.create_fixture(body, &archetype.fixture_def());
        body
    };

    let mut entity = world.spawn((
        id,
        request.kind,
        request.authority,
        PhysicsBody { handle: body },
        Facing::new(request.flip_x),
        Presentation::default(),
    ));
    if let Some(max) = archetype.health {
        entity.insert(Health::new(max));
    }
    if let Some(mover) = archetype.mover {
        entity.insert(mover);
    }
    if let Some(combat) = archetype.combat {
        entity.insert(combat);
    }
    if let Some(value) = archetype.pickup {
        entity.insert(Pickup { value });
    }
    if let Some(seconds) = archetype.ttl {
        entity.insert(Ttl::new(seconds));
    }
    if let Some(projectile) = request.projectile {
        entity.insert(projectile);
    }
    if let Some(player) = request.controller {
        entity.insert(Controller(player));
    }
    if let Some(brain) = archetype::brain_for(request.kind) {
        entity.insert(brain);
    }
    let entity = entity.id();

    world
        .resource_mut::<EntityRegistry>()
        .insert(id, entity, body);

    // Level geometry is loaded by every session and never replicated.
    if request.authority.is_local() && request.kind != EntityKind::Static {
        emit(
            world,
            Packet::EntityCreated {
                id,
                kind: request.kind,
                x: request.position.x,
                y: request.position.y,
                vx: request.velocity.x,
                vy: request.velocity.y,
                flip_x: request.flip_x,
            },
        );
    }
    debug!("built {:?} {} (body {:?})", request.kind, id, body);
    Ok(())
}

/// Remove an entity and tell the replicas.
pub fn remove_entity(world: &mut World, id: EntityId) -> bool {
    remove_with(world, id, true)
}

/// Remove an entity from this session only.
pub fn remove_entity_local(world: &mut World, id: EntityId) -> bool {
    remove_with(world, id, false)
}

fn remove_with(world: &mut World, id: EntityId, broadcast: bool) -> bool {
    if let Some(reservation) = world.resource_mut::<EntityRegistry>().unreserve(id) {
        debug!("{} removed before it was built", id);
        if let Some(player) = reservation.controller {
            world.resource_mut::<SpawnManager>().release(player);
        }
    } else {
        let Some(entity) = world.resource::<EntityRegistry>().get(id) else {
            warn!("remove of unknown entity {} ignored", id);
            return false;
        };
        if world.get::<Despawning>(entity).is_some() {
            debug!("{} is already being removed", id);
            return false;
        }
        if in_drain(world) {
            if let Err(e) = detach_entity(world, id) {
                warn!("detaching {} failed: {}", id, e);
            }
        } else {
            world.entity_mut(entity).insert(Despawning);
            sender(world).enqueue(move |world| detach_entity(world, id));
        }
    }

    if broadcast {
        emit(world, Packet::EntityRemoved { id });
    }
    true
}

/// Destroy the body (fixtures first), then drop the entity from the registry
/// and the ECS world. Runs in the drain.
fn detach_entity(world: &mut World, id: EntityId) -> SimResult {
    let entity = world
        .resource::<EntityRegistry>()
        .get(id)
        .ok_or(SimError::EntityNotFound(id))?;

    let body = world.get::<PhysicsBody>(entity).map(|b| b.handle);
    if let Some(handle) = body {
        world.resource_mut::<PhysicsWorld>().detach_body(handle);
    }
    world.resource_mut::<EntityRegistry>().remove(id, body);

    let is_player = world.get::<EntityKind>(entity) == Some(&EntityKind::Player);
    let controller = world.get::<Controller>(entity).map(|c| c.0);
    world.despawn(entity);

    if is_player {
        if let Some(player) = controller {
            world.resource_mut::<SpawnManager>().release(player);
        }
    }
    debug!("detached {}", id);
    Ok(())
}

/// Hit an entity. Edge-triggered: a target already in (or about to enter)
/// DAMAGE ignores further hits until it leaves that state.
pub fn apply_damage(
    world: &mut World,
    id: EntityId,
    amount: f32,
    direction: Vec2,
    knockback: f32,
) -> DamageOutcome {
    let Some(entity) = world.resource::<EntityRegistry>().get(id) else {
        warn!("damage to unknown entity {} ignored", id);
        return DamageOutcome::Ignored;
    };
    if world.get::<Health>(entity).is_none() {
        debug!("{} is not damageable", id);
        return DamageOutcome::Ignored;
    }
    if world.get::<Despawning>(entity).is_some() {
        return DamageOutcome::Ignored;
    }
    if world
        .get::<Brain>(entity)
        .is_some_and(|b| b.is_in_or_entering(StateTag::Damage))
    {
        debug!("{} already hurt, hit ignored", id);
        return DamageOutcome::Ignored;
    }

    let authority = world.get::<Authority>(entity).copied().unwrap_or_default();
    if !authority.is_local() {
        emit(
            world,
            Packet::EntityDamage {
                target_id: id,
                amount,
                dir_x: direction.x,
                dir_y: direction.y,
                knockback,
            },
        );
        return DamageOutcome::Forwarded;
    }

    let left = match world.get_mut::<Health>(entity) {
        Some(mut health) => health.take(amount),
        None => return DamageOutcome::Ignored,
    };
    if let Some(mut brain) = world.get_mut::<Brain>(entity) {
        brain.request(StateTag::Damage);
    }
    debug!("{} took {} damage, {} left", id, amount, left);

    if let Some(handle) = world.get::<PhysicsBody>(entity).map(|b| b.handle) {
        let impulse = direction.normalize_or_zero() * knockback;
        sender(world).enqueue(move |world| {
            let mut physics = world.resource_mut::<PhysicsWorld>();
            if physics.engine_mut().apply_linear_impulse(handle, impulse) {
                Ok(())
            } else {
                Err(SimError::BodyNotFound(handle))
            }
        });
    }
    DamageOutcome::Applied
}

/// Queue a transform (and optionally velocity) write from a remote update.
///
/// Players simulated by this session are never overridden.
pub fn sync_position(
    world: &mut World,
    id: EntityId,
    position: Vec2,
    velocity: Option<Vec2>,
) -> bool {
    let Some(entity) = world.resource::<EntityRegistry>().get(id) else {
        warn!("position for unknown entity {} ignored", id);
        return false;
    };
    let is_player = world.get::<EntityKind>(entity) == Some(&EntityKind::Player);
    let is_local = world.get::<Authority>(entity).is_some_and(|a| a.is_local());
    if is_player && is_local {
        debug!("position override for local player {} ignored", id);
        return false;
    }
    let Some(handle) = world.get::<PhysicsBody>(entity).map(|b| b.handle) else {
        return false;
    };
    sender(world).enqueue(move |world| set_body_state(world, handle, position, velocity));
    true
}

fn set_body_state(
    world: &mut World,
    handle: BodyHandle,
    position: Vec2,
    velocity: Option<Vec2>,
) -> SimResult {
    let mut physics = world.resource_mut::<PhysicsWorld>();
    let engine = physics.engine_mut();
    if !engine.set_transform(handle, position) {
        return Err(SimError::BodyNotFound(handle));
    }
    if let Some(velocity) = velocity {
        engine.set_linear_velocity(handle, velocity);
    }
    Ok(())
}

/// Overwrite a participant's score from a remote update.
pub fn sync_score(world: &mut World, player: PlayerId, score: i64) -> bool {
    if !world.resource_mut::<ScoreBoard>().set_score(player, score) {
        warn!("score for unknown participant {} ignored", player);
        return false;
    }
    true
}

/// Credit points earned in this session and replicate the new total.
pub fn add_score(world: &mut World, player: PlayerId, amount: i64) -> Option<i64> {
    let Some(score) = world.resource_mut::<ScoreBoard>().add(player, amount) else {
        warn!("score for unknown participant {} ignored", player);
        return None;
    };
    emit(world, Packet::ScoreChanged { player_id: player, score });
    Some(score)
}

/// Spawn a player entity at a freshly claimed spawn point.
pub fn spawn_player(
    world: &mut World,
    player: PlayerId,
    authority: Authority,
) -> SimResult<EntityId> {
    let point = world
        .resource_mut::<SpawnManager>()
        .claim(player)
        .ok_or(SimError::NoSpawnAvailable(player))?;
    let mut request = CreateEntity::new(EntityKind::Player, point).controlled_by(player);
    request.authority = authority;
    // Only explicit ids can be rejected, so this always yields an id.
    create_entity(world, request).ok_or(SimError::NoSpawnAvailable(player))
}

/// Move a dead player to a new spawn point with full health.
pub fn respawn_player(world: &mut World, id: EntityId) -> SimResult {
    let entity = world
        .resource::<EntityRegistry>()
        .get(id)
        .ok_or(SimError::EntityNotFound(id))?;
    let player = world
        .get::<Controller>(entity)
        .map(|c| c.0)
        .unwrap_or(PlayerId::LOCAL);
    let point = world
        .resource_mut::<SpawnManager>()
        .respawn(player)
        .ok_or(SimError::NoSpawnAvailable(player))?;

    if let Some(mut health) = world.get_mut::<Health>(entity) {
        health.restore();
    }
    if let Some(mut brain) = world.get_mut::<Brain>(entity) {
        brain.request(StateTag::Idle);
    }
    let handle = world
        .get::<PhysicsBody>(entity)
        .map(|b| b.handle)
        .ok_or(SimError::EntityNotFound(id))?;
    sender(world).enqueue(move |world| set_body_state(world, handle, point, Some(Vec2::ZERO)));

    emit(
        world,
        Packet::EntityPosition {
            id,
            x: point.x,
            y: point.y,
            velocity: Some(Vec2::ZERO),
        },
    );
    info!("{} respawned at {:?}", id, point);
    Ok(())
}

/// Destroy every entity and reset the bookkeeping. Runs in the drain; used by
/// session teardown.
pub fn clear_all(world: &mut World) -> SimResult {
    let mut query = world.query::<(Entity, &PhysicsBody)>();
    let doomed: Vec<(Entity, BodyHandle)> = query
        .iter(world)
        .map(|(entity, body)| (entity, body.handle))
        .collect();

    let count = doomed.len();
    for (entity, handle) in doomed {
        world.resource_mut::<PhysicsWorld>().detach_body(handle);
        world.despawn(entity);
    }
    world.resource_mut::<EntityRegistry>().clear();
    world.resource_mut::<SpawnManager>().release_all();
    info!("cleared {} entities", count);
    Ok(())
}

/// Snapshot of a live entity, or `None` if the id is unknown or not built yet.
pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
    let entity = world.resource::<EntityRegistry>().get(id)?;
    let entity_ref = world.get_entity(entity).ok()?;
    let physics = world.resource::<PhysicsWorld>();
    let handle = entity_ref.get::<PhysicsBody>().map(|b| b.handle);
    Some(EntitySnapshot {
        id,
        kind: *entity_ref.get::<EntityKind>()?,
        authority: entity_ref.get::<Authority>().copied().unwrap_or_default(),
        controller: entity_ref.get::<Controller>().map(|c| c.0),
        position: handle.and_then(|h| physics.position(h)).unwrap_or_default(),
        velocity: handle.and_then(|h| physics.velocity(h)).unwrap_or_default(),
        flip_x: entity_ref.get::<Facing>().is_some_and(|f| f.flip_x),
        state: entity_ref.get::<Brain>().and_then(|b| b.current()),
        health: entity_ref.get::<Health>().map(|h| h.current),
        animation: entity_ref
            .get::<Presentation>()
            .map(|p| p.animation.clone())
            .unwrap_or_default(),
    })
}
