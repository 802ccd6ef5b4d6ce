//! Session driver.
//!
//! A [`Session`] owns the [`DeferredWorld`] and the per-tick schedule, and is
//! the only thing that steps the simulation. One call to [`Session::tick`]:
//!
//! 1. advances [`WorldTime`]
//! 2. steps the world: physics advance, then the mutation drain
//! 3. runs the schedule: brains → contacts → ttl → position broadcast → outbox flush
//! 4. latches input edges
//!
//! [`Session::advance`] turns frame time into ticks, at a fixed rate when
//! `fixed_delta` is configured.
//!
//! # Threads
//!
//! The session itself stays on the simulation thread. Other threads (network
//! receive callbacks, an input thread) get a [`SessionHandle`]: it can only
//! enqueue mutations, so nothing it does can reach physics mid-step.
//!
//! # Teardown
//!
//! [`Session::shutdown`] discards the pending mutations, queues a final
//! clear-everything mutation and runs one more step to apply it. A teardown
//! requested through [`SessionHandle::request_teardown`] is itself a
//! mutation: it takes effect after the step that drains it.

use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::components::entityid::{Authority, EntityId, PlayerId};
use crate::components::kind::EntityKind;
use crate::error::SimResult;
use crate::events::packet::Packet;
use crate::lifecycle::{self, CreateEntity, DamageOutcome, EntitySnapshot};
use crate::math::Vec2;
use crate::replication;
use crate::resources::chatlog::ChatLog;
use crate::resources::deferredworld::{DeferredWorld, MutationSender, StepReport};
use crate::resources::input::InputState;
use crate::resources::levellayout::{LevelCell, LevelLayout};
use crate::resources::netbridge::{NetBridge, Outbox, PacketSink};
use crate::resources::physics::PhysicsEngine;
use crate::resources::registry::EntityRegistry;
use crate::resources::scoreboard::ScoreBoard;
use crate::resources::sessionconfig::SessionConfig;
use crate::resources::simplephysics::SimplePhysics;
use crate::resources::simrng::SimRng;
use crate::resources::spawnmanager::SpawnManager;
use crate::resources::worldtime::WorldTime;
use crate::systems::brain::actor_brain_system;
use crate::systems::contacts::resolve_contacts_system;
use crate::systems::outbound::{broadcast_positions, flush_outbox};
use crate::systems::time::update_world_time;
use crate::systems::ttl::ttl_system;

/// Upper bound on ticks run by one [`Session::advance`] call, so a long stall
/// does not snowball into ever longer frames.
pub const MAX_TICKS_PER_ADVANCE: u32 = 8;

#[derive(Resource)]
struct TeardownRequested;

/// Cross-thread entry point into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    queue: MutationSender,
}

impl SessionHandle {
    /// Hand over a packet received from the network. Applied in the next drain.
    pub fn deliver(&self, packet: Packet) {
        self.queue
            .enqueue(move |world| replication::apply_inbound(world, packet));
    }

    pub fn enqueue<F>(&self, mutation: F)
    where
        F: FnOnce(&mut World) -> SimResult + Send + 'static,
    {
        self.queue.enqueue(mutation);
    }

    pub fn request_teardown(&self) {
        self.queue.enqueue(|world| {
            info!("teardown requested");
            world.insert_resource(TeardownRequested);
            Ok(())
        });
    }
}

pub struct Session {
    core: DeferredWorld,
    schedule: Schedule,
    config: SessionConfig,
    accumulator: f32,
    closed: bool,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        engine: impl PhysicsEngine + 'static,
        sink: impl PacketSink + 'static,
    ) -> Self {
        let mut core = DeferredWorld::new(engine);
        let world = core.world_mut();
        world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
        world.insert_resource(config.clone());
        world.insert_resource(EntityRegistry::with_id_base(config.id_base));
        world.insert_resource(SpawnManager::with_seed(config.seed));
        world.insert_resource(SimRng::with_seed(config.seed.wrapping_add(1)));
        world.insert_resource(InputState::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(ChatLog::default());
        world.insert_resource(NetBridge::new(sink));

        let mut scores = ScoreBoard::new();
        scores.register(config.player_id, config.player_name.clone());
        world.insert_resource(scores);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                actor_brain_system,
                resolve_contacts_system,
                ttl_system,
                broadcast_positions,
                // Last, so everything emitted this tick leaves together
                flush_outbox,
            )
                .chain(),
        );

        info!(
            "session started (authoritative: {}, fixed_delta: {:?})",
            config.authoritative, config.fixed_delta
        );
        Self {
            core,
            schedule,
            config,
            accumulator: 0.0,
            closed: false,
        }
    }

    /// Session running the bundled engine with the configured gravity.
    pub fn with_simple_physics(config: SessionConfig, sink: impl PacketSink + 'static) -> Self {
        let engine = SimplePhysics::new(Vec2::new(0.0, config.gravity_y));
        Self::new(config, engine, sink)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            queue: self.core.sender(),
        }
    }

    /// Run one simulation tick of `delta` (unscaled) seconds.
    pub fn tick(&mut self, delta: f32) -> StepReport {
        if self.closed {
            return StepReport::default();
        }
        let scaled = update_world_time(self.core.world_mut(), delta);
        let report = self.core.step(
            scaled,
            self.config.velocity_iterations,
            self.config.position_iterations,
        );

        if self
            .core
            .world_mut()
            .remove_resource::<TeardownRequested>()
            .is_some()
        {
            self.shutdown();
            return report;
        }

        let world = self.core.world_mut();
        self.schedule.run(world);
        world.resource_mut::<InputState>().latch();
        world.clear_trackers();
        report
    }

    /// Feed `frame_dt` seconds of wall time. Returns the number of ticks run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.closed {
            return 0;
        }
        let Some(step) = self.config.fixed_delta else {
            self.tick(frame_dt);
            return 1;
        };
        self.accumulator += frame_dt;
        let mut ticks = 0;
        while self.accumulator >= step && !self.closed {
            if ticks == MAX_TICKS_PER_ADVANCE {
                warn!(
                    "simulation is {:.3}s behind, dropping the backlog",
                    self.accumulator
                );
                self.accumulator = 0.0;
                break;
            }
            self.tick(step);
            self.accumulator -= step;
            ticks += 1;
        }
        ticks
    }

    /// Tear the session down. Further ticks are no-ops.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        let dropped = self.core.clear();
        self.core.enqueue(lifecycle::clear_all);
        self.core.step(
            0.0,
            self.config.velocity_iterations,
            self.config.position_iterations,
        );
        self.core.world_mut().resource_mut::<Outbox>().drain();
        self.closed = true;
        info!("session closed, {} pending mutations discarded", dropped);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn create_entity(&mut self, request: CreateEntity) -> Option<EntityId> {
        lifecycle::create_entity(self.core.world_mut(), request)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        lifecycle::remove_entity(self.core.world_mut(), id)
    }

    pub fn remove_entity_local(&mut self, id: EntityId) -> bool {
        lifecycle::remove_entity_local(self.core.world_mut(), id)
    }

    pub fn apply_damage(
        &mut self,
        id: EntityId,
        amount: f32,
        direction: Vec2,
        knockback: f32,
    ) -> DamageOutcome {
        lifecycle::apply_damage(self.core.world_mut(), id, amount, direction, knockback)
    }

    pub fn sync_position(&mut self, id: EntityId, position: Vec2, velocity: Option<Vec2>) -> bool {
        lifecycle::sync_position(self.core.world_mut(), id, position, velocity)
    }

    pub fn sync_score(&mut self, player: PlayerId, score: i64) -> bool {
        lifecycle::sync_score(self.core.world_mut(), player, score)
    }

    pub fn add_score(&mut self, player: PlayerId, amount: i64) -> Option<i64> {
        lifecycle::add_score(self.core.world_mut(), player, amount)
    }

    /// Add a remote participant to the score table.
    pub fn add_participant(&mut self, player: PlayerId, name: impl Into<String>) {
        self.core
            .world_mut()
            .resource_mut::<ScoreBoard>()
            .register(player, name);
    }

    pub fn spawn_local_player(&mut self) -> SimResult<EntityId> {
        lifecycle::spawn_player(self.core.world_mut(), self.config.player_id, Authority::Local)
    }

    /// Say something. Echoed into the local chat log and replicated.
    pub fn send_chat(&mut self, text: impl Into<String>) {
        let text = text.into();
        let sender = self.config.player_name.clone();
        let world = self.core.world_mut();
        world
            .resource_mut::<ChatLog>()
            .push(sender.clone(), text.clone());
        world
            .resource_mut::<Outbox>()
            .push(Packet::ChatMessage { sender, text });
    }

    /// Register the level's spawn points and queue its entities.
    ///
    /// Geometry is built by every session. Enemies and items are built only by
    /// the authoritative one; replicas receive them as `EntityCreated`.
    /// Returns the number of entities queued.
    pub fn load_level(&mut self, layout: &LevelLayout) -> usize {
        let authoritative = self.config.authoritative;
        let world = self.core.world_mut();
        let mut queued = 0;
        for (position, cell) in layout.iter_cells() {
            match cell {
                LevelCell::SpawnPoint => world.resource_mut::<SpawnManager>().register(position),
                LevelCell::Entity { kind, flip_x } => {
                    match kind {
                        EntityKind::Player | EntityKind::Projectile => {
                            warn!("{:?} cannot be placed by a level, cell skipped", kind);
                            continue;
                        }
                        EntityKind::Static => {}
                        _ if !authoritative => continue,
                        _ => {}
                    }
                    let request = CreateEntity::new(*kind, position).flipped(*flip_x);
                    if lifecycle::create_entity(world, request).is_some() {
                        queued += 1;
                    }
                }
            }
        }
        info!(
            "level loaded: {} entities queued, {} spawn points",
            queued,
            world.resource::<SpawnManager>().total()
        );
        queued
    }

    pub fn input_mut(&mut self) -> Mut<'_, InputState> {
        self.core.world_mut().resource_mut::<InputState>()
    }

    pub fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        lifecycle::entity(self.core.world(), id)
    }

    pub fn scores(&self) -> &ScoreBoard {
        self.core.world().resource::<ScoreBoard>()
    }

    pub fn chat(&self) -> &ChatLog {
        self.core.world().resource::<ChatLog>()
    }

    pub fn spawns(&self) -> &SpawnManager {
        self.core.world().resource::<SpawnManager>()
    }

    pub fn entity_count(&self) -> usize {
        self.core.world().resource::<EntityRegistry>().len()
    }

    pub fn pending_count(&self) -> usize {
        self.core.pending_count()
    }

    pub fn time(&self) -> WorldTime {
        *self.core.world().resource::<WorldTime>()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        self.core.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.core.world_mut()
    }
}
