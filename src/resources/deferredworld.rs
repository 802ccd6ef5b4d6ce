//! Deferred-mutation wrapper around the simulation world.
//!
//! The physics engine is not thread-safe and must not change while it is
//! integrating. [`DeferredWorld`] turns every change into a [`Mutation`]
//! closure pushed onto an unbounded crossbeam channel. Producers (the
//! simulation thread itself, network callbacks, input handlers) only ever
//! append; the closures run on the simulation thread at one safe point per
//! tick.
//!
//! # Step cycle
//!
//! [`DeferredWorld::step`]:
//!
//! 1. advances the engine (`StepPhase::Advancing`)
//! 2. drains the queue in FIFO order (`StepPhase::Draining`): everything that
//!    was queued when the drain began, plus whatever those mutations enqueue
//! 3. returns to `StepPhase::Idle`
//!
//! A mutation enqueued before `step` is called is applied after that step's
//! advance and before the next step's advance. Mutations another thread sends
//! while a drain is running wait for the next step, so a busy producer cannot
//! hold the drain open. Relative order between two producer threads racing
//! each other is whatever the channel observed.
//!
//! # Failures
//!
//! A mutation returning `Err` is logged and counted in [`StepReport::failed`];
//! the drain carries on with the next one. Panics are not caught.
//!
//! # Related
//!
//! - [`crate::resources::physics::PhysicsWorld`] – phase-guarded engine access
//! - [`crate::session::SessionHandle`] – cross-thread entry point built on [`MutationSender`]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy_ecs::prelude::{Resource, World};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};

use crate::error::SimResult;
use crate::resources::physics::{PhysicsEngine, PhysicsWorld};

/// A queued change to the world, run during the drain phase.
pub type Mutation = Box<dyn FnOnce(&mut World) -> SimResult + Send + 'static>;

struct Queued {
    mutation: Mutation,
    /// Sent from the simulation thread through the world's own sender.
    local: bool,
}

/// Cloneable producer end of the mutation queue.
///
/// The copy inserted into the world as a resource is the simulation thread's
/// own: systems and running mutations enqueue through it. Copies handed to
/// other threads come from [`DeferredWorld::sender`].
#[derive(Resource, Clone)]
pub struct MutationSender {
    tx: Sender<Queued>,
    /// Local mutations sent but not yet received; `None` for remote senders.
    local: Option<Arc<AtomicUsize>>,
}

impl MutationSender {
    /// Append a mutation. Never runs it synchronously.
    pub fn enqueue<F>(&self, mutation: F)
    where
        F: FnOnce(&mut World) -> SimResult + Send + 'static,
    {
        if let Some(count) = &self.local {
            count.fetch_add(1, Ordering::Relaxed);
        }
        let queued = Queued {
            mutation: Box::new(mutation),
            local: self.local.is_some(),
        };
        if self.tx.send(queued).is_err() {
            // Receiver is gone: the session has been torn down.
            debug!("mutation dropped, world no longer exists");
        }
    }

    pub fn pending_count(&self) -> usize {
        self.tx.len()
    }
}

/// Outcome of one drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub applied: usize,
    pub failed: usize,
}

pub struct DeferredWorld {
    world: World,
    local: MutationSender,
    rx: Receiver<Queued>,
    /// Remote mutations received after a drain's cut-off, first in line next step.
    carried: VecDeque<Mutation>,
}

impl DeferredWorld {
    pub fn new(engine: impl PhysicsEngine + 'static) -> Self {
        Self::with_world(World::new(), engine)
    }

    /// Wrap an existing world. Inserts [`PhysicsWorld`] and [`MutationSender`].
    pub fn with_world(mut world: World, engine: impl PhysicsEngine + 'static) -> Self {
        let (tx, rx) = unbounded::<Queued>();
        let local = MutationSender {
            tx,
            local: Some(Arc::new(AtomicUsize::new(0))),
        };
        world.insert_resource(PhysicsWorld::new(engine));
        world.insert_resource(local.clone());
        Self {
            world,
            local,
            rx,
            carried: VecDeque::new(),
        }
    }

    /// Sender for other threads.
    pub fn sender(&self) -> MutationSender {
        MutationSender {
            tx: self.local.tx.clone(),
            local: None,
        }
    }

    pub fn enqueue<F>(&self, mutation: F)
    where
        F: FnOnce(&mut World) -> SimResult + Send + 'static,
    {
        self.local.enqueue(mutation);
    }

    fn receive(&self) -> Option<Queued> {
        let queued = self.rx.try_recv().ok()?;
        if queued.local
            && let Some(count) = &self.local.local
        {
            count.fetch_sub(1, Ordering::Relaxed);
        }
        Some(queued)
    }

    fn local_in_flight(&self) -> usize {
        self.local
            .local
            .as_ref()
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    fn apply(&mut self, mutation: Mutation, report: &mut StepReport) {
        match mutation(&mut self.world) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                warn!("deferred mutation failed: {}", e);
                report.failed += 1;
            }
        }
    }

    /// Advance physics by `delta`, then apply every queued mutation in order.
    pub fn step(
        &mut self,
        delta: f32,
        velocity_iterations: u32,
        position_iterations: u32,
    ) -> StepReport {
        self.world
            .resource_mut::<PhysicsWorld>()
            .advance(delta, velocity_iterations, position_iterations);

        let mut report = StepReport::default();
        let mut budget = self.rx.len();
        while let Some(mutation) = self.carried.pop_front() {
            self.apply(mutation, &mut report);
        }
        // Past the cut-off only local mutations, i.e. ones queued by this
        // drain, still run.
        while budget > 0 || self.local_in_flight() > 0 {
            let Some(queued) = self.receive() else {
                break;
            };
            if budget > 0 {
                budget -= 1;
            } else if !queued.local {
                self.carried.push_back(queued.mutation);
                continue;
            }
            self.apply(queued.mutation, &mut report);
        }
        if !self.carried.is_empty() {
            debug!("{} late mutations carried to the next step", self.carried.len());
        }

        self.world.resource_mut::<PhysicsWorld>().finish_drain();
        report
    }

    /// Discard every pending mutation without running it.
    pub fn clear(&mut self) -> usize {
        let mut dropped = self.carried.len();
        self.carried.clear();
        while self.receive().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            info!("discarded {} pending mutations", dropped);
        }
        dropped
    }

    pub fn pending_count(&self) -> usize {
        self.rx.len() + self.carried.len()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
