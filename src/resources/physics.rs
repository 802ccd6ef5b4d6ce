//! Physics seam and the phase-guarded physics resource.
//!
//! The simulation never talks to a physics engine directly. Engines implement
//! [`PhysicsEngine`] and are owned by the [`PhysicsWorld`] resource, which
//! tracks where the current tick is in its step cycle:
//!
//! - [`StepPhase::Advancing`] – the engine is integrating; nobody else may touch it
//! - [`StepPhase::Draining`] – queued mutations are running; writes are allowed
//! - [`StepPhase::Idle`] – between ticks; reads only
//!
//! [`PhysicsWorld::engine_mut`] asserts the phase is `Draining`. Engines of this
//! class corrupt their internal state when bodies change mid-step, so a write
//! outside the drain is a hard fault in every build.
//!
//! # Related
//!
//! - [`crate::resources::deferredworld`] – owns the step cycle and drives the phases
//! - [`crate::resources::simplephysics`] – the bundled engine

use bevy_ecs::prelude::Resource;
use log::trace;
use smallvec::SmallVec;

use crate::math::Vec2;

/// Opaque handle to a body inside a [`PhysicsEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// Opaque handle to a fixture attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureHandle(pub u32);

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves; other bodies are pushed out of it.
    Static,
    /// Moves by its velocity but ignores gravity and is never pushed.
    Kinematic,
    /// Fully simulated: gravity, damping, impulses and static push-out.
    Dynamic,
}

#[derive(Debug, Clone, Copy)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub mass: f32,
}

impl BodyDef {
    pub fn new(body_type: BodyType, position: Vec2) -> Self {
        Self {
            body_type,
            position,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            mass: 1.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.gravity_scale = gravity_scale;
        self
    }

    pub fn with_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }
}

/// Axis-aligned box fixture, centred on the body position plus `offset`.
#[derive(Debug, Clone, Copy)]
pub struct FixtureDef {
    pub half_extents: Vec2,
    pub offset: Vec2,
    /// Sensors report contacts but never push or get pushed.
    pub sensor: bool,
}

impl FixtureDef {
    pub fn solid(half_w: f32, half_h: f32) -> Self {
        Self {
            half_extents: Vec2::new(half_w, half_h),
            offset: Vec2::ZERO,
            sensor: false,
        }
    }

    pub fn sensor(half_w: f32, half_h: f32) -> Self {
        Self {
            sensor: true,
            ..Self::solid(half_w, half_h)
        }
    }
}

/// Two bodies whose fixtures overlapped during the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl Contact {
    /// The other body of the pair, if `body` is part of it.
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

pub type FixtureList = SmallVec<[FixtureHandle; 4]>;

/// A single-threaded physics engine.
///
/// Implementations need not be internally synchronized: [`PhysicsWorld`]
/// guarantees exclusive access and only hands out `&mut` during the drain.
/// Methods addressing a missing body return `false`/`None` instead of panicking.
pub trait PhysicsEngine: Send + Sync {
    /// Advance the simulation by `delta` seconds.
    fn step(&mut self, delta: f32, velocity_iterations: u32, position_iterations: u32);

    fn create_body(&mut self, def: &BodyDef) -> BodyHandle;
    fn create_fixture(&mut self, body: BodyHandle, def: &FixtureDef) -> Option<FixtureHandle>;
    fn fixtures(&self, body: BodyHandle) -> FixtureList;
    fn destroy_fixture(&mut self, body: BodyHandle, fixture: FixtureHandle) -> bool;
    /// Destroys a body. Engines may refuse while fixtures are still attached.
    fn destroy_body(&mut self, body: BodyHandle) -> bool;

    fn set_transform(&mut self, body: BodyHandle, position: Vec2) -> bool;
    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool;
    fn apply_linear_impulse(&mut self, body: BodyHandle, impulse: Vec2) -> bool;

    fn position(&self, body: BodyHandle) -> Option<Vec2>;
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2>;

    fn body_count(&self) -> usize;
    fn fixture_count(&self) -> usize;
    /// Contacts found during the most recent [`step`](Self::step).
    fn contacts(&self) -> &[Contact];
}

/// Where the current tick is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPhase {
    #[default]
    Idle,
    Advancing,
    Draining,
}

/// ECS resource owning the physics engine.
#[derive(Resource)]
pub struct PhysicsWorld {
    engine: Box<dyn PhysicsEngine>,
    phase: StepPhase,
}

impl PhysicsWorld {
    pub fn new(engine: impl PhysicsEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            phase: StepPhase::Idle,
        }
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Read-only engine access, valid in every phase.
    pub fn engine(&self) -> &dyn PhysicsEngine {
        self.engine.as_ref()
    }

    /// Mutable engine access.
    ///
    /// # Panics
    ///
    /// Panics unless called from inside the drain phase of a step.
    pub fn engine_mut(&mut self) -> &mut dyn PhysicsEngine {
        assert!(
            self.phase == StepPhase::Draining,
            "physics engine mutated outside the drain phase (phase: {:?})",
            self.phase
        );
        self.engine.as_mut()
    }

    pub fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.engine.position(body)
    }

    pub fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.engine.linear_velocity(body)
    }

    /// Destroy every fixture of `body`, then the body itself.
    pub fn detach_body(&mut self, body: BodyHandle) -> bool {
        let engine = self.engine_mut();
        for fixture in engine.fixtures(body) {
            engine.destroy_fixture(body, fixture);
        }
        let destroyed = engine.destroy_body(body);
        trace!("detached body {:?} (destroyed: {})", body, destroyed);
        destroyed
    }

    /// Run the engine's integration step. Leaves the world in the drain phase.
    pub(crate) fn advance(
        &mut self,
        delta: f32,
        velocity_iterations: u32,
        position_iterations: u32,
    ) {
        debug_assert_eq!(self.phase, StepPhase::Idle, "nested physics step");
        self.phase = StepPhase::Advancing;
        self.engine.step(delta, velocity_iterations, position_iterations);
        self.phase = StepPhase::Draining;
    }

    pub(crate) fn finish_drain(&mut self) {
        self.phase = StepPhase::Idle;
    }
}
