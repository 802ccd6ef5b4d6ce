//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use skirmish::math::Vec2;
use skirmish::resources::netbridge::{ChannelSink, NullSink};
use skirmish::resources::physics::{
    BodyDef, BodyHandle, Contact, FixtureDef, FixtureHandle, FixtureList, PhysicsEngine,
};
use skirmish::resources::sessionconfig::SessionConfig;
use skirmish::resources::simplephysics::SimplePhysics;
use skirmish::session::Session;

pub const DT: f32 = 1.0 / 60.0;

/// One call made into the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCall {
    Step,
    CreateBody(BodyHandle),
    CreateFixture(BodyHandle),
    DestroyFixture(BodyHandle),
    DestroyBody(BodyHandle),
    SetTransform(BodyHandle),
    SetVelocity(BodyHandle),
    Impulse(BodyHandle, Vec2),
}

pub type CallLog = Arc<Mutex<Vec<EngineCall>>>;

/// `SimplePhysics` wrapper recording every call.
pub struct CountingEngine {
    inner: SimplePhysics,
    log: CallLog,
}

impl CountingEngine {
    pub fn new(gravity: Vec2) -> (Self, CallLog) {
        let log: CallLog = Arc::default();
        (
            Self {
                inner: SimplePhysics::new(gravity),
                log: log.clone(),
            },
            log,
        )
    }

    fn record(&self, call: EngineCall) {
        self.log.lock().unwrap().push(call);
    }
}

impl PhysicsEngine for CountingEngine {
    fn step(&mut self, delta: f32, velocity_iterations: u32, position_iterations: u32) {
        self.record(EngineCall::Step);
        self.inner.step(delta, velocity_iterations, position_iterations);
    }

    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = self.inner.create_body(def);
        self.record(EngineCall::CreateBody(handle));
        handle
    }

    fn create_fixture(&mut self, body: BodyHandle, def: &FixtureDef) -> Option<FixtureHandle> {
        self.record(EngineCall::CreateFixture(body));
        self.inner.create_fixture(body, def)
    }

    fn fixtures(&self, body: BodyHandle) -> FixtureList {
        self.inner.fixtures(body)
    }

    fn destroy_fixture(&mut self, body: BodyHandle, fixture: FixtureHandle) -> bool {
        self.record(EngineCall::DestroyFixture(body));
        self.inner.destroy_fixture(body, fixture)
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        self.record(EngineCall::DestroyBody(body));
        self.inner.destroy_body(body)
    }

    fn set_transform(&mut self, body: BodyHandle, position: Vec2) -> bool {
        self.record(EngineCall::SetTransform(body));
        self.inner.set_transform(body, position)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        self.record(EngineCall::SetVelocity(body));
        self.inner.set_linear_velocity(body, velocity)
    }

    fn apply_linear_impulse(&mut self, body: BodyHandle, impulse: Vec2) -> bool {
        self.record(EngineCall::Impulse(body, impulse));
        self.inner.apply_linear_impulse(body, impulse)
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.inner.position(body)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.inner.linear_velocity(body)
    }

    fn body_count(&self) -> usize {
        self.inner.body_count()
    }

    fn fixture_count(&self) -> usize {
        self.inner.fixture_count()
    }

    fn contacts(&self) -> &[Contact] {
        self.inner.contacts()
    }
}

/// Config for deterministic tests: no gravity, no position broadcasts.
pub fn quiet_config() -> SessionConfig {
    let mut config = SessionConfig::new();
    config.gravity_y = 0.0;
    config.position_sync_interval = 0;
    config
}

pub fn session() -> Session {
    Session::with_simple_physics(quiet_config(), NullSink)
}

pub fn counting_session() -> (Session, CallLog) {
    let (engine, log) = CountingEngine::new(Vec2::ZERO);
    (Session::new(quiet_config(), engine, NullSink), log)
}

/// Session whose outbound packets can be inspected.
pub fn observed_session(
    config: SessionConfig,
) -> (Session, crossbeam_channel::Receiver<skirmish::events::packet::Packet>) {
    let (sink, rx) = ChannelSink::new();
    (Session::with_simple_physics(config, sink), rx)
}

pub fn count(log: &CallLog, pred: impl Fn(&EngineCall) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|c| pred(c)).count()
}
