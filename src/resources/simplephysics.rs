//! Bundled axis-aligned physics engine.
//!
//! Good enough for a side-on brawler: boxes, gravity, damping, impulses,
//! static push-out and overlap contacts. No rotation, no dynamic-vs-dynamic
//! response.
//!
//! Each [`step`](PhysicsEngine::step):
//!
//! 1. integrates dynamic/kinematic bodies in `velocity_iterations` sub-steps
//! 2. records overlapping fixture pairs as [`Contact`]s
//! 3. runs `position_iterations` passes pushing dynamic bodies out of static ones

use log::{trace, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::math::Vec2;
use crate::resources::physics::{
    BodyDef, BodyHandle, BodyType, Contact, FixtureDef, FixtureHandle, FixtureList, PhysicsEngine,
};

pub const DEFAULT_GRAVITY: Vec2 = Vec2 { x: 0.0, y: -30.0 };

#[derive(Debug, Clone)]
struct SimBody {
    def: BodyDef,
    position: Vec2,
    velocity: Vec2,
    fixtures: SmallVec<[(FixtureHandle, FixtureDef); 2]>,
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Vec2,
    max: Vec2,
}

impl Aabb {
    fn of(position: Vec2, fixture: &FixtureDef) -> Self {
        let centre = position + fixture.offset;
        Self {
            min: centre - fixture.half_extents,
            max: centre + fixture.half_extents,
        }
    }

    fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Smallest translation moving `self` out of `other`.
    fn push_out(&self, other: &Aabb) -> Vec2 {
        let left = other.min.x - self.max.x;
        let right = other.max.x - self.min.x;
        let down = other.min.y - self.max.y;
        let up = other.max.y - self.min.y;
        let dx = if right.abs() < left.abs() { right } else { left };
        let dy = if up.abs() < down.abs() { up } else { down };
        if dx.abs() < dy.abs() {
            Vec2::new(dx, 0.0)
        } else {
            Vec2::new(0.0, dy)
        }
    }
}

pub struct SimplePhysics {
    gravity: Vec2,
    bodies: FxHashMap<BodyHandle, SimBody>,
    next_body: u32,
    next_fixture: u32,
    contacts: Vec<Contact>,
}

impl Default for SimplePhysics {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl SimplePhysics {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: FxHashMap::default(),
            next_body: 1,
            next_fixture: 1,
            contacts: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            match body.def.body_type {
                BodyType::Static => {}
                BodyType::Kinematic => {
                    body.position += body.velocity * dt;
                }
                BodyType::Dynamic => {
                    body.velocity += gravity * (body.def.gravity_scale * dt);
                    if body.def.linear_damping > 0.0 {
                        body.velocity =
                            body.velocity * (1.0 / (1.0 + body.def.linear_damping * dt));
                    }
                    body.position += body.velocity * dt;
                }
            }
        }
    }

    fn collect_contacts(&mut self) {
        self.contacts.clear();
        let mut handles: Vec<BodyHandle> = self.bodies.keys().copied().collect();
        handles.sort();
        for (i, &a) in handles.iter().enumerate() {
            for &b in &handles[i + 1..] {
                let (ba, bb) = (&self.bodies[&a], &self.bodies[&b]);
                if ba.def.body_type == BodyType::Static && bb.def.body_type == BodyType::Static {
                    continue;
                }
                let touching = ba.fixtures.iter().any(|(_, fa)| {
                    let box_a = Aabb::of(ba.position, fa);
                    bb.fixtures
                        .iter()
                        .any(|(_, fb)| box_a.overlaps(&Aabb::of(bb.position, fb)))
                });
                if touching {
                    self.contacts.push(Contact { a, b });
                }
            }
        }
    }

    fn resolve_static(&mut self) {
        let solids: Vec<Aabb> = self
            .bodies
            .values()
            .filter(|b| b.def.body_type == BodyType::Static)
            .flat_map(|b| {
                b.fixtures
                    .iter()
                    .filter(|(_, f)| !f.sensor)
                    .map(|(_, f)| Aabb::of(b.position, f))
                    .collect::<Vec<_>>()
            })
            .collect();
        for body in self.bodies.values_mut() {
            if body.def.body_type != BodyType::Dynamic {
                continue;
            }
            for (_, fixture) in body.fixtures.iter().filter(|(_, f)| !f.sensor) {
                for solid in &solids {
                    let aabb = Aabb::of(body.position, fixture);
                    if !aabb.overlaps(solid) {
                        continue;
                    }
                    let push = aabb.push_out(solid);
                    body.position += push;
                    // Kill the velocity component driving into the surface.
                    if push.x != 0.0 && push.x.signum() != body.velocity.x.signum() {
                        body.velocity.x = 0.0;
                    }
                    if push.y != 0.0 && push.y.signum() != body.velocity.y.signum() {
                        body.velocity.y = 0.0;
                    }
                }
            }
        }
    }
}

impl PhysicsEngine for SimplePhysics {
    fn step(&mut self, delta: f32, velocity_iterations: u32, position_iterations: u32) {
        if delta <= 0.0 {
            self.contacts.clear();
            return;
        }
        let substeps = velocity_iterations.max(1);
        let dt = delta / substeps as f32;
        for _ in 0..substeps {
            self.integrate(dt);
        }
        self.collect_contacts();
        for _ in 0..position_iterations {
            self.resolve_static();
        }
        trace!(
            "simple physics stepped {}s: {} bodies, {} contacts",
            delta,
            self.bodies.len(),
            self.contacts.len()
        );
    }

    fn create_body(&mut self, def: &BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.next_body);
        self.next_body += 1;
        self.bodies.insert(
            handle,
            SimBody {
                def: *def,
                position: def.position,
                velocity: def.velocity,
                fixtures: SmallVec::new(),
            },
        );
        handle
    }

    fn create_fixture(&mut self, body: BodyHandle, def: &FixtureDef) -> Option<FixtureHandle> {
        let sim = self.bodies.get_mut(&body)?;
        let handle = FixtureHandle(self.next_fixture);
        self.next_fixture += 1;
        sim.fixtures.push((handle, *def));
        Some(handle)
    }

    fn fixtures(&self, body: BodyHandle) -> FixtureList {
        self.bodies
            .get(&body)
            .map(|b| b.fixtures.iter().map(|(h, _)| *h).collect())
            .unwrap_or_default()
    }

    fn destroy_fixture(&mut self, body: BodyHandle, fixture: FixtureHandle) -> bool {
        let Some(sim) = self.bodies.get_mut(&body) else {
            return false;
        };
        let before = sim.fixtures.len();
        sim.fixtures.retain(|(h, _)| *h != fixture);
        sim.fixtures.len() != before
    }

    fn destroy_body(&mut self, body: BodyHandle) -> bool {
        match self.bodies.get(&body) {
            Some(sim) if !sim.fixtures.is_empty() => {
                warn!(
                    "refusing to destroy body {:?} with {} fixtures attached",
                    body,
                    sim.fixtures.len()
                );
                false
            }
            Some(_) => {
                self.bodies.remove(&body);
                self.contacts.retain(|c| c.a != body && c.b != body);
                true
            }
            None => false,
        }
    }

    fn set_transform(&mut self, body: BodyHandle, position: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(sim) => {
                sim.position = position;
                true
            }
            None => false,
        }
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(sim) if sim.def.body_type != BodyType::Static => {
                sim.velocity = velocity;
                true
            }
            _ => false,
        }
    }

    fn apply_linear_impulse(&mut self, body: BodyHandle, impulse: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(sim) if sim.def.body_type == BodyType::Dynamic => {
                let mass = sim.def.mass.max(f32::EPSILON);
                sim.velocity += impulse * (1.0 / mass);
                true
            }
            _ => false,
        }
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn fixture_count(&self) -> usize {
        self.bodies.values().map(|b| b.fixtures.len()).sum()
    }

    fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn dynamic_box(engine: &mut SimplePhysics, at: Vec2) -> BodyHandle {
        let body = engine.create_body(&BodyDef::new(BodyType::Dynamic, at));
        engine.create_fixture(body, &FixtureDef::solid(0.5, 0.5));
        body
    }

    #[test]
    fn test_gravity_accelerates_dynamic_bodies() {
        let mut engine = SimplePhysics::new(Vec2::new(0.0, -10.0));
        let body = dynamic_box(&mut engine, Vec2::new(0.0, 100.0));
        engine.step(1.0, 1, 0);
        let v = engine.linear_velocity(body).unwrap();
        assert!(approx_eq(v.y, -10.0));
        assert!(approx_eq(engine.position(body).unwrap().y, 90.0));
    }

    #[test]
    fn test_static_bodies_do_not_move() {
        let mut engine = SimplePhysics::default();
        let floor = engine.create_body(&BodyDef::new(BodyType::Static, Vec2::ZERO));
        engine.step(1.0, 4, 2);
        assert_eq!(engine.position(floor), Some(Vec2::ZERO));
        assert!(!engine.set_linear_velocity(floor, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_dynamic_body_rests_on_static_floor() {
        let mut engine = SimplePhysics::new(Vec2::new(0.0, -10.0));
        let floor = engine.create_body(&BodyDef::new(BodyType::Static, Vec2::ZERO));
        engine.create_fixture(floor, &FixtureDef::solid(10.0, 0.5));
        let body = dynamic_box(&mut engine, Vec2::new(0.0, 1.05));
        for _ in 0..30 {
            engine.step(1.0 / 60.0, 4, 2);
        }
        let pos = engine.position(body).unwrap();
        assert!(pos.y >= 0.99, "body sank into the floor: {}", pos.y);
        assert!(approx_eq(engine.linear_velocity(body).unwrap().y, 0.0));
    }

    #[test]
    fn test_contacts_report_overlapping_sensors() {
        let mut engine = SimplePhysics::new(Vec2::ZERO);
        let a = dynamic_box(&mut engine, Vec2::ZERO);
        let b = engine.create_body(&BodyDef::new(BodyType::Kinematic, Vec2::new(0.5, 0.0)));
        engine.create_fixture(b, &FixtureDef::sensor(0.5, 0.5));
        let far = dynamic_box(&mut engine, Vec2::new(50.0, 0.0));
        engine.step(0.01, 1, 1);
        let contacts = engine.contacts();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].other(a), Some(b));
        assert_eq!(contacts[0].other(far), None);
    }

    #[test]
    fn test_destroy_body_requires_fixtures_gone() {
        let mut engine = SimplePhysics::default();
        let body = dynamic_box(&mut engine, Vec2::ZERO);
        assert!(!engine.destroy_body(body));
        for fixture in engine.fixtures(body) {
            assert!(engine.destroy_fixture(body, fixture));
        }
        assert!(engine.destroy_body(body));
        assert_eq!(engine.body_count(), 0);
        assert_eq!(engine.fixture_count(), 0);
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut engine = SimplePhysics::new(Vec2::ZERO);
        let mut def = BodyDef::new(BodyType::Dynamic, Vec2::ZERO);
        def.mass = 2.0;
        let body = engine.create_body(&def);
        assert!(engine.apply_linear_impulse(body, Vec2::new(4.0, 0.0)));
        assert!(approx_eq(engine.linear_velocity(body).unwrap().x, 2.0));
    }
}
