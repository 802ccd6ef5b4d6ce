//! ECS resources made available to systems.
//!
//! Long-lived data injected into the session world: the physics seam and the
//! deferred mutation queue, entity bookkeeping, scores, spawn points, input,
//! timing, configuration, and the network bridge.
//!
//! Overview
//! - `chatlog` – most recent chat lines
//! - `deferredworld` – mutation queue and the step/drain cycle
//! - `input` – per-tick state of the actions actors react to
//! - `levellayout` – JSON grid layouts of spawn points and entities
//! - `netbridge` – outbound packet sink and per-tick outbox
//! - `physics` – physics engine seam and the phase-guarded `PhysicsWorld`
//! - `registry` – `EntityId` to ECS entity and physics body maps
//! - `scoreboard` – participant scores and the current leader
//! - `sessionconfig` – INI-backed simulation and session settings
//! - `simplephysics` – bundled AABB physics engine
//! - `simrng` – seeded RNG for AI decisions
//! - `spawnmanager` – pool of player spawn points
//! - `worldtime` – simulation time and delta
pub mod chatlog;
pub mod deferredworld;
pub mod input;
pub mod levellayout;
pub mod netbridge;
pub mod physics;
pub mod registry;
pub mod scoreboard;
pub mod sessionconfig;
pub mod simplephysics;
pub mod simrng;
pub mod spawnmanager;
pub mod worldtime;
