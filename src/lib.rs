//! Skirmish library.
//!
//! Deterministic simulation core for a networked 2D brawler: a deferred
//! mutation world around a physics engine, actor state machines, entity
//! bookkeeping, spawn points and the replication contract. Exposed as a
//! library for the demo binary, integration tests and embedders.

pub mod archetype;
pub mod components;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod math;
pub mod replication;
pub mod resources;
pub mod session;
pub mod states;
pub mod systems;
