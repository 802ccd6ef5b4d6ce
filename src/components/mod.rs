//! ECS components for simulated entities.
//!
//! Every registered entity carries an [`entityid::EntityId`], an
//! [`kind::EntityKind`], an [`entityid::Authority`] and a [`body::PhysicsBody`].
//! The rest are capabilities attached per kind by
//! [`Archetype`](crate::archetype::Archetype).
//!
//! Submodules overview:
//! - [`body`] – handle of the entity's physics body
//! - [`brain`] – actor state machines and the context states run with
//! - [`combat`] – melee or throw attack with its cooldown
//! - [`despawning`] – marker for entities whose removal is queued
//! - [`entityid`] – network-visible ids, player ids, authority and controller
//! - [`facing`] – horizontal facing of an actor
//! - [`health`] – hit points of damageable entities
//! - [`kind`] – entity kinds and factions
//! - [`mover`] – walk speed and jump impulse
//! - [`pickup`] – score granted when collected
//! - [`presentation`] – animation name and extra data shown by replicas
//! - [`projectile`] – damage payload and shooter of a thrown object
//! - [`statemachine`] – generic tag-keyed state machine
//! - [`ttl`] – time-to-live countdown

pub mod body;
pub mod brain;
pub mod combat;
pub mod despawning;
pub mod entityid;
pub mod facing;
pub mod health;
pub mod kind;
pub mod mover;
pub mod pickup;
pub mod presentation;
pub mod projectile;
pub mod statemachine;
pub mod ttl;
