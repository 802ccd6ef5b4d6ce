//! Per-tick systems.
//!
//! Run by the session schedule after each drain, in this order.
//!
//! Submodules overview
//! - [`brain`] – tick actor state machines
//! - [`contacts`] – resolve projectile hits and pickups from physics contacts
//! - [`ttl`] – expire entities whose time-to-live ran out
//! - [`outbound`] – periodic position broadcast and the outbox flush
//! - [`time`] – update simulation time and delta (called before the step)

pub mod brain;
pub mod contacts;
pub mod outbound;
pub mod time;
pub mod ttl;
