//! Messages exchanged between sessions.
//!
//! Submodules:
//! - [`packet`] – logical packets of the replication protocol
pub mod packet;
