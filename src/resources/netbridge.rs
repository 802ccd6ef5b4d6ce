//! Outbound side of the network contract.
//!
//! Registry operations and actor states push [`Packet`]s into the [`Outbox`]
//! resource while the tick runs. At the end of the tick
//! [`flush_outbox`](crate::systems::outbound::flush_outbox) hands them to the
//! [`PacketSink`] held by [`NetBridge`]. The transport behind the sink is
//! external; [`ChannelSink`] forwards packets to a transport thread over a
//! crossbeam channel, [`NullSink`] drops them (single-player sessions).
//!
//! Inbound packets do not come through here: transports deliver them with
//! [`SessionHandle::deliver`](crate::session::SessionHandle::deliver), which
//! enqueues them as deferred mutations.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

use crate::events::packet::Packet;

/// The send-packet primitive supplied by the transport.
pub trait PacketSink: Send + Sync {
    fn send(&self, packet: Packet);
}

/// Sink forwarding packets to a crossbeam channel.
pub struct ChannelSink {
    tx: Sender<Packet>,
}

impl ChannelSink {
    /// Create a sink and the receiver the transport thread should drain.
    pub fn new() -> (Self, Receiver<Packet>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl PacketSink for ChannelSink {
    fn send(&self, packet: Packet) {
        // Ignore send error on shutdown
        if self.tx.send(packet).is_err() {
            debug!("packet dropped, transport receiver is gone");
        }
    }
}

/// Sink for sessions with nobody to replicate to.
pub struct NullSink;

impl PacketSink for NullSink {
    fn send(&self, _packet: Packet) {}
}

#[derive(Resource)]
pub struct NetBridge {
    sink: Box<dyn PacketSink>,
}

impl NetBridge {
    pub fn new(sink: impl PacketSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn send(&self, packet: Packet) {
        self.sink.send(packet);
    }
}

/// Packets produced during the current tick, in emission order.
#[derive(Resource, Debug, Default)]
pub struct Outbox {
    packets: Vec<Packet>,
}

impl Outbox {
    pub fn push(&mut self, packet: Packet) {
        self.packets.push(packet);
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter()
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, Packet> {
        self.packets.drain(..)
    }
}
