//! Packet egress: the sink seam and bundled sink implementations.
//!
//! The payloading engine hands every finished packet to a [`PacketSink`].
//! Two implementations ship with the crate:
//!
//! - [`UdpRtpSink`](udp::UdpRtpSink): serializes packets behind an RFC 3550
//!   fixed header and sends them over UDP.
//! - [`CollectSink`]: records packets in memory, for tests and diagnostics.

pub mod udp;

pub use udp::UdpRtpSink;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;

/// One payloaded packet ready for transmission.
///
/// Carries logical fields only — the on-wire layout is the sink's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadPacket {
    /// RTP payload type (RFC 3551).
    pub payload_type: u8,
    /// Set on the first packet after a stream discontinuity.
    pub marker: bool,
    /// Capture time of the first payload byte, if known.
    pub timestamp: Option<Duration>,
    /// RTP timestamp delta from the stream start, derived from the count
    /// of payload bytes emitted before this packet.
    pub rtp_time: u32,
    /// The audio payload bytes.
    pub payload: Vec<u8>,
}

/// Destination for finished packets.
///
/// The sole channel through which packets leave the payloading engine.
/// Errors propagate to the engine's caller unchanged; the engine does not
/// retry, and bytes already removed from the accumulation buffer for a
/// failed packet are not replayed.
pub trait PacketSink: Send {
    fn send(&mut self, packet: PayloadPacket) -> Result<()>;
}

/// Sink that records every packet it receives.
///
/// Clone it (or call [`packets`](Self::packets)) before handing it to the
/// payloader to keep a shared handle on the recorded packets.
#[derive(Debug, Clone, Default)]
pub struct CollectSink {
    packets: Arc<Mutex<Vec<PayloadPacket>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded packets.
    pub fn packets(&self) -> Arc<Mutex<Vec<PayloadPacket>>> {
        self.packets.clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<PayloadPacket> {
        std::mem::take(&mut *self.packets.lock())
    }
}

impl PacketSink for CollectSink {
    fn send(&mut self, packet: PayloadPacket) -> Result<()> {
        tracing::trace!(
            len = packet.payload.len(),
            rtp_time = packet.rtp_time,
            marker = packet.marker,
            "packet collected"
        );
        self.packets.lock().push(packet);
        Ok(())
    }
}
