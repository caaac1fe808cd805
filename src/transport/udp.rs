//! UDP delivery of payloaded packets behind an RTP fixed header.

use std::net::{SocketAddr, UdpSocket};

use crate::error::Result;
use crate::rtp::{HEADER_LEN, RtpHeader};

use super::{PacketSink, PayloadPacket};

/// Sends each [`PayloadPacket`] as one RTP datagram to a fixed peer.
///
/// Binds an ephemeral socket (`0.0.0.0:0`) and keeps the per-stream RTP
/// header state (wrapping sequence number, SSRC). The 32-bit wire
/// timestamp is `base_rtp_time + packet.rtp_time`; the base defaults to 0
/// for deterministic streams and can be set to a random value per
/// RFC 3550 §5.1.
///
/// This layer is deliberately address-only — it knows nothing about
/// sessions or codecs. The payloading engine resolves all sizing and
/// timing before packets arrive here.
pub struct UdpRtpSink {
    socket: UdpSocket,
    peer: SocketAddr,
    header: RtpHeader,
    base_rtp_time: u32,
}

impl UdpRtpSink {
    /// Bind an ephemeral socket for sending to `peer`, with a random SSRC.
    pub fn connect(peer: SocketAddr, payload_type: u8) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            peer,
            header: RtpHeader::with_random_ssrc(payload_type),
            base_rtp_time: 0,
        })
    }

    /// Use an explicit header state (fixed SSRC) instead of a random one.
    pub fn with_header(peer: SocketAddr, header: RtpHeader) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket,
            peer,
            header,
            base_rtp_time: 0,
        })
    }

    /// Offset added to every packet's RTP time before it hits the wire.
    pub fn set_base_rtp_time(&mut self, base: u32) {
        self.base_rtp_time = base;
    }

    /// Local address of the sending socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Sequence number of the next outgoing packet.
    pub fn next_sequence(&self) -> u16 {
        self.header.sequence()
    }
}

impl PacketSink for UdpRtpSink {
    fn send(&mut self, packet: PayloadPacket) -> Result<()> {
        self.header.pt = packet.payload_type;
        self.header
            .set_timestamp(self.base_rtp_time.wrapping_add(packet.rtp_time) as u64);
        let header = self.header.write(packet.marker);

        let mut datagram = Vec::with_capacity(HEADER_LEN + packet.payload.len());
        datagram.extend_from_slice(&header);
        datagram.extend_from_slice(&packet.payload);

        self.socket.send_to(&datagram, self.peer)?;
        tracing::trace!(
            bytes = datagram.len(),
            peer = %self.peer,
            marker = packet.marker,
            "RTP datagram sent"
        );
        Ok(())
    }
}
