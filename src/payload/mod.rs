//! The payloading engine: buffering, packet sizing, and timestamping.
//!
//! [`AudioPayloader`] turns a stream of constant-bitrate audio chunks into
//! correctly sized, correctly timestamped packets:
//!
//! 1. A codec adapter declares the mode — [`set_frame_based`] for codecs
//!    with fixed-size fixed-duration frames, [`set_sample_based`] /
//!    [`set_sample_bits_based`] for codecs emitting runs of fixed-width
//!    samples.
//! 2. Each input chunk is either emitted directly (when it already fits
//!    one packet and nothing is buffered) or accumulated in the
//!    [`Adapter`], which is then drained into aligned packets while enough
//!    data is available.
//! 3. Every emitted packet is stamped with the caller's payload type, a
//!    capture timestamp (given or extrapolated from the adapter), and an
//!    RTP timestamp derived deterministically from the count of payload
//!    bytes emitted so far.
//!
//! Packet sizing honors the MTU and the min/max ptime targets from
//! [`PayloadConfig`], recomputed on every chunk so the caller can change
//! them mid-stream.
//!
//! [`set_frame_based`]: AudioPayloader::set_frame_based
//! [`set_sample_based`]: AudioPayloader::set_sample_based
//! [`set_sample_bits_based`]: AudioPayloader::set_sample_bits_based

mod mode;

pub use mode::{Mode, PacketBounds};

use std::time::Duration;

use crate::adapter::Adapter;
use crate::error::{PayloadError, Result};
use crate::rtp;
use crate::transport::{PacketSink, PayloadPacket};

/// Default transport-unit size in bytes, typical for Ethernet-bound RTP.
pub const DEFAULT_MTU: usize = 1400;

/// Runtime packetization constraints, owned by the caller.
///
/// Passed by reference into every input call so MTU and ptime targets can
/// change between chunks without touching payloader state. The payloader
/// never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadConfig {
    /// RTP payload type stamped on every packet (dynamic range is 96-127,
    /// RFC 3551).
    pub payload_type: u8,
    /// RTP clock rate in Hz (e.g. 8000 for G.711).
    pub clock_rate: u32,
    /// Total transport-unit size in bytes, including the RTP fixed header.
    pub mtu: usize,
    /// Emit at least this much audio per packet while more is buffered.
    pub min_ptime: Duration,
    /// Never put more than this much audio in one packet. `None` means
    /// unbounded.
    pub max_ptime: Option<Duration>,
}

impl PayloadConfig {
    /// Config with the default MTU, no min-ptime, and unbounded max-ptime.
    pub fn new(payload_type: u8, clock_rate: u32) -> Self {
        Self {
            payload_type,
            clock_rate,
            mtu: DEFAULT_MTU,
            min_ptime: Duration::ZERO,
            max_ptime: None,
        }
    }

    /// Payload bytes that fit in one transport unit after the RTP header.
    pub fn payload_capacity(&self) -> usize {
        rtp::payload_len_for_mtu(self.mtu)
    }
}

/// Packetization engine for constant-bitrate audio.
///
/// Owns the accumulation buffer, the sticky discontinuity flag, and the
/// running emitted-byte offset; hands finished packets to the
/// [`PacketSink`] it was built with. All methods are synchronous and the
/// engine is single-threaded — the hosting pipeline serializes calls.
pub struct AudioPayloader {
    mode: Mode,
    adapter: Adapter,
    sink: Box<dyn PacketSink>,
    /// Marks the next emitted packet, then clears. Exactly one packet is
    /// marked per discontinuity episode.
    discont: bool,
    /// Payload bytes emitted so far. RTP timestamps derive from this, so
    /// they stay monotonic even when chunks are re-sliced across packet
    /// boundaries.
    offset: u64,
}

impl AudioPayloader {
    /// Create an unconfigured payloader emitting into `sink`.
    pub fn new(sink: Box<dyn PacketSink>) -> Self {
        Self {
            mode: Mode::Unconfigured,
            adapter: Adapter::new(),
            sink,
            discont: false,
            offset: 0,
        }
    }

    /// Configure for a frame based codec.
    ///
    /// Drops any buffered bytes: packet geometry changes with the mode, so
    /// data accumulated under the old parameters cannot be sliced under
    /// the new ones.
    pub fn set_frame_based(&mut self, frame_duration: Duration, frame_size: usize) {
        self.mode = Mode::frame_based(frame_duration, frame_size);
        self.adapter.clear();
        tracing::debug!(?frame_duration, frame_size, "frame based mode set");
    }

    /// Configure for a sample based codec, sample width in whole bytes.
    pub fn set_sample_based(&mut self, sample_size: usize) {
        self.set_sample_bits_based(sample_size * 8);
    }

    /// Configure for a sample based codec, sample width in bits.
    ///
    /// Drops any buffered bytes, like [`set_frame_based`](Self::set_frame_based).
    pub fn set_sample_bits_based(&mut self, sample_bits: usize) {
        self.mode = Mode::sample_bits(sample_bits);
        self.adapter.clear();
        tracing::debug!(sample_bits, "sample based mode set");
    }

    /// Active codec mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Payload bytes emitted since construction or the last [`reset`](Self::reset).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read-only view of the buffered bytes awaiting packetization.
    pub fn buffered(&self) -> &[u8] {
        self.adapter.bytes()
    }

    /// Payload one input chunk.
    ///
    /// `timestamp` is the capture time of the chunk's first byte (running
    /// stream time). A `discont` chunk first flushes whatever is pending —
    /// the backlog belongs to the stream before the break — and marks the
    /// next emitted packet.
    ///
    /// Chunks that already satisfy the length bounds while nothing is
    /// buffered are emitted directly without a copy into the adapter.
    /// Everything else is accumulated and drained into aligned packets
    /// while at least `min_payload_len` bytes are available; the remainder
    /// stays buffered for the next chunk or the final [`finish`](Self::finish).
    ///
    /// Fails with [`PayloadError::NotConfigured`] (chunk discarded, nothing
    /// emitted) when no usable mode is set.
    pub fn handle_input(
        &mut self,
        config: &PayloadConfig,
        chunk: &[u8],
        timestamp: Option<Duration>,
        discont: bool,
    ) -> Result<()> {
        let Some(bounds) = self.mode.packet_bounds(config) else {
            tracing::debug!("input dropped: no usable mode configured");
            return Err(PayloadError::NotConfigured);
        };

        if discont {
            tracing::debug!("discontinuous input, flushing pending bytes first");
            self.flush(config, None, None)?;
            self.discont = true;
        }

        tracing::debug!(
            min = bounds.min_payload_len,
            max = bounds.max_payload_len,
            align = bounds.align,
            "computed payload bounds"
        );

        let available = self.adapter.available();
        tracing::debug!(chunk = chunk.len(), available, "handling input");

        if available == 0
            && chunk.len() >= bounds.min_payload_len
            && chunk.len() <= bounds.max_payload_len
        {
            // chunk already fits one packet, skip the adapter
            tracing::debug!("fast packet push");
            return self.push(config, chunk, timestamp);
        }

        self.adapter.push(chunk, timestamp);
        let mut available = available + chunk.len();

        while available >= bounds.min_payload_len {
            let payload_len = bounds.slice_len(available);
            if payload_len == 0 {
                // less than one aligned unit available
                break;
            }
            self.flush(config, Some(payload_len), None)?;
            available -= payload_len;
            tracing::trace!(available, "drained one packet from adapter");
        }
        Ok(())
    }

    /// Emit `data` directly as one packet, bypassing the adapter.
    pub fn push(
        &mut self,
        config: &PayloadConfig,
        data: &[u8],
        timestamp: Option<Duration>,
    ) -> Result<()> {
        tracing::debug!(payload_len = data.len(), ?timestamp, "pushing payload");
        let packet = self.stamp(config, data.to_vec(), timestamp);
        self.sink.send(packet)
    }

    /// Emit buffered bytes as one packet.
    ///
    /// `len = None` flushes everything pending; explicit lengths are
    /// clamped to what is available. Flushing zero bytes is a successful
    /// no-op — no empty packet is emitted.
    ///
    /// `timestamp = None` derives the capture time from the adapter's last
    /// known timestamp plus the elapsed-byte distance scaled through the
    /// codec mode; exact for constant-bitrate input.
    pub fn flush(
        &mut self,
        config: &PayloadConfig,
        len: Option<usize>,
        timestamp: Option<Duration>,
    ) -> Result<()> {
        let available = self.adapter.available();
        let payload_len = len.unwrap_or(available).min(available);

        if payload_len == 0 {
            return Ok(());
        }

        let timestamp = timestamp.or_else(|| {
            let (prev, distance) = self.adapter.prev_timestamp();
            tracing::trace!(?prev, distance, "deriving flush timestamp");
            match prev {
                Some(ts) if distance > 0 => {
                    Some(ts + self.mode.bytes_to_duration(config.clock_rate, distance))
                }
                other => other,
            }
        });

        tracing::debug!(payload_len, ?timestamp, "flushing adapter bytes");

        let payload = self.adapter.take(payload_len);
        let packet = self.stamp(config, payload, timestamp);
        self.sink.send(packet)
    }

    /// End-of-stream: emit all pending bytes in one final packet.
    ///
    /// The terminal flush bypasses the alignment and length bounds of the
    /// steady-state drain loop — a trailing partial frame or fragment is
    /// transmitted, not dropped.
    pub fn finish(&mut self, config: &PayloadConfig) -> Result<()> {
        tracing::debug!(pending = self.adapter.available(), "end of stream flush");
        self.flush(config, None, None)
    }

    /// Drop buffered bytes without emitting anything (flush-stop).
    pub fn clear(&mut self) {
        tracing::debug!(dropped = self.adapter.available(), "clearing buffered bytes");
        self.adapter.clear();
    }

    /// Return to a pristine streaming state: drop buffered bytes, restart
    /// the emitted-byte offset, and mark the next emitted packet as
    /// discontinuous.
    pub fn reset(&mut self) {
        self.adapter.clear();
        self.offset = 0;
        self.discont = true;
        tracing::debug!("payloader reset");
    }

    /// Apply packet metadata: payload type, the one-shot discontinuity
    /// marker, the capture timestamp, and the RTP time derived from the
    /// emitted-byte offset. Advances the offset.
    fn stamp(
        &mut self,
        config: &PayloadConfig,
        payload: Vec<u8>,
        timestamp: Option<Duration>,
    ) -> PayloadPacket {
        let marker = self.discont;
        if marker {
            tracing::debug!("marking first packet after discontinuity");
            self.discont = false;
        }
        let rtp_time = self.mode.bytes_to_rtp_time(config.clock_rate, self.offset);
        let payload_len = payload.len() as u64;
        let packet = PayloadPacket {
            payload_type: config.payload_type,
            marker,
            timestamp,
            rtp_time,
            payload,
        };
        self.offset += payload_len;
        packet
    }
}
