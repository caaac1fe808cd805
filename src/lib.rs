//! RTP payloading engine for constant-bitrate audio codecs.
//!
//! Turns a stream of arbitrarily-sized audio chunks into correctly sized,
//! correctly timestamped packets, honoring both the transport MTU and a
//! target packet duration window (min/max ptime). Codec adapters only
//! declare how their output maps onto bytes and time:
//!
//! - **Frame based** — fixed-size, fixed-duration coded frames (G.729,
//!   AMR, ...). Packets always carry whole frames.
//! - **Sample based** — runs of fixed-width samples (G.711, L16, ...).
//!   Packets align on whole-byte sample groups.
//!
//! The engine buffers partial input, drains it into aligned packets, and
//! stamps each packet with a capture timestamp (given or extrapolated from
//! byte distance — exact for constant-bitrate streams) and an RTP
//! timestamp derived from the count of bytes emitted so far. It works only
//! with constant-bitrate codecs.
//!
//! | Concern | Module |
//! |---------|--------|
//! | Packetization state machine | [`payload`] |
//! | Byte accumulation with timestamp tracking | [`adapter`] |
//! | RTP fixed header (RFC 3550 §5.1) | [`rtp`] |
//! | Packet egress (UDP, in-memory) | [`transport`] |
//!
//! ```
//! use std::time::Duration;
//! use rtp_audio_payload::{AudioPayloader, CollectSink, PayloadConfig};
//!
//! let sink = CollectSink::new();
//! let packets = sink.packets();
//!
//! // G.729-like codec: 10-byte frames, 10 ms each
//! let mut payloader = AudioPayloader::new(Box::new(sink));
//! payloader.set_frame_based(Duration::from_millis(10), 10);
//!
//! let mut config = PayloadConfig::new(96, 8000);
//! config.min_ptime = Duration::from_millis(20);
//! config.max_ptime = Some(Duration::from_millis(20));
//!
//! // 50 ms of audio: two full 20 ms packets, 10 ms left buffered
//! payloader
//!     .handle_input(&config, &[0u8; 50], Some(Duration::ZERO), false)
//!     .unwrap();
//! assert_eq!(packets.lock().len(), 2);
//! assert_eq!(payloader.buffered().len(), 10);
//!
//! // end of stream: the residue goes out too
//! payloader.finish(&config).unwrap();
//! assert_eq!(packets.lock().len(), 3);
//! ```

pub mod adapter;
pub mod error;
pub mod payload;
pub mod rtp;
pub mod transport;

pub use adapter::Adapter;
pub use error::{PayloadError, Result};
pub use payload::{AudioPayloader, DEFAULT_MTU, Mode, PacketBounds, PayloadConfig};
pub use transport::{CollectSink, PacketSink, PayloadPacket, UdpRtpSink};
