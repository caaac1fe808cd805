//! Codec mode, packet length bounds, and byte/time conversions.

use std::time::Duration;

use super::PayloadConfig;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// How the codec's output maps onto bytes and time.
///
/// Exactly one of the configured variants is active for a streaming
/// session; [`Unconfigured`](Self::Unconfigured) makes "no mode set" an
/// explicit state that every calculation matches on instead of a null
/// strategy pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No codec parameters supplied yet. All inputs are rejected.
    #[default]
    Unconfigured,
    /// Fixed-size, fixed-duration coded frames (e.g. G.729: 10 bytes per
    /// 10 ms). Packets carry whole frames only.
    FrameBased {
        /// Size of one coded frame in bytes.
        frame_size: usize,
        /// Duration of one coded frame.
        frame_duration: Duration,
    },
    /// Arbitrary-length runs of fixed-width samples (e.g. G.711: 8 bits
    /// per sample). Packets align on whole-byte sample groups.
    SampleBased {
        /// Width of one sample in bits.
        sample_bits: usize,
        /// Smallest whole-byte grouping of one sample; doubles as the
        /// packet alignment.
        fragment_size: usize,
    },
}

/// Payload length window for one packet, derived from [`Mode`] and
/// [`PayloadConfig`]. Ephemeral — recomputed for every input chunk since
/// MTU and ptime targets can change between chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketBounds {
    /// Do not emit packets smaller than this while more data is buffered.
    pub min_payload_len: usize,
    /// Never emit packets larger than this.
    pub max_payload_len: usize,
    /// Emitted lengths are cut as multiples of this.
    pub align: usize,
}

impl PacketBounds {
    /// Length of the next packet to cut from `available` buffered bytes:
    /// rounded down to the alignment, capped at the maximum.
    pub fn slice_len(&self, available: usize) -> usize {
        self.max_payload_len.min(available - available % self.align)
    }
}

impl Mode {
    /// Frame based mode from the frame duration and size.
    pub fn frame_based(frame_duration: Duration, frame_size: usize) -> Self {
        Mode::FrameBased {
            frame_size,
            frame_duration,
        }
    }

    /// Sample based mode from the sample width in bits.
    ///
    /// The fragment size is the smallest number of whole bytes covering
    /// one sample (20 bits → 3 bytes).
    pub fn sample_bits(sample_bits: usize) -> Self {
        Mode::SampleBased {
            sample_bits,
            fragment_size: sample_bits.div_ceil(8),
        }
    }

    /// Compute the payload length window for one packet.
    ///
    /// Returns `None` when the mode is unconfigured, a parameter is
    /// degenerate (zero frame size, duration, sample width, or clock
    /// rate), or a single frame cannot fit the MTU payload capacity —
    /// callers surface all of these as
    /// [`PayloadError::NotConfigured`](crate::PayloadError::NotConfigured).
    pub fn packet_bounds(&self, config: &PayloadConfig) -> Option<PacketBounds> {
        match *self {
            Mode::Unconfigured => None,
            Mode::FrameBased {
                frame_size,
                frame_duration,
            } => {
                if frame_size == 0 || frame_duration.is_zero() {
                    return None;
                }
                let frame_ns = frame_duration.as_nanos();
                let align = frame_size;

                let maxptime_octets = match config.max_ptime {
                    // at least one whole frame, whatever max-ptime says
                    Some(max_ptime) => {
                        to_len(scale(frame_size as u128, max_ptime.as_nanos(), frame_ns))
                            .max(frame_size)
                    }
                    None => usize::MAX,
                };

                // MTU bound, rounded down to whole frames
                let mtu_octets = align_down(config.payload_capacity(), frame_size);
                let max_payload_len = mtu_octets.min(maxptime_octets);
                if max_payload_len == 0 {
                    return None;
                }

                let minptime_octets =
                    to_len(scale(frame_size as u128, config.min_ptime.as_nanos(), frame_ns));
                let min_payload_len = minptime_octets.max(frame_size).min(max_payload_len);

                Some(PacketBounds {
                    min_payload_len,
                    max_payload_len,
                    align,
                })
            }
            Mode::SampleBased {
                sample_bits,
                fragment_size,
            } => {
                if sample_bits == 0 || config.clock_rate == 0 {
                    return None;
                }
                let align = fragment_size;
                let denom = sample_bits as u128 * NANOS_PER_SEC;

                let maxptime_octets = match config.max_ptime {
                    Some(max_ptime) => to_len(scale(
                        max_ptime.as_nanos() * 8,
                        config.clock_rate as u128,
                        denom,
                    )),
                    None => usize::MAX,
                };
                let max_payload_len = config.payload_capacity().min(maxptime_octets);
                if max_payload_len == 0 {
                    return None;
                }

                let minptime_octets = to_len(scale(
                    config.min_ptime.as_nanos() * 8,
                    config.clock_rate as u128,
                    denom,
                ));
                let min_payload_len = minptime_octets.max(align).min(max_payload_len);

                Some(PacketBounds {
                    min_payload_len,
                    max_payload_len,
                    align,
                })
            }
        }
    }

    /// Elapsed stream time represented by `bytes` of payload.
    ///
    /// Frame based: whole frames only — a partial trailing frame
    /// contributes zero, which is exact for the whole-frame byte counts
    /// the payloader passes. Sample based: bytes → bits → seconds through
    /// the clock rate.
    pub fn bytes_to_duration(&self, clock_rate: u32, bytes: u64) -> Duration {
        match *self {
            Mode::Unconfigured => Duration::ZERO,
            Mode::FrameBased {
                frame_size,
                frame_duration,
            } => {
                if frame_size == 0 {
                    return Duration::ZERO;
                }
                let frames = (bytes / frame_size as u64) as u128;
                from_nanos(frames * frame_duration.as_nanos())
            }
            Mode::SampleBased { sample_bits, .. } => {
                let denom = clock_rate as u128 * sample_bits as u128;
                if denom == 0 {
                    return Duration::ZERO;
                }
                from_nanos(scale(bytes as u128 * 8, NANOS_PER_SEC, denom))
            }
        }
    }

    /// RTP timestamp ticks represented by `bytes` of payload, truncated
    /// and wrapped to 32 bits.
    pub fn bytes_to_rtp_time(&self, clock_rate: u32, bytes: u64) -> u32 {
        match *self {
            Mode::Unconfigured => 0,
            Mode::FrameBased { .. } => {
                let duration = self.bytes_to_duration(clock_rate, bytes);
                scale(duration.as_nanos(), clock_rate as u128, NANOS_PER_SEC) as u32
            }
            Mode::SampleBased { sample_bits, .. } => {
                if sample_bits == 0 {
                    return 0;
                }
                // number of whole samples
                ((bytes * 8) / sample_bits as u64) as u32
            }
        }
    }
}

/// `val * num / denom` in one widened step, so duration and clock-rate
/// scaling never loses precision to intermediate truncation.
fn scale(val: u128, num: u128, denom: u128) -> u128 {
    val * num / denom
}

fn align_down(val: usize, align: usize) -> usize {
    val - (val % align)
}

fn to_len(v: u128) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}

fn from_nanos(ns: u128) -> Duration {
    Duration::from_nanos(u64::try_from(ns).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// MTU that leaves exactly `capacity` payload bytes after the RTP header.
    fn config_with_capacity(capacity: usize) -> PayloadConfig {
        let mut config = PayloadConfig::new(96, 8000);
        config.mtu = capacity + crate::rtp::HEADER_LEN;
        config
    }

    // --- frame based bounds ---

    #[test]
    fn frame_bounds_basic() {
        let mode = Mode::frame_based(ms(20), 20);
        let config = config_with_capacity(1400);
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.min_payload_len, 20);
        assert_eq!(bounds.max_payload_len, 1400);
        assert_eq!(bounds.align, 20);
    }

    #[test]
    fn frame_max_is_multiple_of_frame_size() {
        let mode = Mode::frame_based(ms(20), 20);
        // 1388 rounds down to 1380
        let bounds = mode.packet_bounds(&config_with_capacity(1388)).unwrap();
        assert_eq!(bounds.max_payload_len, 1380);
        assert_eq!(bounds.max_payload_len % 20, 0);
        assert!(bounds.min_payload_len <= bounds.max_payload_len);
    }

    #[test]
    fn frame_max_ptime_caps_payload() {
        let mode = Mode::frame_based(ms(20), 20);
        let mut config = config_with_capacity(1400);
        config.max_ptime = Some(ms(40));
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.max_payload_len, 40);
    }

    #[test]
    fn frame_max_ptime_below_one_frame_clamps_up() {
        let mode = Mode::frame_based(ms(20), 20);
        let mut config = config_with_capacity(1400);
        config.max_ptime = Some(ms(5));
        // a packet always carries at least one whole frame
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.max_payload_len, 20);
    }

    #[test]
    fn frame_min_ptime_raises_minimum() {
        let mode = Mode::frame_based(ms(20), 20);
        let mut config = config_with_capacity(1400);
        config.min_ptime = ms(60);
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.min_payload_len, 60);
    }

    #[test]
    fn frame_min_clamped_to_max() {
        let mode = Mode::frame_based(ms(20), 20);
        let mut config = config_with_capacity(1400);
        config.min_ptime = ms(10_000);
        config.max_ptime = Some(ms(40));
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.max_payload_len, 40);
        assert_eq!(bounds.min_payload_len, 40);
    }

    #[test]
    fn frame_larger_than_mtu_is_unusable() {
        let mode = Mode::frame_based(ms(20), 2000);
        assert!(mode.packet_bounds(&config_with_capacity(1400)).is_none());
    }

    #[test]
    fn frame_zero_parameters_are_unconfigured() {
        let config = config_with_capacity(1400);
        assert!(
            Mode::frame_based(Duration::ZERO, 20)
                .packet_bounds(&config)
                .is_none()
        );
        assert!(Mode::frame_based(ms(20), 0).packet_bounds(&config).is_none());
        assert!(Mode::Unconfigured.packet_bounds(&config).is_none());
    }

    // --- sample based bounds ---

    #[test]
    fn sample_bounds_ptime_matches_capacity() {
        // 8-bit samples at 8 kHz: 20 ms is exactly 160 bytes
        let mode = Mode::sample_bits(8);
        let mut config = config_with_capacity(160);
        config.max_ptime = Some(ms(20));
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.max_payload_len, 160);
        assert_eq!(bounds.min_payload_len, 1);
        assert_eq!(bounds.align, 1);
    }

    #[test]
    fn sample_min_is_at_least_fragment() {
        let mode = Mode::sample_bits(16);
        let bounds = mode.packet_bounds(&config_with_capacity(160)).unwrap();
        assert_eq!(bounds.align, 2);
        assert_eq!(bounds.min_payload_len, 2);
    }

    #[test]
    fn sample_min_ptime_raises_minimum() {
        let mode = Mode::sample_bits(8);
        let mut config = config_with_capacity(1400);
        config.min_ptime = ms(10);
        // 10 ms of 8-bit audio at 8 kHz is 80 bytes
        let bounds = mode.packet_bounds(&config).unwrap();
        assert_eq!(bounds.min_payload_len, 80);
    }

    #[test]
    fn sample_zero_parameters_are_unconfigured() {
        let config = config_with_capacity(1400);
        assert!(Mode::sample_bits(0).packet_bounds(&config).is_none());
        let mut no_clock = config;
        no_clock.clock_rate = 0;
        assert!(Mode::sample_bits(8).packet_bounds(&no_clock).is_none());
    }

    #[test]
    fn fragment_size_rounds_up_to_whole_bytes() {
        assert_eq!(
            Mode::sample_bits(20),
            Mode::SampleBased {
                sample_bits: 20,
                fragment_size: 3
            }
        );
        assert_eq!(
            Mode::sample_bits(8),
            Mode::SampleBased {
                sample_bits: 8,
                fragment_size: 1
            }
        );
    }

    // --- slicing ---

    #[test]
    fn slice_len_aligns_down_and_caps() {
        let bounds = PacketBounds {
            min_payload_len: 20,
            max_payload_len: 40,
            align: 20,
        };
        assert_eq!(bounds.slice_len(30), 20);
        assert_eq!(bounds.slice_len(50), 40);
        assert_eq!(bounds.slice_len(100), 40);
        assert_eq!(bounds.slice_len(19), 0);
    }

    // --- conversions ---

    #[test]
    fn frame_duration_counts_whole_frames() {
        let mode = Mode::frame_based(ms(20), 20);
        assert_eq!(mode.bytes_to_duration(8000, 40), ms(40));
        // partial trailing frame contributes nothing
        assert_eq!(mode.bytes_to_duration(8000, 45), ms(40));
        assert_eq!(mode.bytes_to_duration(8000, 0), Duration::ZERO);
    }

    #[test]
    fn sample_duration_scales_by_clock_rate() {
        let mode = Mode::sample_bits(8);
        assert_eq!(mode.bytes_to_duration(8000, 160), ms(20));
        let wide = Mode::sample_bits(16);
        assert_eq!(wide.bytes_to_duration(8000, 320), ms(20));
    }

    #[test]
    fn frame_rtp_time_from_duration() {
        let mode = Mode::frame_based(ms(20), 20);
        // 40 bytes = 40 ms = 320 ticks at 8 kHz
        assert_eq!(mode.bytes_to_rtp_time(8000, 40), 320);
        assert_eq!(mode.bytes_to_rtp_time(8000, 0), 0);
    }

    #[test]
    fn sample_rtp_time_is_sample_count() {
        let mode = Mode::sample_bits(16);
        assert_eq!(mode.bytes_to_rtp_time(8000, 160), 80);
        // truncated, not rounded
        assert_eq!(mode.bytes_to_rtp_time(8000, 3), 1);
    }
}
