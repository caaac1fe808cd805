//! Byte accumulation with append-boundary timestamp tracking.

use std::collections::VecDeque;
use std::time::Duration;

/// One appended chunk: its length and the capture time of its first byte.
#[derive(Debug)]
struct Run {
    len: usize,
    timestamp: Option<Duration>,
}

/// FIFO byte buffer that remembers where timestamps were recorded.
///
/// Input chunks ("runs") are appended with the capture timestamp of their
/// first byte. Reads always consume from the front. Instead of stamping
/// every byte, the adapter answers one question:
/// [`prev_timestamp`](Self::prev_timestamp) — the timestamp governing the
/// current read position and how many bytes have been consumed since it was
/// recorded. For a constant-bitrate stream that distance, scaled through
/// the codec's byte-to-duration conversion, extrapolates the capture time
/// of the bytes about to be read.
///
/// Runs without a timestamp inherit the previous one: the distance keeps
/// growing across them until a stamped run reaches the read position.
#[derive(Debug, Default)]
pub struct Adapter {
    data: Vec<u8>,
    runs: VecDeque<Run>,
    /// Bytes consumed from the front run so far.
    consumed_front: usize,
    prev_ts: Option<Duration>,
    distance: u64,
}

impl Adapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one run of bytes with the capture timestamp of its first byte.
    ///
    /// Empty runs are ignored.
    pub fn push(&mut self, data: &[u8], timestamp: Option<Duration>) {
        if data.is_empty() {
            return;
        }
        self.data.extend_from_slice(data);
        self.runs.push_back(Run {
            len: data.len(),
            timestamp,
        });
        self.sync_head();
    }

    /// Number of buffered bytes.
    pub fn available(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only view of the buffered bytes, oldest first.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Last timestamp at or before the current read position, and the
    /// number of bytes consumed since it was recorded.
    pub fn prev_timestamp(&self) -> (Option<Duration>, u64) {
        (self.prev_ts, self.distance)
    }

    /// Remove and return the `n` oldest bytes, clamped to what is available.
    pub fn take(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.data.len());
        let out: Vec<u8> = self.data.drain(..n).collect();

        let mut left = n;
        while left > 0 {
            let Some(run) = self.runs.front() else { break };
            let (run_len, run_ts) = (run.len, run.timestamp);
            if self.consumed_front == 0 {
                if let Some(ts) = run_ts {
                    self.prev_ts = Some(ts);
                    self.distance = 0;
                }
            }
            let step = left.min(run_len - self.consumed_front);
            self.consumed_front += step;
            self.distance += step as u64;
            left -= step;
            if self.consumed_front == run_len {
                self.runs.pop_front();
                self.consumed_front = 0;
            }
        }
        self.sync_head();
        out
    }

    /// Drop all buffered bytes and timestamp context.
    pub fn clear(&mut self) {
        self.data.clear();
        self.runs.clear();
        self.consumed_front = 0;
        self.prev_ts = None;
        self.distance = 0;
    }

    /// When the read position sits exactly at the start of a stamped run,
    /// that run's timestamp becomes the reference and the distance resets.
    fn sync_head(&mut self) {
        if self.consumed_front == 0 {
            if let Some(run) = self.runs.front() {
                if let Some(ts) = run.timestamp {
                    self.prev_ts = Some(ts);
                    self.distance = 0;
                }
            }
        }
    }
}
