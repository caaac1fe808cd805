//! Error types for the RTP audio payloading library.

/// Errors that can occur while payloading audio data.
///
/// Variants map to the two failure modes of the engine:
///
/// - **Configuration**: [`NotConfigured`](Self::NotConfigured) — input
///   arrived before a codec mode was set, or the configured mode cannot
///   produce a valid packet length. The offending chunk is discarded.
/// - **Transport**: [`Io`](Self::Io) — a packet sink failed to deliver.
///   Propagated verbatim; bytes already removed from the accumulation
///   buffer for that packet are not replayed (at-most-once delivery).
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// Underlying I/O or socket error from a transport sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No frame or sample mode has been configured, or a single frame
    /// does not fit the MTU payload capacity.
    #[error("payloader not configured")]
    NotConfigured,
}

/// Convenience alias for `Result<T, PayloadError>`.
pub type Result<T> = std::result::Result<T, PayloadError>;
