//! Error types for ttyrec-timeline.
//!
//! Decoding corruption is modelled separately from everything else: a
//! [`FrameError`] describes where a log stopped being well-formed, while
//! [`TimelineError`] covers I/O, configuration, serialization and the
//! recorder process. A truncated log still yields the frames decoded before
//! the damage; [`TimelineError::Truncated`] is only produced when a caller
//! asks for a complete timeline.

use thiserror::Error;

/// A log that ends in the middle of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer than 12 bytes were left where a frame header should start.
    #[error("truncated frame header at byte {offset}: {remaining} of 12 bytes present")]
    TruncatedHeader {
        /// Byte offset of the incomplete header.
        offset: u64,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// The header announced more payload bytes than the stream holds.
    #[error(
        "truncated frame payload at byte {offset}: header announces {expected} bytes, {available} present"
    )]
    TruncatedPayload {
        /// Byte offset of the frame header whose payload is short.
        offset: u64,
        /// Payload length from the header.
        expected: u32,
        /// Bytes actually left after the header.
        available: usize,
    },
}

impl FrameError {
    /// Byte offset of the frame that could not be decoded.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        match self {
            Self::TruncatedHeader { offset, .. } | Self::TruncatedPayload { offset, .. } => *offset,
        }
    }
}

/// The main error type for ttyrec-timeline operations.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The log was truncated and the caller required a complete timeline.
    #[error("recording is corrupted after {frames_decoded} frame(s): {source}")]
    Truncated {
        /// Frames successfully decoded before the corruption.
        frames_decoded: usize,
        /// Where and how the log was cut short.
        #[source]
        source: FrameError,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    IoWithContext {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The render payload could not be serialized.
    #[error("failed to serialize render payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// A payload too large to describe with a 32-bit length field.
    #[error("payload of {len} bytes does not fit a frame header")]
    PayloadTooLarge {
        /// Length of the rejected payload.
        len: usize,
    },

    /// The external recorder failed to start or exited unsuccessfully.
    #[error("recorder error: {message}")]
    Recorder {
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for ttyrec-timeline operations.
pub type Result<T> = std::result::Result<T, TimelineError>;

impl TimelineError {
    /// Create a truncation error.
    #[must_use]
    pub const fn truncated(frames_decoded: usize, source: FrameError) -> Self {
        Self::Truncated {
            frames_decoded,
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a recorder error.
    pub fn recorder(message: impl Into<String>) -> Self {
        Self::Recorder {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io_context(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoWithContext {
            context: context.into(),
            source,
        }
    }

    /// Wrap an I/O result with context.
    pub fn with_io_context<T>(result: std::io::Result<T>, context: impl Into<String>) -> Result<T> {
        result.map_err(|e| Self::io_context(context, e))
    }

    /// Check if this error reports a corrupted (truncated) recording.
    #[must_use]
    pub const fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }

    /// The underlying frame error, if this is a truncation.
    #[must_use]
    pub const fn frame_error(&self) -> Option<&FrameError> {
        match self {
            Self::Truncated { source, .. } => Some(source),
            _ => None,
        }
    }
}
