//! Transport Errors

use thiserror::Error;

/// Longest slice of an offending line kept for diagnostics
const LINE_PREVIEW_LEN: usize = 200;

/// Errors produced by the pumps and the line codec
#[derive(Debug, Error)]
pub enum TransportError {
    /// A line was not a valid envelope (malformed JSON or missing `type`)
    #[error("Malformed message: {source}")]
    Decode {
        /// Start of the offending line
        line: String,
        /// Decoder error
        source: serde_json::Error,
    },

    /// A line exceeded the configured maximum size
    #[error("Line too long: {len} bytes (max: {max})")]
    LineTooLong {
        /// Actual length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// An outbound envelope could not be serialized
    #[error("Serialization error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The inbound byte stream failed
    #[error("Read failed: {0}")]
    Read(#[source] std::io::Error),

    /// The outbound byte stream failed
    #[error("Write failed: {0}")]
    Write(#[source] std::io::Error),

    /// The transport has been stopped
    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Build a decode error, keeping a bounded preview of the line
    pub(crate) fn decode(line: &[u8], source: serde_json::Error) -> Self {
        let text = String::from_utf8_lossy(line);
        let line = text.chars().take(LINE_PREVIEW_LEN).collect();
        Self::Decode { line, source }
    }

    /// Whether the error ends the pump that produced it
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Closed)
    }

    /// Whether the stream itself is still healthy (a single line was skipped)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::LineTooLong { .. })
    }
}
