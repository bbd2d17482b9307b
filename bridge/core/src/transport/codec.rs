//! Line Codec
//!
//! Wire format: one UTF-8 JSON envelope per line.
//!
//! ```text
//! {"type":"text","payload":{"content":"Hel"}}\n
//! {"type":"text","payload":{"content":"lo","done":true}}\n
//! ```
//!
//! # Security
//!
//! - Maximum line size is enforced on both directions
//! - Blank lines (including bare `\r\n`) are skipped, not errors

use super::error::TransportError;
use crate::protocol::Envelope;

/// Default maximum line size (10 MB)
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Smallest line limit a configuration may set
pub const MIN_MAX_LINE_BYTES: usize = 1024;

/// Encoder/decoder for newline-delimited envelopes
#[derive(Clone, Copy, Debug)]
pub struct LineCodec {
    max_line_bytes: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineCodec {
    /// Create a codec with a line size limit
    #[must_use]
    pub fn new(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    /// Configured line size limit
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    /// Encode an envelope as one line, including the trailing newline
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Encode` if serialization fails and
    /// `TransportError::LineTooLong` if the line exceeds the limit.
    pub fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, TransportError> {
        let mut line = serde_json::to_vec(envelope).map_err(TransportError::Encode)?;
        if line.len() > self.max_line_bytes {
            return Err(TransportError::LineTooLong {
                len: line.len(),
                max: self.max_line_bytes,
            });
        }
        line.push(b'\n');
        Ok(line)
    }

    /// Decode one line (with or without its line terminator)
    ///
    /// Returns:
    /// - `Ok(Some(envelope))` for a valid envelope
    /// - `Ok(None)` for a blank line
    /// - `Err(...)` for an oversized or malformed line
    pub fn decode(&self, line: &[u8]) -> Result<Option<Envelope>, TransportError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        if line.len() > self.max_line_bytes {
            return Err(TransportError::LineTooLong {
                len: line.len(),
                max: self.max_line_bytes,
            });
        }
        serde_json::from_slice(line)
            .map(Some)
            .map_err(|e| TransportError::decode(line, e))
    }
}
