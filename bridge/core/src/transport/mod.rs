//! Transport Layer
//!
//! Moves [`Envelope`](crate::protocol::Envelope)s over a pair of byte streams
//! without interpreting them.
//!
//! - [`codec`]: one JSON envelope per line
//! - [`pump`]: independent read and write pumps with a shared write section
//! - [`config`]: queue sizes and line limits
//! - [`error`]: transport failure taxonomy

pub mod codec;
pub mod config;
pub mod error;
pub mod pump;

pub use codec::{LineCodec, DEFAULT_MAX_LINE_BYTES, MIN_MAX_LINE_BYTES};
pub use config::{TransportConfig, DEFAULT_ERROR_CAPACITY, DEFAULT_INCOMING_CAPACITY};
pub use error::TransportError;
pub use pump::{PumpTransport, StdioTransport};
