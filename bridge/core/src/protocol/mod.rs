//! Protocol Definitions
//!
//! Newline-delimited JSON messages exchanged between the surface and its peer
//! process. Every line is one [`Envelope`]:
//!
//! ```text
//! {"type": "form", "id": "abc123", "payload": {"fields": [...]}}
//! ```
//!
//! - [`envelope`]: the generic wrapper and correlation ids
//! - [`types`]: wire type names for each direction
//! - [`payloads`]: per-type payload structs
//! - [`messages`]: typed messages and schema errors

pub mod envelope;
pub mod messages;
pub mod payloads;
pub mod types;

pub use envelope::{CorrelationId, Envelope};
pub use messages::{PayloadSchemaError, PeerMessage, SurfaceMessage};
pub use payloads::{
    AlertPayload, ClearPayload, ClearScope, CodePayload, ComponentUpdate, ConfirmPayload,
    DonePayload, FieldKind, FormField, FormPayload, MarkdownPayload, ProgressPayload,
    ProgressStep, ResponseFlags, SelectPayload, Severity, SpinnerPayload, StatusPayload,
    StepStatus, TableColumn, TablePayload, TextPayload, TokenUsage,
};
pub use types::{PeerMessageType, SurfaceMessageType};
