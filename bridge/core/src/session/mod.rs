//! Session State Machine
//!
//! The single owner of UI mode, conversation log, streaming buffer and
//! pending-request bookkeeping. Nothing in this module performs I/O or takes
//! a lock; the consumer loop feeds it events one at a time.

pub mod events;
pub mod pending;
pub mod reducer;
pub mod state;

pub use events::{ConfirmAction, Effect, FormAction, SelectAction, SessionEvent, UserAction};
pub use pending::{
    ConfirmState, FieldState, FieldValue, FormFocus, FormResolution, FormState, PendingKind,
    PendingRequest, SelectState,
};
pub use reducer::{BusyPolicy, Session};
pub use state::{
    ConversationLog, EntryKind, ErrorInfo, LogEntry, Overlay, Role, StreamBuffer, UiMode,
    DEFAULT_STATUS,
};
