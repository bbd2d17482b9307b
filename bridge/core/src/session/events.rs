//! Session Events and Effects
//!
//! Inputs and outputs of [`Session::update`](super::Session::update). Peer
//! messages, local user actions and transport failures all arrive as one
//! [`SessionEvent`] stream so they share a single total order.

use crate::protocol::{ComponentUpdate, PayloadSchemaError, PeerMessage, SurfaceMessage};

/// Everything that can change the session
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Decoded message from the peer
    Peer(PeerMessage),
    /// Local user action
    User(UserAction),
    /// Recognized type with a malformed payload
    SchemaError(PayloadSchemaError),
    /// A line could not be decoded; the stream is still healthy
    DecodeFailed(String),
    /// An outbound message could not be delivered
    SendFailed(String),
    /// The inbound stream ended
    ConnectionClosed,
    /// The pending request with this sequence number ran out of time
    RequestTimedOut {
        /// Sequence number of the request when the timer was armed
        seq: u64,
    },
}

/// Local user intent, already mapped from raw input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    /// Send the chat input line
    SubmitInput(String),
    /// Stop the reply currently streaming
    CancelStream,
    /// Clear the local conversation
    ClearChat,
    /// Terminal size changed
    Resize {
        /// Columns
        width: u16,
        /// Rows
        height: u16,
    },
    /// Leave the session
    Quit,
    /// Acknowledge the displayed error
    Dismiss,
    /// Interaction with a pending form
    Form(FormAction),
    /// Interaction with a pending confirm dialog
    Confirm(ConfirmAction),
    /// Interaction with a pending select menu
    Select(SelectAction),
}

/// Form interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
    /// Focus the next field or button
    NextField,
    /// Focus the previous field or button
    PrevField,
    /// Cycle option backwards, toggle, or switch button
    Left,
    /// Cycle option forwards, toggle, or switch button
    Right,
    /// Type a character into the focused field
    Input(char),
    /// Delete the last character of the focused field
    Backspace,
    /// Press the focused element
    Activate,
    /// Submit regardless of focus
    Submit,
    /// Cancel the form
    Cancel,
}

/// Confirm dialog interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Move focus to the other button
    Toggle,
    /// Answer yes
    Yes,
    /// Answer no
    No,
    /// Answer with the focused button
    Accept,
}

/// Select menu interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectAction {
    /// Highlight the previous option
    Up,
    /// Highlight the next option
    Down,
    /// Answer with the highlighted option
    Choose,
    /// Answer with nothing
    Cancel,
}

/// Work the consumer loop performs on the reducer's behalf
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Queue a message for the write pump
    Send(SurfaceMessage),
    /// Write a message immediately through the synchronous path
    SendNow(SurfaceMessage),
    /// Hand an opaque update to the renderer
    ForwardUpdate(ComponentUpdate),
    /// Stop the consumer loop
    Exit,
}
