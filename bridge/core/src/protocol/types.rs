//! Wire Type Names
//!
//! The closed sets of message types each side is allowed to emit. Anything
//! outside [`PeerMessageType`] arriving from the peer is ignored for forward
//! compatibility.

use std::fmt;

/// Message types sent by the peer (render commands and requests)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeerMessageType {
    /// Streaming text chunk
    Text,
    /// Complete markdown block
    Markdown,
    /// Progress overlay update
    Progress,
    /// Blocking form request
    Form,
    /// Data table
    Table,
    /// Code block
    Code,
    /// Blocking yes/no request
    Confirm,
    /// Blocking single-choice request
    Select,
    /// Notification
    Alert,
    /// Busy indicator
    Spinner,
    /// Status line update
    Status,
    /// Clear part of the session
    Clear,
    /// Agent finished its turn
    Done,
    /// In-place update of an existing component
    Update,
}

impl PeerMessageType {
    /// All peer message types
    pub const ALL: [Self; 14] = [
        Self::Text,
        Self::Markdown,
        Self::Progress,
        Self::Form,
        Self::Table,
        Self::Code,
        Self::Confirm,
        Self::Select,
        Self::Alert,
        Self::Spinner,
        Self::Status,
        Self::Clear,
        Self::Done,
        Self::Update,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Progress => "progress",
            Self::Form => "form",
            Self::Table => "table",
            Self::Code => "code",
            Self::Confirm => "confirm",
            Self::Select => "select",
            Self::Alert => "alert",
            Self::Spinner => "spinner",
            Self::Status => "status",
            Self::Clear => "clear",
            Self::Done => "done",
            Self::Update => "update",
        }
    }

    /// Look up a wire name; `None` for types this build does not know
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether this type suspends the conversation until the user answers
    #[must_use]
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Form | Self::Confirm | Self::Select)
    }
}

impl fmt::Display for PeerMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message types sent by the surface (user events)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceMessageType {
    /// User typed a message
    Input,
    /// Answer to a form request
    FormResponse,
    /// Answer to a confirm request
    ConfirmResponse,
    /// Answer to a select request
    SelectResponse,
    /// Stop the current generation
    Cancel,
    /// Surface is exiting
    Quit,
    /// Terminal size changed
    Resize,
}

impl SurfaceMessageType {
    /// All surface message types
    pub const ALL: [Self; 7] = [
        Self::Input,
        Self::FormResponse,
        Self::ConfirmResponse,
        Self::SelectResponse,
        Self::Cancel,
        Self::Quit,
        Self::Resize,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::FormResponse => "form_response",
            Self::ConfirmResponse => "confirm_response",
            Self::SelectResponse => "select_response",
            Self::Cancel => "cancel",
            Self::Quit => "quit",
            Self::Resize => "resize",
        }
    }

    /// Look up a wire name
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for SurfaceMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_wire_names_are_unique_and_reversible() {
        for t in PeerMessageType::ALL {
            assert_eq!(PeerMessageType::from_wire(t.as_str()), Some(t));
        }
    }

    #[test]
    fn test_unknown_peer_type() {
        assert_eq!(PeerMessageType::from_wire("layout"), None);
        assert_eq!(PeerMessageType::from_wire("TEXT"), None);
    }

    #[test]
    fn test_blocking_types() {
        let blocking: Vec<_> = PeerMessageType::ALL
            .into_iter()
            .filter(|t| t.is_blocking())
            .collect();
        assert_eq!(
            blocking,
            vec![
                PeerMessageType::Form,
                PeerMessageType::Confirm,
                PeerMessageType::Select
            ]
        );
    }

    #[test]
    fn test_surface_wire_names() {
        assert_eq!(SurfaceMessageType::FormResponse.as_str(), "form_response");
        assert_eq!(
            SurfaceMessageType::from_wire("resize"),
            Some(SurfaceMessageType::Resize)
        );
        assert_eq!(SurfaceMessageType::from_wire("text"), None);
    }
}
