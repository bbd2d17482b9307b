//! Session State Types
//!
//! Everything the reducer owns apart from the pending request: the UI mode,
//! the conversation log, the streaming buffer and the overlay.

use chrono::{DateTime, Utc};

use crate::protocol::{
    AlertPayload, CodePayload, MarkdownPayload, ProgressPayload, TablePayload, TokenUsage,
};

/// Status line shown when nothing else is going on
pub const DEFAULT_STATUS: &str = "Ready";

/// Primary interaction mode
///
/// Derived from the session on every read, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UiMode {
    /// Normal chat
    #[default]
    Active,
    /// A form is waiting for the user
    AwaitingForm,
    /// A confirm dialog is waiting for the user
    AwaitingConfirm,
    /// A select menu is waiting for the user
    AwaitingSelect,
    /// An error is being shown
    ErrorDisplay,
    /// The peer is gone; only quitting remains
    Closed,
}

impl UiMode {
    /// Whether a blocking request owns the input
    #[must_use]
    pub fn is_awaiting(self) -> bool {
        matches!(
            self,
            Self::AwaitingForm | Self::AwaitingConfirm | Self::AwaitingSelect
        )
    }
}

/// Who a log entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Typed by the local user
    User,
    /// Produced by the peer
    Assistant,
    /// Produced by the surface itself
    System,
}

impl Role {
    /// Get the prefix for this role
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::User => "You: ",
            Role::Assistant => "Agent: ",
            Role::System => "",
        }
    }
}

/// Shape of a log entry's content
#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    /// Plain text
    Text,
    /// Markdown source
    Markdown {
        /// Optional heading
        title: Option<String>,
    },
    /// Source code
    Code {
        /// Highlighting hint
        language: Option<String>,
        /// Optional heading
        title: Option<String>,
        /// Show a line-number gutter
        line_numbers: bool,
    },
    /// Data table; `content` holds the title
    Table {
        /// Column labels
        columns: Vec<String>,
        /// Row-major cells
        rows: Vec<Vec<String>>,
        /// Optional footer line
        footer: Option<String>,
    },
    /// Surface-generated notice
    Notice,
}

/// One immutable conversation entry
#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    /// Who produced the entry
    pub role: Role,
    /// How to present `content`
    pub kind: EntryKind,
    /// Entry body
    pub content: String,
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    fn new(role: Role, kind: EntryKind, content: String) -> Self {
        Self {
            role,
            kind,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, EntryKind::Text, content.into())
    }

    /// Finalized streamed reply
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, EntryKind::Text, content.into())
    }

    /// Notice from the surface
    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(Role::System, EntryKind::Notice, content.into())
    }

    /// Complete markdown block from the peer
    pub fn markdown(payload: MarkdownPayload) -> Self {
        Self::new(
            Role::Assistant,
            EntryKind::Markdown {
                title: payload.title,
            },
            payload.content,
        )
    }

    /// Complete code block from the peer
    pub fn code(payload: CodePayload) -> Self {
        Self::new(
            Role::Assistant,
            EntryKind::Code {
                language: payload.language,
                title: payload.title,
                line_numbers: payload.line_numbers,
            },
            payload.code,
        )
    }

    /// Complete table from the peer
    pub fn table(payload: TablePayload) -> Self {
        Self::new(
            Role::Assistant,
            EntryKind::Table {
                columns: payload.columns.iter().map(|c| c.label()).collect(),
                rows: payload.rows,
                footer: payload.footer,
            },
            payload.title.unwrap_or_default(),
        )
    }
}

/// Append-only conversation history
///
/// Entries cannot be edited once pushed; the whole log can only be cleared.
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    entries: Vec<LogEntry>,
}

impl ConversationLog {
    /// Append an entry
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Accumulator for the reply currently being streamed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamBuffer {
    content: String,
}

impl StreamBuffer {
    /// Append a chunk
    pub fn push(&mut self, chunk: &str) {
        self.content.push_str(chunk);
    }

    /// Take the accumulated text, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.content)
    }

    /// Text accumulated so far
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }

    /// Whether nothing has accumulated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Discard the accumulated text
    pub fn clear(&mut self) {
        self.content.clear();
    }
}

/// Non-blocking auxiliary state
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    /// Status line text
    pub status: String,
    /// Streaming/busy indicator
    pub streaming: bool,
    /// Latest progress snapshot
    pub progress: Option<ProgressPayload>,
    /// Latest token counters
    pub tokens: Option<TokenUsage>,
    /// Latest notification
    pub alert: Option<AlertPayload>,
    /// Last known terminal size (columns, rows)
    pub viewport: Option<(u16, u16)>,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS.to_string(),
            streaming: false,
            progress: None,
            tokens: None,
            alert: None,
            viewport: None,
        }
    }
}

/// Error being shown in `ErrorDisplay`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Short headline
    pub message: String,
    /// Underlying cause
    pub detail: Option<String>,
    /// Whether the stream is still healthy
    pub retryable: bool,
}

impl ErrorInfo {
    /// Build an error with a detail line
    pub fn new(message: impl Into<String>, detail: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
            retryable,
        }
    }

    /// Prompt shown under the error
    #[must_use]
    pub fn hint(&self) -> &'static str {
        if self.retryable {
            "Press any key to continue"
        } else {
            "Press any key to continue, or Ctrl+C to quit"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TableColumn;
    use serde_json::json;

    #[test]
    fn test_stream_buffer_take_resets() {
        let mut buffer = StreamBuffer::default();
        buffer.push("Hel");
        buffer.push("lo");
        assert_eq!(buffer.as_str(), "Hello");
        assert_eq!(buffer.take(), "Hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_log_is_append_only() {
        let mut log = ConversationLog::default();
        log.push(LogEntry::user("hi"));
        log.push(LogEntry::assistant("hello"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].role, Role::User);
        assert_eq!(log.last().map(|e| e.content.as_str()), Some("hello"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_table_entry_uses_column_labels() {
        let entry = LogEntry::table(TablePayload {
            title: Some("Files".into()),
            columns: vec![
                TableColumn::Name("name".into()),
                serde_json::from_value(json!({"key": "size", "header": "Size"})).unwrap(),
            ],
            rows: vec![vec!["a.rs".into(), "10".into()]],
            footer: None,
        });
        assert_eq!(entry.content, "Files");
        match entry.kind {
            EntryKind::Table { columns, rows, .. } => {
                assert_eq!(columns, vec!["name".to_string(), "Size".to_string()]);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_overlay_defaults() {
        let overlay = Overlay::default();
        assert_eq!(overlay.status, DEFAULT_STATUS);
        assert!(!overlay.streaming);
        assert!(overlay.progress.is_none());
    }

    #[test]
    fn test_error_hint_depends_on_retryable() {
        let retryable = ErrorInfo::new("Malformed message", "eof", true);
        let fatal = ErrorInfo::new("Connection closed", "eof", false);
        assert_ne!(retryable.hint(), fatal.hint());
        assert!(fatal.hint().contains("quit"));
    }

    #[test]
    fn test_awaiting_modes() {
        assert!(UiMode::AwaitingForm.is_awaiting());
        assert!(!UiMode::ErrorDisplay.is_awaiting());
        assert_eq!(UiMode::default(), UiMode::Active);
    }
}
