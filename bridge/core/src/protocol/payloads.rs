//! Payload Types
//!
//! One struct per wire type. Peer payloads are what the agent sends to draw
//! and ask; surface payloads are what the user's actions produce.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// Peer -> Surface
// ============================================================================

/// Streaming text chunk
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    /// Chunk content, appended to the streaming buffer
    pub content: String,
    /// Final chunk of this stream
    #[serde(default, skip_serializing_if = "is_false")]
    pub done: bool,
}

/// Complete markdown block
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkdownPayload {
    /// Markdown source
    pub content: String,
    /// Optional heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// State of one step in a multi-step progress display
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Not started
    #[default]
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    #[serde(alias = "completed", alias = "done")]
    Complete,
    /// Finished with an error
    #[serde(alias = "failed")]
    Error,
}

/// One step of a progress display
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressStep {
    /// Step label
    pub label: String,
    /// Step state
    #[serde(default)]
    pub status: StepStatus,
    /// Extra detail shown next to the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Progress overlay update
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    /// Headline message
    pub message: String,
    /// Completion percentage, absent for indeterminate progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    /// Ordered steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<ProgressStep>,
}

/// Kind of a form field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text (also an empty `type`)
    #[default]
    #[serde(alias = "")]
    Text,
    /// Masked text
    Password,
    /// Numeric text
    Number,
    /// Multi-line text
    Textarea,
    /// One of `options`
    Select,
    /// Boolean toggle
    Checkbox,
}

impl FieldKind {
    /// Whether the field is edited as a text buffer
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Password | Self::Number | Self::Textarea
        )
    }
}

/// A single form field definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Key used in the response `values`
    pub name: String,
    /// Display label
    pub label: String,
    /// Field kind
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Choices for `select` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Must be filled before submit
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Initial value (string for text/select, bool for checkbox)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder for empty text fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Blocking form request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormPayload {
    /// Form heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Text under the heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered fields
    pub fields: Vec<FormField>,
    /// Submit button label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
    /// Cancel button label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
}

/// Table column header, either a bare name or a descriptor object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableColumn {
    /// Plain header text
    Name(String),
    /// Descriptor object such as `{"header": "Size", "align": "right"}`
    Detailed(Map<String, Value>),
}

impl TableColumn {
    /// Header text to show for this column
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Detailed(map) => ["header", "label", "name", "key"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map_or_else(|| Value::Object(map.clone()).to_string(), str::to_string),
        }
    }
}

/// Data table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    /// Table heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Column headers
    pub columns: Vec<TableColumn>,
    /// Row-major cells
    pub rows: Vec<Vec<String>>,
    /// Text under the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

/// Code block
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodePayload {
    /// Source text
    pub code: String,
    /// Language hint for highlighting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Block heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Show line numbers
    #[serde(default, skip_serializing_if = "is_false")]
    pub line_numbers: bool,
}

/// Blocking yes/no request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPayload {
    /// Question text
    pub message: String,
    /// Dialog heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Label of the affirmative button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_label: Option<String>,
    /// Label of the negative button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    /// Confirming performs an irreversible action
    #[serde(default, skip_serializing_if = "is_false")]
    pub destructive: bool,
}

/// Blocking single-choice request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectPayload {
    /// Prompt text
    pub label: String,
    /// Choices in display order
    pub options: Vec<String>,
    /// Initially highlighted choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Alert severity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational
    #[default]
    Info,
    /// Something succeeded
    Success,
    /// Attention needed
    Warning,
    /// Something failed
    Error,
}

/// Notification
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Alert text
    pub message: String,
    /// Alert heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Severity
    #[serde(default)]
    pub severity: Severity,
}

/// Busy indicator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinnerPayload {
    /// Text shown next to the spinner
    pub message: String,
}

/// Token usage counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input: u64,
    /// Completion tokens
    pub output: u64,
}

/// Status line update
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Status text
    pub message: String,
    /// Token counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
}

/// Part of the session a `clear` applies to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearScope {
    /// Conversation log and streaming buffer
    #[default]
    Chat,
    /// Progress overlay
    Progress,
    /// Everything
    All,
}

impl ClearScope {
    /// Whether the conversation is affected
    #[must_use]
    pub fn clears_chat(self) -> bool {
        matches!(self, Self::Chat | Self::All)
    }

    /// Whether the progress overlay is affected
    #[must_use]
    pub fn clears_progress(self) -> bool {
        matches!(self, Self::Progress | Self::All)
    }
}

/// Clear part of the session
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearPayload {
    /// What to clear
    #[serde(default)]
    pub scope: ClearScope,
}

/// Agent finished its turn
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DonePayload {
    /// Shown on the status line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// In-place update of a previously rendered component
///
/// Everything besides `id` is extension data the core forwards to the
/// renderer without interpreting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    /// Id of the component to update
    #[serde(rename = "id")]
    pub target: String,
    /// Opaque fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ============================================================================
// Surface -> Peer
// ============================================================================

/// User typed a message
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputPayload {
    /// Message text
    pub content: String,
}

/// Why a response was produced without the user's answer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFlags {
    /// Another request was already pending; this one was refused
    #[serde(default, skip_serializing_if = "is_false")]
    pub busy: bool,
    /// The request expired before the user answered
    #[serde(default, skip_serializing_if = "is_false")]
    pub timed_out: bool,
}

impl ResponseFlags {
    /// Flags for a refused request
    #[must_use]
    pub fn busy() -> Self {
        Self {
            busy: true,
            timed_out: false,
        }
    }

    /// Flags for an expired request
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            busy: false,
            timed_out: true,
        }
    }
}

/// Answer to a form request; `values` is `null` when cancelled
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormResponsePayload {
    /// Field name to value
    pub values: Option<Map<String, Value>>,
    /// Non-user outcome markers
    #[serde(flatten)]
    pub flags: ResponseFlags,
}

/// Answer to a confirm request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfirmResponsePayload {
    /// User chose the affirmative option
    pub confirmed: bool,
    /// Non-user outcome markers
    #[serde(flatten)]
    pub flags: ResponseFlags,
}

/// Answer to a select request; `value` is empty when cancelled
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectResponsePayload {
    /// Chosen option
    pub value: String,
    /// Non-user outcome markers
    #[serde(flatten)]
    pub flags: ResponseFlags,
}

/// Terminal size changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizePayload {
    /// Columns
    pub width: u16,
    /// Rows
    pub height: u16,
}
