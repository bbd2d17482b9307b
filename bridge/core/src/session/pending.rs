//! Pending Interactive Requests
//!
//! Working state for the blocking form, confirm and select requests. Each
//! widget state consumes its own action type and reports a resolution once
//! the user is done; the reducer turns resolutions into correlated responses.

use serde_json::{Map, Value};

use super::events::{ConfirmAction, FormAction, SelectAction};
use super::state::UiMode;
use crate::protocol::{
    ConfirmPayload, CorrelationId, FieldKind, FormField, FormPayload, ResponseFlags,
    SelectPayload, SurfaceMessage,
};

const DEFAULT_SUBMIT_LABEL: &str = "Submit";
const DEFAULT_CANCEL_LABEL: &str = "Cancel";
const DEFAULT_CONFIRM_LABEL: &str = "Yes";
const DEFAULT_DENY_LABEL: &str = "No";

// ============================================================================
// Form
// ============================================================================

/// Current value of one form field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Text buffer (text, password, number, textarea)
    Text(String),
    /// Index into the field's options
    Choice(usize),
    /// Checkbox state
    Toggle(bool),
}

/// A form field and its current value
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    /// Field definition from the request
    pub field: FormField,
    /// Current value
    pub value: FieldValue,
}

impl FieldState {
    fn new(field: FormField) -> Self {
        let value = match field.kind {
            FieldKind::Select => {
                let index = match &field.default {
                    Some(Value::String(default)) => {
                        field.options.iter().position(|o| o == default).unwrap_or(0)
                    }
                    _ => 0,
                };
                FieldValue::Choice(index)
            }
            FieldKind::Checkbox => FieldValue::Toggle(match &field.default {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
                _ => false,
            }),
            _ => FieldValue::Text(match &field.default {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }),
        };
        Self { field, value }
    }

    /// JSON value sent back to the peer
    #[must_use]
    pub fn json_value(&self) -> Value {
        match &self.value {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Toggle(on) => Value::Bool(*on),
            FieldValue::Choice(index) => Value::String(
                self.field.options.get(*index).cloned().unwrap_or_default(),
            ),
        }
    }

    fn is_missing(&self) -> bool {
        self.field.required && matches!(&self.value, FieldValue::Text(t) if t.trim().is_empty())
    }

    fn cycle(&mut self, forward: bool) {
        match &mut self.value {
            FieldValue::Choice(index) => {
                let len = self.field.options.len();
                if len > 0 {
                    *index = if forward {
                        (*index + 1) % len
                    } else {
                        (*index + len - 1) % len
                    };
                }
            }
            FieldValue::Toggle(on) => *on = !*on,
            FieldValue::Text(_) => {}
        }
    }
}

/// Focusable element of a form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormFocus {
    /// Field at this index
    Field(usize),
    /// Submit button
    Submit,
    /// Cancel button
    Cancel,
}

/// How the user finished a form
#[derive(Clone, Debug, PartialEq)]
pub enum FormResolution {
    /// Submitted with these values
    Submit(Map<String, Value>),
    /// Dismissed
    Cancel,
}

/// Working state of a pending form
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    /// Heading
    pub title: Option<String>,
    /// Text under the heading
    pub description: Option<String>,
    /// Fields in display order
    pub fields: Vec<FieldState>,
    /// Submit button text
    pub submit_label: String,
    /// Cancel button text
    pub cancel_label: String,
    /// Validation message from the last refused submit
    pub error: Option<String>,
    focus: usize,
}

impl FormState {
    /// Build working state from a request
    pub fn new(payload: FormPayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            fields: payload.fields.into_iter().map(FieldState::new).collect(),
            submit_label: payload
                .submit_label
                .unwrap_or_else(|| DEFAULT_SUBMIT_LABEL.to_string()),
            cancel_label: payload
                .cancel_label
                .unwrap_or_else(|| DEFAULT_CANCEL_LABEL.to_string()),
            error: None,
            focus: 0,
        }
    }

    /// Focused element
    #[must_use]
    pub fn focus(&self) -> FormFocus {
        let fields = self.fields.len();
        match self.focus {
            i if i < fields => FormFocus::Field(i),
            i if i == fields => FormFocus::Submit,
            _ => FormFocus::Cancel,
        }
    }

    /// Field values keyed by name
    #[must_use]
    pub fn values(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.field.name.clone(), f.json_value()))
            .collect()
    }

    /// Apply an action; returns a resolution once the form is finished
    pub fn apply(&mut self, action: FormAction) -> Option<FormResolution> {
        match action {
            FormAction::NextField => self.move_focus(true),
            FormAction::PrevField => self.move_focus(false),
            FormAction::Left | FormAction::Right => {
                let forward = action == FormAction::Right;
                match self.focus() {
                    FormFocus::Field(i) => self.fields[i].cycle(forward),
                    FormFocus::Submit => self.focus = self.fields.len() + 1,
                    FormFocus::Cancel => self.focus = self.fields.len(),
                }
            }
            FormAction::Input(c) => {
                if let FormFocus::Field(i) = self.focus() {
                    let field = &mut self.fields[i];
                    if let FieldValue::Text(text) = &mut field.value {
                        text.push(c);
                        self.error = None;
                    } else if c == ' ' && matches!(field.value, FieldValue::Toggle(_)) {
                        field.cycle(true);
                    }
                }
            }
            FormAction::Backspace => {
                if let FormFocus::Field(i) = self.focus() {
                    if let FieldValue::Text(text) = &mut self.fields[i].value {
                        text.pop();
                    }
                }
            }
            FormAction::Activate => match self.focus() {
                FormFocus::Field(i) => {
                    if matches!(self.fields[i].value, FieldValue::Text(_)) {
                        self.move_focus(true);
                    } else {
                        self.fields[i].cycle(true);
                    }
                }
                FormFocus::Submit => return self.submit(),
                FormFocus::Cancel => return Some(FormResolution::Cancel),
            },
            FormAction::Submit => return self.submit(),
            FormAction::Cancel => return Some(FormResolution::Cancel),
        }
        None
    }

    fn move_focus(&mut self, forward: bool) {
        let stops = self.fields.len() + 2;
        self.focus = if forward {
            (self.focus + 1) % stops
        } else {
            (self.focus + stops - 1) % stops
        };
    }

    fn submit(&mut self) -> Option<FormResolution> {
        if let Some(missing) = self.fields.iter().position(FieldState::is_missing) {
            let label = &self.fields[missing].field.label;
            let name = if label.is_empty() {
                &self.fields[missing].field.name
            } else {
                label
            };
            self.error = Some(format!("{name} is required"));
            self.focus = missing;
            return None;
        }
        self.error = None;
        Some(FormResolution::Submit(self.values()))
    }
}

// ============================================================================
// Confirm
// ============================================================================

/// Working state of a pending confirm dialog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmState {
    /// Question
    pub message: String,
    /// Heading
    pub title: Option<String>,
    /// Affirmative button text
    pub confirm_label: String,
    /// Negative button text
    pub cancel_label: String,
    /// The affirmative action cannot be undone
    pub destructive: bool,
    /// Whether the affirmative button is focused
    pub confirm_focused: bool,
}

impl ConfirmState {
    /// Build working state from a request
    pub fn new(payload: ConfirmPayload) -> Self {
        Self {
            message: payload.message,
            title: payload.title,
            confirm_label: payload
                .confirm_label
                .unwrap_or_else(|| DEFAULT_CONFIRM_LABEL.to_string()),
            cancel_label: payload
                .cancel_label
                .unwrap_or_else(|| DEFAULT_DENY_LABEL.to_string()),
            destructive: payload.destructive,
            confirm_focused: true,
        }
    }

    /// Apply an action; returns the answer once given
    pub fn apply(&mut self, action: ConfirmAction) -> Option<bool> {
        match action {
            ConfirmAction::Toggle => {
                self.confirm_focused = !self.confirm_focused;
                None
            }
            ConfirmAction::Yes => Some(true),
            ConfirmAction::No => Some(false),
            ConfirmAction::Accept => Some(self.confirm_focused),
        }
    }
}

// ============================================================================
// Select
// ============================================================================

/// Working state of a pending select menu
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectState {
    /// Prompt
    pub label: String,
    /// Choices
    pub options: Vec<String>,
    /// Highlighted index
    pub selected: usize,
}

impl SelectState {
    /// Build working state from a request
    pub fn new(payload: SelectPayload) -> Self {
        let selected = payload
            .default
            .as_ref()
            .and_then(|d| payload.options.iter().position(|o| o == d))
            .unwrap_or(0);
        Self {
            label: payload.label,
            options: payload.options,
            selected,
        }
    }

    /// Apply an action; returns the answer once given
    pub fn apply(&mut self, action: SelectAction) -> Option<String> {
        match action {
            SelectAction::Up => {
                self.selected = self.selected.saturating_sub(1);
                None
            }
            SelectAction::Down => {
                if self.selected + 1 < self.options.len() {
                    self.selected += 1;
                }
                None
            }
            SelectAction::Choose => {
                Some(self.options.get(self.selected).cloned().unwrap_or_default())
            }
            SelectAction::Cancel => Some(String::new()),
        }
    }
}

// ============================================================================
// Pending request
// ============================================================================

/// Widget state of a pending request
#[derive(Clone, Debug, PartialEq)]
pub enum PendingKind {
    /// Form
    Form(FormState),
    /// Confirm dialog
    Confirm(ConfirmState),
    /// Select menu
    Select(SelectState),
}

impl PendingKind {
    /// Mode shown while this request is pending
    #[must_use]
    pub fn mode(&self) -> UiMode {
        match self {
            Self::Form(_) => UiMode::AwaitingForm,
            Self::Confirm(_) => UiMode::AwaitingConfirm,
            Self::Select(_) => UiMode::AwaitingSelect,
        }
    }
}

/// A blocking request waiting for the user
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRequest {
    /// Id captured at arrival, echoed verbatim on the response
    pub id: Option<CorrelationId>,
    /// Activation sequence number, used to match timeouts
    pub seq: u64,
    /// Widget state
    pub kind: PendingKind,
}

impl PendingRequest {
    /// Pending form
    pub fn form(id: Option<CorrelationId>, payload: FormPayload) -> Self {
        Self {
            id,
            seq: 0,
            kind: PendingKind::Form(FormState::new(payload)),
        }
    }

    /// Pending confirm dialog
    pub fn confirm(id: Option<CorrelationId>, payload: ConfirmPayload) -> Self {
        Self {
            id,
            seq: 0,
            kind: PendingKind::Confirm(ConfirmState::new(payload)),
        }
    }

    /// Pending select menu
    pub fn select(id: Option<CorrelationId>, payload: SelectPayload) -> Self {
        Self {
            id,
            seq: 0,
            kind: PendingKind::Select(SelectState::new(payload)),
        }
    }

    /// Negative answer carrying a non-user outcome (busy, timed out)
    #[must_use]
    pub fn refusal(&self, flags: ResponseFlags) -> SurfaceMessage {
        let id = self.id.clone();
        match self.kind {
            PendingKind::Form(_) => SurfaceMessage::FormResponse {
                id,
                values: None,
                flags,
            },
            PendingKind::Confirm(_) => SurfaceMessage::ConfirmResponse {
                id,
                confirmed: false,
                flags,
            },
            PendingKind::Select(_) => SurfaceMessage::SelectResponse {
                id,
                value: String::new(),
                flags,
            },
        }
    }
}
