//! Session Reducer
//!
//! [`Session::update`] is the only way session state changes. It takes one
//! [`SessionEvent`], mutates the session and returns the [`Effect`]s the
//! consumer loop must perform. It never performs I/O itself.
//!
//! # Mode
//!
//! The UI mode is derived rather than stored:
//!
//! ```text
//! closed            -> Closed
//! error shown       -> ErrorDisplay
//! request pending   -> AwaitingForm | AwaitingConfirm | AwaitingSelect
//! otherwise         -> Active
//! ```
//!
//! so an error never loses a pending request; dismissing the error returns to
//! whichever `Awaiting*` mode was in progress.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::events::{Effect, SessionEvent, UserAction};
use super::pending::{FormResolution, PendingKind, PendingRequest};
use super::state::{
    ConversationLog, ErrorInfo, LogEntry, Overlay, StreamBuffer, UiMode, DEFAULT_STATUS,
};
use crate::protocol::{
    ClearScope, PayloadSchemaError, PeerMessage, ResponseFlags, SurfaceMessage, TextPayload,
};

/// What to do with a blocking request that arrives while another is pending
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Hold it and activate it once the current request resolves (FIFO)
    #[default]
    Queue,
    /// Answer it immediately with a `busy` response
    Reject,
}

impl fmt::Display for BusyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusyPolicy::Queue => write!(f, "queue"),
            BusyPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for BusyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(BusyPolicy::Queue),
            "reject" => Ok(BusyPolicy::Reject),
            other => Err(format!("unknown busy policy '{other}' (expected queue or reject)")),
        }
    }
}

/// Single-owner session state
#[derive(Debug, Default)]
pub struct Session {
    log: ConversationLog,
    stream: StreamBuffer,
    overlay: Overlay,
    pending: Option<PendingRequest>,
    queued: VecDeque<PendingRequest>,
    error: Option<ErrorInfo>,
    closed: bool,
    busy_policy: BusyPolicy,
    next_seq: u64,
}

impl Session {
    /// Create a session in `Active` mode
    #[must_use]
    pub fn new(busy_policy: BusyPolicy) -> Self {
        Self {
            busy_policy,
            ..Self::default()
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current UI mode
    #[must_use]
    pub fn mode(&self) -> UiMode {
        if self.closed {
            UiMode::Closed
        } else if self.error.is_some() {
            UiMode::ErrorDisplay
        } else if let Some(pending) = &self.pending {
            pending.kind.mode()
        } else {
            UiMode::Active
        }
    }

    /// Conversation history
    #[must_use]
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Reply currently streaming
    #[must_use]
    pub fn stream(&self) -> &StreamBuffer {
        &self.stream
    }

    /// Status line, progress and other auxiliary state
    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Request the user is currently answering
    #[must_use]
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Sequence number of the pending request, for arming timeouts
    #[must_use]
    pub fn pending_seq(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.seq)
    }

    /// Requests waiting behind the pending one
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Error being displayed
    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Whether the peer connection has closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Configured busy policy
    #[must_use]
    pub fn busy_policy(&self) -> BusyPolicy {
        self.busy_policy
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Apply one event
    pub fn update(&mut self, event: SessionEvent) -> Vec<Effect> {
        if self.closed {
            return match event {
                SessionEvent::User(UserAction::Quit) => vec![Effect::Exit],
                other => {
                    trace!(event = ?other, "Session closed, ignoring event");
                    Vec::new()
                }
            };
        }

        match event {
            SessionEvent::Peer(msg) => self.on_peer(msg),
            SessionEvent::User(action) => self.on_user(action),
            SessionEvent::SchemaError(err) => {
                self.on_schema_error(&err);
                Vec::new()
            }
            SessionEvent::DecodeFailed(detail) => {
                warn!(detail = %detail, "Decode failure shown to user");
                self.error = Some(ErrorInfo::new("Malformed message", detail, true));
                Vec::new()
            }
            SessionEvent::SendFailed(detail) => {
                warn!(detail = %detail, "Send failure shown to user");
                self.error = Some(ErrorInfo::new("Failed to send", detail, false));
                Vec::new()
            }
            SessionEvent::ConnectionClosed => {
                info!("Peer connection closed");
                self.error = Some(ErrorInfo::new(
                    "Connection closed",
                    "The agent process ended the session",
                    false,
                ));
                self.overlay.streaming = false;
                self.log.push(LogEntry::notice("Connection closed"));
                self.closed = true;
                Vec::new()
            }
            SessionEvent::RequestTimedOut { seq } => self.on_timeout(seq),
        }
    }

    // ========================================================================
    // Peer messages
    // ========================================================================

    fn on_peer(&mut self, msg: PeerMessage) -> Vec<Effect> {
        match msg {
            PeerMessage::Text(chunk) => self.on_text(chunk),
            PeerMessage::Markdown(p) => self.log.push(LogEntry::markdown(p)),
            PeerMessage::Code(p) => self.log.push(LogEntry::code(p)),
            PeerMessage::Table(p) => self.log.push(LogEntry::table(p)),
            PeerMessage::Form { id, payload } => {
                return self.on_request(PendingRequest::form(id, payload));
            }
            PeerMessage::Confirm { id, payload } => {
                return self.on_request(PendingRequest::confirm(id, payload));
            }
            PeerMessage::Select { id, payload } => {
                return self.on_request(PendingRequest::select(id, payload));
            }
            PeerMessage::Progress(p) => {
                if !p.message.is_empty() {
                    self.overlay.status.clone_from(&p.message);
                }
                self.overlay.progress = Some(p);
            }
            PeerMessage::Alert(p) => self.overlay.alert = Some(p),
            PeerMessage::Spinner(p) => {
                self.overlay.status = p.message;
                self.overlay.streaming = true;
            }
            PeerMessage::Status(p) => {
                self.overlay.status = p.message;
                if p.tokens.is_some() {
                    self.overlay.tokens = p.tokens;
                }
            }
            PeerMessage::Clear(p) => self.on_clear(p.scope),
            PeerMessage::Done(p) => {
                self.overlay.streaming = false;
                self.overlay.progress = None;
                self.overlay.status = p
                    .summary
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_STATUS.to_string());
            }
            PeerMessage::Update(update) => return vec![Effect::ForwardUpdate(update)],
        }
        Vec::new()
    }

    fn on_text(&mut self, chunk: TextPayload) {
        self.stream.push(&chunk.content);
        if chunk.done {
            let content = self.stream.take();
            if !content.is_empty() {
                self.log.push(LogEntry::assistant(content));
            }
            self.overlay.streaming = false;
        } else {
            self.overlay.streaming = true;
        }
    }

    fn on_clear(&mut self, scope: ClearScope) {
        if scope.clears_chat() {
            self.log.clear();
            self.stream.clear();
        }
        if scope.clears_progress() {
            self.overlay.progress = None;
        }
        if scope == ClearScope::All {
            self.overlay.alert = None;
        }
    }

    fn on_request(&mut self, request: PendingRequest) -> Vec<Effect> {
        if self.pending.is_none() {
            self.activate(request);
            return Vec::new();
        }
        match self.busy_policy {
            BusyPolicy::Queue => {
                info!(
                    id = ?request.id,
                    queued = self.queued.len() + 1,
                    "Request pending, queueing new request"
                );
                self.queued.push_back(request);
                Vec::new()
            }
            BusyPolicy::Reject => {
                info!(id = ?request.id, "Request pending, rejecting new request as busy");
                vec![Effect::Send(request.refusal(ResponseFlags::busy()))]
            }
        }
    }

    fn activate(&mut self, mut request: PendingRequest) {
        self.next_seq += 1;
        request.seq = self.next_seq;
        debug!(id = ?request.id, seq = request.seq, mode = ?request.kind.mode(), "Request active");
        self.pending = Some(request);
    }

    /// Discard the pending request and activate the next queued one
    fn resolve(&mut self, response: SurfaceMessage) -> Vec<Effect> {
        self.pending = None;
        if let Some(next) = self.queued.pop_front() {
            self.activate(next);
        }
        vec![Effect::Send(response)]
    }

    // ========================================================================
    // Errors and timeouts
    // ========================================================================

    fn on_schema_error(&mut self, err: &PayloadSchemaError) {
        warn!(msg_type = %err.msg_type, cause = %err.cause, "Payload schema error");
        self.error = Some(ErrorInfo::new(
            "Protocol error",
            err.to_string(),
            false,
        ));
    }

    fn on_timeout(&mut self, seq: u64) -> Vec<Effect> {
        let Some(pending) = self.pending.as_ref().filter(|p| p.seq == seq) else {
            trace!(seq, "Stale request timeout");
            return Vec::new();
        };
        warn!(id = ?pending.id, seq, "Request timed out");
        let response = pending.refusal(ResponseFlags::timed_out());
        self.error = Some(ErrorInfo::new(
            "Request timed out",
            "No answer was given in time; the agent was told the request expired",
            false,
        ));
        self.resolve(response)
    }

    // ========================================================================
    // User actions
    // ========================================================================

    fn on_user(&mut self, action: UserAction) -> Vec<Effect> {
        if self.error.is_some() {
            match action {
                UserAction::Quit | UserAction::Resize { .. } => {}
                _ => {
                    self.error = None;
                    return Vec::new();
                }
            }
        }

        match action {
            UserAction::SubmitInput(text) => self.on_submit_input(&text),
            UserAction::CancelStream => {
                if !self.overlay.streaming {
                    return Vec::new();
                }
                self.overlay.streaming = false;
                self.overlay.status = "Cancelled".to_string();
                vec![Effect::Send(SurfaceMessage::Cancel)]
            }
            UserAction::ClearChat => {
                self.log.clear();
                self.stream.clear();
                Vec::new()
            }
            UserAction::Resize { width, height } => {
                self.overlay.viewport = Some((width, height));
                vec![Effect::Send(SurfaceMessage::Resize { width, height })]
            }
            UserAction::Quit => vec![Effect::SendNow(SurfaceMessage::Quit), Effect::Exit],
            UserAction::Dismiss => Vec::new(),
            UserAction::Form(form_action) => {
                let Some(PendingKind::Form(form)) = self.pending.as_mut().map(|p| &mut p.kind)
                else {
                    return self.mismatched("form");
                };
                let values = match form.apply(form_action) {
                    None => return Vec::new(),
                    Some(FormResolution::Submit(values)) => Some(values),
                    Some(FormResolution::Cancel) => None,
                };
                let id = self.pending_id();
                self.resolve(SurfaceMessage::FormResponse {
                    id,
                    values,
                    flags: ResponseFlags::default(),
                })
            }
            UserAction::Confirm(confirm_action) => {
                let Some(PendingKind::Confirm(confirm)) =
                    self.pending.as_mut().map(|p| &mut p.kind)
                else {
                    return self.mismatched("confirm");
                };
                let Some(confirmed) = confirm.apply(confirm_action) else {
                    return Vec::new();
                };
                let id = self.pending_id();
                self.resolve(SurfaceMessage::ConfirmResponse {
                    id,
                    confirmed,
                    flags: ResponseFlags::default(),
                })
            }
            UserAction::Select(select_action) => {
                let Some(PendingKind::Select(select)) =
                    self.pending.as_mut().map(|p| &mut p.kind)
                else {
                    return self.mismatched("select");
                };
                let Some(value) = select.apply(select_action) else {
                    return Vec::new();
                };
                let id = self.pending_id();
                self.resolve(SurfaceMessage::SelectResponse {
                    id,
                    value,
                    flags: ResponseFlags::default(),
                })
            }
        }
    }

    fn on_submit_input(&mut self, text: &str) -> Vec<Effect> {
        let content = text.trim();
        if content.is_empty() || self.mode() != UiMode::Active || self.overlay.streaming {
            debug!(mode = ?self.mode(), streaming = self.overlay.streaming, "Input not accepted");
            return Vec::new();
        }
        self.log.push(LogEntry::user(content));
        self.overlay.streaming = true;
        self.overlay.status = "Thinking...".to_string();
        vec![Effect::Send(SurfaceMessage::Input {
            content: content.to_string(),
        })]
    }

    fn pending_id(&self) -> Option<crate::protocol::CorrelationId> {
        self.pending.as_ref().and_then(|p| p.id.clone())
    }

    fn mismatched(&self, action: &str) -> Vec<Effect> {
        warn!(action, mode = ?self.mode(), "Action does not match the pending request");
        Vec::new()
    }
}
