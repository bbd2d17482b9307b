//! Log-backed renderer
//!
//! The process's stdout belongs to the wire protocol, so the surface never
//! paints there. Instead [`LogRenderer`] reports what changed between renders
//! to the tracing log and publishes the mode and streaming flag for the key
//! mapper.

use agentui_core::protocol::{AlertPayload, ComponentUpdate};
use agentui_core::{Renderer, Session, UiMode};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::keymap::SurfaceState;

/// Renderer that traces state changes
pub struct LogRenderer {
    state_tx: watch::Sender<SurfaceState>,
    last_mode: Option<UiMode>,
    seen_entries: usize,
    last_status: String,
    last_alert: Option<AlertPayload>,
    last_error: Option<String>,
}

impl LogRenderer {
    /// Create a renderer and the receiver that follows its state
    #[must_use]
    pub fn new() -> (Self, watch::Receiver<SurfaceState>) {
        let (state_tx, state_rx) = watch::channel(SurfaceState::default());
        let renderer = Self {
            state_tx,
            last_mode: None,
            seen_entries: 0,
            last_status: String::new(),
            last_alert: None,
            last_error: None,
        };
        (renderer, state_rx)
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, session: &Session) {
        let mode = session.mode();
        if self.last_mode != Some(mode) {
            info!(from = ?self.last_mode, to = ?mode, "Mode changed");
            self.last_mode = Some(mode);
        }
        let state = SurfaceState {
            mode,
            streaming: session.overlay().streaming,
        };
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });

        let entries = session.log().entries();
        if entries.len() < self.seen_entries {
            debug!("Conversation cleared");
            self.seen_entries = 0;
        }
        for entry in &entries[self.seen_entries..] {
            debug!(
                role = entry.role.prefix(),
                chars = entry.content.chars().count(),
                "Log entry"
            );
        }
        self.seen_entries = entries.len();

        let overlay = session.overlay();
        if overlay.status != self.last_status {
            debug!(status = %overlay.status, "Status");
            self.last_status.clone_from(&overlay.status);
        }
        if overlay.alert != self.last_alert {
            if let Some(alert) = &overlay.alert {
                info!(message = %alert.message, severity = ?alert.severity, "Alert");
            }
            self.last_alert.clone_from(&overlay.alert);
        }

        let error = session.error().map(|e| e.message.clone());
        if error != self.last_error {
            if let Some(e) = session.error() {
                warn!(message = %e.message, detail = ?e.detail, hint = e.hint(), "Session error");
            }
            self.last_error = error;
        }
    }

    fn apply_update(&mut self, update: &ComponentUpdate) {
        match serde_json::to_string(&update.fields) {
            Ok(fields) => debug!(target_id = %update.target, fields = %fields, "Component update"),
            Err(e) => warn!(target_id = %update.target, error = %e, "Unprintable component update"),
        }
    }
}
