//! Agentui TUI Entry Point
//!
//! Usage:
//!   spawned by an agent with its stdin/stdout connected to pipes
//!
//! The agent talks NDJSON over this process's stdin/stdout. Keys come from
//! the controlling terminal. Configuration is read from
//! `$XDG_CONFIG_HOME/agentui/bridge.toml` (or `AGENTUI_CONFIG`) and
//! `AGENTUI_*` environment variables.

use std::io;
use std::panic;

use agentui_core::{load_config, SessionOutcome, SessionRunner, StdioTransport, UserAction};
use crossterm::event::EventStream;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use agentui_tui::{logging, map_event, InputLine, LogRenderer, SurfaceState};

const ACTION_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_path = logging::init()?;

    let config = load_config()?;
    info!(
        log = %log_path.display(),
        config = ?config.config_file_path,
        busy_policy = %config.session.busy_policy,
        busy_policy_source = ?config.busy_policy_source(),
        request_timeout = ?config.session.request_timeout,
        request_timeout_source = ?config.request_timeout_source(),
        "Starting agentui-tui"
    );

    let transport = StdioTransport::stdio(&config.transport);
    let mut runner = SessionRunner::new(transport, &config.session);
    let (mut renderer, state_rx) = LogRenderer::new();
    let (actions_tx, actions_rx) = mpsc::channel(ACTION_QUEUE);

    // Restore the terminal before printing a panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;

    match terminal::size() {
        Ok((width, height)) => {
            let _ = actions_tx.send(UserAction::Resize { width, height }).await;
        }
        Err(e) => debug!(error = %e, "Terminal size unavailable"),
    }

    let input_task = tokio::spawn(read_keys(actions_tx, state_rx));
    let outcome = runner.run(actions_rx, &mut renderer).await;
    input_task.abort();

    disable_raw_mode()?;

    match outcome {
        SessionOutcome::Quit => info!("User quit"),
        SessionOutcome::PeerClosed => info!("Agent disconnected"),
        SessionOutcome::InputClosed => warn!("Keyboard input ended"),
    }
    Ok(())
}

/// Forward terminal events as user actions until either side goes away
async fn read_keys(
    actions: mpsc::Sender<UserAction>,
    state: watch::Receiver<SurfaceState>,
) -> io::Result<()> {
    let mut events = EventStream::new();
    let mut input = InputLine::default();

    while let Some(event) = events.next().await {
        let event = event?;
        let current = *state.borrow();
        if let Some(action) = map_event(&event, current, &mut input) {
            if actions.send(action).await.is_err() {
                break;
            }
        }
    }
    debug!("Terminal event stream ended");
    Ok(())
}
