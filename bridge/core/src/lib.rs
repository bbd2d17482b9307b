//! Agentui Core - Headless Protocol Bridge for Terminal Agent Surfaces
//!
//! This crate lets an interactive surface and an agent process cooperate
//! over a pair of byte streams (usually the agent's stdin/stdout). It owns
//! the wire protocol, the framed message pump, and the session state machine
//! that turns agent commands into UI modes and user answers into responses.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Agent Process (peer)                        │
//! └───────────────┬──────────────────────────────────▲───────────────┘
//!          stdout │ NDJSON envelopes                  │ stdin
//! ┌───────────────┼──────────────────────────────────┼───────────────┐
//! │               ▼          AGENTUI CORE            │               │
//! │  ┌──────────────────────┐            ┌──────────────────────┐    │
//! │  │      Read Pump       │            │      Write Pump      │    │
//! │  └──────────┬───────────┘            └──────────▲───────────┘    │
//! │      incoming│ errors                  send /    │ send_sync      │
//! │  ┌──────────▼──────────────────────────────────┴───────────┐    │
//! │  │                 SessionRunner (one task)                  │    │
//! │  │   dispatch ──► Session::update ──► Effects                │    │
//! │  └──────────▲──────────────────────────────┬───────────────┘    │
//! └─────────────┼──────────────────────────────┼────────────────────┘
//!     UserAction│                              │ render
//! ┌─────────────┴──────────────────────────────▼────────────────────┐
//! │                     Surface (TUI, headless)                       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Envelope`]: `{type, id?, payload?}` wrapper around every message
//! - [`PeerMessage`] / [`SurfaceMessage`]: typed messages for each direction
//! - [`PumpTransport`]: read and write pumps over any async byte streams
//! - [`Session`]: the reducer owning mode, log, stream buffer and requests
//! - [`SessionRunner`]: the consumer loop tying transport, session and surface
//!
//! # Quick Start
//!
//! ```ignore
//! use agentui_core::{load_config, Renderer, SessionRunner, StdioTransport};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let transport = StdioTransport::stdio(&config.transport);
//!     let mut runner = SessionRunner::new(transport, &config.session);
//!
//!     let (actions_tx, actions_rx) = mpsc::channel(64);
//!     // Feed UserActions from your input source into `actions_tx`
//!
//!     let outcome = runner.run(actions_rx, &mut my_renderer).await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`protocol`]: envelopes, wire types, payloads, typed messages
//! - [`transport`]: line codec and pump pair
//! - [`dispatch`]: envelope to session event routing
//! - [`session`]: the reducer and its state
//! - [`runner`]: the consumer loop and renderer boundary
//! - [`config`]: TOML and environment configuration
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on crossterm or any other terminal
//! library. The session can be driven headless for testing.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod transport;

pub use config::{
    default_config_path, load_config, load_config_from_path, BridgeConfig, ConfigError,
    ConfigSource, SessionConfig,
};
pub use dispatch::dispatch;
pub use protocol::{
    CorrelationId, Envelope, PayloadSchemaError, PeerMessage, PeerMessageType, SurfaceMessage,
    SurfaceMessageType,
};
pub use runner::{error_event, Renderer, SessionOutcome, SessionRunner};
pub use session::{
    BusyPolicy, ConfirmAction, Effect, FormAction, SelectAction, Session, SessionEvent, UiMode,
    UserAction,
};
pub use transport::{PumpTransport, StdioTransport, TransportConfig, TransportError};
