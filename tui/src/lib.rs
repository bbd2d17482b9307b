//! Agentui TUI - Terminal surface for an agent process
//!
//! The binary is spawned by an agent with its stdin/stdout wired to the
//! agent's pipes. Keyboard input is read from the controlling terminal,
//! mapped to [`agentui_core::UserAction`]s and handed to the session runner.
//!
//! # Modules
//!
//! - **input**: the chat input line
//! - **keymap**: key events to user actions, per UI mode
//! - **renderer**: the [`agentui_core::Renderer`] this surface installs
//! - **logging**: file-backed tracing setup

pub mod input;
pub mod keymap;
pub mod logging;
pub mod renderer;

pub use input::InputLine;
pub use keymap::{map_event, map_key, SurfaceState};
pub use renderer::LogRenderer;
