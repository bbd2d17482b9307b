//! Key Mapping
//!
//! Turns crossterm events into [`UserAction`]s. The meaning of a key depends
//! on the session's current [`SurfaceState`], which the renderer publishes.
//!
//! | Mode            | Keys                                                       |
//! |-----------------|------------------------------------------------------------|
//! | any             | Ctrl+C quit                                                |
//! | Active          | Enter send (kept while a reply streams), Esc cancel stream, Ctrl+L clear, text editing |
//! | AwaitingForm    | Tab/Shift+Tab/Up/Down focus, Left/Right change, Enter press, Ctrl+S submit, Esc cancel |
//! | AwaitingConfirm | y/n answer, Left/Right/Tab switch, Enter accept, Esc no    |
//! | AwaitingSelect  | Up/Down/k/j move, Enter choose, Esc cancel                 |
//! | ErrorDisplay    | any key dismisses                                          |
//! | Closed          | any key quits                                              |

use agentui_core::{ConfirmAction, FormAction, SelectAction, UiMode, UserAction};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::input::InputLine;

/// What the key mapper needs to know about the session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceState {
    /// Current UI mode
    pub mode: UiMode,
    /// Whether an assistant reply is streaming
    pub streaming: bool,
}

impl From<UiMode> for SurfaceState {
    fn from(mode: UiMode) -> Self {
        Self {
            mode,
            streaming: false,
        }
    }
}

/// Map a terminal event
pub fn map_event(event: &Event, state: SurfaceState, input: &mut InputLine) -> Option<UserAction> {
    match event {
        // Only handle Press events (not Release or Repeat)
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, state, input),
        Event::Resize(width, height) => Some(UserAction::Resize {
            width: *width,
            height: *height,
        }),
        Event::Paste(text) if state.mode == UiMode::Active => {
            text.chars().filter(|c| !c.is_control()).for_each(|c| input.insert(c));
            None
        }
        _ => None,
    }
}

/// Map a key press
pub fn map_key(key: &KeyEvent, state: SurfaceState, input: &mut InputLine) -> Option<UserAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(UserAction::Quit);
    }

    match state.mode {
        UiMode::Closed => Some(UserAction::Quit),
        UiMode::ErrorDisplay => Some(UserAction::Dismiss),
        UiMode::Active => map_chat_key(key, ctrl, state.streaming, input),
        UiMode::AwaitingForm => map_form_key(key, ctrl).map(UserAction::Form),
        UiMode::AwaitingConfirm => map_confirm_key(key).map(UserAction::Confirm),
        UiMode::AwaitingSelect => map_select_key(key).map(UserAction::Select),
    }
}

fn map_chat_key(
    key: &KeyEvent,
    ctrl: bool,
    streaming: bool,
    input: &mut InputLine,
) -> Option<UserAction> {
    match key.code {
        KeyCode::Enter => {
            // The session refuses input mid-reply; keep the line for later
            if streaming || input.as_str().trim().is_empty() {
                return None;
            }
            Some(UserAction::SubmitInput(input.take()))
        }
        KeyCode::Esc => Some(UserAction::CancelStream),
        KeyCode::Char('l') if ctrl => Some(UserAction::ClearChat),
        KeyCode::Char('u') if ctrl => {
            input.clear();
            None
        }
        KeyCode::Char('w') if ctrl => {
            input.delete_word();
            None
        }
        KeyCode::Char(c) if !ctrl => {
            input.insert(c);
            None
        }
        KeyCode::Backspace => {
            input.backspace();
            None
        }
        _ => None,
    }
}

fn map_form_key(key: &KeyEvent, ctrl: bool) -> Option<FormAction> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => Some(FormAction::NextField),
        KeyCode::BackTab | KeyCode::Up => Some(FormAction::PrevField),
        KeyCode::Left => Some(FormAction::Left),
        KeyCode::Right => Some(FormAction::Right),
        KeyCode::Enter => Some(FormAction::Activate),
        KeyCode::Esc => Some(FormAction::Cancel),
        KeyCode::Backspace => Some(FormAction::Backspace),
        KeyCode::Char('s') if ctrl => Some(FormAction::Submit),
        KeyCode::Char(c) if !ctrl => Some(FormAction::Input(c)),
        _ => None,
    }
}

fn map_confirm_key(key: &KeyEvent) -> Option<ConfirmAction> {
    match key.code {
        KeyCode::Char('y' | 'Y') => Some(ConfirmAction::Yes),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(ConfirmAction::No),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            Some(ConfirmAction::Toggle)
        }
        KeyCode::Enter => Some(ConfirmAction::Accept),
        _ => None,
    }
}

fn map_select_key(key: &KeyEvent) -> Option<SelectAction> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(SelectAction::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(SelectAction::Down),
        KeyCode::Enter => Some(SelectAction::Choose),
        KeyCode::Esc => Some(SelectAction::Cancel),
        _ => None,
    }
}
