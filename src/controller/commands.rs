//! Key commands handled inside a focused overlay window.
//!
//! The app runs without a main menu, so the usual edit shortcuts never reach
//! the web view unless the window forwards them itself.

use crate::events::AppEvent;
use crate::model::{MOD_COMMAND, MOD_CONTROL, MOD_OPTION};

/// Standard edit action sent to the window's first responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    SelectAll,
    Copy,
    Cut,
    Paste,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCommand {
    Edit(EditAction),
    /// Hide the overlay the window belongs to.
    Hide,
    Quit,
}

impl WindowCommand {
    /// Interpret a key-down in an overlay window. Command or Control must be
    /// held and Option must not; `key` is the character ignoring modifiers.
    pub fn from_key(flags: u64, key: &str) -> Option<Self> {
        if flags & (MOD_COMMAND | MOD_CONTROL) == 0 || flags & MOD_OPTION != 0 {
            return None;
        }
        let command = match key {
            "a" => WindowCommand::Edit(EditAction::SelectAll),
            "c" => WindowCommand::Edit(EditAction::Copy),
            "x" => WindowCommand::Edit(EditAction::Cut),
            "v" => WindowCommand::Edit(EditAction::Paste),
            "h" => WindowCommand::Hide,
            "q" => WindowCommand::Quit,
            _ => return None,
        };
        Some(command)
    }

    /// Event to publish for `overlay_id`; edit actions stay in the window.
    pub fn event(self, overlay_id: &str) -> Option<AppEvent> {
        match self {
            WindowCommand::Edit(_) => None,
            WindowCommand::Hide => Some(AppEvent::ToggleOverlay(overlay_id.to_string())),
            WindowCommand::Quit => Some(AppEvent::RequestQuit),
        }
    }
}
