//! Keyboard shortcuts: modifier mask plus virtual key code.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::error::{OverlayError, Result};

/// A key combination. Serialized as `{"flags": <mask>, "key": <code>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    #[serde(rename = "flags")]
    pub modifiers: u64,
    #[serde(rename = "key")]
    pub key_code: u16,
}

impl Shortcut {
    pub const fn new(modifiers: u64, key_code: u16) -> Self {
        Self {
            modifiers,
            key_code,
        }
    }

    /// Build a shortcut from raw event flags, dropping device-dependent bits
    /// (caps lock, numeric pad, left/right side flags).
    pub fn from_event(flags: u64, key_code: u16) -> Self {
        Self::new(flags & MODIFIER_MASK, key_code)
    }

    /// Default shortcut of the launch menu.
    pub const fn launch_menu_default() -> Self {
        Self::new(DEFAULT_MENU_MODIFIERS, DEFAULT_MENU_KEY)
    }

    pub fn is_function_key(&self) -> bool {
        FUNCTION_KEY_CODES.contains(&self.key_code)
    }

    /// Reject combinations that cannot be matched or would swallow normal typing.
    pub fn validate(&self) -> Result<()> {
        if self.modifiers & !MODIFIER_MASK != 0 {
            return Err(OverlayError::InvalidShortcut {
                shortcut: *self,
                reason: "contains non-modifier flag bits",
            });
        }
        if self.key_code > MAX_KEY_CODE {
            return Err(OverlayError::InvalidShortcut {
                shortcut: *self,
                reason: "key code out of range",
            });
        }
        if !self.is_function_key() {
            if self.modifiers == 0 {
                return Err(OverlayError::InvalidShortcut {
                    shortcut: *self,
                    reason: "only function keys may be bound without modifiers",
                });
            }
            if self.modifiers == MOD_SHIFT {
                return Err(OverlayError::InvalidShortcut {
                    shortcut: *self,
                    reason: "Shift alone would capture ordinary typing",
                });
            }
        }
        Ok(())
    }

    /// Modifier names in display order.
    pub fn modifier_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.modifiers & MOD_SHIFT != 0 {
            names.push("Shift");
        }
        if self.modifiers & MOD_CONTROL != 0 {
            names.push("Control");
        }
        if self.modifiers & MOD_OPTION != 0 {
            names.push("Option");
        }
        if self.modifiers & MOD_COMMAND != 0 {
            names.push("Command");
        }
        names
    }
}

/// Renders e.g. `Option + Shift + Space`.
impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.modifier_names() {
            write!(f, "{name} + ")?;
        }
        match super::keys::key_name(self.key_code) {
            Some(key) => f.write_str(key),
            None => write!(f, "Key {}", self.key_code),
        }
    }
}

/// A shortcut bound to an overlay id (or the launch menu's reserved id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShortcutBinding {
    pub overlay_id: String,
    pub shortcut: Shortcut,
}

impl ShortcutBinding {
    pub fn new(overlay_id: impl Into<String>, shortcut: Shortcut) -> Self {
        Self {
            overlay_id: overlay_id.into(),
            shortcut,
        }
    }
}
