//! Global keyboard listener.
//!
//! The OS delivers every key event on the machine to a callback that must
//! return quickly. That callback only runs [`KeyFilter::handle`]: one table
//! lookup plus an enqueue. Everything else (reinstalling a dead hook,
//! backing off, permission checks) happens in [`GlobalListener`] on the
//! main loop.
//!
//! The OS hook itself sits behind the [`EventTap`] and [`PermissionGate`]
//! traits so the supervisor can be driven with fakes.

pub mod backoff;
pub mod filter;
pub mod supervisor;

use std::sync::Arc;

use crate::error::Result;

pub use backoff::{Backoff, BackoffConfig};
pub use filter::KeyFilter;
pub use supervisor::{GlobalListener, ListenerState};

/// Kind of event delivered by the OS hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    FlagsChanged,
    /// The OS stopped the hook because the callback was too slow.
    TapDisabledByTimeout,
    /// The OS stopped the hook on user request (secure input and the like).
    TapDisabledByUserInput,
    Other,
}

/// A raw keyboard event as seen by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub flags: u64,
    pub key_code: u16,
    /// Auto-repeat from a held key.
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn key_down(flags: u64, key_code: u16) -> Self {
        Self {
            kind: KeyEventKind::KeyDown,
            flags,
            key_code,
            is_repeat: false,
        }
    }

    pub fn repeat(flags: u64, key_code: u16) -> Self {
        Self {
            is_repeat: true,
            ..Self::key_down(flags, key_code)
        }
    }

    pub fn of_kind(kind: KeyEventKind) -> Self {
        Self {
            kind,
            flags: 0,
            key_code: 0,
            is_repeat: false,
        }
    }
}

/// What the hook should do with the event after the filter saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward to the focused application untouched.
    PassThrough,
    /// Swallow the event.
    Consume,
}

/// A system-wide keyboard hook.
pub trait EventTap {
    /// Create and enable the hook, routing events through `filter`.
    fn install(&mut self, filter: Arc<KeyFilter>) -> Result<()>;

    /// Whether the OS still delivers events to the hook.
    fn is_enabled(&self) -> bool;

    /// Tear the hook down. No-op when not installed.
    fn uninstall(&mut self);
}

/// Accessibility-style permission the hook depends on.
pub trait PermissionGate {
    /// Whether the process is trusted. With `prompt` the OS may show its
    /// permission dialog.
    fn is_trusted(&self, prompt: bool) -> bool;
}
