//! Error taxonomy for the overlay core.
//!
//! Every variant except [`OverlayError::HostUnavailable`] is recovered
//! locally by the component that sees it; the dispatcher only propagates
//! fatal errors up to `main`.

use thiserror::Error;

use crate::model::Shortcut;

/// Errors produced by the hotkey table, listener, controller and stores.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// The exact shortcut is already bound to another overlay.
    #[error("shortcut {shortcut} is already bound to '{existing}'")]
    Conflict { shortcut: Shortcut, existing: String },

    /// The shortcut cannot be bound (unknown modifier bits, bad key code...).
    #[error("invalid shortcut {shortcut}: {reason}")]
    InvalidShortcut {
        shortcut: Shortcut,
        reason: &'static str,
    },

    /// Accessibility permission is missing; the listener stays uninstalled.
    #[error("accessibility permission not granted")]
    PermissionDenied,

    /// The OS disabled the event hook and the retry budget ran out.
    #[error("global listener deactivated after {attempts} reinstall attempts")]
    ListenerDeactivated { attempts: u32 },

    /// The event hook could not be created for a reason other than permission.
    #[error("failed to install global listener: {0}")]
    ListenerInstall(String),

    /// The content host reported a navigation failure.
    #[error("content for '{id}' failed to load: {reason}")]
    ContentLoadFailed { id: String, reason: String },

    /// Toggle or selection for an id the registry does not know.
    #[error("unknown overlay id '{0}'")]
    UnknownOverlayId(String),

    /// No content host could be allocated at all.
    #[error("content host unavailable: {0}")]
    HostUnavailable(String),

    /// The web engine refused to clear website data.
    #[error("could not clear web data: {0}")]
    WebData(String),

    /// Overlay descriptor file is malformed.
    #[error("invalid overlay descriptor: {0}")]
    InvalidDescriptor(String),

    /// Persistence store I/O failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OverlayError {
    /// Only unrecoverable resource exhaustion ends the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OverlayError::HostUnavailable(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OverlayError>;
