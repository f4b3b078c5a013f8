//! Application events for inter-module communication.
//!
//! These events represent high-level application actions that can be
//! published by any module and handled by the event dispatcher.
//! This module is pure Rust with no FFI dependencies, making it fully testable.

use crate::model::{Shortcut, LAUNCH_MENU_ID};

/// What a pending shortcut capture will be bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Overlay(String),
    LaunchMenu,
}

impl CaptureTarget {
    /// Id under which the binding is stored in the hotkey table.
    pub fn binding_id(&self) -> &str {
        match self {
            CaptureTarget::Overlay(id) => id,
            CaptureTarget::LaunchMenu => LAUNCH_MENU_ID,
        }
    }
}

/// Application-level events for decoupled communication between modules.
///
/// Events flow from producers (event tap, launch menu, status bar, content
/// hosts, system observers) through the EventBus to the dispatcher, which
/// runs on the main loop and is the only place state is mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // === Input Events ===
    /// Show or hide one overlay (hotkey, launch menu pick, status bar, CLI)
    ToggleOverlay(String),

    /// Pop up the launch menu at the cursor
    OpenLaunchMenu,

    /// Navigate an open overlay back to its home page
    ReloadOverlay(String),

    /// Drop cookies, caches and storage of every web view
    ClearWebData,

    // === Content Host Notifications ===
    /// Hosted content finished loading
    ContentReady(String),

    /// Hosted content failed to load
    ContentLoadFailed { id: String, reason: String },

    // === Shortcut Editing ===
    /// Arm a one-shot capture of the next key-down
    BeginShortcutCapture(CaptureTarget),

    /// The listener captured a key combination for `target`
    ShortcutCaptured {
        target: CaptureTarget,
        shortcut: Shortcut,
    },

    /// Capture aborted with Escape
    ShortcutCaptureCancelled,

    /// Remove an overlay's shortcut
    ClearShortcut(String),

    // === System Events ===
    /// The OS disabled the event tap
    ListenerDeactivated,

    /// Reinstall the tap (after sleep/wake, session or space change)
    ReinstallListener,

    /// User asked to retry after granting accessibility permission
    RetryPermission,

    /// Persist geometry and leave the main loop
    RequestQuit,
}

impl AppEvent {
    /// Returns a human-readable description of the event for debugging.
    pub fn description(&self) -> &'static str {
        match self {
            AppEvent::ToggleOverlay(_) => "Toggle overlay",
            AppEvent::OpenLaunchMenu => "Open launch menu",
            AppEvent::ReloadOverlay(_) => "Reload overlay home page",
            AppEvent::ClearWebData => "Clear web data",
            AppEvent::ContentReady(_) => "Overlay content ready",
            AppEvent::ContentLoadFailed { .. } => "Overlay content failed to load",
            AppEvent::BeginShortcutCapture(_) => "Begin shortcut capture",
            AppEvent::ShortcutCaptured { .. } => "Shortcut captured",
            AppEvent::ShortcutCaptureCancelled => "Shortcut capture cancelled",
            AppEvent::ClearShortcut(_) => "Clear shortcut",
            AppEvent::ListenerDeactivated => "Global listener deactivated",
            AppEvent::ReinstallListener => "Reinstall global listener",
            AppEvent::RetryPermission => "Retry accessibility permission",
            AppEvent::RequestQuit => "Request quit",
        }
    }
}
