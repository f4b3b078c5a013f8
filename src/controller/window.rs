//! Per-overlay window state.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::host::ContentHost;
use crate::model::Frame;

/// `Uncreated → Loading → Hidden ⇄ ShownPinned`. `Loading` happens once per
/// overlay; there is no terminal state while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Uncreated,
    Loading,
    Hidden,
    ShownPinned,
}

impl Lifecycle {
    pub fn is_shown(self) -> bool {
        self == Lifecycle::ShownPinned
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Uncreated => "uncreated",
            Lifecycle::Loading => "loading",
            Lifecycle::Hidden => "hidden",
            Lifecycle::ShownPinned => "shown",
        })
    }
}

/// Whether showing one overlay hides the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowPolicy {
    /// Overlays show and hide independently of each other.
    #[default]
    Independent,
    /// At most one overlay is shown at a time.
    Exclusive,
}

/// Owned exclusively by the controller.
pub struct OverlayWindowState {
    pub lifecycle: Lifecycle,
    pub geometry: Option<Frame>,
    pub content_ready: bool,
    pub(super) host: Option<Box<dyn ContentHost>>,
    pub(super) load_failure: Option<String>,
    pub(super) loading_since: Option<Instant>,
    pub(super) stall_reported: bool,
}

impl OverlayWindowState {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Uncreated,
            geometry: None,
            content_ready: false,
            host: None,
            load_failure: None,
            loading_since: None,
            stall_reported: false,
        }
    }

    /// Reason of the last failed load while still `Loading`.
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }
}

impl Default for OverlayWindowState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OverlayWindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayWindowState")
            .field("lifecycle", &self.lifecycle)
            .field("geometry", &self.geometry)
            .field("content_ready", &self.content_ready)
            .field("has_host", &self.host.is_some())
            .field("load_failure", &self.load_failure)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_uncreated() {
        let state = OverlayWindowState::new();
        assert_eq!(state.lifecycle, Lifecycle::Uncreated);
        assert!(!state.has_host());
        assert!(!state.content_ready);
    }

    #[test]
    fn show_policy_parses_lowercase() {
        let p: ShowPolicy = serde_json::from_str(r#""exclusive""#).unwrap();
        assert_eq!(p, ShowPolicy::Exclusive);
        assert_eq!(ShowPolicy::default(), ShowPolicy::Independent);
    }
}
