//! Collaborators the controller drives: the per-overlay content host and the
//! status UI.

use crate::error::Result;
use crate::events::EventPublisher;
use crate::hotkeys::HotkeyTable;
use crate::listener::ListenerState;
use crate::model::{Frame, OverlayDescriptor};

use super::Lifecycle;

/// One overlay's content surface (a window with a web view on macOS).
///
/// Hosts report `ContentReady` / `ContentLoadFailed` through the publisher
/// they were created with; they never call back into the controller.
pub trait ContentHost {
    /// Start loading `url`. An `Err` means the request could not even be
    /// issued and is handled like a load failure.
    fn navigate(&mut self, url: &str) -> Result<()>;
    /// Bring the window on screen without taking keyboard focus.
    fn show(&mut self);
    fn hide(&mut self);
    /// Keep the window above other applications' windows.
    fn set_pinned(&mut self, pinned: bool);
    fn set_frame(&mut self, frame: Frame);
    /// Current on-screen frame, including user moves and resizes.
    fn frame(&self) -> Option<Frame>;
    fn destroy(&mut self);
}

/// Allocates content hosts.
pub trait ContentHostFactory {
    /// Create the host for `overlay`. Failure here is unrecoverable.
    fn create(
        &mut self,
        overlay: &OverlayDescriptor,
        events: EventPublisher,
    ) -> Result<Box<dyn ContentHost>>;

    /// Remove website data (cookies, caches, local storage) shared by every
    /// host this factory creates.
    fn clear_website_data(&mut self) -> Result<()>;
}

/// Receives state changes for checkmarks and labels. Implementations must
/// not call back into the core.
pub trait StatusSink {
    fn lifecycle_changed(&self, id: &str, lifecycle: Lifecycle);

    fn listener_changed(&self, _state: ListenerState) {}

    fn bindings_changed(&self, _table: &HotkeyTable) {}
}

/// Sink that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn lifecycle_changed(&self, _id: &str, _lifecycle: Lifecycle) {}
}
