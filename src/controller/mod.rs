//! Overlay window controller: the only place overlay visibility, pinning and
//! geometry change.
//!
//! ```text
//! UNCREATED ──toggle──► LOADING ──ready──► SHOWN_PINNED
//!                                             ▲   │
//!                                       toggle│   │toggle (persist frame)
//!                                             │   ▼
//!                                            HIDDEN
//! ```
//!
//! All calls come from the main loop via the dispatcher, so toggles for the
//! same overlay are serialised. Toggles while `LOADING` are ignored, which
//! also guarantees one content host per overlay.

pub mod commands;
pub mod host;
pub mod window;

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::error::{OverlayError, Result};
use crate::events::EventPublisher;
use crate::model::{frame_key, Frame, OverlayDescriptor};
use crate::registry::OverlayRegistry;
use crate::storage::PersistenceStore;

pub use commands::{EditAction, WindowCommand};
pub use host::{ContentHost, ContentHostFactory, NullStatus, StatusSink};
pub use window::{Lifecycle, OverlayWindowState, ShowPolicy};

pub struct OverlayController {
    registry: Arc<dyn OverlayRegistry>,
    store: Arc<dyn PersistenceStore>,
    factory: Box<dyn ContentHostFactory>,
    status: Rc<dyn StatusSink>,
    publisher: EventPublisher,
    policy: ShowPolicy,
    stall_warn: Duration,
    windows: HashMap<String, OverlayWindowState>,
}

impl OverlayController {
    pub fn new(
        registry: Arc<dyn OverlayRegistry>,
        store: Arc<dyn PersistenceStore>,
        factory: Box<dyn ContentHostFactory>,
        status: Rc<dyn StatusSink>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            registry,
            store,
            factory,
            status,
            publisher,
            policy: ShowPolicy::default(),
            stall_warn: Duration::from_millis(crate::model::DEFAULT_LOAD_STALL_WARN_MS),
            windows: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: ShowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_stall_warning(mut self, after: Duration) -> Self {
        self.stall_warn = after;
        self
    }

    pub fn policy(&self) -> ShowPolicy {
        self.policy
    }

    /// Current lifecycle; `Uncreated` for overlays never touched.
    pub fn lifecycle(&self, id: &str) -> Lifecycle {
        self.windows
            .get(id)
            .map_or(Lifecycle::Uncreated, |w| w.lifecycle)
    }

    pub fn window(&self, id: &str) -> Option<&OverlayWindowState> {
        self.windows.get(id)
    }

    /// Ids currently on screen, sorted.
    pub fn shown(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .windows
            .iter()
            .filter(|(_, w)| w.lifecycle.is_shown())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Show or hide one overlay. Returns the lifecycle after the call.
    ///
    /// Unknown ids fail with `UnknownOverlayId` (recoverable). Failing to
    /// allocate a content host fails with `HostUnavailable` (fatal).
    pub fn toggle(&mut self, id: &str, now: Instant) -> Result<Lifecycle> {
        let descriptor = self
            .registry
            .get(id)
            .ok_or_else(|| OverlayError::UnknownOverlayId(id.to_string()))?;

        match self.lifecycle(id) {
            Lifecycle::Uncreated => self.create(&descriptor, now),
            Lifecycle::Loading => {
                self.retry_failed_load(&descriptor, now);
                Ok(Lifecycle::Loading)
            }
            Lifecycle::Hidden => {
                self.show(id);
                Ok(Lifecycle::ShownPinned)
            }
            Lifecycle::ShownPinned => {
                self.hide(id);
                Ok(Lifecycle::Hidden)
            }
        }
    }

    /// Send a created overlay back to its home page. Visibility is left
    /// alone; an overlay that was never opened has nothing to reload.
    pub fn reload(&mut self, id: &str, now: Instant) -> Result<Lifecycle> {
        let descriptor = self
            .registry
            .get(id)
            .ok_or_else(|| OverlayError::UnknownOverlayId(id.to_string()))?;
        let lifecycle = self.lifecycle(id);
        if lifecycle == Lifecycle::Uncreated {
            debug!("Reload of '{}' ignored; it was never opened", id);
            return Ok(lifecycle);
        }
        info!("Reloading '{}' from {}", id, descriptor.url);
        self.navigate(&descriptor, now);
        Ok(lifecycle)
    }

    /// Wipe cookies, caches and storage for every overlay. Open pages keep
    /// what they already have in memory until they navigate.
    pub fn clear_web_data(&mut self) -> Result<()> {
        self.factory.clear_website_data()?;
        info!("Web data cleared");
        Ok(())
    }

    /// The host finished loading. The first load goes straight to shown.
    pub fn on_content_ready(&mut self, id: &str) {
        let Some(window) = self.windows.get_mut(id) else {
            debug!("Ready notice for '{}' which has no window", id);
            return;
        };
        window.content_ready = true;
        window.load_failure = None;
        window.loading_since = None;
        if window.lifecycle == Lifecycle::Loading {
            info!("Overlay '{}' loaded", id);
            self.show(id);
        }
    }

    /// The host failed to load. The overlay stays in `Loading`; the next
    /// toggle re-navigates.
    pub fn on_load_failed(&mut self, id: &str, reason: &str) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        let err = OverlayError::ContentLoadFailed {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        if window.lifecycle == Lifecycle::Loading {
            warn!("{}; trigger the overlay again to retry", err);
            window.load_failure = Some(reason.to_string());
        } else {
            // in-page navigation of an already shown overlay
            warn!("{}", err);
        }
    }

    /// Ids stuck in `Loading` longer than the stall threshold, each reported
    /// once per load attempt.
    pub fn report_stalled_loads(&mut self, now: Instant) -> Vec<String> {
        let mut stalled = Vec::new();
        for (id, window) in self.windows.iter_mut() {
            if window.lifecycle != Lifecycle::Loading || window.stall_reported {
                continue;
            }
            let Some(since) = window.loading_since else {
                continue;
            };
            let waited = now.saturating_duration_since(since);
            if waited >= self.stall_warn {
                warn!("Overlay '{}' still loading after {:?}", id, waited);
                window.stall_reported = true;
                stalled.push(id.clone());
            }
        }
        stalled.sort();
        stalled
    }

    /// Persist the geometry of every created overlay.
    pub fn persist_all(&mut self) {
        let ids: Vec<String> = self.windows.keys().cloned().collect();
        for id in ids {
            self.capture_geometry(&id);
            self.persist_geometry(&id);
        }
    }

    /// Persist geometry and destroy every host. Called at exit.
    pub fn shutdown(&mut self) {
        self.persist_all();
        for (id, window) in self.windows.iter_mut() {
            if let Some(mut host) = window.host.take() {
                debug!("Destroying host for '{}'", id);
                host.destroy();
            }
        }
        info!("Overlay controller shut down");
    }

    fn create(&mut self, descriptor: &OverlayDescriptor, now: Instant) -> Result<Lifecycle> {
        let id = descriptor.id.as_str();
        let host = self
            .factory
            .create(descriptor, self.publisher.clone())
            .map_err(|e| {
                error!("Cannot create content host for '{}': {}", id, e);
                match e {
                    OverlayError::HostUnavailable(_) => e,
                    other => OverlayError::HostUnavailable(other.to_string()),
                }
            })?;

        let mut window = OverlayWindowState::new();
        window.host = Some(host);
        window.lifecycle = Lifecycle::Loading;
        window.geometry = self.load_geometry(id);
        self.windows.insert(id.to_string(), window);
        self.status.lifecycle_changed(id, Lifecycle::Loading);
        info!("Loading overlay '{}' from {}", id, descriptor.url);

        self.navigate(descriptor, now);
        Ok(Lifecycle::Loading)
    }

    fn retry_failed_load(&mut self, descriptor: &OverlayDescriptor, now: Instant) {
        let id = descriptor.id.as_str();
        let failed = self
            .windows
            .get(id)
            .is_some_and(|w| w.load_failure.is_some());
        if failed {
            info!("Retrying load of '{}'", id);
            self.navigate(descriptor, now);
        } else {
            debug!("Overlay '{}' is still loading; toggle ignored", id);
        }
    }

    fn navigate(&mut self, descriptor: &OverlayDescriptor, now: Instant) {
        let Some(window) = self.windows.get_mut(&descriptor.id) else {
            return;
        };
        window.load_failure = None;
        window.loading_since = Some(now);
        window.stall_reported = false;
        let Some(host) = window.host.as_mut() else {
            return;
        };
        if let Err(e) = host.navigate(&descriptor.url) {
            warn!("Navigation to {} failed: {}", descriptor.url, e);
            window.load_failure = Some(e.to_string());
        }
    }

    fn show(&mut self, id: &str) {
        if self.policy == ShowPolicy::Exclusive {
            for other in self.shown() {
                if other != id {
                    self.hide(&other);
                }
            }
        }

        let stored = self.load_geometry(id);
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        if window.geometry.is_none() {
            window.geometry = stored;
        }
        if let Some(host) = window.host.as_mut() {
            if let Some(frame) = window.geometry {
                host.set_frame(frame);
            }
            host.set_pinned(true);
            host.show();
        }
        window.lifecycle = Lifecycle::ShownPinned;
        debug!("Overlay '{}' shown", id);
        self.status.lifecycle_changed(id, Lifecycle::ShownPinned);
    }

    fn hide(&mut self, id: &str) {
        self.capture_geometry(id);
        self.persist_geometry(id);
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        if let Some(host) = window.host.as_mut() {
            host.set_pinned(false);
            host.hide();
        }
        window.lifecycle = Lifecycle::Hidden;
        debug!("Overlay '{}' hidden", id);
        self.status.lifecycle_changed(id, Lifecycle::Hidden);
    }

    /// Copy the host's current frame (user moves/resizes) into the state.
    fn capture_geometry(&mut self, id: &str) {
        if let Some(window) = self.windows.get_mut(id) {
            if let Some(frame) = window.host.as_ref().and_then(|h| h.frame()) {
                if frame.is_valid() {
                    window.geometry = Some(frame);
                }
            }
        }
    }

    fn persist_geometry(&self, id: &str) {
        let Some(frame) = self.windows.get(id).and_then(|w| w.geometry) else {
            return;
        };
        let result = frame
            .to_bytes()
            .map_err(OverlayError::from)
            .and_then(|bytes| self.store.set(&frame_key(id), &bytes));
        if let Err(e) = result {
            warn!("Could not save geometry of '{}': {}", id, e);
        }
    }

    fn load_geometry(&self, id: &str) -> Option<Frame> {
        self.store
            .get(&frame_key(id))
            .and_then(|bytes| Frame::from_bytes(&bytes))
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        for window in self.windows.values_mut() {
            if let Some(mut host) = window.host.take() {
                host.destroy();
            }
        }
    }
}
