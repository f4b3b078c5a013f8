//! Event dispatcher for handling application events.
//!
//! The dispatcher receives events from the event bus and executes
//! the corresponding actions. It's called from the main loop timer
//! and processes all pending events in batch.
//!
//! # Architecture
//!
//! ```text
//! EventBus::try_recv() → Dispatcher::dispatch() → controller / table / listener / menu
//! ```
//!
//! The dispatcher owns every core component, so all state mutation happens
//! here on the main loop. Recoverable errors are logged; only fatal ones
//! are returned to the caller.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::controller::{OverlayController, StatusSink};
use crate::error::{OverlayError, Result};
use crate::events::{AppEvent, CaptureTarget, EventBus, EventPublisher};
use crate::hotkeys::{save_table, SharedHotkeyTable};
use crate::listener::{GlobalListener, ListenerState};
use crate::menu::LaunchMenu;
use crate::model::Shortcut;
use crate::registry::OverlayRegistry;
use crate::storage::PersistenceStore;

/// What the main loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Shared collaborators handed to the dispatcher.
pub struct Services {
    pub registry: Arc<dyn OverlayRegistry>,
    pub store: Arc<dyn PersistenceStore>,
    pub table: Arc<SharedHotkeyTable>,
    pub status: Rc<dyn StatusSink>,
}

pub struct Dispatcher {
    bus: EventBus,
    services: Services,
    controller: OverlayController,
    listener: GlobalListener,
    menu: LaunchMenu,
    reported_listener: Option<ListenerState>,
}

impl Dispatcher {
    pub fn new(
        bus: EventBus,
        services: Services,
        controller: OverlayController,
        listener: GlobalListener,
        menu: LaunchMenu,
    ) -> Self {
        Self {
            bus,
            services,
            controller,
            listener,
            menu,
            reported_listener: None,
        }
    }

    pub fn publisher(&self) -> EventPublisher {
        self.bus.publisher()
    }

    pub fn controller(&self) -> &OverlayController {
        &self.controller
    }

    pub fn listener(&self) -> &GlobalListener {
        &self.listener
    }

    pub fn table(&self) -> &Arc<SharedHotkeyTable> {
        &self.services.table
    }

    /// Install the global listener. Missing permission is logged and shown
    /// in the status UI; the app keeps running with the launch menu only.
    pub fn start(&mut self, now: Instant) {
        match self.listener.start(true, now) {
            Ok(()) => {}
            Err(OverlayError::PermissionDenied) => {
                warn!("Grant accessibility access, then use \"Retry Permission\" in the menu bar");
            }
            Err(e) => warn!("Global listener not installed: {}", e),
        }
        self.services.status.bindings_changed(&self.services.table.snapshot());
        self.sync_listener_status();
    }

    /// One main-loop iteration: listener upkeep, every queued event, stall
    /// diagnostics. Returns `Err` only for fatal errors.
    pub fn tick(&mut self, now: Instant) -> Result<Flow> {
        if let Err(e) = self.listener.tick(now) {
            warn!("{}", e);
        }

        // Handlers may enqueue follow-ups (menu pick → toggle); drain until empty
        while let Some(event) = self.bus.try_recv() {
            match self.dispatch(event, now) {
                Ok(Flow::Quit) => {
                    self.shutdown();
                    return Ok(Flow::Quit);
                }
                Ok(Flow::Continue) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("{}", e),
            }
        }

        self.controller.report_stalled_loads(now);
        self.sync_listener_status();
        Ok(Flow::Continue)
    }

    /// Handle a single event.
    pub fn dispatch(&mut self, event: AppEvent, now: Instant) -> Result<Flow> {
        debug!("Dispatching: {}", event.description());
        match event {
            AppEvent::ToggleOverlay(id) => {
                self.controller.toggle(&id, now)?;
            }

            AppEvent::OpenLaunchMenu => {
                self.menu.open();
            }

            AppEvent::ReloadOverlay(id) => {
                self.controller.reload(&id, now)?;
            }

            AppEvent::ClearWebData => self.controller.clear_web_data()?,

            AppEvent::ContentReady(id) => self.controller.on_content_ready(&id),

            AppEvent::ContentLoadFailed { id, reason } => {
                self.controller.on_load_failed(&id, &reason)
            }

            AppEvent::BeginShortcutCapture(target) => self.begin_capture(target)?,

            AppEvent::ShortcutCaptured { target, shortcut } => {
                self.bind(&target, shortcut)?;
            }

            AppEvent::ShortcutCaptureCancelled => info!("Shortcut capture cancelled"),

            AppEvent::ClearShortcut(id) => {
                if self.services.table.unregister(&id).is_some() {
                    info!("Cleared shortcut of '{}'", id);
                    self.save_bindings();
                }
            }

            AppEvent::ListenerDeactivated => {
                // Picks up the callback's deactivation flag
                self.listener.tick(now)?;
            }

            AppEvent::ReinstallListener => self.listener.reinstall(now)?,

            AppEvent::RetryPermission => self.listener.retry(now)?,

            AppEvent::RequestQuit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Persist geometry, destroy hosts and remove the hook.
    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.controller.shutdown();
        self.listener.stop();
    }

    fn begin_capture(&mut self, target: CaptureTarget) -> Result<()> {
        if let CaptureTarget::Overlay(id) = &target {
            if self.services.registry.get(id).is_none() {
                return Err(OverlayError::UnknownOverlayId(id.clone()));
            }
        }
        if !self.listener.is_running() {
            warn!("Global listener is not running; the shortcut cannot be captured");
            return Ok(());
        }
        info!("Press the new shortcut for '{}' (Escape cancels)", target.binding_id());
        self.listener.filter().begin_capture(target);
        Ok(())
    }

    fn bind(&mut self, target: &CaptureTarget, shortcut: Shortcut) -> Result<()> {
        self.services.table.register(target.binding_id(), shortcut)?;
        info!("Bound {} to '{}'", shortcut, target.binding_id());
        self.save_bindings();
        Ok(())
    }

    fn save_bindings(&self) {
        let table = self.services.table.snapshot();
        if let Err(e) = save_table(
            &table,
            self.services.store.as_ref(),
            self.services.registry.as_ref(),
        ) {
            warn!("Could not save hotkeys: {}", e);
        }
        self.services.status.bindings_changed(&table);
    }

    fn sync_listener_status(&mut self) {
        let state = self.listener.state();
        let changed = match (self.reported_listener, state) {
            (Some(ListenerState::Recovering { .. }), ListenerState::Recovering { .. }) => false,
            (Some(previous), current) => previous != current,
            (None, _) => true,
        };
        if changed {
            self.reported_listener = Some(state);
            self.services.status.listener_changed(state);
        }
    }
}
