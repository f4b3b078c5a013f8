//! The work done inside the OS event callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{trace, warn};

use super::{Disposition, KeyEvent, KeyEventKind};
use crate::events::{AppEvent, CaptureTarget, EventPublisher};
use crate::hotkeys::SharedHotkeyTable;
use crate::model::{Shortcut, KC_ESCAPE, LAUNCH_MENU_ID};

/// Matches key-downs against the hotkey table and enqueues the result.
///
/// Runs on the OS callback path: it never blocks on a lock held by the main
/// loop and never touches windows.
#[derive(Debug)]
pub struct KeyFilter {
    table: Arc<SharedHotkeyTable>,
    publisher: EventPublisher,
    capture: Mutex<Option<CaptureTarget>>,
    deactivated: AtomicBool,
    // Shortcut whose key is currently held, so auto-repeat is swallowed quietly
    held: Mutex<Option<Shortcut>>,
}

impl KeyFilter {
    pub fn new(table: Arc<SharedHotkeyTable>, publisher: EventPublisher) -> Self {
        Self {
            table,
            publisher,
            capture: Mutex::new(None),
            deactivated: AtomicBool::new(false),
            held: Mutex::new(None),
        }
    }

    pub fn table(&self) -> &Arc<SharedHotkeyTable> {
        &self.table
    }

    /// Decide the fate of one event.
    pub fn handle(&self, event: &KeyEvent) -> Disposition {
        match event.kind {
            KeyEventKind::TapDisabledByTimeout | KeyEventKind::TapDisabledByUserInput => {
                warn!("Event tap disabled by the system ({:?})", event.kind);
                self.deactivated.store(true, Ordering::SeqCst);
                self.publisher.publish(AppEvent::ListenerDeactivated);
                Disposition::PassThrough
            }
            KeyEventKind::KeyDown => self.handle_key_down(event),
            KeyEventKind::FlagsChanged | KeyEventKind::Other => Disposition::PassThrough,
        }
    }

    fn handle_key_down(&self, event: &KeyEvent) -> Disposition {
        let shortcut = Shortcut::from_event(event.flags, event.key_code);

        if let Some(target) = self.take_capture() {
            if shortcut.modifiers == 0 && shortcut.key_code == KC_ESCAPE {
                self.publisher.publish(AppEvent::ShortcutCaptureCancelled);
            } else {
                self.publisher
                    .publish(AppEvent::ShortcutCaptured { target, shortcut });
            }
            return Disposition::Consume;
        }

        let Some(id) = self.table.match_shortcut(shortcut.modifiers, shortcut.key_code) else {
            return Disposition::PassThrough;
        };

        if event.is_repeat && self.held_is(shortcut) {
            return Disposition::Consume;
        }
        self.set_held(shortcut);

        trace!("Shortcut {} matched '{}'", shortcut, id);
        if id == LAUNCH_MENU_ID {
            self.publisher.publish(AppEvent::OpenLaunchMenu);
        } else {
            self.publisher.publish(AppEvent::ToggleOverlay(id));
        }
        Disposition::Consume
    }

    /// Arm a one-shot capture: the next key-down is reported as
    /// `ShortcutCaptured` instead of being matched.
    pub fn begin_capture(&self, target: CaptureTarget) {
        if let Ok(mut slot) = self.capture.lock() {
            *slot = Some(target);
        }
    }

    pub fn cancel_capture(&self) {
        if let Ok(mut slot) = self.capture.lock() {
            *slot = None;
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Returns true once after the OS disabled the hook.
    pub fn take_deactivated(&self) -> bool {
        self.deactivated.swap(false, Ordering::SeqCst)
    }

    fn take_capture(&self) -> Option<CaptureTarget> {
        // try_lock: the callback must not wait on the main loop
        self.capture.try_lock().ok().and_then(|mut slot| slot.take())
    }

    fn held_is(&self, shortcut: Shortcut) -> bool {
        self.held
            .try_lock()
            .map(|held| *held == Some(shortcut))
            .unwrap_or(false)
    }

    fn set_held(&self, shortcut: Shortcut) {
        if let Ok(mut held) = self.held.try_lock() {
            *held = Some(shortcut);
        }
    }
}
