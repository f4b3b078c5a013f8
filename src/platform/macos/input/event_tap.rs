//! CGEventTap-backed global keyboard hook.
//!
//! The tap is added to the main run loop in common modes, so the callback
//! runs on the main thread between AppKit events (and during menu
//! tracking). It hands each event to [`KeyFilter::handle`] and returns NULL
//! to swallow a matched shortcut.

use std::ffi::c_void;
use std::sync::Arc;

use core_graphics::event::{
    CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType, EventField,
};
use log::{debug, trace};

use crate::error::{OverlayError, Result};
use crate::listener::{Disposition, EventTap, KeyEvent, KeyEventKind, KeyFilter, PermissionGate};
use crate::platform::macos::ffi::core_foundation::*;
use crate::platform::macos::ffi::is_process_trusted;

fn mask_bit(event_type: CGEventType) -> u64 {
    1u64 << (event_type as u64)
}

fn kind_of(event_type: u32) -> KeyEventKind {
    match event_type {
        t if t == CGEventType::KeyDown as u32 => KeyEventKind::KeyDown,
        t if t == CGEventType::FlagsChanged as u32 => KeyEventKind::FlagsChanged,
        t if t == CGEventType::TapDisabledByTimeout as u32 => KeyEventKind::TapDisabledByTimeout,
        t if t == CGEventType::TapDisabledByUserInput as u32 => {
            KeyEventKind::TapDisabledByUserInput
        }
        _ => KeyEventKind::Other,
    }
}

unsafe extern "C" fn tap_callback(
    _proxy: CGEventTapProxy,
    event_type: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() {
        return event;
    }
    let filter = &*(user_info as *const KeyFilter);

    let kind = kind_of(event_type);
    let key_event = if event.is_null() || kind != KeyEventKind::KeyDown {
        KeyEvent::of_kind(kind)
    } else {
        let flags = CGEventGetFlags(event);
        let key_code =
            CGEventGetIntegerValueField(event, EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let is_repeat =
            CGEventGetIntegerValueField(event, EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0;
        KeyEvent {
            kind,
            flags,
            key_code,
            is_repeat,
        }
    };

    match filter.handle(&key_event) {
        Disposition::Consume => {
            trace!("Swallowed key {}", key_event.key_code);
            std::ptr::null_mut()
        }
        Disposition::PassThrough => event,
    }
}

/// Session-level, head-inserted, active (not listen-only) event tap.
pub struct MacEventTap {
    port: CFMachPortRef,
    source: CFRunLoopSourceRef,
    // Strong reference handed to the callback as user_info
    filter: *const KeyFilter,
}

impl MacEventTap {
    pub fn new() -> Self {
        Self {
            port: std::ptr::null_mut(),
            source: std::ptr::null_mut(),
            filter: std::ptr::null(),
        }
    }
}

impl Default for MacEventTap {
    fn default() -> Self {
        Self::new()
    }
}

impl EventTap for MacEventTap {
    fn install(&mut self, filter: Arc<KeyFilter>) -> Result<()> {
        self.uninstall();
        unsafe {
            let user_info = Arc::into_raw(filter);
            let mask = mask_bit(CGEventType::KeyDown) | mask_bit(CGEventType::FlagsChanged);
            let port = CGEventTapCreate(
                CGEventTapLocation::Session as u32,
                CGEventTapPlacement::HeadInsertEventTap as u32,
                CGEventTapOptions::Default as u32,
                mask,
                tap_callback,
                user_info as *mut c_void,
            );
            if port.is_null() {
                drop(Arc::from_raw(user_info));
                return Err(OverlayError::ListenerInstall(
                    "CGEventTapCreate returned NULL".into(),
                ));
            }

            let source = CFMachPortCreateRunLoopSource(std::ptr::null(), port, 0);
            if source.is_null() {
                CFMachPortInvalidate(port);
                CFRelease(port as CFTypeRef);
                drop(Arc::from_raw(user_info));
                return Err(OverlayError::ListenerInstall(
                    "could not create run loop source for event tap".into(),
                ));
            }

            CFRunLoopAddSource(CFRunLoopGetMain(), source, kCFRunLoopCommonModes);
            CGEventTapEnable(port, true);

            self.port = port;
            self.source = source;
            self.filter = user_info;
        }
        debug!("CGEventTap installed");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        !self.port.is_null() && unsafe { CGEventTapIsEnabled(self.port) }
    }

    fn uninstall(&mut self) {
        unsafe {
            if !self.port.is_null() {
                CGEventTapEnable(self.port, false);
                if !self.source.is_null() {
                    CFRunLoopRemoveSource(CFRunLoopGetMain(), self.source, kCFRunLoopCommonModes);
                    CFRelease(self.source as CFTypeRef);
                }
                CFMachPortInvalidate(self.port);
                CFRelease(self.port as CFTypeRef);
                debug!("CGEventTap removed");
            }
            // The port is invalidated, so the callback can no longer see the filter
            if !self.filter.is_null() {
                drop(Arc::from_raw(self.filter));
            }
        }
        self.port = std::ptr::null_mut();
        self.source = std::ptr::null_mut();
        self.filter = std::ptr::null();
    }
}

impl Drop for MacEventTap {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// `AXIsProcessTrustedWithOptions`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacPermissionGate;

impl PermissionGate for MacPermissionGate {
    fn is_trusted(&self, prompt: bool) -> bool {
        unsafe { is_process_trusted(prompt) }
    }
}
