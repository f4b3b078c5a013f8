//! FFI bindings for ApplicationServices (Accessibility).
//!
//! The event tap needs the process to be trusted for accessibility.

use std::ffi::c_void;

use super::core_foundation::{
    kCFBooleanFalse, kCFBooleanTrue, kCFTypeDictionaryKeyCallBacks,
    kCFTypeDictionaryValueCallBacks, CFDictionaryCreate, CFRelease,
};

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    pub fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;

    pub static kAXTrustedCheckOptionPrompt: *const c_void;
}

/// Whether the process is trusted. With `prompt`, macOS shows its
/// permission dialog if it is not.
///
/// # Safety
/// Must be called from main thread with valid autorelease pool.
pub unsafe fn is_process_trusted(prompt: bool) -> bool {
    let keys = [kAXTrustedCheckOptionPrompt];
    let values = [if prompt { kCFBooleanTrue } else { kCFBooleanFalse }];

    let dict = CFDictionaryCreate(
        std::ptr::null(), // default allocator
        keys.as_ptr(),
        values.as_ptr(),
        1,
        &kCFTypeDictionaryKeyCallBacks,
        &kCFTypeDictionaryValueCallBacks,
    );

    let trusted = AXIsProcessTrustedWithOptions(dict);

    if !dict.is_null() {
        CFRelease(dict);
    }
    trusted
}
