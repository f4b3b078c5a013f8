//! Thin helpers over `objc2` for raw `msg_send!` code.
//!
//! The AppKit glue works with untyped `id` pointers and runtime-registered
//! classes, the same way throughout `platform::macos`.

#![allow(non_upper_case_globals)]

use std::ffi::{CStr, CString};

use objc2::encode::{Encode, Encoding, RefEncode};
use objc2::rc::Retained;
use objc2::runtime::AnyClass;

use crate::model::Frame;

pub use objc2::runtime::{AnyObject, Bool, ClassBuilder, Sel};
pub use objc2::{msg_send, sel, ClassType};
pub use objc2_foundation::{NSPoint, NSRect, NSSize, NSString};

/// Objective-C object pointer.
pub type id = *mut AnyObject;

pub const nil: id = std::ptr::null_mut();

/// Objective-C `BOOL` values.
pub const YES: Bool = Bool::YES;
pub const NO: Bool = Bool::NO;

/// Opaque `CGColor`, so `CGColorRef` arguments carry the right encoding.
#[repr(C)]
pub struct CGColor {
    _private: [u8; 0],
}

unsafe impl RefEncode for CGColor {
    const ENCODING_REF: Encoding = Encoding::Pointer(&Encoding::Struct("CGColor", &[]));
}

/// Get the shared NSApplication instance.
#[inline]
#[allow(non_snake_case)]
pub fn NSApp() -> id {
    unsafe { msg_send![objc2_app_kit::NSApplication::class(), sharedApplication] }
}

/// Create an NSString from a Rust string slice.
#[inline]
pub fn nsstring(s: &str) -> Retained<NSString> {
    NSString::from_str(s)
}

/// Copy an NSString (or nil) into a Rust `String`.
///
/// # Safety
/// `obj` must be nil or a valid NSString.
pub unsafe fn string_from_ns(obj: id) -> Option<String> {
    if obj.is_null() {
        return None;
    }
    let utf8: *const std::ffi::c_char = msg_send![obj, UTF8String];
    if utf8.is_null() {
        return None;
    }
    Some(CStr::from_ptr(utf8).to_string_lossy().into_owned())
}

/// Look up an Objective-C class registered with the runtime.
#[inline]
pub fn find_class(name: &CStr) -> Option<&'static AnyClass> {
    AnyClass::get(name)
}

/// Get a system class by name.
///
/// Panics only if AppKit/Foundation are not linked, which is a build error
/// rather than a runtime condition.
#[inline]
pub fn get_class(name: &str) -> &'static AnyClass {
    let c_name = CString::new(name).unwrap_or_default();
    AnyClass::get(&c_name).unwrap_or_else(|| panic!("Class '{}' not found", name))
}

pub fn rect_from_frame(frame: Frame) -> NSRect {
    NSRect::new(
        NSPoint::new(frame.x, frame.y),
        NSSize::new(frame.width, frame.height),
    )
}

pub fn frame_from_rect(rect: NSRect) -> Frame {
    Frame::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height)
}

/// Extension trait for accessing instance variables on AnyObject.
pub trait ObjectExt {
    /// # Safety
    /// The ivar must exist and be of type T. Main thread only for UI objects.
    unsafe fn load_ivar<T: Encode>(&self, name: &CStr) -> &T;

    /// # Safety
    /// The ivar must exist and be of type T. Main thread only for UI objects.
    unsafe fn store_ivar<T: Encode>(&mut self, name: &CStr, value: T);
}

impl ObjectExt for AnyObject {
    unsafe fn load_ivar<T: Encode>(&self, name: &CStr) -> &T {
        let ivar = self
            .class()
            .instance_variable(name)
            .unwrap_or_else(|| panic!("ivar {:?} not found", name));
        ivar.load::<T>(self)
    }

    unsafe fn store_ivar<T: Encode>(&mut self, name: &CStr, value: T) {
        let ivar = self
            .class()
            .instance_variable(name)
            .unwrap_or_else(|| panic!("ivar {:?} not found", name));
        *ivar.load_mut::<T>(self) = value;
    }
}

/// Run a closure within an autorelease pool.
#[inline]
pub fn autoreleasepool<R, F: FnOnce() -> R>(f: F) -> R {
    objc2::rc::autoreleasepool(|_| f())
}
