//! macOS front end using AppKit and CoreGraphics via objc2.
//!
//! - `ffi`: raw CoreFoundation/CGEventTap/accessibility bindings and objc2 helpers
//! - `input`: the event tap behind [`crate::listener::EventTap`] plus system observers
//! - `ui`: overlay windows, the launch menu and the status bar item
//! - `app`: timer-driven main loop glue

pub mod app;
pub mod ffi;
pub mod input;
pub mod ui;

pub use ffi::bridge;
