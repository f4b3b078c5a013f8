//! Application domain model.
//!
//! This module contains pure data types (no FFI dependencies):
//! shortcuts, overlay descriptors, window geometry and constants.

pub mod constants;
pub mod descriptor;
pub mod geometry;
pub mod keys;
pub mod shortcut;

pub use constants::*;
pub use descriptor::OverlayDescriptor;
pub use geometry::Frame;
pub use shortcut::{Shortcut, ShortcutBinding};
