//! Global shortcut bindings.
//!
//! - [`table`]: the immutable [`HotkeyTable`] and its swap-on-write
//!   [`SharedHotkeyTable`] handle
//! - [`persist`]: load/save through the persistence store

pub mod persist;
pub mod table;

pub use persist::{load_table, save_table};
pub use table::{HotkeyTable, SharedHotkeyTable};
