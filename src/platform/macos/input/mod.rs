//! Input handling: the global event tap and system observers.

pub mod event_tap;
pub mod observers;

pub use event_tap::{MacEventTap, MacPermissionGate};
pub use observers::{install_termination_observer, install_wakeup_space_observers};
