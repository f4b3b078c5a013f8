//! AppKit UI: overlay windows, the launch menu and the status bar item.

pub mod content_host;
pub mod launch_menu;
pub mod status_bar;

pub use content_host::{WebHostFactory, WebOverlayHost};
pub use launch_menu::CursorMenuPresenter;
pub use status_bar::StatusBar;
