#![allow(unexpected_cfgs)] // Silence cfg warnings from objc macros

//! Menu-bar overlay manager.
//!
//! The core (hotkey table, listener supervision, overlay lifecycle, launch
//! menu, dispatcher) is platform-neutral and talks to the OS only through
//! the traits in [`listener`], [`controller`] and [`menu`], so it runs under
//! plain integration tests. [`platform`] holds the macOS implementations.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod handlers;
pub mod hotkeys;
pub mod listener;
pub mod logging;
pub mod menu;
pub mod model;
pub mod registry;
pub mod storage;

#[cfg(target_os = "macos")]
pub mod platform;

pub use error::{OverlayError, Result};
pub use events::{AppEvent, EventBus, EventPublisher};
pub use model::{Frame, OverlayDescriptor, Shortcut};
