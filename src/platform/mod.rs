//! Platform front ends. The core crate is platform-neutral; only macOS has
//! a native implementation of its host, tap and menu traits.

#[cfg(target_os = "macos")]
pub mod macos;
