//! Configuration constants and default values.
//!
//! This module contains all application constants including modifier
//! flags, key codes, persistence keys and timing defaults.

// === Application ===

/// Display name used in the menu bar and logs.
pub const APP_NAME: &str = "Multi-Overlay";

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "multi-overlay";

// === Modifier Flags ===
//
// Values match the CGEventFlags bit layout so masks read from the event tap
// can be compared directly after normalisation.

/// Shift key flag.
pub const MOD_SHIFT: u64 = 0x0002_0000;

/// Control key flag.
pub const MOD_CONTROL: u64 = 0x0004_0000;

/// Option (Alt) key flag.
pub const MOD_OPTION: u64 = 0x0008_0000;

/// Command key flag.
pub const MOD_COMMAND: u64 = 0x0010_0000;

/// All modifier bits that take part in shortcut matching.
pub const MODIFIER_MASK: u64 = MOD_SHIFT | MOD_CONTROL | MOD_OPTION | MOD_COMMAND;

// === Key Codes (ANSI virtual key codes) ===

/// Space bar.
pub const KC_SPACE: u16 = 49;

/// Return key.
pub const KC_RETURN: u16 = 36;

/// Escape key (cancels shortcut capture).
pub const KC_ESCAPE: u16 = 53;

/// Highest virtual key code accepted in a binding.
pub const MAX_KEY_CODE: u16 = 127;

/// Function keys F1..F20; these may be bound without modifiers.
pub const FUNCTION_KEY_CODES: [u16; 20] = [
    122, 120, 99, 118, 96, 97, 98, 100, 101, 109, 103, 111, 105, 107, 113, 106, 64, 79, 80, 90,
];

// === Launch Menu ===

/// Reserved pseudo overlay id under which the launch menu shortcut is stored.
pub const LAUNCH_MENU_ID: &str = "unified_menu";

/// Default launch menu shortcut: Option + Shift.
pub const DEFAULT_MENU_MODIFIERS: u64 = MOD_OPTION | MOD_SHIFT;

/// Default launch menu key: Space.
pub const DEFAULT_MENU_KEY: u16 = KC_SPACE;

// === Persistence Keys ===

/// Store key of the hotkey document.
pub const STORE_KEY_HOTKEYS: &str = "hotkeys";

/// Prefix of per-overlay geometry keys (`frame.<overlay_id>`).
pub const STORE_KEY_FRAME_PREFIX: &str = "frame.";

/// Store key for an overlay's saved window frame.
pub fn frame_key(overlay_id: &str) -> String {
    format!("{STORE_KEY_FRAME_PREFIX}{overlay_id}")
}

// === Window Defaults ===

/// Size of a freshly created overlay window (width, height).
pub const DEFAULT_WINDOW_SIZE: (f64, f64) = (800.0, 600.0);

/// Height of the drag strip at the top of an overlay window.
pub const DRAG_AREA_HEIGHT: f64 = 30.0;

/// Corner radius of overlay windows.
pub const CORNER_RADIUS: f64 = 15.0;

// === Timing Defaults (milliseconds) ===

/// Main-loop drain interval (~60 fps).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// How often the listener verifies its hook is still enabled.
pub const DEFAULT_LIVENESS_INTERVAL_MS: u64 = 2_000;

/// First reinstall delay after the OS disables the hook.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 250;

/// Ceiling for reinstall delays.
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Reinstall attempts before the listener degrades to a user-visible state.
pub const DEFAULT_RETRY_BUDGET: u32 = 8;

/// Healthy time after which the backoff counter resets.
pub const DEFAULT_STABLE_RESET_MS: u64 = 30_000;

/// Loading time after which a stuck overlay is reported.
pub const DEFAULT_LOAD_STALL_WARN_MS: u64 = 20_000;
