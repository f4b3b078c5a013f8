//! Built-in overlay destinations.

use std::path::Path;

use crate::model::{OverlayDescriptor, Shortcut, KC_SPACE, MOD_COMMAND, MOD_CONTROL, MOD_OPTION, MOD_SHIFT};

fn builtin(
    icon_dir: &Path,
    id: &str,
    name: &str,
    url: &str,
    modifiers: u64,
    description: &str,
) -> OverlayDescriptor {
    OverlayDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        icon_path: icon_dir.join(format!("{id}_logo.png")),
        default_shortcut: Some(Shortcut::new(modifiers, KC_SPACE)),
        description: description.to_string(),
    }
}

/// The overlays shipped with the app, in menu order. Logos are looked up
/// as `<icon_dir>/<id>_logo.png`.
///
/// Default shortcuts never collide with each other or with the launch menu
/// default (Option + Shift + Space).
pub fn builtin_overlays(icon_dir: &Path) -> Vec<OverlayDescriptor> {
    vec![
        builtin(
            icon_dir,
            "grok",
            "Grok",
            "https://grok.com?referrer=macos-multi-overlay",
            MOD_OPTION,
            "Grok AI assistant by xAI",
        ),
        builtin(
            icon_dir,
            "gemini",
            "Gemini",
            "https://gemini.google.com",
            MOD_OPTION | MOD_CONTROL,
            "Gemini AI assistant by Google",
        ),
        builtin(
            icon_dir,
            "claude",
            "Claude",
            "https://claude.ai",
            MOD_OPTION | MOD_COMMAND,
            "Claude AI assistant by Anthropic",
        ),
        builtin(
            icon_dir,
            "chatgpt",
            "ChatGPT",
            "https://chat.openai.com",
            MOD_OPTION | MOD_CONTROL | MOD_SHIFT,
            "ChatGPT AI assistant by OpenAI",
        ),
    ]
}
