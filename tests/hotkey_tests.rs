//! Hotkey table over the real registry and the on-disk store.

use std::fs;

use multi_overlay::error::OverlayError;
use multi_overlay::hotkeys::{load_table, save_table, SharedHotkeyTable};
use multi_overlay::model::{
    Shortcut, KC_SPACE, LAUNCH_MENU_ID, MOD_COMMAND, MOD_CONTROL, MOD_OPTION, MOD_SHIFT,
};
use multi_overlay::registry::{OverlayRegistry, Registry};
use multi_overlay::storage::JsonFileStore;

fn builtin_registry() -> Registry {
    Registry::discover(
        std::path::Path::new("/nonexistent/images"),
        std::path::Path::new("/nonexistent/overlays"),
    )
}

#[test]
fn builtin_defaults_load_without_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let registry = builtin_registry();

    let table = load_table(&store, &registry);

    // every builtin plus the launch menu
    assert_eq!(table.len(), registry.len() + 1);
    assert_eq!(table.lookup(MOD_OPTION, KC_SPACE), Some("grok"));
    assert_eq!(
        table.shortcut_for(LAUNCH_MENU_ID),
        Some(Shortcut::launch_menu_default())
    );
}

#[test]
fn distinct_ids_cannot_share_a_shortcut() {
    let table = SharedHotkeyTable::new(load_table(
        &JsonFileStore::new(tempfile::tempdir().unwrap().path()),
        &builtin_registry(),
    ));
    let grok = table.shortcut_for("grok").unwrap();

    let err = table.register("claude", grok).unwrap_err();
    assert!(matches!(err, OverlayError::Conflict { ref existing, .. } if existing == "grok"));
    assert_eq!(table.match_shortcut(grok.modifiers, grok.key_code).as_deref(), Some("grok"));
}

#[test]
fn superset_of_modifiers_does_not_match() {
    let table = SharedHotkeyTable::new(load_table(
        &JsonFileStore::new(tempfile::tempdir().unwrap().path()),
        &builtin_registry(),
    ));
    // grok is Option+Space; Option+Control+Shift+Command+Space is nobody's
    let all = MOD_OPTION | MOD_CONTROL | MOD_SHIFT | MOD_COMMAND;
    assert_eq!(table.match_shortcut(all, KC_SPACE), None);
}

#[test]
fn rebinding_and_clearing_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let registry = builtin_registry();
    let rebound = Shortcut::new(MOD_CONTROL | MOD_SHIFT, 0);

    {
        let store = JsonFileStore::new(dir.path());
        let table = SharedHotkeyTable::new(load_table(&store, &registry));
        table.register("gemini", rebound).unwrap();
        table.unregister("claude");
        save_table(&table.snapshot(), &store, &registry).unwrap();
    }

    let store = JsonFileStore::new(dir.path());
    let table = load_table(&store, &registry);
    assert_eq!(table.shortcut_for("gemini"), Some(rebound));
    // explicitly unbound, not reset to its default
    assert_eq!(table.shortcut_for("claude"), None);
    assert_eq!(table.lookup(MOD_OPTION, KC_SPACE), Some("grok"));
}

#[test]
fn custom_overlay_default_shortcut_is_bound() {
    let config = tempfile::tempdir().unwrap();
    fs::write(
        config.path().join("notes.json"),
        r#"{
            "id": "notes",
            "name": "Notes",
            "url": "https://notes.example.com",
            "iconPath": "notes.png",
            "defaultHotkey": {"flags": 262144, "key": 45}
        }"#,
    )
    .unwrap();
    let registry = Registry::discover(std::path::Path::new("/nonexistent/images"), config.path());
    assert!(registry.get("notes").is_some());

    let state = tempfile::tempdir().unwrap();
    let table = load_table(&JsonFileStore::new(state.path()), &registry);
    assert_eq!(table.lookup(MOD_CONTROL, 45), Some("notes"));
}

#[test]
fn saved_document_uses_flags_and_key_fields() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let registry = builtin_registry();
    let table = load_table(&store, &registry);
    save_table(&table, &store, &registry).unwrap();

    let text = fs::read_to_string(store.path_for("hotkeys")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["overlays"]["grok"]["flags"], 524288);
    assert_eq!(doc["overlays"]["grok"]["key"], 49);
    assert!(doc["unified_menu"].is_object());
}
