//! Load/save of the hotkey table through the persistence store.
//!
//! Document stored under `hotkeys`:
//!
//! ```json
//! {
//!   "overlays": { "grok": {"flags": 524288, "key": 49}, "claude": null },
//!   "unified_menu": {"flags": 655360, "key": 49}
//! }
//! ```
//!
//! An explicit `null` keeps an overlay unbound. Overlays missing from the
//! document get their descriptor's default shortcut.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use super::table::HotkeyTable;
use crate::error::Result;
use crate::model::{Shortcut, LAUNCH_MENU_ID, STORE_KEY_HOTKEYS};
use crate::registry::OverlayRegistry;
use crate::storage::PersistenceStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct HotkeyDocument {
    #[serde(default)]
    overlays: BTreeMap<String, Option<Shortcut>>,
    // None = absent, Some(None) = explicitly unbound
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    unified_menu: Option<Option<Shortcut>>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Option<Shortcut>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Shortcut>::deserialize(deserializer).map(Some)
}

/// Build the table from the stored document, falling back to defaults.
///
/// Never fails: unknown ids, invalid shortcuts and conflicting entries are
/// dropped with a warning.
pub fn load_table(store: &dyn PersistenceStore, registry: &dyn OverlayRegistry) -> HotkeyTable {
    let document = match store.get(STORE_KEY_HOTKEYS) {
        None => {
            info!("No saved hotkeys; using defaults");
            HotkeyDocument::default()
        }
        Some(bytes) => match serde_json::from_slice::<HotkeyDocument>(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Saved hotkeys are unreadable ({}); using defaults", e);
                HotkeyDocument::default()
            }
        },
    };

    let mut table = HotkeyTable::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (id, entry) in &document.overlays {
        if registry.get(id).is_none() {
            warn!("Dropping hotkey for unknown overlay '{}'", id);
            continue;
        }
        seen.insert(id.clone());
        if let Some(shortcut) = entry {
            bind(&mut table, id, *shortcut);
        }
    }

    match document.unified_menu {
        Some(Some(shortcut)) => bind(&mut table, LAUNCH_MENU_ID, shortcut),
        Some(None) => debug!("Launch menu shortcut explicitly unbound"),
        None => bind(&mut table, LAUNCH_MENU_ID, Shortcut::launch_menu_default()),
    }

    for descriptor in registry.list() {
        if seen.contains(&descriptor.id) {
            continue;
        }
        if let Some(shortcut) = descriptor.default_shortcut {
            bind(&mut table, &descriptor.id, shortcut);
        }
    }

    info!("Loaded {} hotkey bindings", table.len());
    table
}

fn bind(table: &mut HotkeyTable, id: &str, shortcut: Shortcut) {
    if let Err(e) = table.insert(id, shortcut) {
        warn!("Dropping hotkey {} for '{}': {}", shortcut, id, e);
    }
}

/// Write every registry overlay (bound or not) plus the launch menu entry.
pub fn save_table(
    table: &HotkeyTable,
    store: &dyn PersistenceStore,
    registry: &dyn OverlayRegistry,
) -> Result<()> {
    let mut document = HotkeyDocument::default();
    for id in registry.ids() {
        let shortcut = table.shortcut_for(&id);
        document.overlays.insert(id, shortcut);
    }
    for binding in table.bindings() {
        if binding.overlay_id != LAUNCH_MENU_ID {
            document
                .overlays
                .insert(binding.overlay_id, Some(binding.shortcut));
        }
    }
    document.unified_menu = Some(table.shortcut_for(LAUNCH_MENU_ID));

    let bytes = serde_json::to_vec_pretty(&document)?;
    store.set(STORE_KEY_HOTKEYS, &bytes)?;
    debug!("Saved {} hotkey bindings", table.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OverlayDescriptor, KC_SPACE, MOD_COMMAND, MOD_CONTROL, MOD_OPTION};
    use crate::registry::Registry;
    use crate::storage::MemoryStore;
    use std::path::PathBuf;

    fn overlay(id: &str, default: Option<Shortcut>) -> OverlayDescriptor {
        OverlayDescriptor {
            id: id.into(),
            name: id.into(),
            url: format!("https://{id}.example"),
            icon_path: PathBuf::from("icon.png"),
            default_shortcut: default,
            description: String::new(),
        }
    }

    fn registry() -> Registry {
        [
            overlay("alpha", Some(Shortcut::new(MOD_OPTION, KC_SPACE))),
            overlay("beta", Some(Shortcut::new(MOD_CONTROL | MOD_OPTION, KC_SPACE))),
            overlay("gamma", None),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_empty_store_uses_defaults() {
        let table = load_table(&MemoryStore::new(), &registry());
        assert_eq!(table.lookup(MOD_OPTION, KC_SPACE), Some("alpha"));
        assert_eq!(table.shortcut_for("gamma"), None);
        assert_eq!(
            table.shortcut_for(LAUNCH_MENU_ID),
            Some(Shortcut::launch_menu_default())
        );
    }

    #[test]
    fn test_unknown_ids_dropped() {
        let store = MemoryStore::new();
        store
            .set(
                STORE_KEY_HOTKEYS,
                br#"{"overlays":{"ghost":{"flags":1048576,"key":49},"gamma":{"flags":1048576,"key":0}}}"#,
            )
            .unwrap();
        let table = load_table(&store, &registry());
        assert_eq!(table.shortcut_for("ghost"), None);
        assert_eq!(table.shortcut_for("gamma"), Some(Shortcut::new(MOD_COMMAND, 0)));
    }

    #[test]
    fn test_explicit_null_stays_unbound() {
        let store = MemoryStore::new();
        store
            .set(STORE_KEY_HOTKEYS, br#"{"overlays":{"alpha":null},"unified_menu":null}"#)
            .unwrap();
        let table = load_table(&store, &registry());
        assert_eq!(table.shortcut_for("alpha"), None);
        assert_eq!(table.shortcut_for(LAUNCH_MENU_ID), None);
        // beta was absent, so it still gets its default
        assert!(table.shortcut_for("beta").is_some());
    }

    #[test]
    fn test_stored_conflict_is_dropped() {
        let store = MemoryStore::new();
        // gamma takes alpha's default; alpha is absent so its default conflicts
        store
            .set(
                STORE_KEY_HOTKEYS,
                br#"{"overlays":{"gamma":{"flags":524288,"key":49}}}"#,
            )
            .unwrap();
        let table = load_table(&store, &registry());
        assert_eq!(table.lookup(MOD_OPTION, KC_SPACE), Some("gamma"));
        assert_eq!(table.shortcut_for("alpha"), None);
    }

    #[test]
    fn test_corrupt_document_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.set(STORE_KEY_HOTKEYS, b"{not json").unwrap();
        let table = load_table(&store, &registry());
        assert_eq!(table.lookup(MOD_OPTION, KC_SPACE), Some("alpha"));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let reg = registry();
        let store = MemoryStore::new();
        let mut table = HotkeyTable::new();
        table.insert("gamma", Shortcut::new(MOD_COMMAND, KC_SPACE)).unwrap();
        table.insert("beta", Shortcut::new(MOD_OPTION, KC_SPACE)).unwrap();

        save_table(&table, &store, &reg).unwrap();
        let loaded = load_table(&store, &reg);

        assert_eq!(loaded.bindings(), table.bindings());
    }
}
