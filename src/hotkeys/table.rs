//! Shortcut → overlay id table.
//!
//! [`HotkeyTable`] is an immutable value. [`SharedHotkeyTable`] publishes it
//! to the event-tap callback by swapping an `Arc`: writers clone the current
//! table, mutate the copy and swap it in, so a lookup always sees either the
//! old table or the new one, never a half-applied change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::{OverlayError, Result};
use crate::model::{Shortcut, ShortcutBinding};

/// One consistent set of bindings. At most one binding per shortcut and at
/// most one shortcut per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyTable {
    by_shortcut: HashMap<Shortcut, String>,
    by_id: HashMap<String, Shortcut>,
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on the normalised modifier mask and key code.
    ///
    /// Extra modifiers never match a binding that requires fewer.
    pub fn lookup(&self, modifiers: u64, key_code: u16) -> Option<&str> {
        self.by_shortcut
            .get(&Shortcut::from_event(modifiers, key_code))
            .map(String::as_str)
    }

    pub fn shortcut_for(&self, id: &str) -> Option<Shortcut> {
        self.by_id.get(id).copied()
    }

    pub fn owner_of(&self, shortcut: &Shortcut) -> Option<&str> {
        self.by_shortcut.get(shortcut).map(String::as_str)
    }

    /// All bindings, sorted by id.
    pub fn bindings(&self) -> Vec<ShortcutBinding> {
        let mut out: Vec<_> = self
            .by_id
            .iter()
            .map(|(id, s)| ShortcutBinding::new(id.clone(), *s))
            .collect();
        out.sort_by(|a, b| a.overlay_id.cmp(&b.overlay_id));
        out
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Bind `shortcut` to `id`, replacing the id's previous binding.
    ///
    /// Fails with `Conflict` if another id owns the exact shortcut; the
    /// table is left untouched in that case.
    pub fn insert(&mut self, id: &str, shortcut: Shortcut) -> Result<()> {
        shortcut.validate()?;
        match self.by_shortcut.get(&shortcut) {
            Some(owner) if owner == id => return Ok(()),
            Some(owner) => {
                return Err(OverlayError::Conflict {
                    shortcut,
                    existing: owner.clone(),
                })
            }
            None => {}
        }
        self.remove(id);
        self.by_shortcut.insert(shortcut, id.to_string());
        self.by_id.insert(id.to_string(), shortcut);
        Ok(())
    }

    /// Drop the binding for `id`, returning it if there was one.
    pub fn remove(&mut self, id: &str) -> Option<Shortcut> {
        let previous = self.by_id.remove(id)?;
        self.by_shortcut.remove(&previous);
        Some(previous)
    }
}

/// Thread-safe handle shared by the event-tap callback (reader) and the
/// main loop (writer).
#[derive(Debug, Default)]
pub struct SharedHotkeyTable {
    current: RwLock<Arc<HotkeyTable>>,
    // Serialises read-modify-swap so concurrent writers cannot lose updates
    writer: Mutex<()>,
}

impl SharedHotkeyTable {
    pub fn new(table: HotkeyTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
            writer: Mutex::new(()),
        }
    }

    /// The table as of now. Holding the `Arc` keeps that version alive.
    pub fn snapshot(&self) -> Arc<HotkeyTable> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Hot-path lookup used by the listener. The read lock is held only
    /// long enough to clone the `Arc`.
    pub fn match_shortcut(&self, modifiers: u64, key_code: u16) -> Option<String> {
        self.snapshot().lookup(modifiers, key_code).map(str::to_owned)
    }

    pub fn shortcut_for(&self, id: &str) -> Option<Shortcut> {
        self.snapshot().shortcut_for(id)
    }

    pub fn register(&self, id: &str, shortcut: Shortcut) -> Result<()> {
        self.update(|table| table.insert(id, shortcut))
    }

    /// Remove `id`'s binding. No-op if it has none.
    pub fn unregister(&self, id: &str) -> Option<Shortcut> {
        let mut removed = None;
        // The closure is infallible
        let _ = self.update(|table| {
            removed = table.remove(id);
            Ok(())
        });
        removed
    }

    /// Swap in a whole new table (used by `load`).
    pub fn replace(&self, table: HotkeyTable) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap(Arc::new(table));
    }

    fn update(&self, f: impl FnOnce(&mut HotkeyTable) -> Result<()>) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (*self.snapshot()).clone();
        f(&mut next)?;
        self.swap(Arc::new(next));
        Ok(())
    }

    fn swap(&self, next: Arc<HotkeyTable>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KC_SPACE, MOD_OPTION, MOD_SHIFT};

    const OPT_SPACE: Shortcut = Shortcut::new(MOD_OPTION, KC_SPACE);

    #[test]
    fn test_register_and_match() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();
        assert_eq!(table.match_shortcut(MOD_OPTION, KC_SPACE).as_deref(), Some("alpha"));
    }

    #[test]
    fn test_superset_modifiers_do_not_match() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();
        assert_eq!(table.match_shortcut(MOD_OPTION | MOD_SHIFT, KC_SPACE), None);
    }

    #[test]
    fn test_device_bits_are_ignored_when_matching() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();
        // left-option device bit plus caps lock
        assert_eq!(
            table.match_shortcut(MOD_OPTION | 0x20 | 0x1_0000, KC_SPACE).as_deref(),
            Some("alpha")
        );
    }

    #[test]
    fn test_conflict_leaves_existing_binding() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();

        let err = table.register("beta", OPT_SPACE).unwrap_err();
        assert!(matches!(err, OverlayError::Conflict { ref existing, .. } if existing == "alpha"));
        assert_eq!(table.snapshot().len(), 1);
        assert_eq!(table.shortcut_for("beta"), None);
    }

    #[test]
    fn test_reregister_replaces_previous_binding() {
        let table = SharedHotkeyTable::default();
        let other = Shortcut::new(MOD_OPTION | MOD_SHIFT, KC_SPACE);
        table.register("alpha", OPT_SPACE).unwrap();
        table.register("alpha", other).unwrap();

        assert_eq!(table.match_shortcut(MOD_OPTION, KC_SPACE), None);
        assert_eq!(table.shortcut_for("alpha"), Some(other));
    }

    #[test]
    fn test_register_same_binding_twice_is_noop() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();
        table.register("alpha", OPT_SPACE).unwrap();
        assert_eq!(table.snapshot().len(), 1);
    }

    #[test]
    fn test_invalid_shortcut_rejected() {
        let table = SharedHotkeyTable::default();
        assert!(matches!(
            table.register("alpha", Shortcut::new(0, KC_SPACE)),
            Err(OverlayError::InvalidShortcut { .. })
        ));
        assert!(table.snapshot().is_empty());
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let table = SharedHotkeyTable::default();
        assert_eq!(table.unregister("ghost"), None);
        table.register("alpha", OPT_SPACE).unwrap();
        assert_eq!(table.unregister("alpha"), Some(OPT_SPACE));
        assert_eq!(table.match_shortcut(MOD_OPTION, KC_SPACE), None);
    }

    #[test]
    fn test_old_snapshot_unchanged_after_swap() {
        let table = SharedHotkeyTable::default();
        table.register("alpha", OPT_SPACE).unwrap();
        let before = table.snapshot();
        table.unregister("alpha");
        assert_eq!(before.lookup(MOD_OPTION, KC_SPACE), Some("alpha"));
        assert!(table.snapshot().is_empty());
    }

    #[test]
    fn test_bindings_sorted_by_id() {
        let mut table = HotkeyTable::new();
        table.insert("zeta", OPT_SPACE).unwrap();
        table.insert("alpha", Shortcut::new(MOD_SHIFT | MOD_OPTION, KC_SPACE)).unwrap();
        let ids: Vec<_> = table.bindings().into_iter().map(|b| b.overlay_id).collect();
        assert_eq!(ids, ["alpha", "zeta"]);
    }

    #[test]
    fn test_concurrent_readers_see_whole_tables() {
        let table = Arc::new(SharedHotkeyTable::default());
        let reader = {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    let snap = table.snapshot();
                    // both ids move together, so a snapshot has 0 or 2 entries
                    assert!(snap.len() == 0 || snap.len() == 2);
                }
            })
        };
        for _ in 0..200 {
            let mut next = HotkeyTable::new();
            next.insert("a", OPT_SPACE).unwrap();
            next.insert("b", Shortcut::new(MOD_SHIFT | MOD_OPTION, KC_SPACE)).unwrap();
            table.replace(next);
            table.replace(HotkeyTable::new());
        }
        reader.join().unwrap();
    }
}
