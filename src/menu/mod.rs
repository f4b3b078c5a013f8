//! Cursor-anchored launch menu.
//!
//! A pick publishes the same `ToggleOverlay` event a hotkey would, so there
//! is a single dispatch path with two triggers.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::events::{AppEvent, EventPublisher};
use crate::hotkeys::SharedHotkeyTable;
use crate::registry::OverlayRegistry;

/// One row of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub id: String,
    pub name: String,
    pub icon: std::path::PathBuf,
    /// e.g. "Option + Space"; empty when unbound.
    pub shortcut_label: String,
}

/// Renders the menu at the cursor and blocks until the user picks an entry
/// or dismisses it.
pub trait MenuPresenter {
    /// Returns the picked entry's id, or `None` when dismissed.
    fn present(&mut self, entries: &[MenuEntry]) -> Option<String>;
}

pub struct LaunchMenu {
    registry: Arc<dyn OverlayRegistry>,
    table: Arc<SharedHotkeyTable>,
    presenter: Box<dyn MenuPresenter>,
    publisher: EventPublisher,
}

impl LaunchMenu {
    pub fn new(
        registry: Arc<dyn OverlayRegistry>,
        table: Arc<SharedHotkeyTable>,
        presenter: Box<dyn MenuPresenter>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            registry,
            table,
            presenter,
            publisher,
        }
    }

    /// Entries in registry order with their current shortcut labels.
    pub fn entries(&self) -> Vec<MenuEntry> {
        let table = self.table.snapshot();
        self.registry
            .list()
            .into_iter()
            .map(|d| MenuEntry {
                shortcut_label: table
                    .shortcut_for(&d.id)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                id: d.id,
                name: d.name,
                icon: d.icon_path,
            })
            .collect()
    }

    /// Show the menu. A pick enqueues `ToggleOverlay`; dismissal changes
    /// nothing. Returns the picked id.
    pub fn open(&mut self) -> Option<String> {
        let entries = self.entries();
        if entries.is_empty() {
            warn!("Launch menu has no overlays to offer");
            return None;
        }
        match self.presenter.present(&entries) {
            Some(id) => {
                if entries.iter().any(|e| e.id == id) {
                    info!("Launch menu picked '{}'", id);
                } else {
                    // The dispatcher reports it as an unknown id
                    warn!("Launch menu returned unlisted id '{}'", id);
                }
                self.publisher.publish(AppEvent::ToggleOverlay(id.clone()));
                Some(id)
            }
            None => {
                debug!("Launch menu dismissed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::model::{OverlayDescriptor, Shortcut, KC_SPACE, MOD_OPTION};
    use crate::registry::Registry;
    use std::path::PathBuf;

    struct Pick(Option<&'static str>);

    impl MenuPresenter for Pick {
        fn present(&mut self, _entries: &[MenuEntry]) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    fn menu(pick: Option<&'static str>) -> (EventBus, LaunchMenu) {
        let bus = EventBus::new();
        let registry: Registry = ["alpha", "beta"]
            .into_iter()
            .map(|id| OverlayDescriptor {
                id: id.into(),
                name: id.to_uppercase(),
                url: format!("https://{id}.example"),
                icon_path: PathBuf::from(format!("{id}.png")),
                default_shortcut: None,
                description: String::new(),
            })
            .collect();
        let table = Arc::new(SharedHotkeyTable::default());
        table
            .register("alpha", Shortcut::new(MOD_OPTION, KC_SPACE))
            .unwrap();
        let menu = LaunchMenu::new(
            Arc::new(registry),
            table,
            Box::new(Pick(pick)),
            bus.publisher(),
        );
        (bus, menu)
    }

    #[test]
    fn entries_carry_labels_in_registry_order() {
        let (_bus, menu) = menu(None);
        let entries = menu.entries();
        assert_eq!(entries[0].id, "alpha");
        assert_eq!(entries[0].shortcut_label, "Option + Space");
        assert_eq!(entries[1].name, "BETA");
        assert_eq!(entries[1].shortcut_label, "");
    }

    #[test]
    fn pick_enqueues_toggle() {
        let (bus, mut menu) = menu(Some("beta"));
        assert_eq!(menu.open().as_deref(), Some("beta"));
        assert_eq!(bus.drain(), vec![AppEvent::ToggleOverlay("beta".into())]);
    }

    #[test]
    fn dismissal_changes_nothing() {
        let (bus, mut menu) = menu(None);
        assert_eq!(menu.open(), None);
        assert!(bus.drain().is_empty());
    }
}
