//! Overlay registry: the ordered collection of known overlays.
//!
//! The core only reads from the registry (`list`, `get`). The concrete
//! [`Registry`] is assembled once at startup from the built-in overlays and
//! the user's custom descriptor files.

pub mod builtin;
pub mod custom;

use std::path::Path;

use log::{info, warn};

use crate::model::OverlayDescriptor;

pub use builtin::builtin_overlays;
pub use custom::{load_custom_overlays, parse_descriptor};

/// Read-only view of the overlay collection.
pub trait OverlayRegistry: Send + Sync {
    /// All overlays in menu order.
    fn list(&self) -> Vec<OverlayDescriptor>;

    /// Look up one overlay by id.
    fn get(&self, id: &str) -> Option<OverlayDescriptor>;

    fn ids(&self) -> Vec<String> {
        self.list().into_iter().map(|d| d.id).collect()
    }
}

/// Insertion-ordered overlay collection.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    overlays: Vec<OverlayDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-ins (logos under `icon_dir`) followed by custom overlays found
    /// in `custom_dir`.
    pub fn discover(icon_dir: &Path, custom_dir: &Path) -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_overlays(icon_dir) {
            registry.register(descriptor);
        }
        for descriptor in load_custom_overlays(custom_dir) {
            registry.register(descriptor);
        }
        info!("Registry holds {} overlays", registry.overlays.len());
        registry
    }

    /// Add an overlay; an existing entry with the same id is replaced in place.
    pub fn register(&mut self, descriptor: OverlayDescriptor) {
        if let Some(slot) = self.overlays.iter_mut().find(|d| d.id == descriptor.id) {
            warn!("Overlay '{}' redefined; replacing earlier definition", descriptor.id);
            *slot = descriptor;
        } else {
            self.overlays.push(descriptor);
        }
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

impl FromIterator<OverlayDescriptor> for Registry {
    fn from_iter<I: IntoIterator<Item = OverlayDescriptor>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for descriptor in iter {
            registry.register(descriptor);
        }
        registry
    }
}

impl OverlayRegistry for Registry {
    fn list(&self) -> Vec<OverlayDescriptor> {
        self.overlays.clone()
    }

    fn get(&self, id: &str) -> Option<OverlayDescriptor> {
        self.overlays.iter().find(|d| d.id == id).cloned()
    }
}
