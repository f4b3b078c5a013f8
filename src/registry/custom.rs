//! Custom overlays described by JSON files in the user's overlay directory.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::error::{OverlayError, Result};
use crate::model::OverlayDescriptor;

/// Parse one descriptor file; relative icon paths resolve against `base_dir`.
pub fn parse_descriptor(json: &str, base_dir: &Path) -> Result<OverlayDescriptor> {
    let mut descriptor: OverlayDescriptor = serde_json::from_str(json)?;
    if descriptor.icon_path.is_relative() {
        descriptor.icon_path = base_dir.join(&descriptor.icon_path);
    }
    descriptor.validate()?;
    Ok(descriptor)
}

/// Load every `*.json` descriptor in `dir`, sorted by file name.
///
/// A missing directory yields no overlays. Unreadable or invalid files are
/// skipped with a warning.
pub fn load_custom_overlays(dir: &Path) -> Vec<OverlayDescriptor> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No custom overlays in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut overlays = Vec::new();
    for path in paths {
        let loaded = fs::read_to_string(&path)
            .map_err(OverlayError::from)
            .and_then(|json| parse_descriptor(&json, dir));
        match loaded {
            Ok(descriptor) => {
                debug!("Loaded custom overlay '{}' from {}", descriptor.id, path.display());
                overlays.push(descriptor);
            }
            Err(e) => warn!("Skipping custom overlay {}: {}", path.display(), e),
        }
    }
    overlays
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_icon_resolves_against_dir() {
        let d = parse_descriptor(
            r#"{"id":"x","name":"X","url":"https://x.example","iconPath":"x.png"}"#,
            Path::new("/opt/overlays"),
        )
        .unwrap();
        assert_eq!(d.icon_path, Path::new("/opt/overlays/x.png"));
    }

    #[test]
    fn absolute_icon_is_kept() {
        let d = parse_descriptor(
            r#"{"id":"x","name":"X","url":"https://x.example","iconPath":"/icons/x.png"}"#,
            Path::new("/opt/overlays"),
        )
        .unwrap();
        assert_eq!(d.icon_path, Path::new("/icons/x.png"));
    }

    #[test]
    fn colliding_ids_cannot_both_load() {
        let dir = tempfile::tempdir().unwrap();
        for (file, id) in [("1.json", "a_b"), ("2.json", "a/b")] {
            fs::write(
                dir.path().join(file),
                format!(r#"{{"id":"{id}","name":"N","url":"https://n.example","iconPath":"n.png"}}"#),
            )
            .unwrap();
        }
        let ids: Vec<String> = load_custom_overlays(dir.path())
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, ["a_b"]);
    }

    #[test]
    fn missing_dir_is_empty() {
        assert!(load_custom_overlays(Path::new("/definitely/not/here")).is_empty());
    }
}
