//! Overlay descriptors: the read-only data the registry hands to the core.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::Shortcut;
use crate::error::{OverlayError, Result};

/// One summonable web destination.
///
/// Custom overlays use the same shape on disk:
/// `{"id", "name", "url", "iconPath", "defaultHotkey"?, "description"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    pub icon_path: PathBuf,
    #[serde(default, rename = "defaultHotkey", skip_serializing_if = "Option::is_none")]
    pub default_shortcut: Option<Shortcut>,
    #[serde(default)]
    pub description: String,
}

impl OverlayDescriptor {
    /// Checks the required fields are non-empty and the URL is web content.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(OverlayError::InvalidDescriptor("empty id".into()));
        }
        // Ids name storage files; keep them to characters stored verbatim.
        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(OverlayError::InvalidDescriptor(format!(
                "id '{}' may only use letters, digits, '_', '-' and '.'",
                self.id
            )));
        }
        if self.id == super::constants::LAUNCH_MENU_ID {
            return Err(OverlayError::InvalidDescriptor(format!(
                "'{}' is reserved for the launch menu",
                self.id
            )));
        }
        if self.name.trim().is_empty() {
            return Err(OverlayError::InvalidDescriptor(format!(
                "overlay '{}' has no name",
                self.id
            )));
        }
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(OverlayError::InvalidDescriptor(format!(
                "overlay '{}' has a non-web url '{}'",
                self.id, self.url
            )));
        }
        if self.icon_path.as_os_str().is_empty() {
            return Err(OverlayError::InvalidDescriptor(format!(
                "overlay '{}' has no icon path",
                self.id
            )));
        }
        Ok(())
    }
}
