#![forbid(unsafe_code)]

//! Saved view state.
//!
//! A [`ViewSnapshot`] holds what a bundle needs to rebuild a view: identity,
//! colors, aspect, explicit toggles, camera and, for map views, the current
//! projection with its history. Restoring never records commands and never
//! publishes to peers.

use std::collections::BTreeMap;

use geoview_core::{AspectRatio, CameraMatrix, Projection, Rgb, ViewKind};

use super::ViewCoordinator;
use crate::projection_history::HistoryEntry;

/// Persistable state of one view.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ViewSnapshot {
    pub kind: ViewKind,
    pub name: Option<String>,
    pub aliases: Vec<String>,
    pub foreground: Rgb,
    pub background: Rgb,
    pub aspect_ratio: Option<AspectRatio>,
    /// Toggles with explicit values only.
    pub properties: BTreeMap<String, bool>,
    pub camera: Option<CameraMatrix>,
    pub projection: Option<Projection>,
    pub projection_label: Option<String>,
    /// Most recent first.
    #[cfg_attr(feature = "state-persistence", serde(default))]
    pub projection_history: Vec<HistoryEntry>,
}

#[cfg(feature = "state-persistence")]
impl ViewSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ViewCoordinator {
    /// Capture the view's persistable state.
    #[must_use]
    pub fn save_state(&self) -> ViewSnapshot {
        ViewSnapshot {
            kind: self.kind,
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            foreground: self.foreground,
            background: self.background,
            aspect_ratio: self.aspect,
            properties: self.boolean_properties_for_persistence(),
            camera: self.display_matrix(),
            projection: self.current_projection().cloned(),
            projection_label: self.current_projection_label().map(String::from),
            projection_history: self.projection_history(),
        }
    }

    /// Rebuild state from a snapshot of a compatible view.
    ///
    /// Works before and after `initialize`: toggles restored early become
    /// session overrides, the camera is applied only once an engine exists.
    pub fn restore_state(&mut self, snapshot: ViewSnapshot) -> bool {
        if self.is_destroyed() || !self.kind.is_compatible_with(&snapshot.kind) {
            return false;
        }
        self.suppress_sharing = true;
        self.name = snapshot.name;
        self.set_aliases(snapshot.aliases);
        self.apply_colors(Some(snapshot.foreground), Some(snapshot.background), false);
        if let Some(aspect) = snapshot.aspect_ratio {
            self.set_aspect_ratio(aspect);
        }
        self.set_boolean_properties_for_persistence(snapshot.properties);

        if let Some(policy) = self.projection.as_mut() {
            policy.history.clear();
            for entry in snapshot.projection_history.into_iter().rev() {
                policy.history.add(entry.projection, entry.label);
            }
            if let Some(projection) = snapshot.projection {
                policy.current = Some(projection);
                policy.current_label = snapshot.projection_label;
            }
        }
        if self.is_ready() {
            if let Some(projection) = self.current_projection().cloned() {
                self.with_engine("set_projection", |e| e.set_projection(&projection));
            }
            if let Some(camera) = snapshot.camera {
                self.set_display_matrix(&camera);
            }
            self.fill_legends();
        }
        self.suppress_sharing = false;
        tracing::debug!(target: "geoview.coordinator", view = %self.id, "view state restored");
        true
    }
}
