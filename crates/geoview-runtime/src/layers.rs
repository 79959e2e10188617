#![forbid(unsafe_code)]

//! Display layers attached to a view.
//!
//! A [`DisplayLayer`] pairs a control with the displayable it renders. The
//! set keeps insertion order (legends and the visibility animation walk it in
//! that order) and never holds two layers for the same control.

use std::fmt;
use std::sync::Arc;

use geoview_core::{ControlId, DisplayableId, LayerControl, LegendEntry};

/// A control and the engine displayable it owns.
#[derive(Clone)]
pub struct DisplayLayer {
    control: Arc<dyn LayerControl>,
    displayable: DisplayableId,
}

impl fmt::Debug for DisplayLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayLayer")
            .field("control", &self.control.id())
            .field("displayable", &self.displayable)
            .finish()
    }
}

impl PartialEq for DisplayLayer {
    fn eq(&self, other: &Self) -> bool {
        self.control.id() == other.control.id() && self.displayable == other.displayable
    }
}

impl DisplayLayer {
    pub fn new(control: Arc<dyn LayerControl>, displayable: DisplayableId) -> Self {
        Self {
            control,
            displayable,
        }
    }

    #[must_use]
    pub fn control(&self) -> &Arc<dyn LayerControl> {
        &self.control
    }

    #[must_use]
    pub fn control_id(&self) -> ControlId {
        self.control.id()
    }

    #[must_use]
    pub fn displayable(&self) -> DisplayableId {
        self.displayable
    }
}

/// Result of [`DisplayLayerSet::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerInsert {
    Added,
    /// A layer for the same control is already present; the set is unchanged.
    Duplicate,
}

/// Ordered, duplicate-free layer collection.
#[derive(Debug, Default, Clone)]
pub struct DisplayLayerSet {
    layers: Vec<DisplayLayer>,
}

impl DisplayLayerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: DisplayLayer) -> LayerInsert {
        if self.contains(layer.control_id()) {
            return LayerInsert::Duplicate;
        }
        self.layers.push(layer);
        LayerInsert::Added
    }

    pub fn remove(&mut self, control: ControlId) -> Option<DisplayLayer> {
        let idx = self.layers.iter().position(|l| l.control_id() == control)?;
        Some(self.layers.remove(idx))
    }

    #[must_use]
    pub fn contains(&self, control: ControlId) -> bool {
        self.layers.iter().any(|l| l.control_id() == control)
    }

    #[must_use]
    pub fn get(&self, control: ControlId) -> Option<&DisplayLayer> {
        self.layers.iter().find(|l| l.control_id() == control)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayLayer> {
        self.layers.iter()
    }

    /// Layers the visibility animation may toggle.
    pub fn eligible(&self) -> impl Iterator<Item = &DisplayLayer> {
        self.layers.iter().filter(|l| !l.control.is_locked())
    }

    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.eligible().count()
    }

    /// Legend rows for controls that appear in legends.
    #[must_use]
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        self.layers
            .iter()
            .filter(|l| l.control.shows_in_legend())
            .map(|l| LegendEntry {
                control: l.control_id(),
                label: l.control.label(),
                visible: l.control.is_visible(),
            })
            .collect()
    }

    /// Index-based access for round-robin walks.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&DisplayLayer> {
        self.layers.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Remove and return every layer.
    pub fn drain(&mut self) -> Vec<DisplayLayer> {
        std::mem::take(&mut self.layers)
    }
}
