#![forbid(unsafe_code)]

//! UI-facing notifications.
//!
//! The coordinator never draws anything. It reports indicator, legend,
//! overlay and highlight changes to a [`ViewObserver`], which the host UI
//! turns into widgets.
//!
//! # Invariants
//!
//! - Indicator callbacks may arrive from the scheduler thread and are issued
//!   while the wait counter holds its lock: implementations must not call
//!   back into the coordinator.

use crate::ViewId;
use crate::control::ControlId;

/// One row of a view's legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub control: ControlId,
    pub label: String,
    pub visible: bool,
}

/// Text overlay listing the visible layers, anchored at the bottom center of
/// the scene.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayListOverlay {
    pub labels: Vec<String>,
    pub anchor_x: i32,
    pub anchor_y: i32,
}

/// Receives UI state changes from a view coordinator.
pub trait ViewObserver: Send + Sync {
    fn show_busy_indicator(&self, _view: ViewId) {}

    fn show_normal_indicator(&self, _view: ViewId) {}

    fn legends_filled(&self, _view: ViewId, _entries: &[LegendEntry]) {}

    fn display_list_updated(&self, _view: ViewId, _overlay: &DisplayListOverlay) {}

    /// `highlight` is true when the active view should be outlined, i.e. when
    /// more than one main view exists.
    fn active_view_changed(&self, _view: ViewId, _active: bool, _highlight: bool) {}

    /// Layers were added or removed; time-driven widgets should re-sync.
    fn timelines_changed(&self, _view: ViewId) {}

    fn view_destroyed(&self, _view: ViewId) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ViewObserver for NullObserver {}
