#![forbid(unsafe_code)]

//! The display-control seam.
//!
//! A display layer pairs a control with the displayable it renders. The
//! control owns data and styling; the view only toggles visibility, asks for
//! labels and tells the control about view-level changes.

use std::time::Duration;

use crate::ViewId;
use crate::projection::Projection;

/// Identity of a display control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub u64);

/// View-level change a control may react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    /// The map projection changed.
    Projection,
    /// The camera was replaced from outside (undo, sharing).
    Camera,
}

/// A control that owns a display layer.
pub trait LayerControl: Send + Sync {
    fn id(&self) -> ControlId;

    /// Label shown in legends and the display list.
    fn label(&self) -> String;

    fn is_visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    /// Locked controls are skipped by visibility animation and bulk toggles.
    fn is_locked(&self) -> bool {
        false
    }

    fn shows_in_legend(&self) -> bool {
        true
    }

    /// Projection implied by the control's data, if any.
    fn data_projection(&self) -> Option<Projection> {
        None
    }

    /// How long the visibility animation dwells on this control.
    fn animation_pause(&self) -> Option<Duration> {
        None
    }

    /// The hosting view has been destroyed.
    fn view_destroyed(&self, _view: ViewId) {}

    fn view_changed(&self, _view: ViewId, _change: ViewChange) {}

    /// The hosting view rendered its first frame.
    fn first_frame_done(&self, _view: ViewId) {}
}
