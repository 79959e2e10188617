#![forbid(unsafe_code)]

//! Core: value types and collaborator traits for view coordination.
//!
//! # Role in geoview
//! `geoview-core` is the vocabulary layer. It owns the low-level engine event
//! model, the opaque geometry values that views store and replay (camera
//! matrices, projections, aspect ratios), and the traits through which the
//! runtime talks to the outside world.
//!
//! # Primary responsibilities
//! - **EngineEvent**: normalized display-engine events (pointer, frame, busy, resize, keys).
//! - **Projection**: map projection values with structural equality.
//! - **DisplayEngine / EngineFactory**: the rendering engine seam.
//! - **LayerControl**: the display-control seam a layer points at.
//! - **ViewObserver**: UI-facing notifications (indicators, legends, highlight).
//! - **BooleanPropertySet**: named toggles with layered default resolution.
//!
//! # How it fits in the system
//! The runtime (`geoview-runtime`) consumes these types and drives view
//! coordinators. Nothing in this crate spawns threads or keeps global state.

pub mod control;
pub mod engine;
pub mod event;
pub mod geometry;
pub mod observer;
pub mod preferences;
pub mod projection;
pub mod property;

use std::fmt;

pub use control::{ControlId, LayerControl, ViewChange};
pub use engine::{DisplayEngine, DisplayableId, EngineError, EngineFactory, EngineResult};
pub use event::{EngineEvent, KeyCode, KeyEvent, Modifiers, PointerButton};
pub use geometry::{AspectRatio, CameraMatrix, LatLon, MapArea, Rgb, ScreenBounds};
pub use observer::{DisplayListOverlay, LegendEntry, NullObserver, ViewObserver};
pub use preferences::{MemoryPreferences, PreferenceStore};
pub use projection::{Projection, display_projection_ok};
pub use property::{BooleanProperty, BooleanPropertySet, PropertyChange};

/// Index of a view inside the application's view arena.
///
/// Ids are handed out by the peer registry and never reused within one
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ViewId(pub u32);

impl ViewId {
    /// Raw index value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Concrete family of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ViewClass {
    /// Geographic map or globe view.
    Map,
    /// Vertical cross-section view.
    Transect,
    /// Plain cartesian view with no projection.
    Cartesian,
}

/// Whether the scene is rendered flat or in depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Dimension {
    /// 2-D rendering.
    Flat,
    /// 3-D rendering.
    #[default]
    Depth,
}

/// Kind of a view: class plus the flags that discriminate compatibility.
///
/// Two views can exchange commands, layers and shared camera state only when
/// their kinds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ViewKind {
    pub class: ViewClass,
    pub dimension: Dimension,
    pub globe: bool,
}

impl ViewKind {
    /// A 3-D flat-earth map view.
    #[must_use]
    pub const fn map() -> Self {
        Self {
            class: ViewClass::Map,
            dimension: Dimension::Depth,
            globe: false,
        }
    }

    /// A 3-D globe view.
    #[must_use]
    pub const fn globe() -> Self {
        Self {
            class: ViewClass::Map,
            dimension: Dimension::Depth,
            globe: true,
        }
    }

    /// A cross-section view.
    #[must_use]
    pub const fn transect() -> Self {
        Self {
            class: ViewClass::Transect,
            dimension: Dimension::Depth,
            globe: false,
        }
    }

    /// A plain cartesian view.
    #[must_use]
    pub const fn cartesian() -> Self {
        Self {
            class: ViewClass::Cartesian,
            dimension: Dimension::Depth,
            globe: false,
        }
    }

    /// Same kind rendered in 2-D.
    #[must_use]
    pub const fn flat(mut self) -> Self {
        self.dimension = Dimension::Flat;
        self
    }

    /// Whether this kind participates in the "more than one main view"
    /// highlight rule.
    #[must_use]
    pub const fn is_main(&self) -> bool {
        matches!(self.class, ViewClass::Map | ViewClass::Transect)
    }

    /// Whether views of this kind carry a projection policy.
    #[must_use]
    pub const fn has_projection(&self) -> bool {
        matches!(self.class, ViewClass::Map)
    }

    /// Compatibility check: same class and same discriminating flags.
    #[must_use]
    pub fn is_compatible_with(&self, other: &ViewKind) -> bool {
        self == other
    }
}
