#![forbid(unsafe_code)]

//! The display-engine seam.
//!
//! A view owns at most one engine, created lazily through an
//! [`EngineFactory`]. Every engine call is fallible; the coordinator logs
//! failures and keeps its own bookkeeping, so an engine that rejects a
//! projection never leaves the view without one.

use std::fmt;

use crate::geometry::{AspectRatio, CameraMatrix, LatLon, Rgb, ScreenBounds};
use crate::projection::Projection;
use crate::{ViewId, ViewKind};

/// Opaque handle of something the engine renders on behalf of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayableId(pub u64);

/// Errors reported by a display engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be created or has been torn down.
    Unavailable,
    /// The engine refused the request.
    Rejected(String),
    /// Failure inside the rendering backend.
    Backend(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "display engine unavailable"),
            Self::Rejected(why) => write!(f, "engine rejected request: {why}"),
            Self::Backend(why) => write!(f, "engine backend failure: {why}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

/// A rendering engine bound to one view.
///
/// Implementations are driven from the UI thread only.
pub trait DisplayEngine: Send {
    /// Current camera transform.
    fn camera_matrix(&self) -> EngineResult<CameraMatrix>;

    /// Replace the camera transform.
    fn set_camera_matrix(&mut self, matrix: &CameraMatrix) -> EngineResult<()>;

    /// Switch the scene to a new map projection.
    fn set_projection(&mut self, projection: &Projection) -> EngineResult<()>;

    /// Return the camera to its home position.
    fn reset_projection(&mut self) -> EngineResult<()>;

    /// Rotate a globe so the given point faces the viewer.
    fn center_on(&mut self, point: LatLon) -> EngineResult<()>;

    /// Current per-axis display scale.
    fn display_aspect(&self) -> EngineResult<AspectRatio>;

    fn set_display_aspect(&mut self, aspect: AspectRatio) -> EngineResult<()>;

    fn add_displayable(&mut self, id: DisplayableId) -> EngineResult<()>;

    fn remove_displayable(&mut self, id: DisplayableId) -> EngineResult<()>;

    /// On-screen extent of the scene component.
    fn screen_bounds(&self) -> EngineResult<ScreenBounds>;

    /// Toggle rendering. An inactive engine batches changes until reactivated.
    fn set_active(&mut self, active: bool) -> EngineResult<()>;

    fn set_colors(&mut self, foreground: Rgb, background: Rgb) -> EngineResult<()>;

    /// Forward a boolean rendering feature (wireframe, scales, ...).
    ///
    /// Engines that do not know the feature ignore it.
    fn set_feature(&mut self, _id: &str, _on: bool) -> EngineResult<()> {
        Ok(())
    }

    /// Release engine resources. Further calls may fail with
    /// [`EngineError::Unavailable`].
    fn destroy(&mut self);
}

/// Creates engines on first access.
pub trait EngineFactory: Send + Sync {
    fn create(&self, view: ViewId, kind: &ViewKind) -> EngineResult<Box<dyn DisplayEngine>>;
}
