#![forbid(unsafe_code)]

//! Messages delivered to a view's UI-thread queue.
//!
//! Background work never touches a coordinator directly. It posts a
//! [`RuntimeMsg`] into the view's channel and the UI thread applies it on the
//! next `pump`.

use geoview_core::{CameraMatrix, Projection, Rgb, ViewId};

/// What a shared update is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareTopic {
    Projection,
    Camera,
    Colors,
}

/// Payload of a shared update.
#[derive(Debug, Clone, PartialEq)]
pub enum SharePayload {
    Projection {
        projection: Projection,
        label: Option<String>,
    },
    Camera(CameraMatrix),
    Colors {
        foreground: Rgb,
        background: Rgb,
    },
}

impl SharePayload {
    #[must_use]
    pub fn topic(&self) -> ShareTopic {
        match self {
            Self::Projection { .. } => ShareTopic::Projection,
            Self::Camera(_) => ShareTopic::Camera,
            Self::Colors { .. } => ShareTopic::Colors,
        }
    }
}

/// A state change broadcast by one view to its sharing peers.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareMessage {
    pub origin: ViewId,
    pub payload: SharePayload,
}

impl ShareMessage {
    #[must_use]
    pub fn new(origin: ViewId, payload: SharePayload) -> Self {
        Self { origin, payload }
    }

    #[must_use]
    pub fn topic(&self) -> ShareTopic {
        self.payload.topic()
    }
}

/// Work queued for a coordinator's UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeMsg {
    /// A deferred legend refill came due.
    RefillLegends,
    /// The resize with this generation has had no successor for the settle delay.
    ResizeSettled(u64),
    /// Visibility animation tick for this animation generation.
    VisibilityTick(u64),
    /// A peer shared a state change.
    Shared(ShareMessage),
}
