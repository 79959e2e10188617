#![forbid(unsafe_code)]

//! Layer control double.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geoview_core::{ControlId, LayerControl, Projection, ViewChange, ViewId};

/// A notification a control received from a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    ViewDestroyed(ViewId),
    ViewChanged(ViewId, ViewChange),
    FirstFrame(ViewId),
    Visibility(bool),
}

/// A [`LayerControl`] with settable state that records what it is told.
#[derive(Debug)]
pub struct RecordingControl {
    id: ControlId,
    label: String,
    visible: AtomicBool,
    locked: AtomicBool,
    in_legend: bool,
    projection: Mutex<Option<Projection>>,
    pause: Option<Duration>,
    events: Mutex<Vec<ControlEvent>>,
}

impl RecordingControl {
    /// A visible, unlocked control without a data projection.
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: ControlId(id),
            label: label.into(),
            visible: AtomicBool::new(true),
            locked: AtomicBool::new(false),
            in_legend: true,
            projection: Mutex::new(None),
            pause: None,
            events: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_projection(self, projection: Projection) -> Self {
        *self.projection.lock().unwrap_or_else(|e| e.into_inner()) = Some(projection);
        self
    }

    #[must_use]
    pub fn locked(self) -> Self {
        self.locked.store(true, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn hidden(self) -> Self {
        self.visible.store(false, Ordering::SeqCst);
        self
    }

    /// Keep the control out of legends and the display list.
    #[must_use]
    pub fn without_legend(mut self) -> Self {
        self.in_legend = false;
        self
    }

    #[must_use]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Wrap for attaching to a view.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    pub fn set_data_projection(&self, projection: Option<Projection>) {
        *self.projection.lock().unwrap_or_else(|e| e.into_inner()) = projection;
    }

    #[must_use]
    pub fn events(&self) -> Vec<ControlEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, pred: impl Fn(&ControlEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| pred(e))
            .count()
    }

    fn record(&self, event: ControlEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl LayerControl for RecordingControl {
    fn id(&self) -> ControlId {
        self.id
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        self.record(ControlEvent::Visibility(visible));
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    fn shows_in_legend(&self) -> bool {
        self.in_legend
    }

    fn data_projection(&self) -> Option<Projection> {
        self.projection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn animation_pause(&self) -> Option<Duration> {
        self.pause
    }

    fn view_destroyed(&self, view: ViewId) {
        self.record(ControlEvent::ViewDestroyed(view));
    }

    fn view_changed(&self, view: ViewId, change: ViewChange) {
        self.record(ControlEvent::ViewChanged(view, change));
    }

    fn first_frame_done(&self, view: ViewId) {
        self.record(ControlEvent::FirstFrame(view));
    }
}
