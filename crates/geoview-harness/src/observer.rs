#![forbid(unsafe_code)]

//! Observer double that keeps every notification in order.

use std::sync::{Mutex, MutexGuard};

use geoview_core::{DisplayListOverlay, LegendEntry, ViewId, ViewObserver};

/// A recorded observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Busy(ViewId),
    Normal(ViewId),
    Legends(ViewId, Vec<LegendEntry>),
    DisplayList(ViewId, DisplayListOverlay),
    Active {
        view: ViewId,
        active: bool,
        highlight: bool,
    },
    Timelines(ViewId),
    Destroyed(ViewId),
}

impl ObserverEvent {
    #[must_use]
    pub fn view(&self) -> ViewId {
        match self {
            Self::Busy(v)
            | Self::Normal(v)
            | Self::Legends(v, _)
            | Self::DisplayList(v, _)
            | Self::Timelines(v)
            | Self::Destroyed(v) => *v,
            Self::Active { view, .. } => *view,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ObserverEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.lock().clone()
    }

    /// Events concerning `view`.
    #[must_use]
    pub fn events_for(&self, view: ViewId) -> Vec<ObserverEvent> {
        self.lock()
            .iter()
            .filter(|e| e.view() == view)
            .cloned()
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&ObserverEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }

    #[must_use]
    pub fn busy_count(&self, view: ViewId) -> usize {
        self.count(|e| *e == ObserverEvent::Busy(view))
    }

    #[must_use]
    pub fn normal_count(&self, view: ViewId) -> usize {
        self.count(|e| *e == ObserverEvent::Normal(view))
    }

    /// Most recent legend listing for `view`.
    #[must_use]
    pub fn last_legends(&self, view: ViewId) -> Option<Vec<LegendEntry>> {
        self.lock().iter().rev().find_map(|e| match e {
            ObserverEvent::Legends(v, entries) if *v == view => Some(entries.clone()),
            _ => None,
        })
    }

    /// Most recent `(active, highlight)` report for `view`.
    #[must_use]
    pub fn last_active_change(&self, view: ViewId) -> Option<(bool, bool)> {
        self.lock().iter().rev().find_map(|e| match e {
            ObserverEvent::Active {
                view: v,
                active,
                highlight,
            } if *v == view => Some((*active, *highlight)),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl ViewObserver for RecordingObserver {
    fn show_busy_indicator(&self, view: ViewId) {
        self.lock().push(ObserverEvent::Busy(view));
    }

    fn show_normal_indicator(&self, view: ViewId) {
        self.lock().push(ObserverEvent::Normal(view));
    }

    fn legends_filled(&self, view: ViewId, entries: &[LegendEntry]) {
        self.lock()
            .push(ObserverEvent::Legends(view, entries.to_vec()));
    }

    fn display_list_updated(&self, view: ViewId, overlay: &DisplayListOverlay) {
        self.lock()
            .push(ObserverEvent::DisplayList(view, overlay.clone()));
    }

    fn active_view_changed(&self, view: ViewId, active: bool, highlight: bool) {
        self.lock().push(ObserverEvent::Active {
            view,
            active,
            highlight,
        });
    }

    fn timelines_changed(&self, view: ViewId) {
        self.lock().push(ObserverEvent::Timelines(view));
    }

    fn view_destroyed(&self, view: ViewId) {
        self.lock().push(ObserverEvent::Destroyed(view));
    }
}
