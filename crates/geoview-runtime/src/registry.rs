#![forbid(unsafe_code)]

//! Peer registry: which views exist and which one is last-active.
//!
//! The registry is owned by the application root and handed to each
//! coordinator. Last-active is stored here rather than on the views, so at
//! most one view can ever be last-active.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use geoview_core::{ViewId, ViewKind};

#[derive(Default)]
struct RegistryState {
    peers: Vec<(ViewId, ViewKind)>,
    last_active: Option<ViewId>,
    next_id: u32,
}

/// Registry of live views.
#[derive(Default)]
pub struct PeerRegistry {
    state: Mutex<RegistryState>,
}

impl fmt::Debug for PeerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("PeerRegistry")
            .field("peers", &state.peers.len())
            .field("last_active", &state.last_active)
            .finish()
    }
}

impl PeerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view and hand out its id.
    pub fn register(&self, kind: ViewKind) -> ViewId {
        let mut state = self.lock();
        let id = ViewId(state.next_id);
        state.next_id += 1;
        state.peers.push((id, kind));
        id
    }

    /// Remove a view, clearing last-active if it held it.
    pub fn unregister(&self, view: ViewId) -> bool {
        let mut state = self.lock();
        let before = state.peers.len();
        state.peers.retain(|(id, _)| *id != view);
        if state.last_active == Some(view) {
            state.last_active = None;
        }
        state.peers.len() != before
    }

    /// Make `view` last-active. Returns the previous holder.
    ///
    /// Unknown ids are ignored and leave the current holder in place.
    pub fn set_last_active(&self, view: Option<ViewId>) -> Option<ViewId> {
        let mut state = self.lock();
        if let Some(v) = view
            && !state.peers.iter().any(|(id, _)| *id == v)
        {
            return state.last_active;
        }
        std::mem::replace(&mut state.last_active, view)
    }

    #[must_use]
    pub fn last_active(&self) -> Option<ViewId> {
        self.lock().last_active
    }

    #[must_use]
    pub fn is_last_active(&self, view: ViewId) -> bool {
        self.last_active() == Some(view)
    }

    /// More than one map or transect view exists.
    #[must_use]
    pub fn have_more_than_one_main(&self) -> bool {
        self.lock().peers.iter().filter(|(_, k)| k.is_main()).count() > 1
    }

    #[must_use]
    pub fn kind_of(&self, view: ViewId) -> Option<ViewKind> {
        self.lock()
            .peers
            .iter()
            .find(|(id, _)| *id == view)
            .map(|(_, k)| *k)
    }

    /// Live views in registration order.
    #[must_use]
    pub fn views(&self) -> Vec<ViewId> {
        self.lock().peers.iter().map(|(id, _)| *id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().peers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
