#![forbid(unsafe_code)]

//! Publish/subscribe bus between peer views.
//!
//! Views that opted into sharing receive each other's projection, camera and
//! color changes. The bus is an explicit object passed to every coordinator;
//! delivery is a [`RuntimeMsg::Shared`] sent into the subscriber's channel.
//!
//! # Invariants
//!
//! - A publish reaches each sharing subscriber other than the origin at most
//!   once.
//! - Subscribers with sharing off receive nothing.
//! - `subscribe` and `unsubscribe` are idempotent.
//! - A subscriber whose channel is closed is dropped on the next publish.
//!
//! # Re-broadcast loops
//!
//! Receivers apply shared changes with `from_user = false`, which never
//! publishes. One user action therefore produces exactly one publish no matter
//! how many peers are listening.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard};

use geoview_core::ViewId;

use crate::message::{RuntimeMsg, ShareMessage};

struct Subscriber {
    sender: Sender<RuntimeMsg>,
    sharing: bool,
}

#[derive(Default)]
struct BusState {
    subscribers: BTreeMap<ViewId, Subscriber>,
    published: u64,
    delivered: u64,
}

/// Shared-state bus.
#[derive(Default)]
pub struct SharingBus {
    state: Mutex<BusState>,
}

impl fmt::Debug for SharingBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SharingBus")
            .field("subscribers", &state.subscribers.len())
            .field("published", &state.published)
            .field("delivered", &state.delivered)
            .finish()
    }
}

impl SharingBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view's channel. Re-subscribing an existing view only
    /// updates its sharing flag.
    pub fn subscribe(&self, view: ViewId, sender: Sender<RuntimeMsg>, sharing: bool) {
        let mut state = self.lock();
        match state.subscribers.get_mut(&view) {
            Some(existing) => existing.sharing = sharing,
            None => {
                state
                    .subscribers
                    .insert(view, Subscriber { sender, sharing });
                tracing::debug!(target: "geoview.sharing", %view, sharing, "subscribed");
            }
        }
    }

    /// Remove a view. Returns whether it was subscribed.
    pub fn unsubscribe(&self, view: ViewId) -> bool {
        let removed = self.lock().subscribers.remove(&view).is_some();
        if removed {
            tracing::debug!(target: "geoview.sharing", %view, "unsubscribed");
        }
        removed
    }

    /// Toggle whether a subscribed view takes part in sharing.
    pub fn set_sharing(&self, view: ViewId, sharing: bool) {
        if let Some(sub) = self.lock().subscribers.get_mut(&view) {
            sub.sharing = sharing;
        }
    }

    #[must_use]
    pub fn is_subscribed(&self, view: ViewId) -> bool {
        self.lock().subscribers.contains_key(&view)
    }

    #[must_use]
    pub fn is_sharing(&self, view: ViewId) -> bool {
        self.lock()
            .subscribers
            .get(&view)
            .is_some_and(|s| s.sharing)
    }

    /// Deliver `message` to every sharing peer except its origin.
    ///
    /// Returns the number of deliveries.
    pub fn publish(&self, message: ShareMessage) -> usize {
        let mut state = self.lock();
        state.published += 1;
        let mut closed = Vec::new();
        let mut delivered = 0usize;
        for (view, sub) in &state.subscribers {
            if *view == message.origin || !sub.sharing {
                continue;
            }
            if sub.sender.send(RuntimeMsg::Shared(message.clone())).is_ok() {
                delivered += 1;
            } else {
                closed.push(*view);
            }
        }
        for view in closed {
            state.subscribers.remove(&view);
            tracing::debug!(target: "geoview.sharing", %view, "dropped closed subscriber");
        }
        state.delivered += delivered as u64;
        tracing::debug!(
            target: "geoview.sharing",
            origin = %message.origin,
            topic = ?message.topic(),
            delivered,
            "published"
        );
        delivered
    }

    /// Total publishes since creation.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.lock().published
    }

    /// Total deliveries since creation.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.lock().delivered
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
