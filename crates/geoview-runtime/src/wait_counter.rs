#![forbid(unsafe_code)]

//! Reference-counted busy indicator.
//!
//! The display engine reports busy/idle pairs from arbitrary threads, often
//! unbalanced and often for work that finishes in a few milliseconds. The
//! [`WaitCounter`] turns that stream into at most one "busy" and one "normal"
//! indicator change per streak, where a streak is the interval between the
//! count leaving zero and returning to it.
//!
//! # Design
//!
//! All state sits behind one mutex. Entering a streak with a non-zero grace
//! schedules a check on the view's [`TaskScheduler`]; the check shows the
//! busy indicator only if the same streak is still open when it fires. With a
//! zero grace the indicator is shown immediately.
//!
//! # Invariants
//!
//! - Busy is shown at most once per streak, normal at most once per streak,
//!   and normal only after busy in the same streak.
//! - An idle with nothing outstanding is ignored.
//! - After every begin has been matched by an end, the indicator is normal.
//! - After [`WaitCounter::drain`] every further call is ignored.
//!
//! # Failure Modes
//!
//! - **Observer re-entrancy**: indicator callbacks run under the lock so the
//!   last callback always reflects the final state. An observer that calls
//!   back into the counter would deadlock.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use geoview_core::{ViewId, ViewObserver};
use web_time::Duration;

use crate::scheduler::TaskScheduler;

#[derive(Debug, Default)]
struct WaitState {
    outstanding: u32,
    streak: u64,
    showing_busy: bool,
    drained: bool,
    busy_shown: u64,
    normal_shown: u64,
}

/// Snapshot of the counter for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitStats {
    pub outstanding: u32,
    pub showing_busy: bool,
    pub busy_shown: u64,
    pub normal_shown: u64,
}

struct Shared {
    view: ViewId,
    observer: Arc<dyn ViewObserver>,
    state: Mutex<WaitState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WaitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Busy/idle reconciler for one view.
#[derive(Clone)]
pub struct WaitCounter {
    shared: Arc<Shared>,
    grace: Duration,
    scheduler: TaskScheduler,
}

impl fmt::Debug for WaitCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitCounter")
            .field("view", &self.shared.view)
            .field("grace", &self.grace)
            .field("stats", &self.stats())
            .finish()
    }
}

impl WaitCounter {
    pub fn new(
        view: ViewId,
        observer: Arc<dyn ViewObserver>,
        grace: Duration,
        scheduler: TaskScheduler,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                view,
                observer,
                state: Mutex::new(WaitState::default()),
            }),
            grace,
            scheduler,
        }
    }

    /// Record the start of a unit of engine work.
    pub fn begin(&self) {
        let mut state = self.shared.lock();
        if state.drained {
            return;
        }
        state.outstanding = state.outstanding.saturating_add(1);
        if state.outstanding != 1 {
            return;
        }
        state.streak += 1;
        if self.grace.is_zero() {
            show_busy(&self.shared, &mut state);
            return;
        }
        let streak = state.streak;
        drop(state);
        let shared = Arc::clone(&self.shared);
        self.scheduler.schedule_after(self.grace, move |_| {
            let mut state = shared.lock();
            if !state.drained && state.outstanding > 0 && state.streak == streak {
                show_busy(&shared, &mut state);
            }
        });
    }

    /// Record the end of a unit of engine work.
    ///
    /// Returns `false` when nothing was outstanding and the call was ignored.
    pub fn end(&self) -> bool {
        let mut state = self.shared.lock();
        if state.drained || state.outstanding == 0 {
            return false;
        }
        state.outstanding -= 1;
        if state.outstanding == 0 {
            show_normal(&self.shared, &mut state);
        }
        true
    }

    /// Reset to zero, restore the normal indicator and ignore further calls.
    pub fn drain(&self) {
        let mut state = self.shared.lock();
        if state.drained {
            return;
        }
        state.drained = true;
        state.outstanding = 0;
        show_normal(&self.shared, &mut state);
    }

    #[must_use]
    pub fn outstanding(&self) -> u32 {
        self.shared.lock().outstanding
    }

    #[must_use]
    pub fn stats(&self) -> WaitStats {
        let state = self.shared.lock();
        WaitStats {
            outstanding: state.outstanding,
            showing_busy: state.showing_busy,
            busy_shown: state.busy_shown,
            normal_shown: state.normal_shown,
        }
    }
}

fn show_busy(shared: &Shared, state: &mut WaitState) {
    if state.showing_busy {
        return;
    }
    state.showing_busy = true;
    state.busy_shown += 1;
    shared.observer.show_busy_indicator(shared.view);
}

fn show_normal(shared: &Shared, state: &mut WaitState) {
    if !state.showing_busy {
        return;
    }
    state.showing_busy = false;
    state.normal_shown += 1;
    shared.observer.show_normal_indicator(shared.view);
}
