#![forbid(unsafe_code)]

//! Debounced legend refill.
//!
//! Rebuilding legends is cheap in isolation but a bulk load adds dozens of
//! layers in a burst. While a bulk load is running, refill requests only push
//! a deadline forward; a single scheduled check waits for the deadline to
//! pass and then fires the refill callback once.
//!
//! ```text
//! request  request   request                      deadline
//!    |--------|---------|--------- delay ---------->| refill
//!    ^ arms one check; later requests only move the deadline
//! ```
//!
//! # Invariants
//!
//! - At most one pending check at a time.
//! - One refill per quiet period, at or after the latest deadline.
//! - A refill that happens by other means (immediate fill) clears the
//!   pending check, which then exits silently.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use web_time::{Duration, Instant};

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::scheduler::TaskScheduler;

/// Callback fired when a deferred refill comes due.
pub type RefillFn = Arc<dyn Fn() + Send + Sync>;

/// What the caller should do after [`LegendScheduler::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillRequest {
    /// No bulk load: fill right away.
    FillNow,
    /// A refill is (or already was) scheduled.
    Deferred,
    /// The scheduler has been cancelled.
    Ignored,
}

#[derive(Debug, Default)]
struct DebounceState {
    deadline: Option<Instant>,
    pending: bool,
    fired: u64,
}

struct Shared {
    state: Mutex<DebounceState>,
    on_due: RefillFn,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DebounceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Legend refill debouncer for one view.
pub struct LegendScheduler {
    shared: Arc<Shared>,
    delay: Duration,
    scheduler: TaskScheduler,
    cancel: CancellationSource,
}

impl fmt::Debug for LegendScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("LegendScheduler")
            .field("delay", &self.delay)
            .field("pending", &state.pending)
            .field("fired", &state.fired)
            .finish()
    }
}

impl LegendScheduler {
    pub fn new(delay: Duration, scheduler: TaskScheduler, on_due: RefillFn) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DebounceState::default()),
                on_due,
            }),
            delay,
            scheduler,
            cancel: CancellationSource::new(),
        }
    }

    /// Ask for a legend refill.
    pub fn request(&self, bulk_loading: bool) -> RefillRequest {
        if self.cancel.is_cancelled() {
            return RefillRequest::Ignored;
        }
        if !bulk_loading {
            return RefillRequest::FillNow;
        }
        let mut state = self.shared.lock();
        state.deadline = Some(Instant::now() + self.delay);
        if state.pending {
            return RefillRequest::Deferred;
        }
        state.pending = true;
        drop(state);
        tracing::debug!(target: "geoview.legend", delay_ms = crate::config::millis(self.delay), "legend refill deferred");
        arm(
            &self.scheduler,
            Arc::clone(&self.shared),
            self.cancel.token(),
            self.delay,
        );
        RefillRequest::Deferred
    }

    /// A refill just happened; any pending check becomes a no-op.
    pub fn mark_filled(&self) {
        let mut state = self.shared.lock();
        state.pending = false;
        state.deadline = None;
    }

    /// Stop all deferred work. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.mark_filled();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.lock().pending
    }

    /// Number of deferred refills fired so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.shared.lock().fired
    }
}

fn arm(scheduler: &TaskScheduler, shared: Arc<Shared>, token: CancellationToken, wait: Duration) {
    let next_token = token.clone();
    scheduler.schedule_cancellable(wait, token, move |sched| {
        let mut state = shared.lock();
        if !state.pending {
            return;
        }
        let now = Instant::now();
        match state.deadline {
            Some(deadline) if deadline > now => {
                drop(state);
                arm(sched, shared, next_token, deadline - now);
            }
            _ => {
                state.pending = false;
                state.deadline = None;
                state.fired += 1;
                drop(state);
                (shared.on_due)();
            }
        }
    });
}
