#![forbid(unsafe_code)]

//! Delayed task execution off the UI thread.
//!
//! Each view owns one [`TaskScheduler`]. Tasks are boxed closures queued with
//! a due time and an optional [`CancellationToken`]; a single worker thread
//! runs them in due order.
//!
//! Tasks either touch state that carries its own lock (the wait counter, the
//! legend debounce) or post a message into the view's channel, which the UI
//! thread drains on its next `pump`. A task receives the scheduler so it can
//! re-arm itself.
//!
//! # Invariants
//!
//! - Tasks with equal due times run in submission order.
//! - A cancelled task is skipped when it comes due and never runs.
//! - After [`TaskScheduler::shutdown`] the queue is empty and new submissions
//!   are refused.
//!
//! # Failure Modes
//!
//! - **Forgotten shutdown**: the worker exits on its own once every handle
//!   has been dropped and the queue is empty.
//! - **Thread spawn failure**: logged; the task is dropped and `schedule_*`
//!   returns `false`.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

use web_time::{Duration, Instant};

use crate::cancellation::CancellationToken;

/// How long an idle worker waits before checking whether anyone still holds
/// a handle.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// A queued unit of work.
pub type Task = Box<dyn FnOnce(&TaskScheduler) + Send + 'static>;

struct Entry {
    due: Instant,
    seq: u64,
    token: Option<CancellationToken>,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap and we want the earliest entry on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Queue {
    entries: BinaryHeap<Entry>,
    next_seq: u64,
    stopped: bool,
    worker_running: bool,
    ran: u64,
    skipped: u64,
}

struct Inner {
    name: String,
    queue: Mutex<Queue>,
    wake: Condvar,
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Tasks waiting to come due.
    pub pending: usize,
    /// Tasks that ran.
    pub ran: u64,
    /// Tasks skipped because their token was cancelled.
    pub skipped: u64,
}

/// Handle to a per-view delayed-task queue. Clones share the queue.
#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<Inner>,
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("name", &self.inner.name)
            .field("stats", &self.stats())
            .finish()
    }
}

impl TaskScheduler {
    /// Create a scheduler. The worker thread starts on first submission.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                queue: Mutex::new(Queue::default()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Run `task` after `delay`.
    pub fn schedule_after<F>(&self, delay: Duration, task: F) -> bool
    where
        F: FnOnce(&TaskScheduler) + Send + 'static,
    {
        self.submit(delay, None, Box::new(task))
    }

    /// Run `task` after `delay` unless `token` is cancelled first.
    pub fn schedule_cancellable<F>(&self, delay: Duration, token: CancellationToken, task: F) -> bool
    where
        F: FnOnce(&TaskScheduler) + Send + 'static,
    {
        self.submit(delay, Some(token), Box::new(task))
    }

    fn submit(&self, delay: Duration, token: Option<CancellationToken>, task: Task) -> bool {
        let mut queue = self.lock();
        if queue.stopped {
            tracing::debug!(
                target: "geoview.scheduler",
                scheduler = %self.inner.name,
                "submission refused after shutdown"
            );
            return false;
        }
        if !queue.worker_running && !self.spawn_worker() {
            return false;
        }
        queue.worker_running = true;
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.entries.push(Entry {
            due: Instant::now() + delay,
            seq,
            token,
            task,
        });
        self.inner.wake.notify_all();
        true
    }

    fn spawn_worker(&self) -> bool {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(format!("geoview-sched-{}", self.inner.name))
            .spawn(move || worker_loop(inner));
        match spawned {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    target: "geoview.scheduler",
                    scheduler = %self.inner.name,
                    error = %err,
                    "failed to spawn scheduler worker"
                );
                false
            }
        }
    }

    /// Drop every queued task and refuse new ones. Idempotent.
    pub fn shutdown(&self) {
        let mut queue = self.lock();
        if queue.stopped {
            return;
        }
        queue.stopped = true;
        let dropped = queue.entries.len();
        queue.entries.clear();
        self.inner.wake.notify_all();
        tracing::debug!(
            target: "geoview.scheduler",
            scheduler = %self.inner.name,
            dropped,
            "scheduler shut down"
        );
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.lock().stopped
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let queue = self.lock();
        SchedulerStats {
            pending: queue.entries.len(),
            ran: queue.ran,
            skipped: queue.skipped,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.inner.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn worker_loop(inner: Arc<Inner>) {
    let mut queue = inner.queue.lock().unwrap_or_else(|e| e.into_inner());
    loop {
        if queue.stopped {
            break;
        }
        let now = Instant::now();
        match queue.entries.peek().map(|e| e.due) {
            None => {
                if Arc::strong_count(&inner) == 1 {
                    break;
                }
                queue = inner
                    .wake
                    .wait_timeout(queue, IDLE_POLL)
                    .unwrap_or_else(|e| e.into_inner())
                    .0;
            }
            Some(due) if due > now => {
                queue = inner
                    .wake
                    .wait_timeout(queue, due - now)
                    .unwrap_or_else(|e| e.into_inner())
                    .0;
            }
            Some(_) => {
                let Some(entry) = queue.entries.pop() else {
                    continue;
                };
                if entry.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
                    queue.skipped += 1;
                    continue;
                }
                queue.ran += 1;
                drop(queue);
                let handle = TaskScheduler {
                    inner: Arc::clone(&inner),
                };
                (entry.task)(&handle);
                drop(handle);
                queue = inner.queue.lock().unwrap_or_else(|e| e.into_inner());
            }
        }
    }
    queue.worker_running = false;
}
