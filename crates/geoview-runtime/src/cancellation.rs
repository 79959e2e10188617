// SPDX-License-Identifier: Apache-2.0
//! Cooperative cancellation for scheduled view work.
//!
//! Delayed work (legend refill checks, visibility ticks, busy grace checks)
//! is queued on the [`TaskScheduler`](crate::scheduler::TaskScheduler) with an
//! optional [`CancellationToken`]. The owner keeps the matching
//! [`CancellationSource`] and cancels it when the work is no longer wanted:
//! when an animation stops or when the view is destroyed.
//!
//! Cancellation is observed, not enforced. The scheduler skips a cancelled
//! task when it comes due; a task that is already running finishes.
//!
//! # Example
//!
//! ```
//! use geoview_runtime::cancellation::CancellationSource;
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//! assert!(!token.is_cancelled());
//! assert!(source.cancel());
//! assert!(token.is_cancelled());
//! assert!(!source.cancel());
//! ```

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable, thread-safe view of a cancellation flag.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

/// The owning side of a cancellation flag.
///
/// Dropping the source does **not** cancel its tokens.
pub struct CancellationSource {
    flag: Arc<AtomicBool>,
}

impl CancellationSource {
    /// Create a source whose tokens start uncancelled.
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Request cancellation.
    ///
    /// Returns `true` on the first call, `false` when already cancelled.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// Returns `true` once the owning source cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
