#![forbid(unsafe_code)]

//! Visibility animation: cycle through unlocked layers one at a time.
//!
//! ```text
//!  Stopped --start--> Running --tick--> Running (next layer visible)
//!     ^                  |
//!     +---- stop / turn_all / no eligible layers / destroy
//! ```
//!
//! Ticks are one-shot scheduled messages tagged with the animation
//! generation. Stopping bumps the generation and cancels the token, so a
//! tick already sitting in the channel is ignored.

use web_time::Duration;

use super::ViewCoordinator;
use crate::cancellation::CancellationSource;
use crate::message::RuntimeMsg;

/// Lower bound for [`ViewCoordinator::faster_visibility_animation`].
const MIN_FAST_INTERVAL: Duration = Duration::from_millis(300);
const SPEED_STEP: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub(crate) struct VisibilityAnimation {
    running: bool,
    interval: Duration,
    cursor: usize,
    generation: u64,
    cancel: Option<CancellationSource>,
    ticks: u64,
}

impl VisibilityAnimation {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            running: false,
            interval,
            cursor: 0,
            generation: 0,
            cancel: None,
            ticks: 0,
        }
    }

    pub(crate) fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.generation += 1;
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        true
    }
}

impl ViewCoordinator {
    /// Start or stop the visibility animation.
    ///
    /// Returns `true` when the state changed.
    pub fn set_animated_visibility(&mut self, on: bool) -> bool {
        if !on {
            let stopped = self.visibility.stop();
            if stopped {
                tracing::debug!(target: "geoview.coordinator", view = %self.id, "visibility animation stopped");
            }
            return stopped;
        }
        if !self.is_ready() || self.visibility.running {
            return false;
        }
        self.visibility.running = true;
        self.visibility.generation += 1;
        self.visibility.cancel = Some(CancellationSource::new());
        tracing::debug!(
            target: "geoview.coordinator",
            view = %self.id,
            interval_ms = crate::config::millis(self.visibility.interval),
            "visibility animation started"
        );
        self.schedule_visibility_tick(Duration::ZERO);
        true
    }

    #[must_use]
    pub fn is_visibility_animating(&self) -> bool {
        self.visibility.running
    }

    /// Number of animation ticks applied.
    #[must_use]
    pub fn visibility_ticks(&self) -> u64 {
        self.visibility.ticks
    }

    #[must_use]
    pub fn visibility_interval(&self) -> Duration {
        self.visibility.interval
    }

    pub fn set_visibility_interval(&mut self, interval: Duration) {
        self.visibility.interval = interval;
    }

    /// Shorten the dwell by 200 ms while it is above 300 ms.
    pub fn faster_visibility_animation(&mut self) {
        if self.visibility.interval > MIN_FAST_INTERVAL {
            self.visibility.interval = self.visibility.interval.saturating_sub(SPEED_STEP);
        }
    }

    /// Lengthen the dwell by 200 ms.
    pub fn slower_visibility_animation(&mut self) {
        self.visibility.interval += SPEED_STEP;
    }

    /// Advance the round-robin by one layer.
    ///
    /// With several unlocked layers exactly one ends up visible; with a single
    /// unlocked layer its visibility flips. Returns the dwell requested by the
    /// chosen layer, if any.
    pub fn step_visibility(&mut self) -> Option<Duration> {
        if !self.is_ready() {
            return None;
        }
        let eligible: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.control().is_locked())
            .map(|(i, _)| i)
            .collect();
        let pause = match eligible.as_slice() {
            [] => return None,
            [only] => {
                let control = self.layers.at(*only)?.control();
                control.set_visible(!control.is_visible());
                control.animation_pause()
            }
            _ => {
                let pick = eligible
                    .iter()
                    .copied()
                    .find(|i| *i >= self.visibility.cursor)
                    .unwrap_or(eligible[0]);
                for idx in &eligible {
                    if let Some(layer) = self.layers.at(*idx) {
                        layer.control().set_visible(*idx == pick);
                    }
                }
                self.visibility.cursor = pick + 1;
                self.layers.at(pick)?.control().animation_pause()
            }
        };
        self.update_display_list();
        pause
    }

    /// Show or hide every unlocked layer. Stops the animation.
    pub fn turn_all_layers(&mut self, on: bool) {
        if !self.is_ready() {
            return;
        }
        self.set_animated_visibility(false);
        for layer in self.layers.eligible() {
            layer.control().set_visible(on);
        }
        self.update_display_list();
    }

    pub(crate) fn visibility_tick(&mut self, generation: u64) {
        if !self.is_ready() || !self.visibility.running || generation != self.visibility.generation {
            return;
        }
        if self.layers.eligible_count() == 0 {
            self.set_animated_visibility(false);
            return;
        }
        let pause = self.step_visibility();
        self.visibility.ticks += 1;
        let delay = pause.unwrap_or(self.visibility.interval);
        self.schedule_visibility_tick(delay);
    }

    fn schedule_visibility_tick(&mut self, delay: Duration) {
        let Some(token) = self.visibility.cancel.as_ref().map(CancellationSource::token) else {
            return;
        };
        let generation = self.visibility.generation;
        let tx = self.sender.clone();
        self.scheduler
            .schedule_cancellable(delay, token, move |_| {
                let _ = tx.send(RuntimeMsg::VisibilityTick(generation));
            });
    }
}
