#![forbid(unsafe_code)]

//! Deterministic engine-event storms for stress tests.
//!
//! | Pattern | Description |
//! |---------|-------------|
//! | [`StormPattern::BusyFlood`] | Unbalanced busy/idle reports, idles may outnumber begins |
//! | [`StormPattern::ResizeBurst`] | Back-to-back resizes that must coalesce |
//! | [`StormPattern::Interaction`] | Pointer presses, drags and releases mixed with frames |
//!
//! The same seed always produces the same sequence.

use geoview_core::{EngineEvent, PointerButton};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StormPattern {
    BusyFlood { count: usize },
    ResizeBurst { count: usize },
    Interaction { count: usize },
}

impl StormPattern {
    /// Pattern name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BusyFlood { .. } => "busy_flood",
            Self::ResizeBurst { .. } => "resize_burst",
            Self::Interaction { .. } => "interaction",
        }
    }
}

/// xorshift64.
struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next() % u64::from(max)) as u32
    }
}

/// A generated storm.
#[derive(Debug, Clone)]
pub struct EventStorm {
    pub events: Vec<EngineEvent>,
    pub pattern_name: &'static str,
    pub seed: u64,
}

impl EventStorm {
    /// Busy reports minus idle reports, clamped at zero after every step the
    /// way the wait counter clamps.
    #[must_use]
    pub fn expected_outstanding(&self) -> u32 {
        self.events.iter().fold(0u32, |n, e| match e {
            EngineEvent::BusyBegin => n + 1,
            EngineEvent::BusyIdle => n.saturating_sub(1),
            _ => n,
        })
    }

    #[must_use]
    pub fn resize_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, EngineEvent::ComponentResized { .. }))
            .count()
    }
}

pub fn generate_storm(pattern: StormPattern, seed: u64) -> EventStorm {
    let mut rng = Rng::new(seed);
    let events = match pattern {
        StormPattern::BusyFlood { count } => (0..count)
            .map(|_| {
                if rng.below(5) < 3 {
                    EngineEvent::BusyBegin
                } else {
                    EngineEvent::BusyIdle
                }
            })
            .collect(),
        StormPattern::ResizeBurst { count } => (0..count)
            .map(|_| EngineEvent::ComponentResized {
                width: 200 + rng.below(1200),
                height: 150 + rng.below(800),
            })
            .collect(),
        StormPattern::Interaction { count } => {
            let mut events = Vec::with_capacity(count);
            let mut pressed = false;
            for _ in 0..count {
                let event = match rng.below(10) {
                    0..=2 if !pressed => {
                        pressed = true;
                        EngineEvent::PointerDown(PointerButton::Primary)
                    }
                    0..=2 => {
                        pressed = false;
                        EngineEvent::PointerUp(PointerButton::Primary)
                    }
                    3..=6 => EngineEvent::PointerMoved,
                    _ => EngineEvent::FrameRendered,
                };
                events.push(event);
            }
            if pressed {
                events.push(EngineEvent::PointerUp(PointerButton::Primary));
            }
            events
        }
    };
    EventStorm {
        events,
        pattern_name: pattern.name(),
        seed,
    }
}
