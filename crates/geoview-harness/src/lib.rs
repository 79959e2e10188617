#![forbid(unsafe_code)]

//! Test doubles and fixtures for geoview.
//!
//! - [`RecordingEngineFactory`] / [`EngineProbe`]: engines whose calls and
//!   state tests can inspect, with per-operation failure injection
//! - [`RecordingControl`]: a layer control with settable visibility, lock and
//!   data projection
//! - [`RecordingObserver`]: every UI notification, in order
//! - [`fixtures`]: reference projections
//! - [`storm`]: seeded engine-event storms

pub mod control;
pub mod engine;
pub mod fixtures;
pub mod observer;
pub mod storm;

pub use control::{ControlEvent, RecordingControl};
pub use engine::{EngineCall, EngineProbe, RecordingEngine, RecordingEngineFactory};
pub use observer::{ObserverEvent, RecordingObserver};
pub use storm::{EventStorm, StormPattern, generate_storm};
