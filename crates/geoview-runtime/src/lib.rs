#![forbid(unsafe_code)]

//! geoview Runtime
//!
//! Coordinates the views of a scientific-visualization application: what
//! each view displays, how it reacts to engine events, and how views share
//! state with their peers.
//!
//! # Key Components
//!
//! - [`ViewCoordinator`] - Per-view state, engine reconciliation and undo
//! - [`ViewWorkspace`] - Arena owning the views of one application
//! - [`SharingBus`] - Publish/subscribe channel between peer views
//! - [`CommandStack`] - Bounded undo/redo history
//! - [`WaitCounter`] - Busy indicator with a grace period
//! - [`LegendScheduler`] - Debounced legend refills during bulk loads
//! - [`ProjectionHistory`] - Recently used map projections
//!
//! # How it fits in the system
//! `geoview-core` supplies the value types and the engine, control, observer
//! and preference seams. This crate owns everything stateful: each view runs
//! on the UI thread, delayed work comes back through a per-view
//! [`TaskScheduler`], and cross-view traffic goes through the bus.

pub mod cancellation;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod layers;
pub mod legend;
pub mod message;
pub mod projection_history;
pub mod registry;
pub mod scheduler;
pub mod sharing;
pub mod undo;
pub mod wait_counter;
pub mod workspace;

pub use cancellation::{CancellationSource, CancellationToken};
pub use config::{ConfigError, CoordinatorConfig, ViewProperties};
pub use context::{BulkLoadFlag, ViewContext};
pub use coordinator::{
    DEFAULT_LABEL, ProjectionChange, ProjectionPolicy, ProjectionRequest, ViewCommand,
    ViewCoordinator, ViewSnapshot,
};
pub use layers::{DisplayLayer, DisplayLayerSet, LayerInsert};
pub use legend::{LegendScheduler, RefillRequest};
pub use message::{RuntimeMsg, ShareMessage, SharePayload, ShareTopic};
pub use projection_history::{HistoryEntry, ProjectionHistory};
pub use registry::PeerRegistry;
pub use scheduler::{SchedulerStats, TaskScheduler};
pub use sharing::SharingBus;
pub use undo::{CommandError, CommandStack, HistoryConfig, Step, UndoableCmd};
pub use wait_counter::{WaitCounter, WaitStats};
pub use workspace::ViewWorkspace;
