#![forbid(unsafe_code)]

//! Undo/redo for view state.
//!
//! - [`UndoableCmd`]: a reversible change applied to a target
//! - [`CommandStack`]: bounded history with a cursor
//!
//! Camera and projection commands live with the view coordinator; this
//! module stays generic so tests can drive it with plain values.

pub mod command;
pub mod history;

pub use command::{CommandError, CommandResult, UndoableCmd};
pub use history::{CommandStack, HistoryConfig, Step};
