#![forbid(unsafe_code)]

//! Reversible commands.
//!
//! A command is an immutable `(previous, new)` pair for one property of some
//! target. Applying `redo` installs the new value, `undo` reinstalls the
//! previous one. Commands never hold references to their target; the target
//! is passed in when the command is applied.
//!
//! # Invariants
//!
//! - `undo()` after `redo()` restores the target's observable value exactly.
//! - Commands are immutable once pushed.

use std::fmt;

use geoview_core::EngineError;

/// Result of applying a command.
pub type CommandResult = Result<(), CommandError>;

/// Errors that can occur while applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The target has been destroyed.
    TargetDestroyed,
    /// The target cannot accept this kind of command.
    Unsupported(&'static str),
    /// The display engine failed while applying the value.
    Engine(EngineError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetDestroyed => write!(f, "command target destroyed"),
            Self::Unsupported(kind) => write!(f, "target does not support {kind} commands"),
            Self::Engine(err) => write!(f, "engine error while applying command: {err}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for CommandError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

/// A reversible change to a target of type `T`.
pub trait UndoableCmd<T: ?Sized> {
    /// Install the new value.
    fn redo(&self, target: &mut T) -> CommandResult;

    /// Reinstall the previous value.
    fn undo(&self, target: &mut T) -> CommandResult;

    /// Short description for menus and logs.
    fn description(&self) -> &str;
}
