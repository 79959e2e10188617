#![forbid(unsafe_code)]

//! Bounded command history with a cursor.
//!
//! [`CommandStack`] keeps one sequence of commands and a cursor that splits
//! it into "done" (before the cursor) and "undone" (after it):
//!
//! ```text
//! push(c1..c4)       [c1, c2, c3, c4]|        cursor = 4
//! undo x2            [c1, c2]|[c3, c4]        cursor = 2
//! push(c5)           [c1, c2, c5]|            redo tail discarded
//! ```
//!
//! # Invariants
//!
//! 1. `0 <= cursor <= len <= max_depth`
//! 2. Pushing discards every command after the cursor.
//! 3. Stepping past either end is a no-op and returns `None`.
//! 4. Over the bound, the oldest command is evicted and the cursor shifts.

use std::collections::VecDeque;
use std::fmt;

use super::command::{CommandResult, UndoableCmd};

/// Configuration for a command stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of commands retained.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Unbounded configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
        }
    }
}

/// Direction of a cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move back one command (`move(-1)`).
    Undo,
    /// Move forward one command (`move(+1)`).
    Redo,
}

/// Bounded undo/redo history.
pub struct CommandStack<C> {
    entries: VecDeque<C>,
    cursor: usize,
    config: HistoryConfig,
}

impl<C> fmt::Debug for CommandStack<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStack")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("max_depth", &self.config.max_depth)
            .finish()
    }
}

impl<C> Default for CommandStack<C> {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl<C> CommandStack<C> {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            config,
        }
    }

    /// Append a command, discarding the redo tail and evicting over the bound.
    pub fn push(&mut self, command: C) {
        if self.config.max_depth == 0 {
            return;
        }
        self.entries.truncate(self.cursor);
        self.entries.push_back(command);
        self.cursor = self.entries.len();
        while self.entries.len() > self.config.max_depth {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Move the cursor one step and return the command to apply.
    ///
    /// For [`Step::Undo`] this is the command just before the cursor (apply
    /// its `undo`); for [`Step::Redo`] the one just after (apply its `redo`).
    pub fn step(&mut self, step: Step) -> Option<&C> {
        match step {
            Step::Undo => {
                if self.cursor == 0 {
                    return None;
                }
                self.cursor -= 1;
                self.entries.get(self.cursor)
            }
            Step::Redo => {
                if self.cursor >= self.entries.len() {
                    return None;
                }
                self.cursor += 1;
                self.entries.get(self.cursor - 1)
            }
        }
    }

    /// Step and apply in one go, for targets that do not own the stack.
    pub fn apply<T: ?Sized>(&mut self, step: Step, target: &mut T) -> Option<CommandResult>
    where
        C: UndoableCmd<T>,
    {
        let command = self.step(step)?;
        Some(match step {
            Step::Undo => command.undo(target),
            Step::Redo => command.redo(target),
        })
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Commands in order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.entries.iter()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
