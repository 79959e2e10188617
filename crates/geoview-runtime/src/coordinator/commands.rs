#![forbid(unsafe_code)]

//! Camera and projection commands.

use geoview_core::{CameraMatrix, EngineError, Projection, ViewChange};

use super::ViewCoordinator;
use super::projection::ProjectionRequest;
use crate::undo::{CommandError, CommandResult, Step, UndoableCmd};

/// A recorded view change.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// The user moved the camera.
    Camera {
        before: CameraMatrix,
        after: CameraMatrix,
    },
    /// The map projection changed.
    Projection {
        before: Projection,
        before_label: Option<String>,
        after: Projection,
        after_label: Option<String>,
    },
}

impl UndoableCmd<ViewCoordinator> for ViewCommand {
    fn redo(&self, view: &mut ViewCoordinator) -> CommandResult {
        match self {
            Self::Camera { after, .. } => view.apply_camera(after),
            Self::Projection {
                after, after_label, ..
            } => view.apply_projection(after, after_label),
        }
    }

    fn undo(&self, view: &mut ViewCoordinator) -> CommandResult {
        match self {
            Self::Camera { before, .. } => view.apply_camera(before),
            Self::Projection {
                before,
                before_label,
                ..
            } => view.apply_projection(before, before_label),
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::Camera { .. } => "Camera change",
            Self::Projection { .. } => "Projection change",
        }
    }
}

impl ViewCoordinator {
    /// Step back one command. Returns `false` at the start of history.
    pub fn undo(&mut self) -> bool {
        self.step_history(Step::Undo)
    }

    /// Step forward one command. Returns `false` at the end of history.
    pub fn redo(&mut self) -> bool {
        self.step_history(Step::Redo)
    }

    fn step_history(&mut self, step: Step) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(command) = self.commands.step(step).cloned() else {
            return false;
        };
        self.applying_command = true;
        let result = match step {
            Step::Undo => command.undo(self),
            Step::Redo => command.redo(self),
        };
        self.applying_command = false;
        match result {
            Ok(()) => tracing::debug!(
                target: "geoview.coordinator",
                view = %self.id,
                ?step,
                command = command.description(),
                "history step applied"
            ),
            Err(err) => tracing::warn!(
                target: "geoview.coordinator",
                view = %self.id,
                ?step,
                command = command.description(),
                error = %err,
                "history step failed"
            ),
        }
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Recorded commands, oldest first.
    pub fn commands(&self) -> impl Iterator<Item = &ViewCommand> {
        self.commands.iter()
    }

    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn push_command(&mut self, command: ViewCommand) {
        if self.applying_command {
            return;
        }
        tracing::debug!(
            target: "geoview.coordinator",
            view = %self.id,
            command = command.description(),
            "command recorded"
        );
        self.commands.push(command);
    }

    fn apply_camera(&mut self, matrix: &CameraMatrix) -> CommandResult {
        if self.is_destroyed() {
            return Err(CommandError::TargetDestroyed);
        }
        let engine = self.engine().ok_or(CommandError::Engine(EngineError::Unavailable))?;
        engine.set_camera_matrix(matrix)?;
        self.notify_layers(ViewChange::Camera);
        Ok(())
    }

    fn apply_projection(&mut self, projection: &Projection, label: &Option<String>) -> CommandResult {
        if self.is_destroyed() {
            return Err(CommandError::TargetDestroyed);
        }
        if self.projection.is_none() {
            return Err(CommandError::Unsupported("projection"));
        }
        self.set_projection(
            ProjectionRequest::new(projection.clone())
                .label_opt(label.clone())
                .record_command(false),
        );
        self.restore_projection_label(label.clone());
        Ok(())
    }
}
