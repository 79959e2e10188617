#![forbid(unsafe_code)]

//! Engine event reconciliation.
//!
//! | event             | effect                                                  |
//! |-------------------|---------------------------------------------------------|
//! | pointer down      | become last-active; remember the camera                 |
//! | pointer up        | record a camera command if the camera moved             |
//! | pointer moved     | become last-active when focus follows the pointer       |
//! | frame rendered    | first frame: notify layers, refresh overlay + highlight |
//! | busy / idle       | wait counter                                            |
//! | resized           | reposition the overlay once resizing settles            |
//! | F1 / F2 / F3      | step visibility / all layers on / all layers off        |

use geoview_core::{EngineEvent, KeyEvent};
use web_time::Instant;

use super::ViewCoordinator;
use crate::message::{RuntimeMsg, SharePayload};

impl ViewCoordinator {
    /// Feed one engine event. Ignored before `initialize` and after `destroy`.
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        if !self.is_ready() {
            return;
        }
        match event {
            EngineEvent::PointerDown(_) => {
                if self.config.shareable && !self.is_last_active() {
                    self.set_last_active();
                }
                self.pending_camera = self.display_matrix();
            }
            EngineEvent::PointerUp(_) => self.finish_camera_interaction(),
            EngineEvent::PointerMoved => {
                if self.config.shareable && !self.config.click_to_focus && !self.is_last_active() {
                    self.set_last_active();
                }
            }
            EngineEvent::FrameRendered => self.frame_rendered(),
            EngineEvent::BusyBegin => self.wait.begin(),
            EngineEvent::BusyIdle => {
                self.wait.end();
            }
            EngineEvent::ComponentResized { width, height } => self.component_resized(width, height),
            EngineEvent::Key(key) => self.key_pressed(key),
        }
    }

    fn finish_camera_interaction(&mut self) {
        let Some(before) = self.pending_camera.take() else {
            return;
        };
        let Some(after) = self.display_matrix() else {
            return;
        };
        if after == before {
            return;
        }
        self.push_command(super::ViewCommand::Camera {
            before,
            after: after.clone(),
        });
        self.share(SharePayload::Camera(after));
    }

    fn frame_rendered(&mut self) {
        self.last_frame_at = Some(Instant::now());
        if self.first_frame_done {
            return;
        }
        self.first_frame_done = true;
        tracing::debug!(target: "geoview.coordinator", view = %self.id, "first frame rendered");
        for layer in self.layers.iter().collect::<Vec<_>>().into_iter().rev() {
            layer.control().first_frame_done(self.id);
        }
        self.update_display_list();
        if self.is_last_active() {
            let highlight = self.ctx.registry.have_more_than_one_main();
            self.ctx
                .observer
                .active_view_changed(self.id, true, highlight);
        }
    }

    fn component_resized(&mut self, width: u32, height: u32) {
        self.resize_generation += 1;
        let generation = self.resize_generation;
        let tx = self.sender.clone();
        tracing::trace!(target: "geoview.coordinator", view = %self.id, width, height, generation, "resize");
        self.scheduler
            .schedule_after(self.config.resize_settle(), move |_| {
                let _ = tx.send(RuntimeMsg::ResizeSettled(generation));
            });
    }

    pub(crate) fn resize_settled(&mut self, generation: u64) {
        if generation != self.resize_generation {
            return;
        }
        self.resize_repositions += 1;
        self.update_display_list();
    }

    fn key_pressed(&mut self, key: KeyEvent) {
        if key.is_plain_function(1) {
            self.set_animated_visibility(false);
            self.step_visibility();
        } else if key.is_plain_function(2) {
            self.turn_all_layers(true);
        } else if key.is_plain_function(3) {
            self.turn_all_layers(false);
        }
    }
}
