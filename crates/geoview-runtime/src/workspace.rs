#![forbid(unsafe_code)]

//! An arena of views sharing one context.
//!
//! [`ViewWorkspace`] owns every coordinator of an application window and is
//! the only place that can borrow two views at once, which moving a layer
//! between views needs. Coordinators still talk to each other only through
//! the sharing bus.

use std::collections::BTreeMap;

use geoview_core::{ControlId, ViewId, ViewKind};

use crate::config::CoordinatorConfig;
use crate::context::{BulkLoadFlag, ViewContext};
use crate::coordinator::ViewCoordinator;
use crate::registry::PeerRegistry;
use crate::sharing::SharingBus;

/// Owns the views of one application.
#[derive(Debug)]
pub struct ViewWorkspace {
    ctx: ViewContext,
    config: CoordinatorConfig,
    views: BTreeMap<ViewId, ViewCoordinator>,
}

impl ViewWorkspace {
    pub fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            config: CoordinatorConfig::default(),
            views: BTreeMap::new(),
        }
    }

    /// Default configuration for views created without one.
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Create, initialize and focus a view with the workspace configuration.
    pub fn create_view(&mut self, kind: ViewKind) -> ViewId {
        self.create_view_with(kind, self.config.clone())
    }

    pub fn create_view_with(&mut self, kind: ViewKind, config: CoordinatorConfig) -> ViewId {
        let mut view = ViewCoordinator::new(kind, self.ctx.clone(), config);
        view.initialize();
        view.set_last_active();
        let id = view.id();
        self.views.insert(id, view);
        id
    }

    #[must_use]
    pub fn view(&self, id: ViewId) -> Option<&ViewCoordinator> {
        self.views.get(&id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut ViewCoordinator> {
        self.views.get_mut(&id)
    }

    pub fn views(&self) -> impl Iterator<Item = &ViewCoordinator> {
        self.views.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// First view whose name or alias is `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ViewId> {
        self.views
            .values()
            .find(|v| v.is_named(name))
            .map(ViewCoordinator::id)
    }

    /// Destroy and drop a view.
    pub fn destroy_view(&mut self, id: ViewId) -> bool {
        match self.views.remove(&id) {
            Some(mut view) => {
                view.destroy();
                true
            }
            None => false,
        }
    }

    /// Pump every view once. Returns the number of messages applied.
    pub fn pump_all(&mut self) -> usize {
        self.views.values_mut().map(ViewCoordinator::pump).sum()
    }

    /// Move a layer between compatible views.
    ///
    /// On failure the layer stays where it was.
    pub fn move_layer(&mut self, from: ViewId, to: ViewId, control: ControlId) -> bool {
        if from == to {
            return false;
        }
        let compatible = match (self.views.get(&from), self.views.get(&to)) {
            (Some(a), Some(b)) => a.is_compatible_with(b) && b.is_ready(),
            _ => false,
        };
        if !compatible {
            return false;
        }
        let Some(layer) = self
            .views
            .get_mut(&from)
            .and_then(|v| v.remove_layer(control))
        else {
            return false;
        };
        let moved = self
            .views
            .get_mut(&to)
            .is_some_and(|v| v.adopt_layer(layer.clone()));
        if !moved && let Some(source) = self.views.get_mut(&from) {
            source.adopt_layer(layer);
        }
        tracing::debug!(
            target: "geoview.workspace",
            %from,
            %to,
            control = control.0,
            moved,
            "layer move"
        );
        moved
    }

    /// The view that last took focus.
    #[must_use]
    pub fn last_active_view(&self) -> Option<ViewId> {
        self.ctx
            .registry
            .last_active()
            .filter(|id| self.views.contains_key(id))
    }

    /// Mark the start or end of a bulk load across all views.
    pub fn set_bulk_loading(&self, loading: bool) {
        self.ctx.bulk_load.set(loading);
    }

    #[must_use]
    pub fn bulk_load(&self) -> &BulkLoadFlag {
        &self.ctx.bulk_load
    }

    #[must_use]
    pub fn bus(&self) -> &SharingBus {
        &self.ctx.bus
    }

    #[must_use]
    pub fn registry(&self) -> &PeerRegistry {
        &self.ctx.registry
    }

    #[must_use]
    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }
}
