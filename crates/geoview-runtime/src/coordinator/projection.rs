#![forbid(unsafe_code)]

//! Map projection selection for map views.
//!
//! # State machine
//!
//! ```text
//!                  set_projection(p)
//!   no projection ------------------> current = p, history = [p]
//!   current = q   --(p == q)--------> re-home camera (unless preserving), Unchanged
//!   current = q   --(p != q)--------> history gains "Default" q on first change,
//!                                     current = p, history front = p, Changed
//!   globe, no auto-rotate ----------> recenter on p's center, Recentered
//! ```
//!
//! # Invariants
//!
//! - Once any projection change happened, the current projection is in the
//!   history.
//! - The camera matrix captured before a swap is reapplied after it.
//! - A projection command is recorded before state changes, so undo sees the
//!   prior projection and label.
//! - Engine failures are logged; bookkeeping is never rolled back.

use geoview_core::property::ids;
use geoview_core::{Projection, ViewChange, display_projection_ok};

use super::ViewCoordinator;
use super::commands::ViewCommand;
use crate::message::SharePayload;
use crate::projection_history::{HistoryEntry, ProjectionHistory};

/// Label inserted for the projection a view started with.
pub const DEFAULT_LABEL: &str = "Default";

/// Projection state carried by map views.
#[derive(Debug, Clone, Default)]
pub struct ProjectionPolicy {
    pub(super) current: Option<Projection>,
    pub(super) current_label: Option<String>,
    pub(super) history: ProjectionHistory,
    pub(super) catalog: Vec<Projection>,
    pub(super) do_not_set_projection: bool,
    pub(super) initial: Option<String>,
}

impl ProjectionPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Projection> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_label(&self) -> Option<&str> {
        self.current_label.as_deref()
    }

    #[must_use]
    pub fn history(&self) -> &ProjectionHistory {
        &self.history
    }

    #[must_use]
    pub fn catalog(&self) -> &[Projection] {
        &self.catalog
    }

    /// Find a catalog projection by exact name, then by case-insensitive
    /// `*` wildcard pattern.
    #[must_use]
    pub fn find_in_catalog(&self, name: &str) -> Option<&Projection> {
        self.catalog
            .iter()
            .find(|p| p.name() == name)
            .or_else(|| self.catalog.iter().find(|p| wildcard_match(name, p.name())))
    }
}

/// Case-insensitive glob with `*` only.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let mut rest = text.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Parameters for [`ViewCoordinator::set_projection`].
#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    projection: Option<Projection>,
    label: Option<String>,
    from_user: bool,
    check_default: bool,
    record_command: bool,
    preserve_viewpoint: bool,
}

impl ProjectionRequest {
    /// A user-initiated change that is recorded for undo.
    #[must_use]
    pub fn new(projection: Projection) -> Self {
        Self::maybe(Some(projection))
    }

    /// Like [`ProjectionRequest::new`] but accepting a missing projection,
    /// which is rejected when applied.
    #[must_use]
    pub fn maybe(projection: Option<Projection>) -> Self {
        Self {
            projection,
            label: None,
            from_user: true,
            check_default: false,
            record_command: true,
            preserve_viewpoint: false,
        }
    }

    /// History label; defaults to the projection's name.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn label_opt(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    /// User-initiated changes are shared with peers.
    #[must_use]
    pub fn from_user(mut self, on: bool) -> Self {
        self.from_user = on;
        self
    }

    /// Only apply when the view takes its projection from data.
    #[must_use]
    pub fn check_default(mut self, on: bool) -> Self {
        self.check_default = on;
        self
    }

    #[must_use]
    pub fn record_command(mut self, on: bool) -> Self {
        self.record_command = on;
        self
    }

    /// When the projection is unchanged, keep the camera where it is instead
    /// of returning it home.
    #[must_use]
    pub fn preserve_viewpoint(mut self, on: bool) -> Self {
        self.preserve_viewpoint = on;
        self
    }
}

/// Outcome of [`ViewCoordinator::set_projection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionChange {
    /// A new projection is current.
    Changed,
    /// The requested projection equals the current one.
    Unchanged,
    /// The globe was rotated to face the projection's center instead.
    Recentered,
    /// Nothing happened: not a map view, not ready, no projection, or the
    /// data-default check failed.
    Rejected,
}

impl ProjectionChange {
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

impl ViewCoordinator {
    /// The projection policy, for map views.
    #[must_use]
    pub fn projection_policy(&self) -> Option<&ProjectionPolicy> {
        self.projection.as_ref()
    }

    #[must_use]
    pub fn current_projection(&self) -> Option<&Projection> {
        self.projection.as_ref().and_then(ProjectionPolicy::current)
    }

    #[must_use]
    pub fn current_projection_label(&self) -> Option<&str> {
        self.projection
            .as_ref()
            .and_then(ProjectionPolicy::current_label)
    }

    /// Projection history, most recent first. Empty for non-map views.
    #[must_use]
    pub fn projection_history(&self) -> Vec<HistoryEntry> {
        self.projection
            .as_ref()
            .map(|p| p.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Install the starting projection without recording history, commands
    /// or touching peers. Used when restoring saved state.
    pub fn set_initial_projection(&mut self, projection: Projection, label: Option<String>) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let Some(policy) = self.projection.as_mut() else {
            return false;
        };
        policy.current = Some(projection);
        policy.current_label = label;
        true
    }

    /// Replace the named-projection catalog.
    pub fn set_projection_catalog(&mut self, catalog: Vec<Projection>) {
        if let Some(policy) = self.projection.as_mut() {
            policy.catalog = catalog;
        }
    }

    /// Refuse data-driven projection changes.
    pub fn set_do_not_set_projection(&mut self, on: bool) {
        if let Some(policy) = self.projection.as_mut() {
            policy.do_not_set_projection = on;
        }
    }

    pub(crate) fn set_pending_initial_projection(&mut self, name: String) {
        if let Some(policy) = self.projection.as_mut() {
            policy.initial = Some(name);
        }
    }

    pub(crate) fn apply_pending_initial_projection(&mut self) {
        let Some(name) = self.projection.as_mut().and_then(|p| p.initial.take()) else {
            return;
        };
        let Some(projection) = self
            .projection
            .as_ref()
            .and_then(|p| p.find_in_catalog(&name))
            .cloned()
        else {
            tracing::debug!(target: "geoview.coordinator", view = %self.id, %name, "initial projection not in catalog");
            return;
        };
        self.set_initial_projection(projection, Some(name));
    }

    /// Whether a data-supplied projection may be adopted by this view.
    #[must_use]
    pub fn display_projection_ok(&self, candidate: Option<&Projection>) -> bool {
        if self
            .projection
            .as_ref()
            .is_some_and(|p| p.do_not_set_projection)
        {
            return false;
        }
        display_projection_ok(candidate)
    }

    /// Make `request`'s projection current.
    pub fn set_projection(&mut self, request: ProjectionRequest) -> ProjectionChange {
        if !self.is_ready() {
            return ProjectionChange::Rejected;
        }
        let Some(policy) = self.projection.as_ref() else {
            return ProjectionChange::Rejected;
        };
        if request.check_default
            && (!self.properties.value(ids::AUTO_PROJECTION).unwrap_or(true)
                || policy.do_not_set_projection)
        {
            return ProjectionChange::Rejected;
        }
        let Some(projection) = request.projection else {
            return ProjectionChange::Rejected;
        };

        let span = tracing::debug_span!(
            target: "geoview.coordinator",
            "set_projection",
            view = %self.id,
            projection = %projection.name(),
            from_user = request.from_user
        );
        let _enter = span.enter();

        if self.kind.globe && !self.properties.value(ids::AUTO_ROTATE).unwrap_or(false) {
            let center = projection.center();
            self.with_engine("center_on", |e| e.center_on(center));
            return ProjectionChange::Recentered;
        }

        let matrix = if request.preserve_viewpoint {
            self.display_matrix()
        } else {
            None
        };
        self.with_engine("set_active", |e| e.set_active(false));

        let label = request
            .label
            .clone()
            .unwrap_or_else(|| projection.name().to_string());
        if request.record_command
            && let Some(policy) = self.projection.as_ref()
            && let Some(before) = policy.current.clone()
        {
            let command = ViewCommand::Projection {
                before,
                before_label: policy.current_label.clone(),
                after: projection.clone(),
                after_label: Some(label.clone()),
            };
            self.push_command(command);
        }

        let unchanged = self
            .projection
            .as_ref()
            .and_then(|p| p.current.as_ref())
            .is_some_and(|current| *current == projection);

        let outcome = if unchanged {
            if !request.preserve_viewpoint {
                self.with_engine("reset_projection", |e| e.reset_projection());
            }
            ProjectionChange::Unchanged
        } else {
            if let Some(policy) = self.projection.as_mut() {
                if policy.history.is_empty()
                    && let Some(previous) = policy.current.clone()
                {
                    policy.history.add(previous, DEFAULT_LABEL);
                }
                policy.history.add(projection.clone(), label.clone());
                policy.current = Some(projection.clone());
                policy.current_label = Some(label.clone());
            }
            if request.from_user {
                self.share(SharePayload::Projection {
                    projection: projection.clone(),
                    label: Some(label),
                });
            }
            if self
                .with_engine("set_projection", |e| e.set_projection(&projection))
                .is_some()
            {
                let prior_aspect = self.aspect;
                match prior_aspect {
                    Some(aspect) if self.config.keep_aspect_on_projection_change => {
                        self.with_engine("set_display_aspect", |e| e.set_display_aspect(aspect));
                    }
                    _ => {
                        if let Some(aspect) = self.with_engine("display_aspect", |e| e.display_aspect()) {
                            self.aspect = Some(aspect);
                        }
                    }
                }
                match matrix.as_ref() {
                    Some(matrix) => {
                        self.with_engine("set_camera_matrix", |e| e.set_camera_matrix(matrix));
                    }
                    None => {
                        self.with_engine("reset_projection", |e| e.reset_projection());
                    }
                }
            }
            self.notify_layers(ViewChange::Projection);
            self.fill_legends();
            ProjectionChange::Changed
        };

        self.update_display_list();
        self.with_engine("set_active", |e| e.set_active(true));
        tracing::debug!(target: "geoview.coordinator", view = %self.id, ?outcome, "projection request applied");
        outcome
    }

    /// Force the current label after replaying a command, so undo restores
    /// the label exactly even when the history kept an older one.
    pub(crate) fn restore_projection_label(&mut self, label: Option<String>) {
        if let Some(policy) = self.projection.as_mut() {
            policy.current_label = label;
        }
    }

    /// Adopt the projection of the first layer whose data projection is
    /// displayable.
    pub fn set_projection_from_first_layer(&mut self) -> ProjectionChange {
        if !self.is_ready() {
            return ProjectionChange::Rejected;
        }
        let candidate = self.layers.iter().find_map(|layer| {
            let projection = layer.control().data_projection()?;
            self.display_projection_ok(Some(&projection))
                .then(|| (projection, layer.control().label()))
        });
        match candidate {
            Some((projection, label)) => {
                self.set_projection(ProjectionRequest::new(projection).label(label))
            }
            None => ProjectionChange::Rejected,
        }
    }

    /// Apply a catalog projection by name.
    pub fn set_projection_by_name(&mut self, name: &str) -> ProjectionChange {
        let Some(projection) = self
            .projection
            .as_ref()
            .and_then(|p| p.find_in_catalog(name))
            .cloned()
        else {
            tracing::debug!(target: "geoview.coordinator", view = %self.id, %name, "no catalog projection matches");
            return ProjectionChange::Rejected;
        };
        let label = projection.name().to_string();
        self.set_projection(ProjectionRequest::new(projection).label(label))
    }

    /// A layer's data changed; adopt its projection when the view takes its
    /// projection from data.
    ///
    /// Initial loads return the camera home; later changes keep the current
    /// viewpoint.
    pub fn layer_data_changed(
        &mut self,
        control: geoview_core::ControlId,
        from_initial_load: bool,
    ) -> ProjectionChange {
        if !self.is_ready() || self.projection.is_none() || self.ctx.bulk_load.is_loading() {
            return ProjectionChange::Rejected;
        }
        if !self.properties.value(ids::AUTO_PROJECTION).unwrap_or(true) {
            return ProjectionChange::Rejected;
        }
        let Some(layer) = self.layers.get(control) else {
            return ProjectionChange::Rejected;
        };
        let label = layer.control().label();
        let Some(projection) = layer.control().data_projection() else {
            return ProjectionChange::Rejected;
        };
        if !self.kind.globe && !self.display_projection_ok(Some(&projection)) {
            return ProjectionChange::Rejected;
        }
        if !self.kind.globe && self.current_projection() == Some(&projection) {
            return ProjectionChange::Unchanged;
        }
        self.set_projection(
            ProjectionRequest::new(projection)
                .label(label)
                .check_default(true)
                .preserve_viewpoint(!from_initial_load),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards() {
        assert!(wildcard_match("lambert*", "Lambert CONUS"));
        assert!(wildcard_match("*conus", "Lambert CONUS"));
        assert!(wildcard_match("*bert*", "Lambert CONUS"));
        assert!(wildcard_match("l*t c*s", "Lambert CONUS"));
        assert!(!wildcard_match("merc*", "Lambert CONUS"));
        assert!(wildcard_match("WORLD", "world"));
        assert!(!wildcard_match("world", "world 2"));
    }

    #[test]
    fn catalog_prefers_exact_name() {
        let mut policy = ProjectionPolicy::new();
        policy.catalog = vec![
            Projection::new("latlon", "World*"),
            Projection::new("mercator", "World Mercator"),
        ];
        assert_eq!(
            policy.find_in_catalog("World*").map(Projection::family),
            Some("latlon")
        );
        assert_eq!(
            policy.find_in_catalog("world m*").map(Projection::family),
            Some("mercator")
        );
        assert!(policy.find_in_catalog("polar").is_none());
    }

    #[test]
    fn request_defaults() {
        let r = ProjectionRequest::new(Projection::new("latlon", "x"));
        assert!(r.from_user && r.record_command);
        assert!(!r.check_default && !r.preserve_viewpoint);
        assert!(ProjectionRequest::maybe(None).projection.is_none());
    }
}
