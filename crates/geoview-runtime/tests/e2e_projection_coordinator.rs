#![forbid(unsafe_code)]

//! End-to-end tests for map projection handling: user changes, history
//! labels, undo, data-driven adoption, catalog lookup and globe recentering.
//!
//! Run:
//!   cargo test -p geoview-runtime --test e2e_projection_coordinator

use std::sync::Arc;

use geoview_core::property::ids;
use geoview_core::{AspectRatio, CameraMatrix, DisplayableId, LayerControl, ViewChange, ViewKind};
use geoview_harness::fixtures::{self, degenerate, lambert_conus, mercator, sliver, world};
use geoview_harness::{ControlEvent, EngineCall, EngineProbe, RecordingControl, RecordingEngineFactory};
use geoview_runtime::{
    CoordinatorConfig, DEFAULT_LABEL, ProjectionChange, ProjectionRequest, ViewContext,
    ViewCoordinator, ViewProperties,
};

fn map_view_with(config: CoordinatorConfig, kind: ViewKind) -> (ViewCoordinator, EngineProbe) {
    let engines = Arc::new(RecordingEngineFactory::new());
    let mut view = ViewCoordinator::new(kind, ViewContext::new(engines.clone()), config);
    view.initialize();
    let probe = engines.probe(view.id()).expect("engine created");
    (view, probe)
}

fn map_view() -> (ViewCoordinator, EngineProbe) {
    map_view_with(CoordinatorConfig::default(), ViewKind::map())
}

fn labels(view: &ViewCoordinator) -> Vec<String> {
    view.projection_history()
        .into_iter()
        .map(|e| e.label)
        .collect()
}

// ============================================================================
// User changes and history
// ============================================================================

#[test]
fn first_projection_has_no_default_entry() {
    let (mut view, probe) = map_view();
    let outcome = view.set_projection(ProjectionRequest::new(world()).label("World"));
    assert_eq!(outcome, ProjectionChange::Changed);
    assert_eq!(view.current_projection(), Some(&world()));
    assert_eq!(view.current_projection_label(), Some("World"));
    assert_eq!(labels(&view), vec!["World"]);
    assert_eq!(view.command_count(), 0, "nothing to undo back to");
    assert_eq!(probe.projection(), Some(world()));
    assert!(probe.is_active());
}

#[test]
fn initial_projection_becomes_default_in_history() {
    let (mut view, _probe) = map_view();
    view.set_initial_projection(world(), Some("World".into()));
    assert!(view.projection_history().is_empty());

    view.set_projection(ProjectionRequest::new(lambert_conus()).label("CONUS"));
    assert_eq!(labels(&view), vec!["CONUS", DEFAULT_LABEL]);
    assert_eq!(view.command_count(), 1);
}

#[test]
fn undo_restores_projection_and_label() {
    let (mut view, probe) = map_view();
    view.set_initial_projection(world(), Some("World".into()));
    view.set_projection(ProjectionRequest::new(lambert_conus()).label("CONUS"));

    assert!(view.undo());
    assert_eq!(view.current_projection(), Some(&world()));
    assert_eq!(view.current_projection_label(), Some("World"));
    assert_eq!(probe.projection(), Some(world()));
    assert_eq!(labels(&view), vec![DEFAULT_LABEL, "CONUS"], "history keeps first label");

    assert!(view.redo());
    assert_eq!(view.current_projection(), Some(&lambert_conus()));
    assert_eq!(view.current_projection_label(), Some("CONUS"));
    assert_eq!(view.command_count(), 1);
}

#[test]
fn redo_restores_resolved_label() {
    let (mut view, _probe) = map_view();
    view.set_initial_projection(world(), Some("World".into()));
    view.set_projection(ProjectionRequest::new(mercator()));
    let resolved = view.current_projection_label().map(String::from);
    assert_eq!(resolved.as_deref(), Some(mercator().name()));

    assert!(view.undo());
    assert_eq!(view.current_projection_label(), Some("World"));
    assert!(view.redo());
    assert_eq!(view.current_projection(), Some(&mercator()));
    assert_eq!(view.current_projection_label(), resolved.as_deref());
}

#[test]
fn equal_projection_rehomes_camera() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()).label("World"));
    probe.move_camera(CameraMatrix::scaled(4.0));

    let outcome = view.set_projection(ProjectionRequest::new(world().renamed("Copy")));
    assert_eq!(outcome, ProjectionChange::Unchanged);
    assert_eq!(probe.camera(), CameraMatrix::identity());
    assert_eq!(view.current_projection_label(), Some("World"));
    assert_eq!(labels(&view), vec!["World"]);
    assert_eq!(view.command_count(), 1, "equal requests are still recorded");
}

#[test]
fn preserving_viewpoint_skips_rehome() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    probe.move_camera(CameraMatrix::scaled(4.0));
    view.set_projection(ProjectionRequest::new(world()).preserve_viewpoint(true));
    assert_eq!(probe.camera(), CameraMatrix::scaled(4.0));
    assert_eq!(probe.count(|c| *c == EngineCall::ResetProjection), 0);
}

#[test]
fn projection_swap_rehomes_by_default() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    probe.move_camera(CameraMatrix::scaled(4.0));
    probe.clear_calls();

    let outcome = view.set_projection(ProjectionRequest::new(mercator()));
    assert_eq!(outcome, ProjectionChange::Changed);
    assert_eq!(probe.camera(), CameraMatrix::identity());
    assert_eq!(probe.count(|c| *c == EngineCall::ResetProjection), 1);
    assert_eq!(probe.count(|c| matches!(c, EngineCall::SetCamera(_))), 0);
}

#[test]
fn camera_survives_projection_swap_when_preserved() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    let moved = CameraMatrix::scaled(3.0);
    probe.move_camera(moved.clone());
    probe.clear_calls();

    view.set_projection(ProjectionRequest::new(mercator()).preserve_viewpoint(true));
    assert_eq!(probe.camera(), moved);
    assert_eq!(probe.count(|c| *c == EngineCall::SetCamera(moved.clone())), 1);
    assert_eq!(probe.count(|c| *c == EngineCall::ResetProjection), 0);
    let calls = probe.calls();
    assert_eq!(calls.first(), Some(&EngineCall::SetActive(false)));
    assert_eq!(calls.last(), Some(&EngineCall::SetActive(true)));
}

#[test]
fn aspect_follows_engine_unless_kept() {
    let (mut view, probe) = map_view();
    view.set_aspect_ratio(AspectRatio::new(1.0, 1.0, 0.5));
    probe.set_aspect(AspectRatio::new(2.0, 1.0, 1.0));
    view.set_projection(ProjectionRequest::new(world()));
    assert_eq!(view.aspect_ratio(), Some(AspectRatio::new(2.0, 1.0, 1.0)));

    let mut config = CoordinatorConfig::default();
    config.keep_aspect_on_projection_change = true;
    let (mut kept, kept_probe) = map_view_with(config, ViewKind::map());
    kept.set_aspect_ratio(AspectRatio::new(1.0, 1.0, 0.5));
    kept_probe.set_aspect(AspectRatio::new(2.0, 1.0, 1.0));
    kept.set_projection(ProjectionRequest::new(world()));
    assert_eq!(kept_probe.aspect(), AspectRatio::new(1.0, 1.0, 0.5));
    assert_eq!(kept.aspect_ratio(), Some(AspectRatio::new(1.0, 1.0, 0.5)));
}

#[test]
fn layers_hear_about_projection_changes() {
    let (mut view, _probe) = map_view();
    let control = RecordingControl::new(1, "Radar").shared();
    view.add_layer(control.clone(), DisplayableId(1));
    view.set_projection(ProjectionRequest::new(world()));
    view.set_projection(ProjectionRequest::new(mercator()));
    assert_eq!(
        control.count(|e| matches!(e, ControlEvent::ViewChanged(_, ViewChange::Projection))),
        2
    );
}

#[test]
fn missing_projection_is_rejected() {
    let (mut view, probe) = map_view();
    assert_eq!(
        view.set_projection(ProjectionRequest::maybe(None)),
        ProjectionChange::Rejected
    );
    assert!(view.current_projection().is_none());
    assert!(probe.calls().iter().all(|c| !matches!(c, EngineCall::SetProjection(_))));
}

#[test]
fn non_map_views_reject_projections() {
    let (mut view, _probe) = map_view_with(CoordinatorConfig::default(), ViewKind::transect());
    assert_eq!(
        view.set_projection(ProjectionRequest::new(world())),
        ProjectionChange::Rejected
    );
    assert!(view.projection_history().is_empty());
}

#[test]
fn engine_failure_keeps_bookkeeping() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    probe.fail("set_projection");
    assert_eq!(
        view.set_projection(ProjectionRequest::new(mercator())),
        ProjectionChange::Changed
    );
    assert_eq!(view.current_projection(), Some(&mercator()));
    assert_eq!(probe.projection(), Some(world()));
    assert!(probe.is_active(), "engine reactivated after failure");
}

// ============================================================================
// Data-driven projections
// ============================================================================

#[test]
fn new_layer_projection_is_adopted() {
    let (mut view, _probe) = map_view();
    let control = RecordingControl::new(1, "Satellite")
        .with_projection(lambert_conus())
        .shared();
    view.add_layer(control, DisplayableId(1));
    assert_eq!(view.current_projection(), Some(&lambert_conus()));
    assert_eq!(view.current_projection_label(), Some("Satellite"));
}

#[test]
fn unreasonable_data_projections_are_ignored() {
    let (mut view, _probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    for (i, p) in [degenerate(), sliver()].into_iter().enumerate() {
        let control = RecordingControl::new(i as u64, "bad").with_projection(p).shared();
        view.add_layer(control, DisplayableId(i as u64));
    }
    assert_eq!(view.current_projection(), Some(&world()));
}

#[test]
fn data_projection_respects_opt_outs() {
    let (mut view, _probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    view.set_do_not_set_projection(true);
    assert!(!view.display_projection_ok(Some(&lambert_conus())));
    let control = RecordingControl::new(1, "A").with_projection(lambert_conus()).shared();
    view.add_layer(control.clone(), DisplayableId(1));
    assert_eq!(view.current_projection(), Some(&world()));

    view.set_do_not_set_projection(false);
    view.set_boolean_property(ids::AUTO_PROJECTION, false);
    assert_eq!(
        view.layer_data_changed(control.id(), false),
        ProjectionChange::Rejected
    );
    assert_eq!(view.current_projection(), Some(&world()));

    view.set_boolean_property(ids::AUTO_PROJECTION, true);
    assert_eq!(
        view.layer_data_changed(control.id(), false),
        ProjectionChange::Changed
    );
    assert_eq!(view.current_projection(), Some(&lambert_conus()));
}

#[test]
fn later_data_changes_keep_viewpoint() {
    let (mut view, probe) = map_view();
    let control = RecordingControl::new(1, "A").with_projection(world()).shared();
    view.add_layer(control.clone(), DisplayableId(1));
    probe.move_camera(CameraMatrix::scaled(5.0));
    control.set_data_projection(Some(mercator()));
    assert_eq!(
        view.layer_data_changed(control.id(), false),
        ProjectionChange::Changed
    );
    assert_eq!(probe.camera(), CameraMatrix::scaled(5.0));
}

#[test]
fn initial_layer_load_returns_camera_home() {
    let (mut view, probe) = map_view();
    view.set_projection(ProjectionRequest::new(world()));
    probe.move_camera(CameraMatrix::scaled(5.0));
    let control = RecordingControl::new(1, "A").with_projection(mercator()).shared();
    view.add_layer(control, DisplayableId(1));
    assert_eq!(view.current_projection(), Some(&mercator()));
    assert_eq!(probe.camera(), CameraMatrix::identity());
}

#[test]
fn bulk_load_defers_data_projection() {
    let engines = Arc::new(RecordingEngineFactory::new());
    let ctx = ViewContext::new(engines);
    let mut view = ViewCoordinator::new(ViewKind::map(), ctx.clone(), CoordinatorConfig::default());
    view.initialize();
    ctx.bulk_load.set(true);
    let control = RecordingControl::new(1, "A").with_projection(lambert_conus()).shared();
    view.add_layer(control, DisplayableId(1));
    assert!(view.current_projection().is_none());
    ctx.bulk_load.set(false);
}

#[test]
fn first_displayable_layer_wins() {
    let (mut view, _probe) = map_view();
    view.set_boolean_property(ids::AUTO_PROJECTION, false);
    let bad: Arc<dyn LayerControl> = RecordingControl::new(1, "Bad").with_projection(degenerate()).shared();
    let good: Arc<dyn LayerControl> = RecordingControl::new(2, "Good").with_projection(mercator()).shared();
    view.add_layer(bad, DisplayableId(1));
    view.add_layer(good, DisplayableId(2));
    assert!(view.current_projection().is_none());

    assert_eq!(view.set_projection_from_first_layer(), ProjectionChange::Changed);
    assert_eq!(view.current_projection(), Some(&mercator()));
    assert_eq!(view.current_projection_label(), Some("Good"));
}

// ============================================================================
// Catalog and initial projection
// ============================================================================

#[test]
fn catalog_lookup_by_name_and_pattern() {
    let (mut view, _probe) = map_view();
    view.set_projection_catalog(fixtures::catalog());
    assert_eq!(view.set_projection_by_name("us>c*"), ProjectionChange::Changed);
    assert_eq!(view.current_projection(), Some(&lambert_conus()));
    assert_eq!(view.current_projection_label(), Some("US>CONUS"));
    assert_eq!(view.set_projection_by_name("Mollweide"), ProjectionChange::Rejected);
}

#[test]
fn initial_projection_property_applies_on_initialize() {
    let engines = Arc::new(RecordingEngineFactory::new());
    let mut view = ViewCoordinator::new(
        ViewKind::map(),
        ViewContext::new(engines.clone()),
        CoordinatorConfig::default(),
    );
    view.set_projection_catalog(fixtures::catalog());
    let props = ViewProperties::parse("initialProjection=World Mercator;name=Main").unwrap();
    assert!(view.apply_properties(&props));
    assert!(view.current_projection().is_none());

    view.initialize();
    assert_eq!(view.current_projection(), Some(&mercator()));
    assert_eq!(view.current_projection_label(), Some("World Mercator"));
    assert_eq!(view.command_count(), 0);
    assert_eq!(
        engines.probe(view.id()).unwrap().projection(),
        Some(mercator())
    );
    assert!(view.is_named("Main"));
}

// ============================================================================
// Globe
// ============================================================================

#[test]
fn globe_recenters_instead_of_reprojecting() {
    let (mut view, probe) = map_view_with(CoordinatorConfig::default(), ViewKind::globe());
    let outcome = view.set_projection(ProjectionRequest::new(lambert_conus()));
    assert_eq!(outcome, ProjectionChange::Recentered);
    assert!(view.current_projection().is_none());
    assert_eq!(
        probe.count(|c| *c == EngineCall::CenterOn(lambert_conus().center())),
        1
    );
}

#[test]
fn auto_rotating_globe_reprojects() {
    let (mut view, _probe) = map_view_with(CoordinatorConfig::default(), ViewKind::globe());
    view.set_boolean_property(ids::AUTO_ROTATE, true);
    assert_eq!(
        view.set_projection(ProjectionRequest::new(lambert_conus())),
        ProjectionChange::Changed
    );
}
