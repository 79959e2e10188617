#![forbid(unsafe_code)]

//! End-to-end tests for a single view: initialization, layers, engine events,
//! undo, visibility animation and teardown.
//!
//! Run:
//!   cargo test -p geoview-runtime --test e2e_view_lifecycle

use std::collections::BTreeMap;
use std::sync::Arc;

use geoview_core::property::ids;
use geoview_core::{
    CameraMatrix, DisplayableId, EngineEvent, KeyCode, LayerControl, PointerButton, Rgb,
    ScreenBounds, ViewKind,
};
use geoview_harness::{
    ControlEvent, EngineCall, ObserverEvent, RecordingControl, RecordingEngineFactory,
    RecordingObserver, StormPattern, generate_storm,
};
use geoview_harness::fixtures::{mercator, world};
use geoview_runtime::{
    CoordinatorConfig, ProjectionChange, ProjectionRequest, ViewContext, ViewCoordinator,
};
use web_time::Duration;

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    engines: Arc<RecordingEngineFactory>,
    observer: Arc<RecordingObserver>,
    ctx: ViewContext,
}

fn fixture() -> Fixture {
    let engines = Arc::new(RecordingEngineFactory::new());
    let observer = Arc::new(RecordingObserver::new());
    let ctx = ViewContext::new(engines.clone()).with_observer(observer.clone());
    Fixture {
        engines,
        observer,
        ctx,
    }
}

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_busy_grace(Duration::ZERO)
        .with_legend_refill_delay(Duration::from_millis(40))
        .with_resize_settle(Duration::from_millis(30))
        .with_visibility_interval(Duration::from_millis(20))
}

fn ready_view(fx: &Fixture, kind: ViewKind) -> ViewCoordinator {
    let mut view = ViewCoordinator::new(kind, fx.ctx.clone(), fast_config());
    assert!(view.initialize());
    view
}

fn layer(id: u64, label: &str) -> Arc<RecordingControl> {
    RecordingControl::new(id, label).shared()
}

const WAIT: Duration = Duration::from_secs(3);

// ============================================================================
// Initialization
// ============================================================================

#[test]
fn initialize_acquires_engine_and_applies_state() {
    let fx = fixture();
    let mut view = ViewCoordinator::new(ViewKind::map(), fx.ctx.clone(), fast_config());
    assert!(!view.has_engine());
    assert!(!view.is_ready());
    assert!(fx.ctx.registry.kind_of(view.id()).is_some());

    assert!(view.initialize());
    assert!(view.initialize(), "initialize is idempotent");
    assert_eq!(fx.engines.created(), 1);

    let probe = fx.engines.probe(view.id()).expect("engine created");
    assert_eq!(probe.colors(), Some((Rgb::WHITE, Rgb::BLACK)));
    assert_eq!(probe.feature(ids::WIREFRAME), Some(true));
    assert_eq!(probe.feature(ids::SHOW_SCALES), Some(false));
    assert!(fx.ctx.bus.is_subscribed(view.id()));
    assert!(!fx.ctx.bus.is_sharing(view.id()));
}

#[test]
fn transect_views_have_no_map_toggles() {
    let fx = fixture();
    let view = ready_view(&fx, ViewKind::transect());
    assert!(view.properties().contains(ids::WIREFRAME));
    assert!(!view.properties().contains(ids::AUTO_PROJECTION));
    assert!(view.projection_policy().is_none());
}

#[test]
fn saved_toggles_before_initialize_become_session_overrides() {
    let fx = fixture();
    let mut view = ViewCoordinator::new(ViewKind::map(), fx.ctx.clone(), fast_config());
    view.set_boolean_properties_for_persistence(BTreeMap::from([(
        ids::WIREFRAME.to_string(),
        false,
    )]));
    view.initialize();
    assert!(!view.boolean_property(ids::WIREFRAME));
    let probe = fx.engines.probe(view.id()).unwrap();
    assert_eq!(probe.feature(ids::WIREFRAME), Some(false));
    assert_eq!(
        view.boolean_properties_for_persistence().get(ids::WIREFRAME),
        Some(&false)
    );
}

#[test]
fn toggles_reach_the_engine() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let probe = fx.engines.probe(view.id()).unwrap();
    assert!(view.set_boolean_property(ids::PERSPECTIVE, true));
    assert_eq!(probe.feature(ids::PERSPECTIVE), Some(true));
    assert!(!view.set_boolean_property(ids::PERSPECTIVE, true), "no-op set");
    assert!(view.set_sharing(true));
    assert!(fx.ctx.bus.is_sharing(view.id()));
}

// ============================================================================
// Layers, legends and the display list
// ============================================================================

#[test]
fn layers_are_added_once_and_removed() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let probe = fx.engines.probe(view.id()).unwrap();
    let a = layer(1, "Temperature");
    let b = layer(2, "Winds");

    assert!(view.add_layer(a.clone(), DisplayableId(10)));
    assert!(!view.add_layer(a.clone(), DisplayableId(11)), "duplicate control");
    assert!(view.add_layer(b.clone(), DisplayableId(20)));
    assert_eq!(probe.displayables(), vec![DisplayableId(10), DisplayableId(20)]);

    let labels: Vec<_> = view.legend_entries().iter().map(|e| e.label.clone()).collect();
    assert_eq!(labels, vec!["Temperature", "Winds"]);
    assert_eq!(
        fx.observer
            .count(|e| matches!(e, ObserverEvent::Timelines(v) if *v == view.id())),
        2
    );

    let removed = view.remove_layer(a.id()).expect("layer present");
    assert_eq!(removed.displayable(), DisplayableId(10));
    assert_eq!(probe.displayables(), vec![DisplayableId(20)]);
    assert_eq!(view.layers().len(), 1);
    assert!(view.remove_layer(a.id()).is_none());
}

#[test]
fn batch_add_fills_legends_once() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let before = view.legend_fill_count();
    let batch: Vec<(Arc<dyn LayerControl>, DisplayableId)> = (0..5)
        .map(|i| (layer(i, &format!("L{i}")) as Arc<dyn LayerControl>, DisplayableId(i)))
        .collect();
    assert_eq!(view.add_layers(batch), 5);
    assert_eq!(view.legend_fill_count(), before + 1);
    assert_eq!(view.legend_entries().len(), 5);
}

#[test]
fn display_list_tracks_visible_layers() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    fx.engines
        .probe(view.id())
        .unwrap()
        .set_bounds(ScreenBounds::from_size(800, 600));
    view.add_layer(layer(1, "Shown"), DisplayableId(1));
    view.add_layer(RecordingControl::new(2, "Hidden").hidden().shared(), DisplayableId(2));
    view.add_layer(
        RecordingControl::new(3, "Unlisted").without_legend().shared(),
        DisplayableId(3),
    );

    let overlay = view.display_list();
    assert_eq!(overlay.labels, vec!["Shown".to_string()]);
    assert_eq!(overlay.anchor_x, 400);
    assert_eq!(overlay.anchor_y, 600 - 14);

    view.set_boolean_property(ids::SHOW_DISPLAY_LIST, false);
    assert!(view.display_list().labels.is_empty());
}

#[test]
fn bulk_load_coalesces_legend_refills() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::transect());
    let before = view.legend_fill_count();
    fx.ctx.bulk_load.set(true);
    for i in 0..10 {
        view.add_layer(layer(i, &format!("L{i}")), DisplayableId(i));
    }
    assert_eq!(view.legend_fill_count(), before);
    assert!(view.legend_refill_pending());

    assert!(view.pump_until(WAIT, |v| v.legend_fill_count() == before + 1));
    view.pump_for(Duration::from_millis(150));
    assert_eq!(view.legend_fill_count(), before + 1);
    assert_eq!(view.legend_entries().len(), 10);
    fx.ctx.bulk_load.set(false);
}

// ============================================================================
// Engine events
// ============================================================================

#[test]
fn first_frame_notifies_layers_once() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let a = layer(1, "A");
    view.add_layer(a.clone(), DisplayableId(1));
    view.on_engine_event(EngineEvent::FrameRendered);
    view.on_engine_event(EngineEvent::FrameRendered);
    assert!(view.first_frame_done());
    assert!(view.last_frame_at().is_some());
    assert_eq!(
        a.count(|e| matches!(e, ControlEvent::FirstFrame(_))),
        1
    );
}

#[test]
fn camera_drag_records_undoable_command() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let probe = fx.engines.probe(view.id()).unwrap();
    let moved = CameraMatrix::scaled(2.0);

    view.on_engine_event(EngineEvent::PointerDown(PointerButton::Primary));
    probe.move_camera(moved.clone());
    view.on_engine_event(EngineEvent::PointerUp(PointerButton::Primary));
    assert_eq!(view.command_count(), 1);
    assert!(view.can_undo());

    assert!(view.undo());
    assert_eq!(probe.camera(), CameraMatrix::identity());
    assert!(view.can_redo());
    assert!(view.redo());
    assert_eq!(probe.camera(), moved);
    assert_eq!(view.command_count(), 1, "replay records nothing");
    assert!(!view.redo());
}

#[test]
fn click_without_drag_records_nothing() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    view.on_engine_event(EngineEvent::PointerDown(PointerButton::Primary));
    view.on_engine_event(EngineEvent::PointerUp(PointerButton::Primary));
    assert_eq!(view.command_count(), 0);
    assert!(!view.undo());
}

#[test]
fn busy_reports_drive_the_indicator() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    view.on_engine_event(EngineEvent::BusyBegin);
    view.on_engine_event(EngineEvent::BusyBegin);
    view.on_engine_event(EngineEvent::BusyIdle);
    assert_eq!(fx.observer.busy_count(view.id()), 1);
    assert_eq!(fx.observer.normal_count(view.id()), 0);
    view.on_engine_event(EngineEvent::BusyIdle);
    view.on_engine_event(EngineEvent::BusyIdle);
    assert_eq!(fx.observer.normal_count(view.id()), 1);
    assert_eq!(view.wait_stats().outstanding, 0);
}

#[test]
fn quick_work_within_grace_shows_nothing() {
    let fx = fixture();
    let config = fast_config().with_busy_grace(Duration::from_millis(150));
    let mut view = ViewCoordinator::new(ViewKind::map(), fx.ctx.clone(), config);
    view.initialize();
    view.on_engine_event(EngineEvent::BusyBegin);
    view.on_engine_event(EngineEvent::BusyIdle);
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert_eq!(fx.observer.busy_count(view.id()), 0);
}

#[test]
fn resize_burst_repositions_once() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let storm = generate_storm(StormPattern::ResizeBurst { count: 25 }, 11);
    for event in storm.events {
        view.on_engine_event(event);
    }
    assert!(view.pump_until(WAIT, |v| v.resize_repositions() == 1));
    view.pump_for(Duration::from_millis(100));
    assert_eq!(view.resize_repositions(), 1);
}

#[test]
fn interaction_storm_leaves_consistent_history() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let probe = fx.engines.probe(view.id()).unwrap();
    let storm = generate_storm(StormPattern::Interaction { count: 400 }, 3);
    let mut step = 1.0;
    for event in storm.events {
        if matches!(event, EngineEvent::PointerMoved) {
            step += 1.0;
            probe.move_camera(CameraMatrix::scaled(step));
        }
        view.on_engine_event(event);
    }
    assert!(view.command_count() <= 100);
    while view.undo() {}
    assert!(!view.can_undo());
    while view.redo() {}
    assert!(!view.can_redo());
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn function_keys_toggle_layers() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let layers: Vec<_> = (0..3).map(|i| layer(i, &format!("L{i}"))).collect();
    let locked = RecordingControl::new(9, "Locked").hidden().locked().shared();
    for (i, l) in layers.iter().enumerate() {
        view.add_layer(l.clone(), DisplayableId(i as u64));
    }
    view.add_layer(locked.clone(), DisplayableId(9));

    view.on_engine_event(EngineEvent::key(KeyCode::F(3)));
    assert!(layers.iter().all(|l| !l.is_visible()));
    view.on_engine_event(EngineEvent::key(KeyCode::F(2)));
    assert!(layers.iter().all(|l| l.is_visible()));
    assert!(!locked.is_visible(), "locked layers are never touched");

    view.on_engine_event(EngineEvent::key(KeyCode::F(1)));
    assert_eq!(layers.iter().filter(|l| l.is_visible()).count(), 1);
    assert!(layers[0].is_visible());
    view.on_engine_event(EngineEvent::key(KeyCode::F(1)));
    assert!(layers[1].is_visible());
    assert!(!layers[0].is_visible());
}

#[test]
fn single_layer_step_flips_visibility() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let only = layer(1, "Only");
    view.add_layer(only.clone(), DisplayableId(1));
    view.step_visibility();
    assert!(!only.is_visible());
    view.step_visibility();
    assert!(only.is_visible());
}

#[test]
fn visibility_animation_cycles_and_stops() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let layers: Vec<_> = (0..3).map(|i| layer(i, &format!("L{i}"))).collect();
    for (i, l) in layers.iter().enumerate() {
        view.add_layer(l.clone(), DisplayableId(i as u64));
    }

    assert!(view.set_animated_visibility(true));
    assert!(!view.set_animated_visibility(true));
    assert!(view.pump_until(WAIT, |v| v.visibility_ticks() >= 4));
    assert_eq!(layers.iter().filter(|l| l.is_visible()).count(), 1);

    assert!(view.set_animated_visibility(false));
    let ticks = view.visibility_ticks();
    view.pump_for(Duration::from_millis(100));
    assert_eq!(view.visibility_ticks(), ticks);
}

#[test]
fn two_layer_animation_shows_exactly_one_per_tick() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let layers: Vec<_> = (0..2).map(|i| layer(i, &format!("L{i}"))).collect();
    for (i, l) in layers.iter().enumerate() {
        view.add_layer(l.clone(), DisplayableId(i as u64));
    }

    assert!(view.set_animated_visibility(true));
    for tick in 1..=6 {
        assert!(view.pump_until(WAIT, |v| v.visibility_ticks() >= tick));
        assert_eq!(
            layers.iter().filter(|l| l.is_visible()).count(),
            1,
            "tick {tick}"
        );
    }
    view.set_animated_visibility(false);
}

#[test]
fn animation_stops_when_no_layer_is_eligible() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let layers: Vec<_> = (0..2).map(|i| layer(i, &format!("L{i}"))).collect();
    for (i, l) in layers.iter().enumerate() {
        view.add_layer(l.clone(), DisplayableId(i as u64));
    }

    assert!(view.set_animated_visibility(true));
    assert!(view.pump_until(WAIT, |v| v.visibility_ticks() >= 2));
    for l in &layers {
        l.set_locked(true);
    }
    assert!(view.pump_until(WAIT, |v| !v.is_visibility_animating()));
    let ticks = view.visibility_ticks();
    view.pump_for(Duration::from_millis(100));
    assert_eq!(view.visibility_ticks(), ticks);
}

#[test]
fn animation_speed_has_a_floor() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    view.set_visibility_interval(Duration::from_millis(700));
    view.faster_visibility_animation();
    assert_eq!(view.visibility_interval(), Duration::from_millis(500));
    view.faster_visibility_animation();
    view.faster_visibility_animation();
    assert_eq!(view.visibility_interval(), Duration::from_millis(300));
    view.slower_visibility_animation();
    assert_eq!(view.visibility_interval(), Duration::from_millis(500));
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn destroy_is_idempotent_and_final() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    let id = view.id();
    let probe = fx.engines.probe(id).unwrap();
    let a = layer(1, "A");
    view.add_layer(a.clone(), DisplayableId(1));
    view.on_engine_event(EngineEvent::BusyBegin);

    view.destroy();
    view.destroy();

    assert!(view.is_destroyed());
    assert!(probe.is_destroyed());
    assert_eq!(probe.count(|c| *c == EngineCall::Destroy), 1);
    assert_eq!(a.count(|e| matches!(e, ControlEvent::ViewDestroyed(_))), 1);
    assert_eq!(fx.observer.count(|e| *e == ObserverEvent::Destroyed(id)), 1);
    assert_eq!(fx.observer.normal_count(id), 1, "busy indicator restored");
    assert!(fx.ctx.registry.kind_of(id).is_none());
    assert!(!fx.ctx.bus.is_subscribed(id));
    assert!(view.layers().is_empty());

    assert!(!view.add_layer(layer(2, "B"), DisplayableId(2)));
    assert!(!view.undo());
    view.on_engine_event(EngineEvent::FrameRendered);
    assert!(!view.first_frame_done());
    assert!(!view.initialize());
}

#[test]
fn destroyed_view_rejects_projection_changes() {
    let fx = fixture();
    let mut view = ready_view(&fx, ViewKind::map());
    view.set_projection(ProjectionRequest::new(world()));
    view.destroy();

    assert_eq!(
        view.set_projection(ProjectionRequest::new(mercator())),
        ProjectionChange::Rejected
    );
    assert!(view.is_destroyed());
    assert_eq!(view.current_projection(), Some(&world()));
    assert_eq!(view.command_count(), 0);
}

#[test]
fn dropping_a_view_destroys_it() {
    let fx = fixture();
    let view = ready_view(&fx, ViewKind::map());
    let id = view.id();
    let probe = fx.engines.probe(id).unwrap();
    drop(view);
    assert!(probe.is_destroyed());
    assert!(fx.ctx.registry.is_empty());
}

#[test]
fn highlight_requires_two_main_views() {
    let fx = fixture();
    let mut first = ready_view(&fx, ViewKind::map());
    assert!(first.set_last_active());
    assert!(!first.show_highlight());
    let mut second = ready_view(&fx, ViewKind::map());
    assert!(second.set_last_active());
    assert!(second.show_highlight());
    assert!(!first.is_last_active());
    assert_eq!(fx.observer.last_active_change(first.id()), Some((false, true)));
    assert_eq!(fx.observer.last_active_change(second.id()), Some((true, true)));
}

#[test]
fn pointer_down_takes_focus() {
    let fx = fixture();
    let mut first = ready_view(&fx, ViewKind::map());
    let second = ready_view(&fx, ViewKind::map());
    assert!(!first.is_last_active());
    first.on_engine_event(EngineEvent::PointerDown(PointerButton::Primary));
    assert!(first.is_last_active());
    assert!(!second.is_last_active());
}
