#![forbid(unsafe_code)]

//! Logging contract for engine failures and coordinator spans.
//!
//! Verify that:
//! - Every failed engine call produces one WARN on `geoview.engine` carrying
//!   `view`, `op` and `error` fields, and the coordinator keeps going.
//! - A failed history step is reported on `geoview.coordinator` at WARN.
//! - Projection changes run inside a `set_projection` span.
//!
//! Run:
//!   cargo test -p geoview-runtime --test tracing_engine_failures

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

use geoview_core::{CameraMatrix, EngineEvent, PointerButton, ViewKind};
use geoview_harness::RecordingEngineFactory;
use geoview_harness::fixtures::{mercator, world};
use geoview_runtime::{CoordinatorConfig, ProjectionRequest, ViewContext, ViewCoordinator};

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

impl Capture {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn warnings_on(&self, target: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.level == tracing::Level::WARN && e.target == target)
            .collect()
    }

    fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_span_name,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Capture {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn failed_engine_call_warns_once_with_context() {
    let engines = Arc::new(RecordingEngineFactory::new());
    let mut view = ViewCoordinator::new(
        ViewKind::map(),
        ViewContext::new(engines.clone()),
        CoordinatorConfig::default(),
    );
    view.initialize();
    view.set_projection(ProjectionRequest::new(world()));
    let probe = engines.probe(view.id()).unwrap();
    probe.fail("set_projection");

    let logs = capture(|| {
        view.set_projection(ProjectionRequest::new(mercator()));
    });

    let warnings = logs.warnings_on("geoview.engine");
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    let warning = &warnings[0];
    assert_eq!(warning.field("op"), Some("set_projection"));
    assert_eq!(warning.field("view"), Some(view.id().to_string().as_str()));
    assert!(warning.field("error").is_some_and(|e| e.contains("injected")));
    assert_eq!(warning.parent_span_name.as_deref(), Some("set_projection"));
    assert_eq!(view.current_projection(), Some(&mercator()));
}

#[test]
fn engine_creation_failure_is_logged_and_recoverable() {
    let engines = Arc::new(RecordingEngineFactory::new());
    engines.fail_creation(true);
    let mut view = ViewCoordinator::new(
        ViewKind::map(),
        ViewContext::new(engines.clone()),
        CoordinatorConfig::default(),
    );

    let logs = capture(|| {
        view.initialize();
    });
    assert!(view.is_ready());
    assert!(!view.has_engine());
    assert!(
        logs.warnings_on("geoview.engine")
            .iter()
            .any(|w| w.field("op") == Some("create"))
    );

    engines.fail_creation(false);
    view.set_projection(ProjectionRequest::new(world()));
    assert!(view.has_engine());
    assert_eq!(engines.probe(view.id()).unwrap().projection(), Some(world()));
}

#[test]
fn failed_history_step_is_reported() {
    let engines = Arc::new(RecordingEngineFactory::new());
    let mut view = ViewCoordinator::new(
        ViewKind::map(),
        ViewContext::new(engines.clone()),
        CoordinatorConfig::default(),
    );
    view.initialize();
    let probe = engines.probe(view.id()).unwrap();
    view.on_engine_event(EngineEvent::PointerDown(PointerButton::Primary));
    probe.move_camera(CameraMatrix::scaled(2.0));
    view.on_engine_event(EngineEvent::PointerUp(PointerButton::Primary));
    probe.fail("set_camera_matrix");

    let logs = capture(|| {
        assert!(view.undo());
    });
    let warnings = logs.warnings_on("geoview.coordinator");
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert_eq!(warnings[0].field("command"), Some("Camera change"));
    assert!(view.can_redo(), "cursor still moved");
}

#[test]
fn projection_changes_run_in_a_span() {
    let engines = Arc::new(RecordingEngineFactory::new());
    let mut view = ViewCoordinator::new(
        ViewKind::map(),
        ViewContext::new(engines),
        CoordinatorConfig::default(),
    );
    view.initialize();

    let logs = capture(|| {
        view.set_projection(ProjectionRequest::new(world()));
    });
    let spans = logs.spans_named("set_projection");
    assert_eq!(spans.len(), 1);
    assert_eq!(
        spans[0].fields.get("projection").map(String::as_str),
        Some("World")
    );
    assert!(
        logs.events()
            .iter()
            .all(|e| e.level != tracing::Level::WARN),
        "healthy engine logs no warnings"
    );
}
