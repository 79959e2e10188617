#![forbid(unsafe_code)]

//! In-memory display engine that records every call.
//!
//! Each [`RecordingEngine`] shares its state with an [`EngineProbe`] the test
//! keeps, so assertions can look inside an engine the coordinator owns.
//! Failures are injected per operation name (`"set_projection"`,
//! `"camera_matrix"`, ...), matching the `op` field the coordinator logs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use geoview_core::{
    AspectRatio, CameraMatrix, DisplayEngine, DisplayableId, EngineError, EngineFactory,
    EngineResult, LatLon, Projection, Rgb, ScreenBounds, ViewId, ViewKind,
};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetCamera(CameraMatrix),
    SetProjection(String),
    ResetProjection,
    CenterOn(LatLon),
    SetAspect(AspectRatio),
    AddDisplayable(DisplayableId),
    RemoveDisplayable(DisplayableId),
    SetActive(bool),
    SetColors(Rgb, Rgb),
    SetFeature(String, bool),
    Destroy,
}

#[derive(Debug)]
struct EngineState {
    camera: CameraMatrix,
    projection: Option<Projection>,
    aspect: AspectRatio,
    bounds: ScreenBounds,
    displayables: Vec<DisplayableId>,
    active: bool,
    colors: Option<(Rgb, Rgb)>,
    features: BTreeMap<String, bool>,
    failing: BTreeSet<&'static str>,
    calls: Vec<EngineCall>,
    destroyed: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            camera: CameraMatrix::identity(),
            projection: None,
            aspect: AspectRatio::default(),
            bounds: ScreenBounds::from_size(800, 600),
            displayables: Vec::new(),
            active: true,
            colors: None,
            features: BTreeMap::new(),
            failing: BTreeSet::new(),
            calls: Vec::new(),
            destroyed: false,
        }
    }
}

/// Test-side handle on an engine's state.
#[derive(Debug, Clone, Default)]
pub struct EngineProbe {
    state: Arc<Mutex<EngineState>>,
}

impl EngineProbe {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `op` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, op: &'static str) {
        self.lock().failing.insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.lock().failing.remove(op);
    }

    /// Simulate the user dragging the camera.
    pub fn move_camera(&self, matrix: CameraMatrix) {
        self.lock().camera = matrix;
    }

    pub fn set_bounds(&self, bounds: ScreenBounds) {
        self.lock().bounds = bounds;
    }

    pub fn set_aspect(&self, aspect: AspectRatio) {
        self.lock().aspect = aspect;
    }

    #[must_use]
    pub fn camera(&self) -> CameraMatrix {
        self.lock().camera.clone()
    }

    #[must_use]
    pub fn projection(&self) -> Option<Projection> {
        self.lock().projection.clone()
    }

    #[must_use]
    pub fn aspect(&self) -> AspectRatio {
        self.lock().aspect
    }

    #[must_use]
    pub fn displayables(&self) -> Vec<DisplayableId> {
        self.lock().displayables.clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    #[must_use]
    pub fn colors(&self) -> Option<(Rgb, Rgb)> {
        self.lock().colors
    }

    #[must_use]
    pub fn feature(&self, id: &str) -> Option<bool> {
        self.lock().features.get(id).copied()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }

    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

/// A [`DisplayEngine`] backed by an [`EngineProbe`].
#[derive(Debug, Default)]
pub struct RecordingEngine {
    probe: EngineProbe,
}

impl RecordingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn probe(&self) -> EngineProbe {
        self.probe.clone()
    }

    fn call<R>(
        &self,
        op: &'static str,
        record: Option<EngineCall>,
        apply: impl FnOnce(&mut EngineState) -> R,
    ) -> EngineResult<R> {
        let mut state = self.probe.lock();
        if state.destroyed {
            return Err(EngineError::Unavailable);
        }
        if state.failing.contains(op) {
            return Err(EngineError::Backend(format!("injected {op} failure")));
        }
        if let Some(call) = record {
            state.calls.push(call);
        }
        Ok(apply(&mut state))
    }
}

impl DisplayEngine for RecordingEngine {
    fn camera_matrix(&self) -> EngineResult<CameraMatrix> {
        self.call("camera_matrix", None, |s| s.camera.clone())
    }

    fn set_camera_matrix(&mut self, matrix: &CameraMatrix) -> EngineResult<()> {
        self.call(
            "set_camera_matrix",
            Some(EngineCall::SetCamera(matrix.clone())),
            |s| s.camera = matrix.clone(),
        )
    }

    fn set_projection(&mut self, projection: &Projection) -> EngineResult<()> {
        self.call(
            "set_projection",
            Some(EngineCall::SetProjection(projection.name().to_string())),
            |s| s.projection = Some(projection.clone()),
        )
    }

    fn reset_projection(&mut self) -> EngineResult<()> {
        self.call("reset_projection", Some(EngineCall::ResetProjection), |s| {
            s.camera = CameraMatrix::identity();
        })
    }

    fn center_on(&mut self, point: LatLon) -> EngineResult<()> {
        self.call("center_on", Some(EngineCall::CenterOn(point)), |_| ())
    }

    fn display_aspect(&self) -> EngineResult<AspectRatio> {
        self.call("display_aspect", None, |s| s.aspect)
    }

    fn set_display_aspect(&mut self, aspect: AspectRatio) -> EngineResult<()> {
        self.call(
            "set_display_aspect",
            Some(EngineCall::SetAspect(aspect)),
            |s| s.aspect = aspect,
        )
    }

    fn add_displayable(&mut self, id: DisplayableId) -> EngineResult<()> {
        self.call(
            "add_displayable",
            Some(EngineCall::AddDisplayable(id)),
            |s| s.displayables.push(id),
        )
    }

    fn remove_displayable(&mut self, id: DisplayableId) -> EngineResult<()> {
        self.call(
            "remove_displayable",
            Some(EngineCall::RemoveDisplayable(id)),
            |s| s.displayables.retain(|d| *d != id),
        )
    }

    fn screen_bounds(&self) -> EngineResult<ScreenBounds> {
        self.call("screen_bounds", None, |s| s.bounds)
    }

    fn set_active(&mut self, active: bool) -> EngineResult<()> {
        self.call("set_active", Some(EngineCall::SetActive(active)), |s| {
            s.active = active;
        })
    }

    fn set_colors(&mut self, foreground: Rgb, background: Rgb) -> EngineResult<()> {
        self.call(
            "set_colors",
            Some(EngineCall::SetColors(foreground, background)),
            |s| s.colors = Some((foreground, background)),
        )
    }

    fn set_feature(&mut self, id: &str, on: bool) -> EngineResult<()> {
        self.call(
            "set_feature",
            Some(EngineCall::SetFeature(id.to_string(), on)),
            |s| {
                s.features.insert(id.to_string(), on);
            },
        )
    }

    fn destroy(&mut self) {
        let mut state = self.probe.lock();
        state.calls.push(EngineCall::Destroy);
        state.destroyed = true;
        state.displayables.clear();
    }
}

/// Hands out [`RecordingEngine`]s and keeps their probes by view.
#[derive(Debug, Default)]
pub struct RecordingEngineFactory {
    probes: Mutex<BTreeMap<ViewId, EngineProbe>>,
    fail_create: AtomicBool,
    created: AtomicUsize,
}

impl RecordingEngineFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe of the engine created for `view`, if any.
    #[must_use]
    pub fn probe(&self, view: ViewId) -> Option<EngineProbe> {
        self.probes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&view)
            .cloned()
    }

    /// Make engine creation fail until cleared.
    pub fn fail_creation(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for RecordingEngineFactory {
    fn create(&self, view: ViewId, kind: &ViewKind) -> EngineResult<Box<dyn DisplayEngine>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::Backend("injected create failure".into()));
        }
        let engine = RecordingEngine::new();
        self.probes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(view, engine.probe());
        self.created.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: "geoview.harness", %view, ?kind, "recording engine created");
        Ok(Box::new(engine))
    }
}
