#![forbid(unsafe_code)]

//! The per-view coordinator.
//!
//! A [`ViewCoordinator`] owns everything one view needs to stay consistent:
//! the lazily created display engine, the attached layers, boolean toggles,
//! undo history, busy indicator, legend debounce and, for map views, the
//! projection policy.
//!
//! # Threading
//!
//! The coordinator lives on the UI thread and is driven by `&mut self` calls.
//! Delayed work runs on the view's [`TaskScheduler`] and comes back as
//! [`RuntimeMsg`]s that [`ViewCoordinator::pump`] applies. Peers reach it only
//! through the [`SharingBus`](crate::sharing::SharingBus), which posts into
//! the same channel.
//!
//! # Lifecycle
//!
//! ```text
//!   new --initialize--> Ready --destroy--> Destroyed
//!    \______________________destroy_______/
//! ```
//!
//! Mutating calls are no-ops outside `Ready`. `destroy` is idempotent and
//! irreversible; read-only getters keep answering afterwards.

mod commands;
mod events;
mod projection;
mod snapshot;
mod visibility;

pub use commands::ViewCommand;
pub use projection::{DEFAULT_LABEL, ProjectionChange, ProjectionPolicy, ProjectionRequest};
pub use snapshot::ViewSnapshot;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};

use geoview_core::preferences::keys;
use geoview_core::property::ids;
use geoview_core::{
    AspectRatio, BooleanProperty, BooleanPropertySet, CameraMatrix, ControlId, DisplayEngine,
    DisplayListOverlay, DisplayableId, Dimension, EngineError, EngineResult, LayerControl,
    LegendEntry, PropertyChange, Rgb, ViewChange, ViewId, ViewKind,
};
use web_time::{Duration, Instant};

use crate::config::{CoordinatorConfig, ViewProperties};
use crate::context::ViewContext;
use crate::layers::{DisplayLayer, DisplayLayerSet, LayerInsert};
use crate::legend::{LegendScheduler, RefillRequest};
use crate::message::{RuntimeMsg, ShareMessage, SharePayload};
use crate::scheduler::{SchedulerStats, TaskScheduler};
use crate::undo::{CommandStack, HistoryConfig};
use crate::wait_counter::{WaitCounter, WaitStats};
use visibility::VisibilityAnimation;

/// Pixel height of one display-list line.
const DISPLAY_LIST_LINE_HEIGHT: i32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Ready,
    Destroyed,
}

/// Coordinates one view.
pub struct ViewCoordinator {
    id: ViewId,
    kind: ViewKind,
    config: CoordinatorConfig,
    ctx: ViewContext,
    lifecycle: Lifecycle,

    engine: Option<Box<dyn DisplayEngine>>,
    layers: DisplayLayerSet,
    properties: BooleanPropertySet,
    commands: CommandStack<ViewCommand>,
    applying_command: bool,
    suppress_sharing: bool,

    wait: WaitCounter,
    legends: LegendScheduler,
    scheduler: TaskScheduler,
    sender: Sender<RuntimeMsg>,
    receiver: Receiver<RuntimeMsg>,

    name: Option<String>,
    aliases: Vec<String>,
    foreground: Rgb,
    background: Rgb,
    aspect: Option<AspectRatio>,

    first_frame_done: bool,
    last_frame_at: Option<Instant>,
    last_activated_at: Option<Instant>,
    pending_camera: Option<CameraMatrix>,
    resize_generation: u64,
    resize_repositions: u64,
    visibility: VisibilityAnimation,
    projection: Option<ProjectionPolicy>,

    legend_listing: Vec<LegendEntry>,
    legend_fills: u64,
    overlay: DisplayListOverlay,
    overlay_updates: u64,
}

impl fmt::Debug for ViewCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCoordinator")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("lifecycle", &self.lifecycle)
            .field("layers", &self.layers.len())
            .field("commands", &self.commands)
            .field("projection", &self.current_projection().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}

impl ViewCoordinator {
    /// Create a coordinator and register it with the peer registry.
    ///
    /// The engine is not created until first needed; call
    /// [`initialize`](Self::initialize) before driving the view.
    pub fn new(kind: ViewKind, ctx: ViewContext, config: CoordinatorConfig) -> Self {
        let id = ctx.registry.register(kind);
        let scheduler = TaskScheduler::new(id.to_string());
        let (sender, receiver) = mpsc::channel();
        let wait = WaitCounter::new(
            id,
            Arc::clone(&ctx.observer),
            config.busy_grace(),
            scheduler.clone(),
        );
        let refill_tx = sender.clone();
        let legends = LegendScheduler::new(
            config.legend_refill_delay(),
            scheduler.clone(),
            Arc::new(move || {
                let _ = refill_tx.send(RuntimeMsg::RefillLegends);
            }),
        );
        let foreground = ctx
            .preferences
            .get_color(keys::FOREGROUND)
            .unwrap_or(Rgb::WHITE);
        let background = ctx
            .preferences
            .get_color(keys::BACKGROUND)
            .unwrap_or(Rgb::BLACK);
        tracing::debug!(target: "geoview.coordinator", view = %id, ?kind, "view created");
        Self {
            id,
            kind,
            properties: BooleanPropertySet::new().with_preferences(Arc::clone(&ctx.preferences)),
            commands: CommandStack::new(HistoryConfig::new(config.history_depth)),
            visibility: VisibilityAnimation::new(config.visibility_interval()),
            projection: kind.has_projection().then(ProjectionPolicy::new),
            config,
            ctx,
            lifecycle: Lifecycle::Created,
            engine: None,
            layers: DisplayLayerSet::new(),
            applying_command: false,
            suppress_sharing: false,
            wait,
            legends,
            scheduler,
            sender,
            receiver,
            name: None,
            aliases: Vec::new(),
            foreground,
            background,
            aspect: None,
            first_frame_done: false,
            last_frame_at: None,
            last_activated_at: None,
            pending_camera: None,
            resize_generation: 0,
            resize_repositions: 0,
            legend_listing: Vec::new(),
            legend_fills: 0,
            overlay: DisplayListOverlay::default(),
            overlay_updates: 0,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Acquire the engine, register toggles and join the sharing bus.
    ///
    /// Idempotent. Returns `false` once destroyed.
    pub fn initialize(&mut self) -> bool {
        match self.lifecycle {
            Lifecycle::Ready => return true,
            Lifecycle::Destroyed => return false,
            Lifecycle::Created => {}
        }
        let span = tracing::debug_span!(target: "geoview.coordinator", "initialize", view = %self.id);
        let _enter = span.enter();

        self.register_default_properties();
        self.properties.mark_initialized();
        self.lifecycle = Lifecycle::Ready;

        let (fg, bg) = (self.foreground, self.background);
        self.with_engine("set_colors", |e| e.set_colors(fg, bg));
        let features: Vec<(String, bool)> = self
            .properties
            .iter()
            .map(|p| (p.id().to_string(), p.value()))
            .collect();
        for (id, on) in features {
            self.with_engine("set_feature", |e| e.set_feature(&id, on));
        }
        if let Some(aspect) = self.aspect {
            self.with_engine("set_display_aspect", |e| e.set_display_aspect(aspect));
        }
        self.apply_pending_initial_projection();
        if let Some(projection) = self.current_projection().cloned() {
            self.with_engine("set_projection", |e| e.set_projection(&projection));
        }

        self.ctx
            .bus
            .subscribe(self.id, self.sender.clone(), self.sharing());
        self.update_display_list();
        tracing::debug!(target: "geoview.coordinator", view = %self.id, "view initialized");
        true
    }

    fn register_default_properties(&mut self) {
        let mut defaults = vec![
            BooleanProperty::new(ids::WIREFRAME, "Wireframe Box", true)
                .with_tooltip("Toggle the wireframe box around the scene"),
            BooleanProperty::new(ids::SHARE_VIEWS, "Share Views", false)
                .with_tooltip("Share state with other views"),
            BooleanProperty::new(ids::ANIMATION_READOUT, "Show Animation Time", false),
            BooleanProperty::new(ids::WAIT_VISIBLE, "Show Wait Message", true),
            BooleanProperty::new(ids::SHOW_DISPLAY_LIST, "Show Display List", true),
            BooleanProperty::new(ids::LOGO_VISIBLE, "Show Logo", false),
            BooleanProperty::new(ids::TOP_BAR_VISIBLE, "Show Top Bar", true),
        ];
        if self.kind.has_projection() {
            defaults.extend([
                BooleanProperty::new(ids::SHOW_SCALES, "Show Display Scales", false),
                BooleanProperty::new(ids::AUTO_PROJECTION, "Auto-set Projection", true)
                    .with_tooltip("Use the projection of newly added data"),
                BooleanProperty::new(ids::PERSPECTIVE, "Perspective View", false),
                BooleanProperty::new(ids::AUTO_ROTATE, "Auto Rotate", false),
                BooleanProperty::new(
                    ids::EARTH_NAV_PANEL,
                    "Show Earth Navigation Panel",
                    self.kind.dimension == Dimension::Depth,
                ),
                BooleanProperty::new(ids::SHOW_PIP, "Show Overview Map", false),
            ]);
            if self.kind.globe {
                defaults.push(BooleanProperty::new(
                    ids::GLOBE_BACKGROUND,
                    "Show Globe Background",
                    false,
                ));
            }
        }
        for property in defaults {
            self.properties.register(property);
        }
    }

    /// Tear the view down. Idempotent and irreversible.
    pub fn destroy(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        let span = tracing::debug_span!(target: "geoview.coordinator", "destroy", view = %self.id);
        let _enter = span.enter();
        self.lifecycle = Lifecycle::Destroyed;

        self.visibility.stop();
        self.legends.cancel();
        if let Some(engine) = self.engine.as_deref_mut()
            && let Err(err) = engine.set_active(false)
        {
            log_engine_failure(self.id, "set_active", &err);
        }
        for layer in self.layers.iter() {
            layer.control().view_destroyed(self.id);
        }
        self.ctx.registry.unregister(self.id);
        self.ctx.bus.unsubscribe(self.id);
        self.wait.drain();
        self.scheduler.shutdown();
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        self.layers.drain();
        self.legend_listing.clear();
        self.pending_camera = None;
        while self.receiver.try_recv().is_ok() {}
        self.ctx.observer.view_destroyed(self.id);
        tracing::debug!(target: "geoview.coordinator", view = %self.id, "view destroyed");
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    /// Initialized and not destroyed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    // ========================================================================
    // Runtime queue
    // ========================================================================

    /// Apply every queued message. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let messages: Vec<RuntimeMsg> = self.receiver.try_iter().collect();
        let count = messages.len();
        for message in messages {
            self.handle_message(message);
        }
        count
    }

    /// Apply messages as they arrive for up to `budget`.
    pub fn pump_for(&mut self, budget: Duration) -> usize {
        let deadline = Instant::now() + budget;
        let mut count = 0;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.receiver.recv_timeout(deadline - now) {
                Ok(message) => {
                    self.handle_message(message);
                    count += 1;
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        count
    }

    /// Pump until `done` holds or `timeout` passes. Returns whether `done` held.
    pub fn pump_until(&mut self, timeout: Duration, mut done: impl FnMut(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if done(self) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let wait = (deadline - now).min(Duration::from_millis(10));
            if let Ok(message) = self.receiver.recv_timeout(wait) {
                self.handle_message(message);
            }
        }
    }

    fn handle_message(&mut self, message: RuntimeMsg) {
        if !self.is_ready() {
            return;
        }
        match message {
            RuntimeMsg::RefillLegends => self.fill_legends_now(),
            RuntimeMsg::ResizeSettled(generation) => self.resize_settled(generation),
            RuntimeMsg::VisibilityTick(generation) => self.visibility_tick(generation),
            RuntimeMsg::Shared(message) => self.receive_share(message),
        }
    }

    // ========================================================================
    // Engine access
    // ========================================================================

    /// The engine, created on first access. `None` once destroyed or when
    /// creation failed.
    fn engine(&mut self) -> Option<&mut (dyn DisplayEngine + 'static)> {
        if self.lifecycle == Lifecycle::Destroyed {
            return None;
        }
        if self.engine.is_none() {
            match self.ctx.engines.create(self.id, &self.kind) {
                Ok(engine) => {
                    tracing::debug!(target: "geoview.engine", view = %self.id, "engine created");
                    self.engine = Some(engine);
                }
                Err(err) => {
                    log_engine_failure(self.id, "create", &err);
                    return None;
                }
            }
        }
        self.engine.as_deref_mut()
    }

    /// Run an engine call, logging failures.
    fn with_engine<R>(
        &mut self,
        op: &'static str,
        call: impl FnOnce(&mut dyn DisplayEngine) -> EngineResult<R>,
    ) -> Option<R> {
        let id = self.id;
        let engine = self.engine()?;
        match call(engine) {
            Ok(value) => Some(value),
            Err(err) => {
                log_engine_failure(id, op, &err);
                None
            }
        }
    }

    #[must_use]
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Current camera matrix, if an engine exists and reports one.
    #[must_use]
    pub fn display_matrix(&self) -> Option<CameraMatrix> {
        let engine = self.engine.as_deref()?;
        match engine.camera_matrix() {
            Ok(matrix) => Some(matrix),
            Err(err) => {
                log_engine_failure(self.id, "camera_matrix", &err);
                None
            }
        }
    }

    /// Replace the camera without recording a command.
    pub fn set_display_matrix(&mut self, matrix: &CameraMatrix) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.with_engine("set_camera_matrix", |e| e.set_camera_matrix(matrix))
            .is_some()
    }

    // ========================================================================
    // Identity
    // ========================================================================

    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Same class and discriminating flags.
    #[must_use]
    pub fn is_compatible_with(&self, other: &ViewCoordinator) -> bool {
        self.kind.is_compatible_with(&other.kind)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        if !self.is_destroyed() {
            self.name = Some(name.into());
        }
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Only the first alias is kept.
    pub fn set_aliases(&mut self, aliases: Vec<String>) {
        if self.is_destroyed() {
            return;
        }
        self.aliases = aliases.into_iter().take(1).collect();
    }

    /// Whether `name` is this view's name or alias.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name) || self.aliases.iter().any(|a| a == name)
    }

    // ========================================================================
    // Colors and aspect
    // ========================================================================

    #[must_use]
    pub fn colors(&self) -> (Rgb, Rgb) {
        (self.foreground, self.background)
    }

    /// User color change. `None` keeps the current value. Shared with peers.
    pub fn set_colors(&mut self, foreground: Option<Rgb>, background: Option<Rgb>) -> bool {
        self.apply_colors(foreground, background, true)
    }

    fn apply_colors(&mut self, foreground: Option<Rgb>, background: Option<Rgb>, from_user: bool) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let fg = foreground.unwrap_or(self.foreground);
        let bg = background.unwrap_or(self.background);
        if (fg, bg) == (self.foreground, self.background) {
            return false;
        }
        self.foreground = fg;
        self.background = bg;
        if self.is_ready() {
            self.with_engine("set_colors", |e| e.set_colors(fg, bg));
            if from_user {
                self.share(SharePayload::Colors {
                    foreground: fg,
                    background: bg,
                });
            }
        }
        true
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.aspect
    }

    pub fn set_aspect_ratio(&mut self, aspect: AspectRatio) {
        if self.is_destroyed() {
            return;
        }
        self.aspect = Some(aspect);
        if self.is_ready() {
            self.with_engine("set_display_aspect", |e| e.set_display_aspect(aspect));
        }
    }

    // ========================================================================
    // Boolean properties
    // ========================================================================

    #[must_use]
    pub fn properties(&self) -> &BooleanPropertySet {
        &self.properties
    }

    /// Effective value of a toggle; unknown ids read as `false`.
    #[must_use]
    pub fn boolean_property(&self, id: &str) -> bool {
        self.properties.value(id).unwrap_or(false)
    }

    /// Set a toggle and react to the change.
    pub fn set_boolean_property(&mut self, id: &str, value: bool) -> bool {
        if self.is_destroyed() {
            return false;
        }
        match self.properties.set(id, value) {
            Some(change) => {
                if self.is_ready() {
                    self.property_changed(&change);
                }
                true
            }
            None => false,
        }
    }

    fn property_changed(&mut self, change: &PropertyChange) {
        tracing::debug!(
            target: "geoview.coordinator",
            view = %self.id,
            property = %change.id,
            value = change.new,
            "property changed"
        );
        match change.id.as_str() {
            ids::SHARE_VIEWS => self.ctx.bus.set_sharing(self.id, change.new),
            ids::SHOW_DISPLAY_LIST => self.update_display_list(),
            ids::AUTO_PROJECTION => {}
            other => {
                let on = change.new;
                self.with_engine("set_feature", |e| e.set_feature(other, on));
            }
        }
    }

    /// Whether this view shares state with its peers.
    #[must_use]
    pub fn sharing(&self) -> bool {
        self.properties.value(ids::SHARE_VIEWS).unwrap_or(false)
    }

    pub fn set_sharing(&mut self, on: bool) -> bool {
        self.set_boolean_property(ids::SHARE_VIEWS, on)
    }

    /// Toggles with explicit values, for saving.
    #[must_use]
    pub fn boolean_properties_for_persistence(&self) -> BTreeMap<String, bool> {
        self.properties.for_persistence()
    }

    /// Restore saved toggles. Before initialization they become session
    /// overrides; afterwards they are applied as regular changes.
    pub fn set_boolean_properties_for_persistence(&mut self, values: BTreeMap<String, bool>) {
        match self.lifecycle {
            Lifecycle::Destroyed => {}
            Lifecycle::Created => self.properties.set_session_overrides(values),
            Lifecycle::Ready => {
                for (id, value) in values {
                    self.set_boolean_property(&id, value);
                }
            }
        }
    }

    /// Write explicit toggle values and colors to the preference store.
    pub fn save_preferences(&self) {
        let prefs = &self.ctx.preferences;
        for (id, value) in self.properties.for_persistence() {
            prefs.put_bool(&id, value);
        }
        prefs.put_color(keys::FOREGROUND, self.foreground);
        prefs.put_color(keys::BACKGROUND, self.background);
    }

    /// Apply parsed per-view settings.
    pub fn apply_properties(&mut self, props: &ViewProperties) -> bool {
        if self.is_destroyed() {
            return false;
        }
        if let Some(name) = &props.name {
            self.set_name(name.clone());
        }
        if let Some(aliases) = &props.aliases {
            self.set_aliases(aliases.clone());
        }
        self.apply_colors(props.foreground, props.background, false);
        if let Some(aspect) = props.aspect_ratio {
            self.set_aspect_ratio(aspect);
        }
        if let Some(on) = props.click_to_focus {
            self.config.click_to_focus = on;
        }
        if let Some(on) = props.do_not_set_projection {
            self.set_do_not_set_projection(on);
        }
        for (id, on) in &props.flags {
            self.set_boolean_property(id, *on);
        }
        if let Some(name) = &props.initial_projection {
            if self.is_ready() {
                self.set_projection_by_name(name);
            } else {
                self.set_pending_initial_projection(name.clone());
            }
        }
        true
    }

    // ========================================================================
    // Layers
    // ========================================================================

    #[must_use]
    pub fn layers(&self) -> &DisplayLayerSet {
        &self.layers
    }

    /// Attach a layer. Returns `false` for duplicates or when not ready.
    pub fn add_layer(&mut self, control: Arc<dyn LayerControl>, displayable: DisplayableId) -> bool {
        if !self.attach_layer(DisplayLayer::new(control, displayable)) {
            return false;
        }
        self.fill_legends();
        true
    }

    /// Attach several layers with one engine batch and one legend refill.
    pub fn add_layers(
        &mut self,
        layers: impl IntoIterator<Item = (Arc<dyn LayerControl>, DisplayableId)>,
    ) -> usize {
        if !self.is_ready() {
            return 0;
        }
        self.with_engine("set_active", |e| e.set_active(false));
        let added = layers
            .into_iter()
            .filter(|(control, displayable)| {
                self.attach_layer(DisplayLayer::new(Arc::clone(control), *displayable))
            })
            .count();
        self.with_engine("set_active", |e| e.set_active(true));
        if added > 0 {
            self.fill_legends();
        }
        added
    }

    /// Attach a layer taken from another view.
    pub fn adopt_layer(&mut self, layer: DisplayLayer) -> bool {
        if !self.attach_layer(layer) {
            return false;
        }
        self.fill_legends();
        true
    }

    fn attach_layer(&mut self, layer: DisplayLayer) -> bool {
        if !self.is_ready() {
            return false;
        }
        let control = layer.control_id();
        let displayable = layer.displayable();
        if self.layers.insert(layer) == LayerInsert::Duplicate {
            return false;
        }
        self.with_engine("add_displayable", |e| e.add_displayable(displayable));
        self.ctx.observer.timelines_changed(self.id);
        if self.projection.is_some() {
            self.layer_data_changed(control, true);
        }
        true
    }

    /// Detach a layer, removing its displayable from the engine.
    pub fn remove_layer(&mut self, control: ControlId) -> Option<DisplayLayer> {
        if !self.is_ready() {
            return None;
        }
        let layer = self.layers.remove(control)?;
        let displayable = layer.displayable();
        self.with_engine("remove_displayable", |e| e.remove_displayable(displayable));
        self.ctx.observer.timelines_changed(self.id);
        self.fill_legends();
        Some(layer)
    }

    fn notify_layers(&self, change: ViewChange) {
        for layer in self.layers.iter() {
            layer.control().view_changed(self.id, change);
        }
    }

    // ========================================================================
    // Legends and display list
    // ========================================================================

    /// Rebuild legends now, or after the quiet period during bulk loads.
    pub fn fill_legends(&mut self) {
        if !self.is_ready() {
            return;
        }
        match self.legends.request(self.ctx.bulk_load.is_loading()) {
            RefillRequest::FillNow => self.fill_legends_now(),
            RefillRequest::Deferred | RefillRequest::Ignored => {}
        }
    }

    fn fill_legends_now(&mut self) {
        self.legends.mark_filled();
        self.legend_listing = self.layers.legend_entries();
        self.legend_fills += 1;
        self.ctx
            .observer
            .legends_filled(self.id, &self.legend_listing);
        self.update_display_list();
    }

    #[must_use]
    pub fn legend_entries(&self) -> &[LegendEntry] {
        &self.legend_listing
    }

    /// Number of legend rebuilds so far.
    #[must_use]
    pub fn legend_fill_count(&self) -> u64 {
        self.legend_fills
    }

    #[must_use]
    pub fn legend_refill_pending(&self) -> bool {
        self.legends.is_pending()
    }

    /// Recompute the display-list overlay from the visible layers.
    pub fn update_display_list(&mut self) {
        if !self.is_ready() {
            return;
        }
        let labels: Vec<String> = if self.properties.value(ids::SHOW_DISPLAY_LIST).unwrap_or(true) {
            self.layers
                .iter()
                .filter(|l| l.control().shows_in_legend() && l.control().is_visible())
                .map(|l| l.control().label())
                .collect()
        } else {
            Vec::new()
        };
        let bounds = self
            .with_engine("screen_bounds", |e| e.screen_bounds())
            .unwrap_or_default();
        let rows = i32::try_from(labels.len()).unwrap_or(i32::MAX);
        self.overlay = DisplayListOverlay {
            anchor_x: bounds.center_x(),
            anchor_y: bounds
                .bottom()
                .saturating_sub(rows.saturating_mul(DISPLAY_LIST_LINE_HEIGHT)),
            labels,
        };
        self.overlay_updates += 1;
        self.ctx.observer.display_list_updated(self.id, &self.overlay);
    }

    #[must_use]
    pub fn display_list(&self) -> &DisplayListOverlay {
        &self.overlay
    }

    #[must_use]
    pub fn display_list_updates(&self) -> u64 {
        self.overlay_updates
    }

    /// Resizes that survived coalescing and repositioned the overlay.
    #[must_use]
    pub fn resize_repositions(&self) -> u64 {
        self.resize_repositions
    }

    // ========================================================================
    // Focus
    // ========================================================================

    #[must_use]
    pub fn is_last_active(&self) -> bool {
        self.ctx.registry.is_last_active(self.id)
    }

    /// Outline the view: it is last-active and more than one main view exists.
    #[must_use]
    pub fn show_highlight(&self) -> bool {
        self.is_last_active() && self.ctx.registry.have_more_than_one_main()
    }

    /// Become the last-active view. Only shareable views take part.
    pub fn set_last_active(&mut self) -> bool {
        if !self.is_ready() || !self.config.shareable {
            return false;
        }
        let previous = self.ctx.registry.set_last_active(Some(self.id));
        if previous == Some(self.id) {
            return false;
        }
        self.last_activated_at = Some(Instant::now());
        let highlight = self.ctx.registry.have_more_than_one_main();
        if let Some(previous) = previous {
            self.ctx
                .observer
                .active_view_changed(previous, false, highlight);
        }
        self.ctx
            .observer
            .active_view_changed(self.id, true, highlight);
        true
    }

    #[must_use]
    pub fn last_activated_at(&self) -> Option<Instant> {
        self.last_activated_at
    }

    // ========================================================================
    // Frames and busy state
    // ========================================================================

    #[must_use]
    pub fn first_frame_done(&self) -> bool {
        self.first_frame_done
    }

    #[must_use]
    pub fn last_frame_at(&self) -> Option<Instant> {
        self.last_frame_at
    }

    /// Handle for engine threads that report busy/idle directly.
    #[must_use]
    pub fn wait_counter(&self) -> WaitCounter {
        self.wait.clone()
    }

    #[must_use]
    pub fn wait_stats(&self) -> WaitStats {
        self.wait.stats()
    }

    #[must_use]
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    // ========================================================================
    // Sharing
    // ========================================================================

    fn share(&self, payload: SharePayload) {
        if self.suppress_sharing || !self.sharing() {
            return;
        }
        self.ctx.bus.publish(ShareMessage::new(self.id, payload));
    }

    fn receive_share(&mut self, message: ShareMessage) {
        if message.origin == self.id || !self.sharing() {
            return;
        }
        tracing::debug!(
            target: "geoview.sharing",
            view = %self.id,
            origin = %message.origin,
            topic = ?message.topic(),
            "shared update received"
        );
        match message.payload {
            SharePayload::Projection { projection, label } => {
                if self.projection.is_some() {
                    self.set_projection(
                        ProjectionRequest::new(projection)
                            .label_opt(label)
                            .from_user(false),
                    );
                }
            }
            SharePayload::Camera(matrix) => {
                let compatible = self
                    .ctx
                    .registry
                    .kind_of(message.origin)
                    .is_some_and(|k| k.is_compatible_with(&self.kind));
                if compatible
                    && self
                        .with_engine("set_camera_matrix", |e| e.set_camera_matrix(&matrix))
                        .is_some()
                {
                    self.notify_layers(ViewChange::Camera);
                }
            }
            SharePayload::Colors {
                foreground,
                background,
            } => {
                self.apply_colors(Some(foreground), Some(background), false);
            }
        }
    }

    // ========================================================================
    // Copying state between views
    // ========================================================================

    /// Copy name, aliases, colors, aspect, toggles, camera and projection from
    /// a compatible view. Nothing is shared with peers during the copy.
    pub fn init_with(&mut self, other: &ViewCoordinator) -> bool {
        if !self.is_ready() || !self.is_compatible_with(other) {
            return false;
        }
        self.suppress_sharing = true;
        if let Some(aspect) = other.aspect_ratio() {
            self.set_aspect_ratio(aspect);
        }
        self.set_aliases(other.aliases.clone());
        if let Some(name) = other.name() {
            self.set_name(name.to_string());
        }
        for (id, value) in other.boolean_properties_for_persistence() {
            self.set_boolean_property(&id, value);
        }
        self.apply_colors(Some(other.foreground), Some(other.background), false);
        if let Some(projection) = other.current_projection().cloned() {
            self.set_projection(
                ProjectionRequest::new(projection)
                    .label_opt(other.current_projection_label().map(String::from))
                    .from_user(false)
                    .record_command(false),
            );
        }
        if let Some(matrix) = other.display_matrix() {
            self.set_display_matrix(&matrix);
        }
        self.suppress_sharing = false;
        true
    }
}

impl Drop for ViewCoordinator {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn log_engine_failure(view: ViewId, op: &'static str, err: &EngineError) {
    tracing::warn!(
        target: "geoview.engine",
        %view,
        op,
        error = %err,
        "engine call failed"
    );
}
