#![forbid(unsafe_code)]

//! Named boolean toggles with layered default resolution.
//!
//! Each view carries a [`BooleanPropertySet`]: wireframe, sharing, display
//! list, and so on. A property's effective value resolves as
//!
//! ```text
//! session override  >  explicit value  >  stored preference  >  hard default
//! ```
//!
//! # Invariants
//!
//! - Re-registering an id keeps the current effective value unless a session
//!   override exists for it. A changed default never flips a live toggle.
//! - Change hooks fire only after [`BooleanPropertySet::mark_initialized`],
//!   and only when the effective value actually changes.
//! - [`BooleanPropertySet::for_persistence`] lists exactly the properties with
//!   an explicit value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::preferences::PreferenceStore;

/// Well-known property ids.
pub mod ids {
    pub const WIREFRAME: &str = "View.Wireframe";
    pub const SHARE_VIEWS: &str = "View.ShareViews";
    pub const ANIMATION_READOUT: &str = "View.AniReadout";
    pub const WAIT_VISIBLE: &str = "View.WaitVisible";
    pub const SHOW_DISPLAY_LIST: &str = "View.ShowDisplayList";
    pub const LOGO_VISIBLE: &str = "idv.viewmanager.logo.visibility";
    pub const TOP_BAR_VISIBLE: &str = "View.TopBarVisible";
    pub const SHOW_SCALES: &str = "View.ShowScales";
    pub const AUTO_PROJECTION: &str = "View.UseFromData";
    pub const PERSPECTIVE: &str = "View.PerspectiveView";
    pub const AUTO_ROTATE: &str = "View.AutoRotate";
    pub const EARTH_NAV_PANEL: &str = "View.ShowEarthNavPanel";
    pub const SHOW_PIP: &str = "View.ShowPip";
    pub const GLOBE_BACKGROUND: &str = "View.ShowGlobeBackground";
}

/// Callback invoked with `(id, new_value)`.
pub type ChangeHook = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// A single named toggle.
#[derive(Clone)]
pub struct BooleanProperty {
    id: String,
    label: String,
    tooltip: String,
    default: bool,
    value: Option<bool>,
    hook: Option<ChangeHook>,
}

impl fmt::Debug for BooleanProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanProperty")
            .field("id", &self.id)
            .field("default", &self.default)
            .field("value", &self.value)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

impl BooleanProperty {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, default: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: String::new(),
            default,
            value: None,
            hook: None,
        }
    }

    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: ChangeHook) -> Self {
        self.hook = Some(hook);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Default after preference resolution.
    #[must_use]
    pub fn default_value(&self) -> bool {
        self.default
    }

    /// Explicitly set value, if any.
    #[must_use]
    pub fn explicit_value(&self) -> Option<bool> {
        self.value
    }

    /// Effective value.
    #[must_use]
    pub fn value(&self) -> bool {
        self.value.unwrap_or(self.default)
    }
}

/// Record of an effective-value change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub id: String,
    pub old: bool,
    pub new: bool,
}

/// Ordered collection of boolean properties.
#[derive(Default)]
pub struct BooleanPropertySet {
    properties: Vec<BooleanProperty>,
    preferences: Option<Arc<dyn PreferenceStore>>,
    session: Option<BTreeMap<String, bool>>,
    initialized: bool,
}

impl fmt::Debug for BooleanPropertySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanPropertySet")
            .field("properties", &self.properties)
            .field("session", &self.session)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl BooleanPropertySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve defaults through a preference store.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Install restored session values.
    ///
    /// Already-registered properties adopt their override immediately
    /// without firing hooks; later registrations pick theirs up on insert.
    pub fn set_session_overrides(&mut self, overrides: BTreeMap<String, bool>) {
        for property in &mut self.properties {
            if let Some(v) = overrides.get(&property.id) {
                property.value = Some(*v);
            }
        }
        self.session = Some(overrides);
    }

    /// Register (or re-register) a property.
    pub fn register(&mut self, mut property: BooleanProperty) {
        if let Some(stored) = self
            .preferences
            .as_ref()
            .and_then(|p| p.get_bool(&property.id))
        {
            property.default = stored;
        }
        let session_value = self
            .session
            .as_ref()
            .and_then(|s| s.get(&property.id).copied());
        match self.position(&property.id) {
            Some(idx) => {
                let existing = &self.properties[idx];
                let current = existing.value();
                property.value = session_value
                    .or(existing.value)
                    .or((current != property.default).then_some(current));
                if property.hook.is_none() {
                    property.hook = existing.hook.clone();
                }
                self.properties[idx] = property;
            }
            None => {
                property.value = session_value;
                self.properties.push(property);
            }
        }
    }

    /// Effective value of a registered property.
    #[must_use]
    pub fn value(&self, id: &str) -> Option<bool> {
        self.get(id).map(BooleanProperty::value)
    }

    /// Effective value, registering `id` with `default` when missing.
    pub fn get_or(&mut self, id: &str, default: bool) -> bool {
        if self.position(id).is_none() {
            self.register(BooleanProperty::new(id, id, default));
        }
        self.value(id).unwrap_or(default)
    }

    /// Property metadata.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BooleanProperty> {
        self.properties.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Set an explicit value. Unknown ids are registered with a `false`
    /// default first.
    ///
    /// Returns the change when the effective value moved.
    pub fn set(&mut self, id: &str, value: bool) -> Option<PropertyChange> {
        let idx = match self.position(id) {
            Some(idx) => idx,
            None => {
                self.register(BooleanProperty::new(id, id, false));
                self.properties.len() - 1
            }
        };
        let property = &mut self.properties[idx];
        let old = property.value();
        property.value = Some(value);
        if old == value {
            return None;
        }
        if self.initialized
            && let Some(hook) = property.hook.clone()
        {
            hook(id, value);
        }
        Some(PropertyChange {
            id: id.to_string(),
            old,
            new: value,
        })
    }

    /// Properties with an explicit value, keyed by id.
    #[must_use]
    pub fn for_persistence(&self) -> BTreeMap<String, bool> {
        self.properties
            .iter()
            .filter_map(|p| p.value.map(|v| (p.id.clone(), v)))
            .collect()
    }

    /// Start delivering change hooks.
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BooleanProperty> {
        self.properties.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.id == id)
    }
}
