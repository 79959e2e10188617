#![forbid(unsafe_code)]

//! Coordinator configuration.
//!
//! Two layers:
//!
//! - [`CoordinatorConfig`]: runtime policy (history depth, debounce and grace
//!   delays, focus behavior). Loadable from TOML or JSON with the
//!   `policy-config` feature.
//! - [`ViewProperties`]: per-view settings given as `name=value;...`, the
//!   form hosts use in layout descriptors. Every key is known up front;
//!   unknown keys and unparsable values are errors.
//!
//! ```toml
//! # geoview-policy.toml
//! history_depth = 50
//! busy_grace_ms = 250
//! legend_refill_delay_ms = 1000
//! ```

use std::fmt;

#[cfg(feature = "policy-config")]
use std::path::Path;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

use geoview_core::property::ids;
use geoview_core::{AspectRatio, Rgb};
use web_time::Duration;

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Runtime policy for one coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct CoordinatorConfig {
    /// Maximum undo depth.
    pub history_depth: usize,
    /// How long engine work must run before the busy indicator appears.
    pub busy_grace_ms: u64,
    /// Quiet period before a deferred legend refill during bulk loads.
    pub legend_refill_delay_ms: u64,
    /// How long a resize must go unanswered before the overlay is repositioned.
    pub resize_settle_ms: u64,
    /// Default dwell per step of the visibility animation.
    pub visibility_interval_ms: u64,
    /// When false, hovering makes a view last-active; when true it takes a click.
    pub click_to_focus: bool,
    /// Whether the view takes part in last-active tracking.
    pub shareable: bool,
    /// Reapply the prior aspect ratio after a projection change instead of
    /// adopting the engine's.
    pub keep_aspect_on_projection_change: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            history_depth: 100,
            busy_grace_ms: 500,
            legend_refill_delay_ms: 1000,
            resize_settle_ms: 200,
            visibility_interval_ms: 1000,
            click_to_focus: true,
            shareable: true,
            keep_aspect_on_projection_change: false,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn busy_grace(&self) -> Duration {
        Duration::from_millis(self.busy_grace_ms)
    }

    #[must_use]
    pub fn legend_refill_delay(&self) -> Duration {
        Duration::from_millis(self.legend_refill_delay_ms)
    }

    #[must_use]
    pub fn resize_settle(&self) -> Duration {
        Duration::from_millis(self.resize_settle_ms)
    }

    #[must_use]
    pub fn visibility_interval(&self) -> Duration {
        Duration::from_millis(self.visibility_interval_ms)
    }

    #[must_use]
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    #[must_use]
    pub fn with_busy_grace(mut self, grace: Duration) -> Self {
        self.busy_grace_ms = millis(grace);
        self
    }

    #[must_use]
    pub fn with_legend_refill_delay(mut self, delay: Duration) -> Self {
        self.legend_refill_delay_ms = millis(delay);
        self
    }

    #[must_use]
    pub fn with_resize_settle(mut self, delay: Duration) -> Self {
        self.resize_settle_ms = millis(delay);
        self
    }

    #[must_use]
    pub fn with_visibility_interval(mut self, interval: Duration) -> Self {
        self.visibility_interval_ms = millis(interval);
        self
    }

    #[must_use]
    pub fn with_click_to_focus(mut self, on: bool) -> Self {
        self.click_to_focus = on;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Check parameter ranges. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.history_depth == 0 {
            errors.push("history_depth must be > 0".into());
        }
        if self.visibility_interval_ms == 0 {
            errors.push("visibility_interval_ms must be > 0".into());
        }
        if self.resize_settle_ms > 10_000 {
            errors.push(format!(
                "resize_settle_ms must be <= 10000, got {}",
                self.resize_settle_ms
            ));
        }
        errors
    }

    /// Validate, turning problems into an error.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors from loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "policy-config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "policy-config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
    /// A property entry without `=`.
    Malformed(String),
    /// A property key nobody understands.
    UnknownKey(String),
    /// A known key with a value of the wrong shape.
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
            Self::Malformed(entry) => write!(f, "malformed property entry {entry:?}"),
            Self::UnknownKey(key) => write!(f, "unknown view property {key:?}"),
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value {value:?} for view property {key:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "policy-config")]
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

/// Keys that map straight onto boolean properties.
const FLAG_KEYS: &[(&str, &str)] = &[
    ("wireframe", ids::WIREFRAME),
    ("shareViews", ids::SHARE_VIEWS),
    ("aniReadout", ids::ANIMATION_READOUT),
    ("waitVisible", ids::WAIT_VISIBLE),
    ("showDisplayList", ids::SHOW_DISPLAY_LIST),
    ("logoVisibility", ids::LOGO_VISIBLE),
    ("topBarVisible", ids::TOP_BAR_VISIBLE),
    ("showScales", ids::SHOW_SCALES),
    ("useProjectionFromData", ids::AUTO_PROJECTION),
    ("perspectiveView", ids::PERSPECTIVE),
    ("autoRotate", ids::AUTO_ROTATE),
    ("showEarthNavPanel", ids::EARTH_NAV_PANEL),
    ("showPip", ids::SHOW_PIP),
    ("showGlobeBackground", ids::GLOBE_BACKGROUND),
];

/// Per-view settings parsed from `name=value;...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewProperties {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub foreground: Option<Rgb>,
    pub background: Option<Rgb>,
    pub aspect_ratio: Option<AspectRatio>,
    pub click_to_focus: Option<bool>,
    pub do_not_set_projection: Option<bool>,
    /// Catalog name of the projection to start with.
    pub initial_projection: Option<String>,
    /// Boolean property values keyed by property id, in input order.
    pub flags: Vec<(&'static str, bool)>,
}

impl ViewProperties {
    /// Parse `key=value` pairs separated by `;`. Blank segments are skipped.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut props = Self::default();
        for segment in text.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConfigError::Malformed(segment.to_string()))?;
            props.apply(key.trim(), value.trim())?;
        }
        Ok(props)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "name" => self.name = Some(value.to_string()),
            "aliases" => {
                self.aliases = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            "foreground" => self.foreground = Some(Rgb::parse(value).map_err(|_| invalid())?),
            "background" => self.background = Some(Rgb::parse(value).map_err(|_| invalid())?),
            "aspectRatio" => self.aspect_ratio = Some(AspectRatio::parse(value).ok_or_else(invalid)?),
            "clickToFocus" => self.click_to_focus = Some(parse_bool(value).ok_or_else(invalid)?),
            "doNotSetProjection" => {
                self.do_not_set_projection = Some(parse_bool(value).ok_or_else(invalid)?);
            }
            "initialProjection" => self.initial_projection = Some(value.to_string()),
            _ => {
                let (_, id) = FLAG_KEYS
                    .iter()
                    .find(|(k, _)| *k == key)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let on = parse_bool(value).ok_or_else(invalid)?;
                self.flags.push((*id, on));
            }
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = CoordinatorConfig::default();
        assert_eq!(c.history_depth, 100);
        assert_eq!(c.busy_grace(), Duration::from_millis(500));
        assert_eq!(c.legend_refill_delay(), Duration::from_secs(1));
        assert_eq!(c.resize_settle(), Duration::from_millis(200));
        assert_eq!(c.visibility_interval(), Duration::from_secs(1));
        assert!(c.validate().is_empty());
    }

    #[test]
    fn huge_durations_saturate() {
        let c = CoordinatorConfig::default().with_busy_grace(Duration::MAX);
        assert_eq!(c.busy_grace_ms, u64::MAX);
        assert_eq!(millis(Duration::from_millis(250)), 250);
    }

    #[test]
    fn validate_catches_zero_depth() {
        let errors = CoordinatorConfig::default().with_history_depth(0).validate();
        assert!(errors.iter().any(|e| e.contains("history_depth")));
        assert!(matches!(
            CoordinatorConfig::default().with_history_depth(0).validated(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn parse_known_keys() {
        let props = ViewProperties::parse(
            "name=Main; aliases=left,right ;foreground=#ffffff;showScales=true;\
             aspectRatio=1,1,0.5;clickToFocus=false;",
        )
        .unwrap();
        assert_eq!(props.name.as_deref(), Some("Main"));
        assert_eq!(props.aliases, Some(vec!["left".into(), "right".into()]));
        assert_eq!(props.foreground, Some(Rgb::WHITE));
        assert_eq!(props.flags, vec![(ids::SHOW_SCALES, true)]);
        assert_eq!(props.aspect_ratio, Some(AspectRatio::new(1.0, 1.0, 0.5)));
        assert_eq!(props.click_to_focus, Some(false));
    }

    #[test]
    fn unknown_key_rejected() {
        match ViewProperties::parse("name=x;frobnicate=1") {
            Err(ConfigError::UnknownKey(k)) => assert_eq!(k, "frobnicate"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_values_rejected() {
        assert!(matches!(
            ViewProperties::parse("wireframe=maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ViewProperties::parse("background=#12"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ViewProperties::parse("name"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_partial_uses_defaults() {
        let c = CoordinatorConfig::from_toml_str("busy_grace_ms = 0\nhistory_depth = 5\n").unwrap();
        assert_eq!(c.busy_grace(), Duration::ZERO);
        assert_eq!(c.history_depth, 5);
        assert_eq!(c.resize_settle_ms, 200);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn json_roundtrip() {
        let c = CoordinatorConfig::default().with_click_to_focus(false);
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(CoordinatorConfig::from_json_str(&json).unwrap(), c);
    }
}
