#![forbid(unsafe_code)]

//! Map projection values.
//!
//! A [`Projection`] is identified by its defining parameters, not by its
//! display name: two projections with the same family, parameters, center and
//! default area are the same projection even when one is labeled "CONUS" and
//! the other "Lambert (copy)".

use crate::geometry::{LatLon, MapArea};

#[cfg(feature = "state-persistence")]
use serde::{Deserialize, Serialize};

/// Ratio beyond which a data-supplied projection is too skewed to display.
const MAX_EXTENT_RATIO: f64 = 10.0;

/// A map projection.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct Projection {
    name: String,
    family: String,
    params: Vec<(String, f64)>,
    center: LatLon,
    default_area: MapArea,
}

impl Projection {
    /// Create a projection of the given family with no extra parameters.
    #[must_use]
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: family.into(),
            params: Vec::new(),
            center: LatLon::default(),
            default_area: MapArea::default(),
        }
    }

    /// Add or replace a defining parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        let key = key.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => {
                self.params.push((key, value));
                self.params.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }
        self
    }

    #[must_use]
    pub fn with_center(mut self, center: LatLon) -> Self {
        self.center = center;
        self
    }

    #[must_use]
    pub fn with_default_area(mut self, area: MapArea) -> Self {
        self.default_area = area;
        self
    }

    /// Same projection under a different display name.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn center(&self) -> LatLon {
        self.center
    }

    #[must_use]
    pub fn default_area(&self) -> MapArea {
        self.default_area
    }
}

impl PartialEq for Projection {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family
            && self.params == other.params
            && self.center == other.center
            && self.default_area == other.default_area
    }
}

/// Whether a data-supplied projection is reasonable to display.
///
/// `None`, a zero-width or zero-height default area, and extents more skewed
/// than 10:1 in either direction are rejected.
#[must_use]
pub fn display_projection_ok(candidate: Option<&Projection>) -> bool {
    let Some(projection) = candidate else {
        return false;
    };
    let area = projection.default_area();
    let width = area.width.abs();
    let height = area.height.abs();
    if width == 0.0 || height == 0.0 || !width.is_finite() || !height.is_finite() {
        return false;
    }
    width / height <= MAX_EXTENT_RATIO && height / width <= MAX_EXTENT_RATIO
}
