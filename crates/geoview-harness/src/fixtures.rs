#![forbid(unsafe_code)]

//! Reference projections.

use geoview_core::{LatLon, MapArea, Projection};

/// Plate carrée over the whole world.
#[must_use]
pub fn world() -> Projection {
    Projection::new("latlon", "World")
        .with_default_area(MapArea::new(-180.0, -90.0, 360.0, 180.0))
}

#[must_use]
pub fn mercator() -> Projection {
    Projection::new("mercator", "World Mercator")
        .with_param("lon0", 0.0)
        .with_default_area(MapArea::new(-180.0, -80.0, 360.0, 160.0))
}

/// Lambert conformal over the continental US.
#[must_use]
pub fn lambert_conus() -> Projection {
    Projection::new("lambert", "US>CONUS")
        .with_param("lat0", 25.0)
        .with_param("lon0", -95.0)
        .with_param("par1", 25.0)
        .with_param("par2", 25.0)
        .with_center(LatLon::new(38.0, -97.0))
        .with_default_area(MapArea::new(-2700.0, -1500.0, 5400.0, 3200.0))
}

#[must_use]
pub fn polar_north() -> Projection {
    Projection::new("stereographic", "North Polar")
        .with_param("lat0", 90.0)
        .with_center(LatLon::new(90.0, 0.0))
        .with_default_area(MapArea::new(-4000.0, -4000.0, 8000.0, 8000.0))
}

/// A data projection with a zero-height extent.
#[must_use]
pub fn degenerate() -> Projection {
    Projection::new("latlon", "Degenerate").with_default_area(MapArea::new(0.0, 0.0, 10.0, 0.0))
}

/// A data projection skewed well past 10:1.
#[must_use]
pub fn sliver() -> Projection {
    Projection::new("latlon", "Sliver").with_default_area(MapArea::new(0.0, 0.0, 500.0, 2.0))
}

/// Named catalog used by lookup tests.
#[must_use]
pub fn catalog() -> Vec<Projection> {
    vec![world(), mercator(), lambert_conus(), polar_north()]
}
