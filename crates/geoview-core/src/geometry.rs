#![forbid(unsafe_code)]

//! Geometric primitives and opaque scene values.
//!
//! Camera math lives in the display engine. Everything here is stored,
//! compared and replayed, never interpreted.

use std::fmt;

#[cfg(feature = "state-persistence")]
use serde::{Deserialize, Serialize};

/// Pixel rectangle of the scene component on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct ScreenBounds {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenBounds {
    /// Create new bounds.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds at the origin with the given size.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Horizontal center.
    #[inline]
    pub const fn center_x(&self) -> i32 {
        self.x.saturating_add((self.width / 2) as i32)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Whether the bounds cover no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Flattened camera transform as reported by the engine.
///
/// Equality is element-wise; a matrix captured before and after an
/// interaction tells whether the camera actually moved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct CameraMatrix(Vec<f64>);

impl CameraMatrix {
    /// Wrap raw engine values.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// The 4x4 identity transform.
    #[must_use]
    pub fn identity() -> Self {
        let mut values = vec![0.0; 16];
        for i in 0..4 {
            values[i * 5] = 1.0;
        }
        Self(values)
    }

    /// Identity with a uniform scale applied; handy for distinct test values.
    #[must_use]
    pub fn scaled(factor: f64) -> Self {
        let mut m = Self::identity();
        for i in 0..3 {
            m.0[i * 5] = factor;
        }
        m
    }

    /// Raw values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Per-axis display scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct AspectRatio {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AspectRatio {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Parse `"x,y,z"`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(',').map(|p| p.trim().parse::<f64>());
        let x = parts.next()?.ok()?;
        let y = parts.next()?.ok()?;
        let z = parts.next()?.ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(x, y, z))
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Rectangle in projection coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct MapArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl MapArea {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "state-persistence", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `r,g,b` or one of a few names.
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let text = text.trim();
        let err = || ColorParseError(text.to_string());
        if let Some(hex) = text.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(err());
            }
            let value = u32::from_str_radix(hex, 16).map_err(|_| err())?;
            return Ok(Self::new(
                (value >> 16) as u8,
                (value >> 8) as u8,
                value as u8,
            ));
        }
        if text.contains(',') {
            let channels: Vec<u8> = text
                .split(',')
                .map(|c| c.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .map_err(|_| err())?;
            return match channels.as_slice() {
                [r, g, b] => Ok(Self::new(*r, *g, *b)),
                _ => Err(err()),
            };
        }
        match text.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::BLACK),
            "white" => Ok(Self::WHITE),
            "red" => Ok(Self::new(255, 0, 0)),
            "green" => Ok(Self::new(0, 255, 0)),
            "blue" => Ok(Self::new(0, 0, 255)),
            "gray" | "grey" => Ok(Self::new(128, 128, 128)),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Text that does not describe a color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorParseError(pub String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color: {:?}", self.0)
    }
}

impl std::error::Error for ColorParseError {}
