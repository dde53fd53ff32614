//! Lighting data model: light sources, darkness polygons and global settings.
//!
//! These are plain records shared by the map document and the lighting
//! engine; the overlay renderer lives in `tabletop-vision`.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Smallest radius a light may have, in tiles.
pub const MIN_LIGHT_RADIUS: f32 = 0.05;

/// Darkness alpha used in night mode regardless of `darkness_opacity`.
pub const NIGHT_OPACITY: f32 = 0.92;

/// Kind tag of a light source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Torch,
    Candle,
    Window,
    Fire,
    Magic,
    Moonlight,
    #[default]
    Point,
}

/// A point light in tile coordinates. The light sits at the centre of the
/// cell `(x, y)`; fractional positions are allowed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub x: f32,
    pub y: f32,
    /// Radius in tiles, always > 0.
    pub radius: f32,
    pub color: Rgb,
    /// In [0, 1].
    pub intensity: f32,
    #[serde(default)]
    pub flicker: bool,
    #[serde(default)]
    pub light_type: LightKind,
}

impl LightSource {
    pub fn new(x: f32, y: f32, radius: f32, color: Rgb, intensity: f32) -> Self {
        Self {
            x,
            y,
            radius: sanitize_radius(radius),
            color,
            intensity: intensity.clamp(0.0, 1.0),
            flicker: false,
            light_type: LightKind::Point,
        }
    }

    pub fn with_flicker(mut self, flicker: bool) -> Self {
        self.flicker = flicker;
        self
    }

    pub fn with_kind(mut self, kind: LightKind) -> Self {
        self.light_type = kind;
        self
    }

    /// Euclidean distance in tiles from the light to `(x, y)`.
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    fn normalized(mut self) -> Self {
        self.radius = sanitize_radius(self.radius);
        self.intensity = if self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        self
    }
}

fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() {
        radius.max(MIN_LIGHT_RADIUS)
    } else {
        MIN_LIGHT_RADIUS
    }
}

/// The light a material emits when painted onto a cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightEmission {
    pub kind: LightKind,
    pub radius: f32,
    pub color: Rgb,
    pub intensity: f32,
    #[serde(default)]
    pub flicker: bool,
}

impl LightEmission {
    /// Light source for this emission placed at cell `(x, y)`.
    pub fn source_at(&self, x: i32, y: i32) -> LightSource {
        LightSource::new(x as f32, y as f32, self.radius, self.color, self.intensity)
            .with_flicker(self.flicker)
            .with_kind(self.kind)
    }
}

/// A closed polygon of tile-coordinate vertices. Self-intersections are
/// filled with the even-odd rule. The vertex list is immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f32, f32)>", into = "Vec<(f32, f32)>")]
pub struct DarknessPolygon {
    vertices: Vec<(f32, f32)>,
}

impl DarknessPolygon {
    /// Build a polygon; fails with fewer than three vertices or
    /// non-finite coordinates.
    pub fn new(vertices: Vec<(f32, f32)>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::MapFormat(format!(
                "darkness polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(Error::MapFormat("darkness polygon has a non-finite vertex".into()));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[(f32, f32)] {
        &self.vertices
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.vertices.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        )
    }
}

impl TryFrom<Vec<(f32, f32)>> for DarknessPolygon {
    type Error = Error;

    fn try_from(v: Vec<(f32, f32)>) -> Result<Self> {
        Self::new(v)
    }
}

impl From<DarknessPolygon> for Vec<(f32, f32)> {
    fn from(p: DarknessPolygon) -> Self {
        p.vertices
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingMode {
    #[default]
    Day,
    Night,
}

/// Global lighting parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightingSettings {
    pub mode: LightingMode,
    /// Day-mode darkness inside polygons, in [0, 1].
    pub darkness_opacity: f32,
}

impl LightingSettings {
    /// Darkness alpha for the current mode, in [0, 1].
    pub fn base_alpha(&self) -> f32 {
        match self.mode {
            LightingMode::Night => NIGHT_OPACITY,
            LightingMode::Day => self.darkness_opacity.clamp(0.0, 1.0),
        }
    }
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            mode: LightingMode::Day,
            darkness_opacity: 0.7,
        }
    }
}

/// Serialisable lighting state, the `lighting` sub-document of a map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingRecord {
    #[serde(default)]
    pub lights: Vec<LightSource>,
    #[serde(default)]
    pub darkness_polygons: Vec<DarknessPolygon>,
    #[serde(default)]
    pub lighting_mode: LightingMode,
    #[serde(default = "default_darkness_opacity")]
    pub darkness_opacity: f32,
}

fn default_darkness_opacity() -> f32 {
    LightingSettings::default().darkness_opacity
}

impl LightingRecord {
    pub fn settings(&self) -> LightingSettings {
        LightingSettings {
            mode: self.lighting_mode,
            darkness_opacity: self.darkness_opacity.clamp(0.0, 1.0),
        }
    }

    /// Check value ranges after deserialisation and normalise lights.
    pub fn validated(mut self) -> Result<Self> {
        if !(0.0..=1.0).contains(&self.darkness_opacity) {
            return Err(Error::MapFormat(format!(
                "darkness_opacity {} outside [0, 1]",
                self.darkness_opacity
            )));
        }
        for (i, l) in self.lights.iter().enumerate() {
            if !(l.radius > 0.0) || !l.x.is_finite() || !l.y.is_finite() {
                let msg = format!("light {i} has an invalid position or radius");
                return Err(Error::MapFormat(msg));
            }
        }
        self.lights = self.lights.into_iter().map(LightSource::normalized).collect();
        Ok(self)
    }
}
