//! The [`Material`] record and the built-in base set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::lighting::{LightEmission, LightKind};

/// Identifier of a material, unique within a registry.
pub type MaterialId = String;

/// A named visual class of tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Base colour used by procedural generators and the noisy fill.
    pub color: Rgb,
    #[serde(default)]
    pub animated: bool,
    /// Decorative symbol shown in the editor palette.
    #[serde(default)]
    pub emoji: String,
    /// Reference bitmap, used when no frame bitmap is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<PathBuf>,
    /// Per-frame bitmaps, indexed by `frame mod len`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frame_paths: Vec<PathBuf>,
    /// Light placed automatically when the material is painted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightEmission>,
}

impl Material {
    pub fn new(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
            animated: false,
            emoji: String::new(),
            texture_path: None,
            frame_paths: Vec::new(),
            light: None,
        }
    }

    pub fn animated(mut self) -> Self {
        self.animated = true;
        self
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = emoji.into();
        self
    }

    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture_path = Some(path.into());
        self
    }

    pub fn with_frames(mut self, frames: Vec<PathBuf>) -> Self {
        self.frame_paths = frames;
        self
    }

    pub fn with_light(mut self, light: LightEmission) -> Self {
        self.light = Some(light);
        self
    }

    /// The grey stand-in returned for unknown ids.
    pub fn fallback() -> Self {
        Self::new("Missing", Rgb::FALLBACK_GREY).with_emoji("?")
    }

    /// Whether the material emits light when painted.
    pub fn emits_light(&self) -> bool {
        self.light.is_some()
    }
}

fn emission(kind: LightKind, radius: f32, color: Rgb, intensity: f32) -> LightEmission {
    LightEmission {
        kind,
        radius,
        color,
        intensity,
        flicker: true,
    }
}

/// The built-in base materials, in id order.
pub fn builtin_materials() -> Vec<(MaterialId, Material)> {
    let fire_light = emission(LightKind::Fire, 4.0, Rgb::new(255, 150, 60), 0.9);
    let lava_light = emission(LightKind::Fire, 3.0, Rgb::new(255, 90, 30), 0.7);
    let torch_light = emission(LightKind::Torch, 5.0, Rgb::new(255, 190, 110), 1.0);
    let tile = |name: &str, color: Rgb, emoji: &str| Material::new(name, color).with_emoji(emoji);
    vec![
        ("dirt".into(), tile("Dirt", Rgb::new(120, 86, 52), "🟫")),
        (
            "fire".into(),
            tile("Fire", Rgb::new(230, 100, 30), "🔥")
                .animated()
                .with_light(fire_light),
        ),
        ("floor".into(), tile("Floor", Rgb::new(150, 140, 125), "⬜")),
        ("forest".into(), tile("Forest", Rgb::new(34, 90, 40), "🌲").animated()),
        ("grass".into(), tile("Grass", Rgb::new(76, 140, 52), "🌿")),
        (
            "lava".into(),
            tile("Lava", Rgb::new(200, 60, 20), "🌋")
                .animated()
                .with_light(lava_light),
        ),
        ("mountain".into(), tile("Mountain", Rgb::new(105, 95, 90), "⛰")),
        ("road".into(), tile("Road", Rgb::new(150, 130, 100), "🛤")),
        ("sand".into(), tile("Sand", Rgb::new(214, 190, 130), "🏖")),
        ("snow".into(), tile("Snow", Rgb::new(235, 240, 245), "❄")),
        ("stone".into(), tile("Stone", Rgb::new(128, 128, 132), "🪨")),
        ("torch".into(), tile("Torch", Rgb::new(150, 140, 125), "🕯").with_light(torch_light)),
        ("village".into(), tile("Village", Rgb::new(140, 110, 80), "🏘").animated()),
        ("wall".into(), tile("Wall", Rgb::new(70, 70, 75), "🧱")),
        ("water".into(), tile("Water", Rgb::new(40, 100, 180), "🌊").animated()),
    ]
}
