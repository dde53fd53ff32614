//! Render configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tabletop_texture::{DEFAULT_CAPACITY, FRAME_PERIOD, FogIntensity};
use tabletop_vision::FogPreset;

use crate::error::Result;
use crate::viewport::ViewportConfig;

/// Settings of a render session. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixel side of one tile in the composed map image.
    pub cell_size: u32,
    pub display_width: u32,
    pub display_height: u32,
    /// Frame counter period. Must be a multiple of the generators' 240-tick
    /// cycle.
    pub frame_period: u32,
    /// Present every n-th tick.
    pub present_every: u32,
    pub texture_cache_capacity: usize,
    pub lighting_enabled: bool,
    pub fog_enabled: bool,
    pub fog_intensity: FogIntensity,
    /// Applied to the fog of every new or loaded map.
    pub initial_fog: FogPreset,
    /// Radius, in tiles, revealed around each reported player position.
    pub reveal_radius: i32,
    /// How many recent reveal positions drive auto-framing.
    pub recent_reveals: usize,
    pub auto_zoom: bool,
    pub auto_zoom_padding: i32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_size: 32,
            display_width: 1280,
            display_height: 720,
            frame_period: FRAME_PERIOD,
            present_every: 2,
            texture_cache_capacity: DEFAULT_CAPACITY,
            lighting_enabled: true,
            fog_enabled: true,
            fog_intensity: FogIntensity::Normal,
            initial_fog: FogPreset::Centre { radius: 3 },
            reveal_radius: 2,
            recent_reveals: 16,
            auto_zoom: false,
            auto_zoom_padding: 3,
            min_zoom: 0.5,
            max_zoom: 3.0,
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&text)?.sanitized())
    }

    /// Clamp values that would break the pipeline.
    pub fn sanitized(mut self) -> Self {
        self.cell_size = self.cell_size.max(1);
        self.display_width = self.display_width.max(1);
        self.display_height = self.display_height.max(1);
        self.present_every = self.present_every.max(1);
        if self.frame_period == 0 || self.frame_period % FRAME_PERIOD != 0 {
            log::warn!(
                "frame period {} is not a multiple of {FRAME_PERIOD}, using {FRAME_PERIOD}",
                self.frame_period
            );
            self.frame_period = FRAME_PERIOD;
        }
        self.reveal_radius = self.reveal_radius.max(0);
        self.recent_reveals = self.recent_reveals.max(1);
        self.auto_zoom_padding = self.auto_zoom_padding.max(0);
        if !(self.min_zoom > 0.0) {
            self.min_zoom = 0.5;
        }
        if !(self.max_zoom >= self.min_zoom) {
            self.max_zoom = self.min_zoom;
        }
        self
    }

    pub fn viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            display_width: self.display_width,
            display_height: self.display_height,
            padding: self.auto_zoom_padding,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            ..ViewportConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        let text = r#"{"cell_size": 16, "fog_intensity": "light", "frame_period": 100,
                       "initial_fog": "hide_all"}"#;
        fs::write(&path, text).unwrap();
        let cfg = RenderConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.cell_size, 16);
        assert_eq!(cfg.initial_fog, FogPreset::HideAll);
        assert_eq!(cfg.fog_intensity, FogIntensity::Light);
        assert_eq!(cfg.frame_period, FRAME_PERIOD);
        assert_eq!(cfg.display_width, 1280);
        assert!(cfg.lighting_enabled);
        assert_eq!(RenderConfig::default().initial_fog, FogPreset::Centre { radius: 3 });
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            RenderConfig::from_json_file(&path),
            Err(crate::error::RenderError::Config(_))
        ));
    }
}
