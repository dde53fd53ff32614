//! The render loop: one [`Session`] owns every piece of map state and
//! drives the pipeline one tick at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde_json::Value;
use tabletop_core::{
    LightingSettings, MapDocument, Material, MaterialId, MaterialRegistry, Point, TileGrid,
};
use tabletop_vision::{FogState, LightingEngine};

use crate::clock::FrameClock;
use crate::compositor::{Compositor, Scene};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::input::PositionSlot;
use crate::minimap::MiniMap;
use crate::viewport::Viewport;

// ---------------------------------------------------------------------------
// Display sinks
// ---------------------------------------------------------------------------

/// Where presented frames go: a window surface, a projector, a file.
pub trait DisplaySink {
    /// Show one display-sized frame. `frame` is the animation frame it
    /// was rendered at.
    fn present(&mut self, image: &RgbaImage, frame: u32) -> Result<()>;
}

/// Writes every presented frame to the same PNG file.
#[derive(Clone, Debug)]
pub struct PngSink {
    path: PathBuf,
    presented: u64,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            presented: 0,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written so far.
    #[inline]
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for PngSink {
    fn present(&mut self, image: &RgbaImage, _frame: u32) -> Result<()> {
        image.save(&self.path)?;
        self.presented += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Map fields the renderer does not use, kept for saving.
#[derive(Clone, Debug, Default)]
struct DocumentExtras {
    name: Option<String>,
    layers: Option<Value>,
    is_svg_mode: bool,
    svg_path: Option<String>,
}

pub struct Session {
    config: RenderConfig,
    registry: MaterialRegistry,
    grid: TileGrid,
    fog: FogState,
    lighting: LightingEngine,
    compositor: Compositor,
    viewport: Viewport,
    clock: FrameClock,
    slot: PositionSlot,
    recent: VecDeque<Point>,
    extras: DocumentExtras,
}

impl Session {
    /// A session over `grid` with no lights. The fog starts from the
    /// configured initial preset.
    pub fn new(config: RenderConfig, registry: MaterialRegistry, grid: TileGrid) -> Self {
        let config = config.sanitized();
        let mut viewport = Viewport::new(config.viewport_config(), grid.width(), grid.height());
        viewport.set_auto_framing(config.auto_zoom);
        Self {
            fog: initial_fog(&config, &grid),
            lighting: LightingEngine::default(),
            compositor: Compositor::new(&config),
            clock: FrameClock::new(config.frame_period, config.present_every),
            slot: PositionSlot::new(),
            recent: VecDeque::with_capacity(config.recent_reveals),
            extras: DocumentExtras::default(),
            viewport,
            registry,
            grid,
            config,
        }
    }

    /// Open a saved map.
    pub fn open(config: RenderConfig, registry: MaterialRegistry, path: &Path) -> Result<Self> {
        let doc = MapDocument::load_file(path)?;
        let mut session = Self::new(config, registry, TileGrid::new(1, 1));
        session.install(doc);
        Ok(session)
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Direct grid access. Edits made here do not place or remove
    /// material lights; use [`paint_tile`](Self::paint_tile) for that.
    #[inline]
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    #[inline]
    pub fn fog(&self) -> &FogState {
        &self.fog
    }

    #[inline]
    pub fn fog_mut(&mut self) -> &mut FogState {
        &mut self.fog
    }

    #[inline]
    pub fn lighting(&self) -> &LightingEngine {
        &self.lighting
    }

    #[inline]
    pub fn lighting_mut(&mut self) -> &mut LightingEngine {
        &mut self.lighting
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    #[inline]
    pub fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    #[inline]
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// A handle for the webcam task. Positions published through it are
    /// picked up at the next tick.
    pub fn position_slot(&self) -> PositionSlot {
        self.slot.clone()
    }

    /// Recently revealed positions, oldest first.
    pub fn recent_reveals(&self) -> impl Iterator<Item = Point> + '_ {
        self.recent.iter().copied()
    }

    pub fn set_auto_zoom(&mut self, on: bool) {
        self.config.auto_zoom = on;
        self.viewport.set_auto_framing(on);
    }

    pub fn set_lighting_settings(&mut self, settings: LightingSettings) {
        self.lighting.set_settings(settings);
    }

    // -----------------------------------------------------------------------
    // Loop
    // -----------------------------------------------------------------------

    /// Run one tick: take the latest player position, move the camera,
    /// and render into `sink` if this tick is presented. Returns whether a
    /// frame was presented.
    pub fn tick(&mut self, sink: &mut dyn DisplaySink) -> Result<bool> {
        if let Some(p) = self.slot.take() {
            self.reveal_at(p);
        }
        let recent: Vec<Point> = self.recent.iter().copied().collect();
        self.viewport.update_targets(&recent);
        self.viewport.tick();

        let frame = self.clock.frame();
        if !self.clock.advance() {
            return Ok(false);
        }
        let image = self.render_frame(frame);
        sink.present(&image, frame)?;
        Ok(true)
    }

    /// Reveal around a player position and remember it for auto-framing.
    /// Positions off the map are ignored.
    pub fn reveal_at(&mut self, p: Point) -> usize {
        if !self.grid.contains(p) {
            return 0;
        }
        let changed = self.fog.reveal_point(p, self.config.reveal_radius);
        self.recent.push_back(p);
        while self.recent.len() > self.config.recent_reveals {
            self.recent.pop_front();
        }
        changed
    }

    /// The display buffer for `frame`.
    pub fn render_frame(&mut self, frame: u32) -> RgbaImage {
        let scene = Scene {
            grid: &self.grid,
            registry: &self.registry,
            fog: Some(&self.fog),
            lighting: Some(&self.lighting),
        };
        self.compositor.render_frame(&scene, frame, &self.viewport)
    }

    /// The whole composed map for `frame`, before the viewport crop.
    pub fn render_map(&mut self, frame: u32) -> RgbaImage {
        let scene = Scene {
            grid: &self.grid,
            registry: &self.registry,
            fog: Some(&self.fog),
            lighting: Some(&self.lighting),
        };
        self.compositor.render_map(&scene, frame)
    }

    /// The game master's view of the fog.
    pub fn minimap(&self, minimap: &mut MiniMap) -> RgbaImage {
        minimap.render(&self.grid, &self.registry, Some(&self.fog))
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Paint one tile and keep material lights in step with it.
    pub fn paint_tile(&mut self, p: Point, material_id: &str) -> bool {
        let changed = self.grid.put_tile(p, material_id);
        if changed {
            self.lighting.apply_material_paint(p, self.registry.get(material_id));
        }
        changed
    }

    /// Empty one tile and remove any light standing on it.
    pub fn clear_tile(&mut self, p: Point) -> bool {
        let changed = self.grid.clear_tile(p);
        if changed {
            self.lighting.apply_material_paint(p, None);
        }
        changed
    }

    pub fn add_custom_material(
        &mut self,
        id: impl Into<MaterialId>,
        material: Material,
    ) -> Result<()> {
        let id = id.into();
        self.registry.put(id.clone(), material)?;
        self.compositor.invalidate_material(&id);
        Ok(())
    }

    /// Swap the definition of an existing custom material.
    pub fn update_custom_material(&mut self, id: &str, material: Material) -> Result<()> {
        self.registry.remove(id)?;
        self.registry.put(id, material)?;
        self.compositor.invalidate_material(id);
        Ok(())
    }

    pub fn remove_custom_material(&mut self, id: &str) -> Result<Material> {
        let removed = self.registry.remove(id)?;
        self.compositor.invalidate_material(id);
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Replace the map with a saved one. On error nothing changes.
    pub fn load_map(&mut self, path: &Path) -> Result<()> {
        let doc = MapDocument::load_file(path)?;
        self.install(doc);
        Ok(())
    }

    fn install(&mut self, doc: MapDocument) {
        let MapDocument {
            name,
            grid,
            lighting,
            custom_materials,
            layers,
            is_svg_mode,
            svg_path,
        } = doc;
        self.registry.merge_custom(custom_materials);
        self.lighting = lighting.map(LightingEngine::from_record).unwrap_or_default();
        self.fog = initial_fog(&self.config, &grid);
        self.viewport.set_map_size(grid.width(), grid.height());
        self.grid = grid;
        self.recent.clear();
        self.extras = DocumentExtras {
            name,
            layers,
            is_svg_mode,
            svg_path,
        };
        self.compositor.invalidate_all();
    }

    pub fn save_map(&self, path: &Path) -> Result<()> {
        let doc = MapDocument {
            name: self.extras.name.clone(),
            grid: self.grid.clone(),
            lighting: Some(self.lighting.to_record()),
            custom_materials: self.registry.custom_materials(),
            layers: self.extras.layers.clone(),
            is_svg_mode: self.extras.is_svg_mode,
            svg_path: self.extras.svg_path.clone(),
        };
        doc.save_file(path)?;
        Ok(())
    }

    /// Write the composed map at the current frame as a PNG.
    pub fn export_png(&mut self, path: &Path) -> Result<()> {
        let image = self.render_map(self.clock.frame());
        image.save(path)?;
        log::debug!("exported {}x{} map to {}", image.width(), image.height(), path.display());
        Ok(())
    }
}

fn initial_fog(config: &RenderConfig, grid: &TileGrid) -> FogState {
    let mut fog = FogState::new(grid.width(), grid.height());
    fog.apply_preset(config.initial_fog);
    fog
}
