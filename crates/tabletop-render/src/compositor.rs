//! The per-frame pipeline: static base, animated overlay, lighting, fog
//! and the viewport crop.

use std::sync::Arc;

use image::RgbaImage;
use tabletop_core::{Direction, MaterialId, MaterialRegistry, Point, TileGrid};
use tabletop_texture::{FogIntensity, FogTextureProvider, Texture, TextureEngine};
use tabletop_vision::{FogState, LightingEngine};

use crate::canvas;
use crate::config::RenderConfig;
use crate::viewport::Viewport;

/// What one frame is composed from. Fog and lighting are optional layers;
/// `None` skips the stage.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub grid: &'a TileGrid,
    pub registry: &'a MaterialRegistry,
    pub fog: Option<&'a FogState>,
    pub lighting: Option<&'a LightingEngine>,
}

impl<'a> Scene<'a> {
    /// Tiles only.
    pub fn tiles(grid: &'a TileGrid, registry: &'a MaterialRegistry) -> Self {
        Self {
            grid,
            registry,
            fog: None,
            lighting: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Cached stages
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BaseKey {
    width: i32,
    height: i32,
    cell: u32,
    revision: u64,
}

impl BaseKey {
    fn of(grid: &TileGrid, cell: u32) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            cell,
            revision: grid.revision(),
        }
    }
}

/// A cell redrawn every frame: animated materials and extended tiles.
#[derive(Clone, Debug)]
struct LiveCell {
    pos: Point,
    material: MaterialId,
    direction: Option<Direction>,
}

#[derive(Debug)]
struct StaticBase {
    key: BaseKey,
    image: RgbaImage,
    live: Vec<LiveCell>,
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Compositor {
    engine: TextureEngine,
    fog_tiles: FogTextureProvider,
    cell: u32,
    lighting_enabled: bool,
    fog_enabled: bool,
    fog_intensity: FogIntensity,
    base: Option<StaticBase>,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl Compositor {
    pub fn new(config: &RenderConfig) -> Self {
        Self::with_engine(config, TextureEngine::new(config.texture_cache_capacity))
    }

    /// Use a preconfigured texture engine, e.g. one with an asset root.
    pub fn with_engine(config: &RenderConfig, engine: TextureEngine) -> Self {
        Self {
            engine,
            fog_tiles: FogTextureProvider::new(),
            cell: config.cell_size.max(1),
            lighting_enabled: config.lighting_enabled,
            fog_enabled: config.fog_enabled,
            fog_intensity: config.fog_intensity,
            base: None,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> u32 {
        self.cell
    }

    pub fn set_cell_size(&mut self, cell: u32) {
        self.cell = cell.max(1);
    }

    #[inline]
    pub fn texture_engine(&self) -> &TextureEngine {
        &self.engine
    }

    pub fn set_lighting_enabled(&mut self, on: bool) {
        self.lighting_enabled = on;
    }

    pub fn set_fog_enabled(&mut self, on: bool) {
        self.fog_enabled = on;
    }

    pub fn set_fog_intensity(&mut self, intensity: FogIntensity) {
        self.fog_intensity = intensity;
    }

    /// Drop everything cached for one material. The static base is rebuilt
    /// on the next frame.
    pub fn invalidate_material(&mut self, material_id: &str) {
        self.engine.invalidate(material_id);
        self.base = None;
    }

    /// Drop every cached texture and the static base.
    pub fn invalidate_all(&mut self) {
        self.engine.clear();
        self.fog_tiles.clear();
        self.base = None;
    }

    /// Compose the whole map at `cell` pixels per tile.
    pub fn render_map(&mut self, scene: &Scene, frame: u32) -> RgbaImage {
        self.ensure_base(scene.grid, scene.registry);
        let cell = self.cell;
        let Some(base) = self.base.as_ref() else {
            return canvas::black(0, 0);
        };
        let mut img = base.image.clone();

        // Stage 2: cells that change with the frame, in row-major order so
        // an overhang lands on top of the rows above it.
        for live in &base.live {
            let tex = self.engine.get_texture(
                scene.registry,
                &live.material,
                cell,
                frame,
                live.direction,
            );
            let (x, y) = cell_origin(live.pos, cell);
            canvas::blit(
                &mut img,
                &tex.image,
                x + tex.offset.x as i64,
                y + tex.offset.y as i64,
            );
        }

        if let Some(lighting) = scene.lighting.filter(|_| self.lighting_enabled) {
            let (w, h) = (scene.grid.width(), scene.grid.height());
            let overlay = lighting.render_overlay(w, h, cell, frame);
            canvas::composite(&mut img, &overlay);
        }

        if let Some(fog) = scene.fog.filter(|_| self.fog_enabled) {
            let tile = self.fog_tiles.get(cell, self.fog_intensity);
            for p in fog.hidden_cells().filter(|p| scene.grid.contains(*p)) {
                let (x, y) = cell_origin(p, cell);
                canvas::blit(&mut img, &tile, x, y);
            }
        }
        img
    }

    /// Compose the map and crop it to the display through `viewport`.
    pub fn render_frame(&mut self, scene: &Scene, frame: u32, viewport: &Viewport) -> RgbaImage {
        let map = self.render_map(scene, frame);
        viewport.project(&map, self.cell)
    }

    /// Rebuild the static base when the grid or cell size changed since
    /// it was built. Runs at the start of a frame only.
    fn ensure_base(&mut self, grid: &TileGrid, registry: &MaterialRegistry) {
        let key = BaseKey::of(grid, self.cell);
        if self.base.as_ref().is_some_and(|b| b.key == key) {
            return;
        }
        let cell = self.cell;
        let mut image = canvas::black(grid.width() as u32 * cell, grid.height() as u32 * cell);
        let mut live = Vec::new();

        for (pos, id) in grid.iter() {
            let Some(id) = id else { continue };
            let animated = registry.get(id).is_some_and(|m| m.animated);
            let extended = self.engine.is_extended(registry, id);
            if animated || extended {
                live.push(LiveCell {
                    pos,
                    material: id.to_string(),
                    direction: grid.direction(pos),
                });
            }
            if animated {
                continue;
            }
            let tex = self.engine.get_texture(registry, id, cell, 0, grid.direction(pos));
            let (x, y) = cell_origin(pos, cell);
            blit_cell_part(&mut image, &tex, cell, x, y);
        }

        log::debug!(
            "rebuilt static base {}x{} at {cell} px, {} live cells",
            grid.width(),
            grid.height(),
            live.len()
        );
        self.base = Some(StaticBase { key, image, live });
    }
}

#[inline]
fn cell_origin(p: Point, cell: u32) -> (i64, i64) {
    (p.x as i64 * cell as i64, p.y as i64 * cell as i64)
}

/// Blit only the part of a texture covering its own cell.
fn blit_cell_part(dst: &mut RgbaImage, tex: &Arc<Texture>, cell: u32, x: i64, y: i64) {
    let sx = (-tex.offset.x).max(0) as u32;
    let sy = (-tex.offset.y).max(0) as u32;
    canvas::blit_region(dst, &tex.image, (sx, sy, cell, cell), x, y);
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use tabletop_core::{LightSource, LightingMode, LightingSettings, Material, Rgb};

    use super::*;

    fn config(cell: u32) -> RenderConfig {
        RenderConfig {
            cell_size: cell,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn map_image_is_grid_times_cell() {
        let mut grid = TileGrid::new(3, 2);
        grid.fill("grass");
        let registry = MaterialRegistry::builtin();
        let mut comp = Compositor::new(&config(8));
        let img = comp.render_map(&Scene::tiles(&grid, &registry), 0);
        assert_eq!(img.dimensions(), (24, 16));
        assert!(img.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn base_rebuilds_after_grid_edit() {
        let mut grid = TileGrid::new(2, 1);
        grid.fill("grass");
        let registry = MaterialRegistry::builtin();
        let mut comp = Compositor::new(&config(8));
        let before = comp.render_map(&Scene::tiles(&grid, &registry), 0);
        grid.put_tile(Point::new(1, 0), "sand");
        let after = comp.render_map(&Scene::tiles(&grid, &registry), 0);
        assert_ne!(before, after);
        assert_eq!(
            canvas::block_mean(&before, 0, 0, 8, 8),
            canvas::block_mean(&after, 0, 0, 8, 8)
        );
    }

    #[test]
    fn animated_cells_change_between_frames() {
        let mut grid = TileGrid::new(1, 1);
        grid.fill("water");
        let registry = MaterialRegistry::builtin();
        let mut comp = Compositor::new(&config(16));
        let scene = Scene::tiles(&grid, &registry);
        assert_ne!(comp.render_map(&scene, 0), comp.render_map(&scene, 30));
    }

    #[test]
    fn edited_material_is_redrawn() {
        let mut grid = TileGrid::new(1, 1);
        grid.fill("mine");
        let mut registry = MaterialRegistry::builtin();
        registry.put("mine", Material::new("Mine", Rgb::new(200, 0, 0))).unwrap();
        let mut comp = Compositor::new(&config(8));
        let red = comp.render_map(&Scene::tiles(&grid, &registry), 0);

        registry.remove("mine").unwrap();
        registry.put("mine", Material::new("Mine", Rgb::new(0, 0, 200))).unwrap();
        comp.invalidate_material("mine");
        let blue = comp.render_map(&Scene::tiles(&grid, &registry), 0);
        let (r, b) = (canvas::block_mean(&red, 0, 0, 8, 8), canvas::block_mean(&blue, 0, 0, 8, 8));
        assert!(r[0] > r[2] + 100.0);
        assert!(b[2] > b[0] + 100.0);
    }

    #[test]
    fn hidden_cells_get_fog() {
        let mut grid = TileGrid::new(2, 1);
        grid.fill("grass");
        let registry = MaterialRegistry::builtin();
        let mut fog = FogState::new(2, 1);
        fog.reveal_point(Point::new(0, 0), 0);
        let mut comp = Compositor::new(&config(8));
        let clear = comp.render_map(&Scene::tiles(&grid, &registry), 0);
        let scene = Scene {
            fog: Some(&fog),
            ..Scene::tiles(&grid, &registry)
        };
        let fogged = comp.render_map(&scene, 0);
        assert_eq!(
            canvas::block_mean(&clear, 0, 0, 8, 8),
            canvas::block_mean(&fogged, 0, 0, 8, 8)
        );
        assert_ne!(
            canvas::block_mean(&clear, 8, 0, 8, 8),
            canvas::block_mean(&fogged, 8, 0, 8, 8)
        );

        comp.set_fog_enabled(false);
        assert_eq!(comp.render_map(&scene, 0), clear);
    }

    #[test]
    fn night_darkens_unlit_cells() {
        let mut grid = TileGrid::new(5, 1);
        grid.fill("sand");
        let registry = MaterialRegistry::builtin();
        let mut lighting = LightingEngine::new(LightingSettings {
            mode: LightingMode::Night,
            ..LightingSettings::default()
        });
        lighting.add_light(LightSource::new(0.0, 0.0, 2.0, Rgb::new(255, 200, 120), 1.0));
        let scene = Scene {
            lighting: Some(&lighting),
            ..Scene::tiles(&grid, &registry)
        };
        let mut comp = Compositor::new(&config(8));
        let img = comp.render_map(&scene, 0);
        let lit = canvas::block_mean(&img, 0, 0, 8, 8);
        let dark = canvas::block_mean(&img, 32, 0, 8, 8);
        assert!(lit.iter().sum::<f32>() > 3.0 * dark.iter().sum::<f32>());
        assert_eq!(img.get_pixel(36, 4)[3], 255);
    }

    #[test]
    fn blank_grid_is_black() {
        let grid = TileGrid::new(4, 4);
        let registry = MaterialRegistry::builtin();
        let mut comp = Compositor::new(&config(4));
        let img = comp.render_map(&Scene::tiles(&grid, &registry), 7);
        assert!(img.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }
}
