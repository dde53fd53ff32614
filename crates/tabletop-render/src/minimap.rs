//! The game master's mini-map: a small picture of the fog state that can
//! be clicked to reveal or hide areas.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tabletop_core::{MaterialRegistry, Point, TileGrid};
use tabletop_texture::{FogIntensity, FogTextureProvider};
use tabletop_vision::FogState;

use crate::canvas;

#[derive(Debug)]
pub struct MiniMap {
    scale: u32,
    intensity: FogIntensity,
    fog_tiles: FogTextureProvider,
}

impl Default for MiniMap {
    fn default() -> Self {
        Self::new(4)
    }
}

impl MiniMap {
    /// A mini-map drawing each tile as a `scale` × `scale` block, with
    /// light fog over hidden tiles.
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
            intensity: FogIntensity::Light,
            fog_tiles: FogTextureProvider::new(),
        }
    }

    pub fn with_intensity(mut self, intensity: FogIntensity) -> Self {
        self.intensity = intensity;
        self
    }

    #[inline]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    #[inline]
    pub fn intensity(&self) -> FogIntensity {
        self.intensity
    }

    /// The cloud tile drawn over hidden tiles. Built once per scale and
    /// intensity, then shared.
    pub fn fog_tile(&mut self) -> Arc<RgbaImage> {
        self.fog_tiles.get(self.scale, self.intensity)
    }

    /// Every tile shows its material colour; hidden ones get the fog cloud
    /// on top. Empty tiles are black. Without a fog state every tile
    /// counts as revealed.
    pub fn render(
        &mut self,
        grid: &TileGrid,
        registry: &MaterialRegistry,
        fog: Option<&FogState>,
    ) -> RgbaImage {
        let s = self.scale;
        let mut img = canvas::black(grid.width() as u32 * s, grid.height() as u32 * s);
        let tile = self.fog_tile();
        for (p, id) in grid.iter() {
            let (x0, y0) = (p.x as u32 * s, p.y as u32 * s);
            if let Some(id) = id {
                let color = Rgba(registry.lookup(id).color.to_rgba(255));
                for y in y0..y0 + s {
                    for x in x0..x0 + s {
                        img.put_pixel(x, y, color);
                    }
                }
            }
            if fog.is_some_and(|f| !f.is_revealed(p)) {
                canvas::blit(&mut img, &tile, x0 as i64, y0 as i64);
            }
        }
        img
    }

    /// Tile under a mini-map pixel, if any.
    pub fn cell_at(&self, pixel: (u32, u32), map_size: Point) -> Option<Point> {
        let p = Point::new((pixel.0 / self.scale) as i32, (pixel.1 / self.scale) as i32);
        (p.x < map_size.x && p.y < map_size.y).then_some(p)
    }

    /// Reveal (or hide) a disc of `brush` tiles around the clicked pixel.
    /// Returns how many tiles changed.
    pub fn paint(&self, fog: &mut FogState, pixel: (u32, u32), brush: i32, reveal: bool) -> usize {
        let size = Point::new(fog.width(), fog.height());
        let Some(center) = self.cell_at(pixel, size) else {
            return 0;
        };
        if reveal {
            fog.reveal_point(center, brush)
        } else {
            fog.hide_point(center, brush)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_tiles_show_the_fog_tile() {
        let mut grid = TileGrid::new(2, 1);
        grid.fill("snow");
        let registry = MaterialRegistry::builtin();
        let mut fog = FogState::new(2, 1);
        fog.reveal_point(Point::new(0, 0), 0);

        let mut mm = MiniMap::new(3);
        let img = mm.render(&grid, &registry, Some(&fog));
        assert_eq!(img.dimensions(), (6, 3));
        let snow = Rgba(registry.lookup("snow").color.to_rgba(255));
        assert_eq!(img.get_pixel(1, 1), &snow);

        let tile = mm.fog_tile();
        assert!(Arc::ptr_eq(&tile, &mm.fog_tile()));
        let mut want = RgbaImage::from_pixel(3, 3, snow);
        canvas::blit(&mut want, &tile, 0, 0);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(img.get_pixel(3 + x, y), want.get_pixel(x, y));
            }
        }
        assert_ne!(img.get_pixel(4, 1), &snow);
    }

    #[test]
    fn hidden_empty_tiles_are_fogged() {
        let grid = TileGrid::new(1, 1);
        let registry = MaterialRegistry::builtin();
        let fog = FogState::new(1, 1);
        let mut mm = MiniMap::new(2).with_intensity(FogIntensity::Dense);
        let img = mm.render(&grid, &registry, Some(&fog));
        let tile = mm.fog_tile();
        assert_eq!(img.get_pixel(0, 0), tile.get_pixel(0, 0));
        assert_eq!(img.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn empty_tiles_are_black() {
        let grid = TileGrid::new(2, 2);
        let registry = MaterialRegistry::builtin();
        let img = MiniMap::default().render(&grid, &registry, None);
        assert!(img.pixels().all(|p| p == &Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn click_paints_fog() {
        let mut fog = FogState::new(10, 10);
        let mm = MiniMap::new(4);
        assert_eq!(mm.cell_at((9, 17), Point::new(10, 10)), Some(Point::new(2, 4)));
        assert_eq!(mm.cell_at((40, 0), Point::new(10, 10)), None);

        assert_eq!(mm.paint(&mut fog, (9, 17), 1, true), 5);
        assert!(fog.is_revealed(Point::new(2, 4)));
        assert_eq!(mm.paint(&mut fog, (9, 17), 0, false), 1);
        assert!(!fog.is_revealed(Point::new(2, 4)));
        assert_eq!(mm.paint(&mut fog, (400, 0), 3, true), 0);
    }
}
