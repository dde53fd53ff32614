//! Procedural tile generators.
//!
//! Each generator is a pure function of a [`TileRequest`]. Built-in
//! material ids map onto a [`Procedural`] kind; anything else is painted
//! as noisy flat colour by the engine.

mod fire;
mod forest;
mod terrain;
mod village;
mod water;

use image::RgbaImage;
use tabletop_core::{Direction, Point, Rgb};

use crate::texture::Texture;

/// Frames per full animation cycle. Every generator is periodic over it.
pub const FRAME_PERIOD: u32 = 240;

/// Everything a generator may depend on.
#[derive(Clone, Copy, Debug)]
pub struct TileRequest<'a> {
    pub material_id: &'a str,
    pub color: Rgb,
    pub size: u32,
    pub frame: u32,
    pub direction: Option<Direction>,
}

impl TileRequest<'_> {
    #[inline]
    pub fn static_seed(&self) -> u64 {
        crate::noise::static_seed(self.material_id, self.size)
    }

    #[inline]
    pub fn frame_seed(&self) -> u64 {
        crate::noise::frame_seed(self.material_id, self.size, self.frame % FRAME_PERIOD)
    }

    /// Seed that changes only every `bucket` frames.
    #[inline]
    pub fn bucket_seed(&self, bucket: u32) -> u64 {
        let frame = (self.frame % FRAME_PERIOD) / bucket.max(1);
        crate::noise::frame_seed(self.material_id, self.size, frame)
    }

    /// Whether the tile is large enough for detail features.
    #[inline]
    pub fn detailed(&self) -> bool {
        self.size >= 16
    }

    pub(crate) fn canvas(&self) -> RgbaImage {
        RgbaImage::new(self.size, self.size)
    }
}

/// Procedural generator families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Procedural {
    Grass,
    Sand,
    Dirt,
    Snow,
    Stone,
    Mountain,
    Road,
    Wall,
    Floor,
    Water,
    Forest,
    Village,
    Fire,
    Lava,
}

impl Procedural {
    /// Generator for a material id, if one exists.
    pub fn for_material(id: &str) -> Option<Self> {
        use Procedural::*;
        Some(match id {
            "grass" => Grass,
            "sand" => Sand,
            "dirt" => Dirt,
            "snow" => Snow,
            "stone" => Stone,
            "mountain" => Mountain,
            "road" => Road,
            "wall" => Wall,
            "floor" | "torch" => Floor,
            "water" | "river" => Water,
            "forest" => Forest,
            "village" => Village,
            "fire" => Fire,
            "lava" => Lava,
            _ => return None,
        })
    }

    /// Whether the generator draws above its own cell.
    pub fn is_extended(self) -> bool {
        self == Procedural::Village
    }

    pub fn generate(self, req: &TileRequest) -> Texture {
        use Procedural::*;
        match self {
            Grass => Texture::cell(terrain::grass(req)),
            Sand => Texture::cell(terrain::sand(req)),
            Dirt => Texture::cell(terrain::dirt(req)),
            Snow => Texture::cell(terrain::snow(req)),
            Stone => Texture::cell(terrain::stone(req)),
            Mountain => Texture::cell(terrain::mountain(req)),
            Road => Texture::cell(terrain::road(req)),
            Wall => Texture::cell(terrain::wall(req)),
            Floor => {
                let mut img = terrain::floor(req);
                if req.material_id == "torch" {
                    fire::torch_sconce(&mut img, req);
                }
                Texture::cell(img)
            }
            Water => Texture::cell(water::water(req)),
            Forest => Texture::cell(forest::forest(req)),
            Village => Texture::new(
                village::village(req),
                Point::new(0, -2 * req.size as i32),
            ),
            Fire => Texture::cell(fire::fire(req)),
            Lava => Texture::cell(fire::lava(req)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::mean_rgb;

    fn req(id: &str, color: Rgb, size: u32, frame: u32) -> TileRequest<'_> {
        TileRequest { material_id: id, color, size, frame, direction: None }
    }

    #[test]
    fn every_kind_fills_its_canvas() {
        for id in [
            "grass", "sand", "dirt", "snow", "stone", "mountain", "road", "wall", "floor", "torch",
            "water", "forest", "fire", "lava",
        ] {
            let kind = Procedural::for_material(id).unwrap();
            for size in [1, 8, 32] {
                let t = kind.generate(&req(id, Rgb::new(100, 120, 90), size, 7));
                assert_eq!(t.image.dimensions(), (size, size), "{id} at {size}");
                assert_eq!(t.offset, Point::ZERO);
                assert!(t.image.pixels().all(|p| p[3] == 255), "{id} at {size} not opaque");
            }
        }
    }

    #[test]
    fn village_is_three_cells_tall() {
        let t = Procedural::Village.generate(&req("village", Rgb::new(140, 110, 80), 32, 0));
        assert_eq!(t.image.dimensions(), (32, 96));
        assert_eq!(t.offset, Point::new(0, -64));
        // the bottom third is the ground and fully covers the cell
        for y in 64..96 {
            for x in 0..32 {
                assert_eq!(t.image.get_pixel(x, y)[3], 255);
            }
        }
    }

    #[test]
    fn grass_reads_green() {
        let t = Procedural::Grass.generate(&req("grass", Rgb::new(76, 140, 52), 32, 0));
        let [r, g, _] = mean_rgb(&t.image);
        assert!(g - r >= 30.0, "grass mean r={r} g={g}");
    }

    #[test]
    fn generators_are_deterministic() {
        for kind in [Procedural::Water, Procedural::Fire, Procedural::Forest, Procedural::Village] {
            let a = kind.generate(&req("x", Rgb::new(90, 90, 90), 24, 33));
            let b = kind.generate(&req("x", Rgb::new(90, 90, 90), 24, 33));
            assert_eq!(a.image, b.image);
        }
    }

    #[test]
    fn animation_is_periodic() {
        for kind in [Procedural::Water, Procedural::Fire, Procedural::Lava] {
            let a = kind.generate(&req("x", Rgb::new(90, 90, 90), 16, 10));
            let b = kind.generate(&req("x", Rgb::new(90, 90, 90), 16, 10 + FRAME_PERIOD));
            let c = kind.generate(&req("x", Rgb::new(90, 90, 90), 16, 11));
            assert_eq!(a.image, b.image, "{kind:?}");
            assert_ne!(a.image, c.image, "{kind:?}");
        }
    }
}
