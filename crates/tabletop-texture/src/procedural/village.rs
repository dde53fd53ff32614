//! Village tiles: a few houses with chimney smoke.
//!
//! The canvas is one cell wide and three cells tall. The bottom third is
//! the cell itself; roofs and smoke rise into the two cells above, which is
//! why the texture carries an offset of `(0, -2·size)`.

use image::{Rgba, RgbaImage};
use rand::Rng;
use tabletop_core::Rgb;

use super::{FRAME_PERIOD, TileRequest};
use crate::noise::{self, fold};
use crate::paint;

const PUFFS: u32 = 6;
const SMOKE: Rgb = Rgb::new(205, 205, 210);

struct House {
    x: i32,
    width: i32,
    wall_top: i32,
    ground: i32,
}

pub(super) fn village(req: &TileRequest) -> RgbaImage {
    let size = req.size;
    let s = size as i32;
    let mut img = RgbaImage::new(size, size * 3);

    let ground = Rgb::new(96, 120, 60).lerp(req.color, 0.3);
    let seed = fold(req.static_seed());
    for y in 2 * size..3 * size {
        for x in 0..size {
            let d = (noise::signed(x, y, seed) * 10.0) as i32;
            img.put_pixel(x, y, Rgba(ground.offset(d).to_rgba(255)));
        }
    }

    let mut rng = noise::rng(req.static_seed());
    let count = if req.detailed() { 2 } else { 1 };
    let wall = req.color.lerp(Rgb::WHITE, 0.3);
    let roof = Rgb::new(150, 60, 40);
    let chimney = Rgb::new(90, 70, 60);

    let mut chimneys = Vec::new();
    for i in 0..count {
        let slot = s / count;
        let width = (slot as f32 * rng.random_range(0.6..0.8)) as i32;
        let x = i * slot + (slot - width) / 2;
        let house = House {
            x,
            width,
            wall_top: 2 * s + (s as f32 * rng.random_range(0.45..0.55)) as i32,
            ground: 2 * s + (s as f32 * 0.88) as i32,
        };
        let roof_top = house.wall_top - (s as f32 * rng.random_range(0.45..0.7)) as i32;
        let cx = house.x as f32 + house.width as f32 / 2.0;

        // chimney stands behind the roof
        let ch_w = (s / 10).max(1);
        let ch_x = house.x + house.width * 2 / 3;
        let ch_top = roof_top + (house.wall_top - roof_top) / 4;
        paint::rect(&mut img, ch_x, ch_top, ch_w, house.wall_top - ch_top, chimney, 255);
        chimneys.push((ch_x as f32 + ch_w as f32 / 2.0, ch_top as f32));

        paint::rect(
            &mut img,
            house.x,
            house.wall_top,
            house.width,
            house.ground - house.wall_top,
            wall,
            255,
        );
        paint::roof(
            &mut img,
            cx,
            roof_top,
            house.wall_top,
            house.width as f32 * 0.65,
            roof,
            255,
        );
        if req.detailed() {
            let door_w = (house.width / 4).max(1);
            let door_h = (house.ground - house.wall_top) / 2;
            paint::rect(
                &mut img,
                cx as i32 - door_w / 2,
                house.ground - door_h,
                door_w,
                door_h,
                Rgb::new(70, 45, 30),
                255,
            );
        }
    }

    if req.detailed() {
        let wind = noise::signed(0, 0, fold(req.bucket_seed(FRAME_PERIOD)));
        for (j, (x, top)) in chimneys.into_iter().enumerate() {
            smoke(&mut img, req, x, top, wind, j as u32);
        }
    }
    img
}

/// Puffs rise from `(x, top)` and loop back to the chimney, twice per
/// animation period. They never leave the canvas.
fn smoke(img: &mut RgbaImage, req: &TileRequest, x: f32, top: f32, wind: f32, chimney: u32) {
    let max_h = (top - 2.0).max(1.0);
    let s = req.size as f32;
    let t = (req.frame % FRAME_PERIOD) as f32 * 2.0 / FRAME_PERIOD as f32;
    for j in 0..PUFFS {
        let h = ((j as f32 / PUFFS as f32 + t + chimney as f32 * 0.37).fract()) * max_h;
        let k = h / max_h;
        let px = x + wind * h * 0.25 + (h / 6.0 + j as f32).sin() * 1.5;
        let r = 1.0 + k * s / 6.0;
        let alpha = (170.0 * (1.0 - k)) as u8;
        paint::disc(img, px, top - h, r, SMOKE, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(frame: u32) -> TileRequest<'static> {
        TileRequest {
            material_id: "village",
            color: Rgb::new(140, 110, 80),
            size: 32,
            frame,
            direction: None,
        }
    }

    #[test]
    fn draws_above_the_cell() {
        let img = village(&req(0));
        let overhang = (0..64).flat_map(|y| (0..32).map(move |x| (x, y)));
        let painted = overhang.filter(|&(x, y)| img.get_pixel(x, y)[3] > 0).count();
        assert!(painted > 0);
        // the very top row stays clear
        assert!((0..32).all(|x| img.get_pixel(x, 0)[3] == 0));
    }

    #[test]
    fn smoke_moves() {
        assert_ne!(village(&req(0)), village(&req(20)));
        assert_eq!(village(&req(20)), village(&req(20 + FRAME_PERIOD)));
    }
}
