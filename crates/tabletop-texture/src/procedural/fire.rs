//! Fire, lava and torch sconces.

use image::RgbaImage;
use rand::Rng;
use tabletop_core::Rgb;

use super::{FRAME_PERIOD, TileRequest};
use crate::noise::{self, cycle_phase, fold, periodic_value_noise};
use crate::paint;

/// Noise lattice cells across one tile.
const LATTICE: u32 = 4;

const EMBER: Rgb = Rgb::new(140, 30, 10);
const FLAME: Rgb = Rgb::new(240, 120, 20);
const CORE: Rgb = Rgb::new(255, 220, 90);

fn flame_colour(heat: f32) -> Rgb {
    if heat < 0.5 {
        EMBER.lerp(FLAME, heat * 2.0)
    } else {
        FLAME.lerp(CORE, (heat - 0.5) * 2.0)
    }
}

pub(super) fn fire(req: &TileRequest) -> RgbaImage {
    let mut img = req.canvas();
    let seed = fold(req.static_seed());
    paint::fill_noisy(&mut img, Rgb::new(60, 30, 20), 8, seed);

    let s = req.size as f32;
    let l = LATTICE as f32;
    // the flames climb four lattice periods per animation period
    let scroll = (req.frame % FRAME_PERIOD) as f32 * 4.0 * l / FRAME_PERIOD as f32;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let fx = (x as f32 + 0.5) / s;
        let fy = (y as f32 + 0.5) / s;
        let n1 = periodic_value_noise(fx * l, fy * l + scroll, LATTICE, seed);
        let (u2, v2) = (fx * l * 2.0, (fy * l + scroll) * 2.0);
        let n2 = periodic_value_noise(u2, v2, LATTICE * 2, seed ^ 0xF1A3);
        let heat = (n1 * 0.65 + n2 * 0.35) * (0.3 + 0.9 * fy) - (1.0 - fy) * 0.15;
        if heat > 0.25 {
            let k = ((heat - 0.25) / 0.6).clamp(0.0, 1.0);
            *px = paint::over(*px, flame_colour(k), (120.0 + 135.0 * k) as u8);
        }
    }

    if req.detailed() {
        let mut rng = noise::rng(req.frame_seed());
        for _ in 0..req.size / 8 {
            let x = rng.random_range(0..req.size as i32);
            let y = rng.random_range(0..req.size as i32 / 2);
            paint::blend(&mut img, x, y, CORE, 230);
        }
    }
    img
}

pub(super) fn lava(req: &TileRequest) -> RgbaImage {
    let mut img = req.canvas();
    let seed = fold(req.static_seed());
    let crust = Rgb::new(50, 20, 12);
    let bright = Rgb::new(255, 200, 80);
    let pulse = 0.75 + 0.25 * cycle_phase(req.frame, FRAME_PERIOD, 2).sin();
    let drift = (req.frame % FRAME_PERIOD) as f32 * 3.0 / FRAME_PERIOD as f32;

    let s = req.size as f32;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let fx = (x as f32 + 0.5) / s * 3.0;
        let fy = (y as f32 + 0.5) / s * 3.0;
        let plates = periodic_value_noise(fx, fy, 3, seed);
        let flow = periodic_value_noise(fx + drift, fy, 3, seed ^ 0x1A7A);
        let crack = 1.0 - ((plates - 0.5).abs() / 0.12).min(1.0);
        let vein = crack.max((plates - 0.65).max(0.0) * 3.0);
        let glow = (vein * (0.7 + 0.3 * flow) * pulse).min(1.0);
        let mut c = crust.lerp(req.color, glow);
        if glow > 0.7 {
            c = c.lerp(bright, (glow - 0.7) / 0.3);
        }
        let d = (noise::signed(x, y, seed) * 6.0) as i32;
        *px = image::Rgba(c.offset(d).to_rgba(255));
    }
    img
}

/// A wall bracket with a small static flame, drawn onto a floor tile.
pub(super) fn torch_sconce(img: &mut RgbaImage, req: &TileRequest) {
    if req.size < 4 {
        return;
    }
    let s = req.size as f32;
    let cx = s / 2.0;
    paint::rect(
        img,
        (cx - s * 0.05) as i32,
        (s * 0.45) as i32,
        (s * 0.1).ceil() as i32,
        (s * 0.35) as i32,
        Rgb::new(70, 50, 35),
        255,
    );
    paint::disc(img, cx, s * 0.38, s * 0.12, FLAME, 230);
    paint::disc(img, cx, s * 0.4, s * 0.06, CORE, 255);
}
