//! Forest canopy with gently swaying crowns.
//!
//! Tree layout is fixed per tile size. Leaf highlights reseed only every
//! [`HIGHLIGHT_BUCKET`] frames, which reads as slow rustling rather than
//! per-frame noise.

use image::RgbaImage;
use rand::Rng;
use tabletop_core::Rgb;

use super::{FRAME_PERIOD, TileRequest};
use crate::noise::{self, cycle_phase, fold};
use crate::paint;

const HIGHLIGHT_BUCKET: u32 = 80;

pub(super) fn forest(req: &TileRequest) -> RgbaImage {
    let mut img = req.canvas();
    let floor = req.color.scale(0.6);
    paint::fill_noisy(&mut img, floor, 8, fold(req.static_seed()));
    if req.size < 4 {
        return img;
    }

    let s = req.size as f32;
    let mut layout = noise::rng(req.static_seed());
    let mut leaves = noise::rng(req.bucket_seed(HIGHLIGHT_BUCKET));
    let sway = cycle_phase(req.frame, FRAME_PERIOD, 1);
    let trunk = Rgb::new(80, 55, 35);
    let highlight = req.color.lerp(Rgb::new(150, 200, 90), 0.4);

    let count = 3 + req.size / 12;
    let mut trees: Vec<(f32, f32, f32, f32)> = (0..count)
        .map(|_| {
            let x = layout.random_range(0.15..0.85) * s;
            let y = layout.random_range(0.2..0.8) * s;
            let r = layout.random_range(0.14..0.24) * s;
            let phase = layout.random_range(0.0..std::f32::consts::TAU);
            (x, y, r, phase)
        })
        .collect();
    // back to front
    trees.sort_by(|a, b| a.1.total_cmp(&b.1));

    for (x, y, r, phase) in trees {
        let dx = (s / 40.0) * (sway + phase).sin();
        paint::rect(
            &mut img,
            (x - r * 0.15) as i32,
            y as i32,
            (r * 0.3).ceil() as i32,
            (r * 0.9).ceil() as i32,
            trunk,
            255,
        );
        paint::disc(&mut img, x + dx + r * 0.1, y + r * 0.1, r, req.color.scale(0.55), 255);
        paint::disc(&mut img, x + dx, y, r, req.color, 255);
        if req.detailed() {
            for _ in 0..3 {
                let hx = x + dx + leaves.random_range(-0.5..0.5) * r;
                let hy = y + leaves.random_range(-0.6..0.2) * r;
                paint::disc(&mut img, hx, hy, (r * 0.2).max(0.8), highlight, 170);
            }
        }
    }
    img
}
