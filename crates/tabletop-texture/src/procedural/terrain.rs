//! Static ground materials. Each starts from a noisy fill of the material
//! colour and adds one kind of detail when the tile is large enough.

use image::RgbaImage;
use rand::Rng;
use tabletop_core::Rgb;

use super::TileRequest;
use crate::noise::{self, fold};
use crate::paint;

fn base(req: &TileRequest, amp: i32) -> RgbaImage {
    let mut img = req.canvas();
    paint::fill_noisy(&mut img, req.color, amp, fold(req.static_seed()));
    img
}

pub(super) fn grass(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 12);
    if !req.detailed() {
        return img;
    }
    let mut rng = noise::rng(req.static_seed());
    let s = req.size as i32;
    let tufts = (req.size * req.size / 48) as usize;
    let dark = req.color.scale(0.7);
    let light = req.color.lerp(Rgb::new(170, 220, 110), 0.35);
    for _ in 0..tufts {
        let x = rng.random_range(0..s);
        let y = rng.random_range(2..s);
        let len = rng.random_range(2..=(s / 8).max(3));
        let lean = rng.random_range(-1..=1);
        let color = if rng.random::<bool>() { dark } else { light };
        for i in 0..len {
            paint::blend(&mut img, x + lean * i / 2, y - i, color, 200);
        }
    }
    img
}

pub(super) fn sand(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 8);
    if !req.detailed() {
        return img;
    }
    let seed = fold(req.static_seed());
    let light = req.color.lerp(Rgb::WHITE, 0.25);
    let size = req.size as f32;
    let phase = noise::unit(0, 0, seed) * std::f32::consts::TAU;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let wobble = noise::periodic_value_noise(x as f32 / 6.0, y as f32 / 6.0, 64, seed) * 3.0;
        let ripple = ((y as f32 + wobble) / size * std::f32::consts::TAU * 3.0 + phase).sin();
        if ripple > 0.8 {
            *px = paint::over(*px, light, 90);
        }
    }
    img
}

pub(super) fn dirt(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 14);
    if !req.detailed() {
        return img;
    }
    let mut rng = noise::rng(req.static_seed());
    let s = req.size as f32;
    let pebbles = (req.size / 4) as usize;
    for _ in 0..pebbles {
        let x = rng.random_range(0.0..s);
        let y = rng.random_range(0.0..s);
        let r = rng.random_range(0.6..(s / 16.0).max(1.2));
        let shade = req.color.scale(rng.random_range(0.55..0.8));
        paint::disc(&mut img, x, y, r, shade, 220);
    }
    img
}

pub(super) fn snow(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 5);
    if !req.detailed() {
        return img;
    }
    let seed = fold(req.static_seed());
    let shadow = Rgb::new(190, 205, 230);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let drift = noise::periodic_value_noise(x as f32 / 7.0, y as f32 / 7.0, 64, seed);
        if drift > 0.7 {
            *px = paint::over(*px, shadow, ((drift - 0.7) * 300.0) as u8);
        } else if noise::unit(x, y, seed ^ 0x5EED) > 0.985 {
            *px = paint::over(*px, Rgb::WHITE, 255);
        }
    }
    img
}

pub(super) fn stone(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 10);
    if !req.detailed() {
        return img;
    }
    let mut rng = noise::rng(req.static_seed());
    let s = req.size as f32;
    let crack = req.color.scale(0.55);
    for _ in 0..(req.size / 12).max(1) {
        let (mut x, mut y) = (rng.random_range(0.0..s), rng.random_range(0.0..s));
        for _ in 0..rng.random_range(4..10) {
            let nx = x + rng.random_range(-3.0..3.0);
            let ny = y + rng.random_range(-3.0..3.0);
            paint::line(&mut img, (x, y), (nx, ny), crack, 200);
            (x, y) = (nx, ny);
        }
    }
    img
}

pub(super) fn mountain(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 10);
    if !req.detailed() {
        return img;
    }
    let s = req.size as f32;
    let rock = req.color.scale(0.8);
    let cap = Rgb::new(235, 238, 242);
    let peaks = [(0.32, 0.25, 0.3), (0.68, 0.1, 0.38)];
    for (cx, top, half) in peaks {
        let (cx, top, half) = (cx * s, (top * s) as i32, half * s);
        let bottom = (s * 0.92) as i32;
        paint::roof(&mut img, cx, top, bottom, half, rock, 255);
        let cap_bottom = top + ((bottom - top) as f32 * 0.3) as i32;
        paint::roof(&mut img, cx, top, cap_bottom, half * 0.3, cap, 255);
        // shaded flank
        paint::line(&mut img, (cx, top as f32), (cx + half, bottom as f32), rock.scale(0.7), 160);
    }
    img
}

pub(super) fn road(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 8);
    if !req.detailed() {
        return img;
    }
    let seed = fold(req.static_seed());
    let mortar = req.color.scale(0.65);
    let step = (req.size / 4).max(4);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let row = y / step;
        let shift = if row % 2 == 0 { 0 } else { step / 2 };
        let on_joint = y % step == 0 || (x + shift) % step == 0;
        if on_joint {
            *px = paint::over(*px, mortar, 200);
        } else {
            let stone = (row * 31 + (x + shift) / step) as u32;
            let d = (noise::signed(stone, row, seed) * 12.0) as i32;
            *px = paint::over(*px, req.color.offset(d), 120);
        }
    }
    img
}

pub(super) fn wall(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 6);
    if !req.detailed() {
        return img;
    }
    let mortar = req.color.lerp(Rgb::new(30, 30, 32), 0.5);
    let highlight = req.color.lerp(Rgb::WHITE, 0.15);
    let bh = (req.size / 4).max(4);
    let bw = bh * 2;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let shift = if (y / bh) % 2 == 0 { 0 } else { bw / 2 };
        if y % bh == 0 || (x + shift) % bw == 0 {
            *px = paint::over(*px, mortar, 255);
        } else if y % bh == 1 {
            *px = paint::over(*px, highlight, 120);
        }
    }
    img
}

pub(super) fn floor(req: &TileRequest) -> RgbaImage {
    let mut img = base(req, 4);
    if !req.detailed() {
        return img;
    }
    let seam = req.color.scale(0.8);
    let half = req.size / 2;
    for (x, y, px) in img.enumerate_pixels_mut() {
        if x % half == 0 || y % half == 0 {
            *px = paint::over(*px, seam, 180);
        }
    }
    img
}
