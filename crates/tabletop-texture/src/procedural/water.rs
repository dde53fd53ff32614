//! Animated, seamlessly tiling water.
//!
//! The pattern is evaluated on a torus of period `size - 1`, so column 0
//! equals the last column and row 0 equals the last row: adjacent water
//! tiles join without a visible seam. Waves use integer frequencies and the
//! phase advances by `frame * k` with `k = 2π·2 / FRAME_PERIOD`, which keeps
//! the animation periodic. A flow direction shifts each wave's phase by
//! `frame * k * (fx·dx + fy·dy)`, so the surface drifts along the current.

use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};
use tabletop_core::Rgb;

use super::{FRAME_PERIOD, TileRequest};
use crate::noise::{self, cycle_phase, fold};
use crate::paint;

/// (x frequency, y frequency, amplitude)
const WAVES: [(i32, i32, f32); 5] = [
    (1, 0, 0.34),
    (0, 1, 0.28),
    (1, 1, 0.2),
    (2, -1, 0.12),
    (3, 1, 0.06),
];

const GLINT_RADIUS: f32 = 1.5;

pub(super) fn water(req: &TileRequest) -> RgbaImage {
    let size = req.size;
    if size < 2 {
        return paint::solid(size, req.color);
    }
    let period = (size - 1) as f32;
    let seed = fold(req.static_seed());
    let t = cycle_phase(req.frame, FRAME_PERIOD, 2);
    let (dx, dy) = req.direction.map_or((0, 0), |d| d.delta());

    let phases: Vec<f32> = WAVES
        .iter()
        .enumerate()
        .map(|(i, &(fx, fy, _))| {
            let offset = noise::unit(i as u32, 0, seed) * TAU;
            let flow = fx * dx + fy * dy;
            if flow == 0 {
                offset + t * 0.5
            } else {
                offset - flow as f32 * t
            }
        })
        .collect();

    let glints = glints(req, period, t);
    let deep = req.color.scale(0.7);
    let light = req.color.lerp(Rgb::new(170, 215, 245), 0.45);

    let mut img = req.canvas();
    for (x, y, px) in img.enumerate_pixels_mut() {
        let xm = x % (size - 1);
        let ym = y % (size - 1);
        let u = TAU * xm as f32 / period;
        let v = TAU * ym as f32 / period;

        let mut h: f32 = WAVES
            .iter()
            .zip(&phases)
            .map(|(&(fx, fy, amp), ph)| amp * (fx as f32 * u + fy as f32 * v + ph).sin())
            .sum();
        h += noise::signed(xm, ym, seed) * 0.08;

        let mut color = if h >= 0.0 {
            req.color.lerp(light, h)
        } else {
            req.color.lerp(deep, -h)
        };

        for &(gx, gy, strength) in &glints {
            let d = torus_dist(xm as f32, gx, period).hypot(torus_dist(ym as f32, gy, period));
            if d < GLINT_RADIUS {
                color = color.lerp(Rgb::WHITE, (1.0 - d / GLINT_RADIUS) * strength);
            }
        }
        *px = Rgba(color.to_rgba(255));
    }
    img
}

/// Glint centres on a ring around the tile centre, rotating once per period.
fn glints(req: &TileRequest, period: f32, t: f32) -> Vec<(f32, f32, f32)> {
    if !req.detailed() {
        return Vec::new();
    }
    let count = 3 + req.size / 16;
    let spin = cycle_phase(req.frame, FRAME_PERIOD, 1);
    let c = period / 2.0;
    (0..count)
        .map(|i| {
            let theta = TAU * i as f32 / count as f32 + spin;
            let r = period * (0.18 + 0.12 * (i % 3) as f32);
            let gx = (c + r * theta.cos()).rem_euclid(period);
            let gy = (c + r * theta.sin()).rem_euclid(period);
            let pulse = 0.5 + 0.5 * (t + i as f32 * 1.7).sin();
            (gx, gy, pulse * 0.8)
        })
        .collect()
}

#[inline]
fn torus_dist(a: f32, b: f32, period: f32) -> f32 {
    let d = (a - b).abs();
    d.min(period - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::mean_rgb;
    use tabletop_core::Direction;

    fn req(size: u32, frame: u32, direction: Option<Direction>) -> TileRequest<'static> {
        TileRequest {
            material_id: "water",
            color: Rgb::new(40, 100, 180),
            size,
            frame,
            direction,
        }
    }

    #[test]
    fn edges_match() {
        let directions = Direction::ALL.into_iter().map(Some).chain([None]);
        for direction in directions {
            for size in [2, 3, 7, 16, 31, 32] {
                let last = size - 1;
                for frame in (0..FRAME_PERIOD).step_by(7).chain([FRAME_PERIOD - 1]) {
                    let img = water(&req(size, frame, direction));
                    for i in 0..size {
                        let at = format!("{direction:?} size {size} frame {frame} index {i}");
                        assert_eq!(img.get_pixel(0, i), img.get_pixel(last, i), "row, {at}");
                        assert_eq!(img.get_pixel(i, 0), img.get_pixel(i, last), "column, {at}");
                    }
                }
            }
        }
    }

    #[test]
    fn reads_blue() {
        let [r, _, b] = mean_rgb(&water(&req(32, 0, None)));
        assert!(b - r >= 40.0, "water mean r={r} b={b}");
    }

    #[test]
    fn direction_changes_pattern() {
        let still = water(&req(32, 30, None));
        let flowing = water(&req(32, 30, Some(Direction::Down)));
        assert_ne!(still, flowing);
    }

    #[test]
    fn tiny_tile_is_flat() {
        let img = water(&req(1, 3, None));
        assert_eq!(img.get_pixel(0, 0), &Rgba([40, 100, 180, 255]));
    }
}
