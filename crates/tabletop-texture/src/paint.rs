//! Small raster helpers shared by the generators. All of them clip to the
//! image bounds, so callers may pass shapes that overhang the tile.

use image::{Rgba, RgbaImage};
use tabletop_core::Rgb;

use crate::noise;

/// Fill `img` with `base` perturbed per pixel by up to `amp` levels.
pub fn fill_noisy(img: &mut RgbaImage, base: Rgb, amp: i32, seed: u32) {
    for (x, y, px) in img.enumerate_pixels_mut() {
        let d = (noise::signed(x, y, seed) * amp as f32).round() as i32;
        *px = Rgba(base.offset(d).to_rgba(255));
    }
}

/// Alpha-over one pixel. Out-of-bounds coordinates are ignored.
#[inline]
pub fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Rgb, alpha: u8) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 || alpha == 0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    *dst = over(*dst, color, alpha);
}

/// Source-over composition of `color` at `alpha` onto `dst`.
pub fn over(dst: Rgba<u8>, color: Rgb, alpha: u8) -> Rgba<u8> {
    let sa = alpha as u32;
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| -> u8 {
        let num = s as u32 * sa * 255 + d as u32 * da * (255 - sa);
        (num / (out_a * 255)).min(255) as u8
    };
    Rgba([
        mix(color.r(), dst[0]),
        mix(color.g(), dst[1]),
        mix(color.b(), dst[2]),
        out_a.min(255) as u8,
    ])
}

/// Filled axis-aligned rectangle.
pub fn rect(img: &mut RgbaImage, x: i32, y: i32, w: i32, h: i32, color: Rgb, alpha: u8) {
    for yy in y..y + h {
        for xx in x..x + w {
            blend(img, xx, yy, color, alpha);
        }
    }
}

/// Filled disc with a soft one-pixel rim.
pub fn disc(img: &mut RgbaImage, cx: f32, cy: f32, r: f32, color: Rgb, alpha: u8) {
    if r <= 0.0 {
        return;
    }
    let x0 = (cx - r - 1.0).floor() as i32;
    let x1 = (cx + r + 1.0).ceil() as i32;
    let y0 = (cy - r - 1.0).floor() as i32;
    let y1 = (cy + r + 1.0).ceil() as i32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let cover = (r + 0.5 - d).clamp(0.0, 1.0);
            if cover > 0.0 {
                blend(img, x, y, color, (alpha as f32 * cover) as u8);
            }
        }
    }
}

/// Filled isosceles triangle pointing up: apex at `(cx, top)`, base of
/// half-width `half` on row `bottom`.
pub fn roof(img: &mut RgbaImage, cx: f32, top: i32, bottom: i32, half: f32, color: Rgb, alpha: u8) {
    let h = (bottom - top).max(1) as f32;
    for y in top..=bottom {
        let t = (y - top) as f32 / h;
        let hw = half * t;
        let x0 = (cx - hw).round() as i32;
        let x1 = (cx + hw).round() as i32;
        for x in x0..=x1 {
            blend(img, x, y, color, alpha);
        }
    }
}

/// Straight line, one pixel wide.
pub fn line(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgb, alpha: u8) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (from.0 + dx * t).floor() as i32;
        let y = (from.1 + dy * t).floor() as i32;
        blend(img, x, y, color, alpha);
    }
}

/// A square of `color`, fully opaque.
pub fn solid(size: u32, color: Rgb) -> RgbaImage {
    RgbaImage::from_pixel(size, size, Rgba(color.to_rgba(255)))
}

/// Mean RGB of the opaque-weighted pixels of `img`.
pub fn mean_rgb(img: &RgbaImage) -> [f32; 3] {
    let mut sum = [0f64; 3];
    let mut weight = 0f64;
    for px in img.pixels() {
        let a = px[3] as f64 / 255.0;
        for c in 0..3 {
            sum[c] += px[c] as f64 * a;
        }
        weight += a;
    }
    if weight == 0.0 {
        return [0.0; 3];
    }
    [
        (sum[0] / weight) as f32,
        (sum[1] / weight) as f32,
        (sum[2] / weight) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_opaque_replaces() {
        let px = over(Rgba([10, 20, 30, 255]), Rgb::new(200, 100, 50), 255);
        assert_eq!(px, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn over_onto_transparent_keeps_color() {
        let px = over(Rgba([0, 0, 0, 0]), Rgb::new(200, 100, 50), 128);
        assert_eq!(px[3], 128);
        assert_eq!(px[0], 200);
    }

    #[test]
    fn shapes_clip() {
        let mut img = RgbaImage::new(4, 4);
        disc(&mut img, 0.0, 0.0, 6.0, Rgb::WHITE, 255);
        rect(&mut img, -3, -3, 100, 1, Rgb::BLACK, 255);
        line(&mut img, (-5.0, -5.0), (10.0, 10.0), Rgb::BLACK, 255);
        assert_eq!(img.get_pixel(3, 3)[3], 255);
    }
}
