//! Blitting onto RGBA canvases.

use image::{Rgba, RgbaImage, imageops};
use tabletop_core::Rgb;
use tabletop_texture::{mean_rgb, over};

/// Opaque black canvas.
pub fn black(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
}

/// Alpha-composite `src` onto `dst` with its top-left at `(x, y)`.
/// Anything outside `dst` is clipped.
pub fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    blit_region(dst, src, (0, 0, src.width(), src.height()), x, y);
}

/// Alpha-composite the `(sx, sy, w, h)` region of `src` at `(x, y)`.
pub fn blit_region(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    region: (u32, u32, u32, u32),
    x: i64,
    y: i64,
) {
    let (sx, sy, w, h) = region;
    let w = w.min(src.width().saturating_sub(sx)) as i64;
    let h = h.min(src.height().saturating_sub(sy)) as i64;
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(dw);
    let y1 = (y + h).min(dh);
    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = *src.get_pixel(sx + (dx - x) as u32, sy + (dy - y) as u32);
            over_pixel(dst.get_pixel_mut(dx as u32, dy as u32), s);
        }
    }
}

/// Alpha-composite two images of the same size.
pub fn composite(dst: &mut RgbaImage, src: &RgbaImage) {
    if dst.dimensions() != src.dimensions() {
        log::warn!(
            "skipping overlay of size {:?} on canvas of size {:?}",
            src.dimensions(),
            dst.dimensions()
        );
        return;
    }
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        over_pixel(d, *s);
    }
}

#[inline]
fn over_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    if src[3] != 0 {
        *dst = over(*dst, Rgb::new(src[0], src[1], src[2]), src[3]);
    }
}

/// Mean RGB of a rectangular block, clipped to the image.
pub fn block_mean(img: &RgbaImage, x: u32, y: u32, w: u32, h: u32) -> [f32; 3] {
    mean_rgb(&imageops::crop_imm(img, x, y, w, h).to_image())
}
