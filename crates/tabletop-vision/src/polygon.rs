//! Even-odd scanline fill of darkness polygons.

use tabletop_core::DarknessPolygon;

/// Binary pixel mask, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Union of every polygon, each filled with the even-odd rule. Vertex
    /// coordinates are in tiles and scaled by `scale` pixels per tile.
    pub fn from_polygons<'a>(
        polygons: impl IntoIterator<Item = &'a DarknessPolygon>,
        scale: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let mut mask = Self::new(width, height);
        for poly in polygons {
            fill_even_odd(poly.vertices(), scale, width, height, |x, y| {
                mask.bits[(y * width + x) as usize] = true;
            });
        }
        mask
    }
}

/// Call `plot` for every pixel whose centre lies inside the polygon under
/// the even-odd rule. Pixels are clipped to `width` × `height`.
pub fn fill_even_odd(
    vertices: &[(f32, f32)],
    scale: f32,
    width: u32,
    height: u32,
    mut plot: impl FnMut(u32, u32),
) {
    if vertices.len() < 3 || width == 0 || height == 0 {
        return;
    }
    let pts: Vec<(f32, f32)> = vertices.iter().map(|&(x, y)| (x * scale, y * scale)).collect();
    let (min_y, max_y) = pts
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    let y0 = (min_y - 0.5).ceil().max(0.0) as u32;
    let y1 = ((max_y - 0.5).floor().min(height as f32 - 1.0)).max(-1.0) as i64;

    let mut xs = Vec::new();
    for y in y0 as i64..=y1 {
        let sy = y as f32 + 0.5;
        xs.clear();
        for i in 0..pts.len() {
            let (ax, ay) = pts[i];
            let (bx, by) = pts[(i + 1) % pts.len()];
            if (ay > sy) != (by > sy) {
                xs.push(ax + (sy - ay) * (bx - ax) / (by - ay));
            }
        }
        xs.sort_by(f32::total_cmp);
        for pair in xs.chunks_exact(2) {
            // pixel centres x + 0.5 in [left, right)
            let left = (pair[0] - 0.5).ceil().max(0.0);
            let right = (pair[1] - 0.5).ceil().min(width as f32);
            let mut x = left as u32;
            while (x as f32) < right {
                plot(x, y as u32);
                x += 1;
            }
        }
    }
}
