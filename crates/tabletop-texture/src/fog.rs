//! Fog cloud tiles.
//!
//! A fog tile is a soft cloud made of gaussian blobs over a base colour.
//! Blob distances wrap around the tile, so neighbouring fogged cells join
//! without seams. One image is built per `(size, intensity)` and handed out
//! as a shared [`Arc`]; callers blit the same image onto every hidden cell.

use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tabletop_core::Rgb;

use crate::noise;

/// How thick the fog is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FogIntensity {
    /// Semi-transparent: the map shows through.
    Light,
    #[default]
    Normal,
    /// Fully opaque.
    Dense,
}

impl FogIntensity {
    /// Alpha of the fog before cloud modulation.
    pub fn base_alpha(self) -> u8 {
        match self {
            FogIntensity::Light => 140,
            FogIntensity::Normal => 235,
            FogIntensity::Dense => 255,
        }
    }
}

const FOG_BASE: Rgb = Rgb::new(120, 124, 134);
const FOG_HIGHLIGHT: Rgb = Rgb::new(205, 208, 216);
const FOG_SEED: u64 = 0xF06_C10D;

#[derive(Debug, Default)]
pub struct FogTextureProvider {
    tiles: HashMap<(u32, FogIntensity), Arc<RgbaImage>>,
}

impl FogTextureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared cloud tile for `(size, intensity)`.
    pub fn get(&mut self, size: u32, intensity: FogIntensity) -> Arc<RgbaImage> {
        let tile = self
            .tiles
            .entry((size, intensity))
            .or_insert_with(|| Arc::new(cloud(size, intensity)));
        Arc::clone(tile)
    }

    /// Number of distinct tiles built so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}

fn cloud(size: u32, intensity: FogIntensity) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    if size == 0 {
        return img;
    }
    let s = size as f32;
    let mut rng = noise::rng(FOG_SEED ^ size as u64);
    let blobs: Vec<(f32, f32, f32, f32)> = (0..6 + size / 8)
        .map(|_| {
            let x = rng.random_range(0.0..s);
            let y = rng.random_range(0.0..s);
            let sigma = rng.random_range(0.12..0.3) * s;
            let weight = rng.random_range(0.5..1.0);
            (x, y, sigma, weight)
        })
        .collect();

    let wrap = |d: f32| {
        let d = d.abs();
        d.min(s - d)
    };
    let base = intensity.base_alpha() as f32;
    for (x, y, px) in img.enumerate_pixels_mut() {
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let density: f32 = blobs
            .iter()
            .map(|&(bx, by, sigma, w)| {
                let d2 = wrap(fx - bx).powi(2) + wrap(fy - by).powi(2);
                w * (-d2 / (2.0 * sigma * sigma)).exp()
            })
            .sum::<f32>()
            .min(1.0);
        let color = FOG_BASE.lerp(FOG_HIGHLIGHT, density);
        let alpha = match intensity {
            FogIntensity::Dense => 255.0,
            _ => (base * (0.9 + 0.1 * density)).min(255.0),
        };
        *px = Rgba(color.to_rgba(alpha.round() as u8));
    }
    img
}
