//! The texture engine: one entry point, [`TextureEngine::get_texture`],
//! resolving a material to a shared image.
//!
//! Resolution order:
//!
//! 1. the frame bitmap for `frame mod len`, when the material lists frames
//!    and that file exists, else the reference bitmap;
//! 2. the procedural generator for built-in kinds;
//! 3. a deterministic noisy fill of the base colour.
//!
//! Anything that fails is logged once per material and replaced by the
//! grey fallback. The call never fails.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tabletop_core::{Direction, Material, MaterialId, MaterialRegistry};

use crate::cache::{DEFAULT_CAPACITY, TextureCache, TextureKey};
use crate::error::{Result, TextureError};
use crate::noise;
use crate::paint;
use crate::procedural::{FRAME_PERIOD, Procedural, TileRequest};
use crate::texture::Texture;

#[derive(Debug)]
pub struct TextureEngine {
    cache: TextureCache,
    asset_root: Option<PathBuf>,
    warned: HashSet<MaterialId>,
}

impl Default for TextureEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TextureEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: TextureCache::new(capacity),
            asset_root: None,
            warned: HashSet::new(),
        }
    }

    /// Directory relative bitmap paths are resolved against.
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Texture for `material_id` at `size` pixels. Animated materials
    /// depend on `frame` and `direction`; static ones ignore both.
    pub fn get_texture(
        &mut self,
        registry: &MaterialRegistry,
        material_id: &str,
        size: u32,
        frame: u32,
        direction: Option<Direction>,
    ) -> Arc<Texture> {
        let frame = frame % FRAME_PERIOD;
        let Some(material) = registry.get(material_id) else {
            self.warn_once(material_id, format_args!("unknown material `{material_id}`"));
            return self.fallback(material_id, size);
        };

        let key = if material.animated {
            TextureKey::Animated {
                material: material_id.to_string(),
                size,
                frame,
                direction,
            }
        } else {
            TextureKey::Static { material: material_id.to_string(), size }
        };
        if let Some(t) = self.cache.get(&key) {
            return t;
        }

        let texture = match self.render(material_id, material, size, frame, direction) {
            Ok(t) => t,
            Err(e) => {
                self.warn_once(
                    material_id,
                    format_args!("texture for `{material_id}` failed: {e}"),
                );
                Texture::fallback(size)
            }
        };
        self.cache.insert(key, texture)
    }

    /// Whether `material_id` renders as an extended (taller than its cell)
    /// tile. Bitmap-backed materials never are.
    pub fn is_extended(&self, registry: &MaterialRegistry, material_id: &str) -> bool {
        registry.get(material_id).is_some_and(|m| {
            m.texture_path.is_none()
                && m.frame_paths.is_empty()
                && Procedural::for_material(material_id).is_some_and(Procedural::is_extended)
        })
    }

    /// Forget every cached texture of one material, e.g. after it was
    /// edited. Also re-arms its failure warning.
    pub fn invalidate(&mut self, material_id: &str) {
        let n = self.cache.invalidate(material_id);
        self.warned.remove(material_id);
        log::debug!("invalidated {n} textures of `{material_id}`");
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.warned.clear();
    }

    #[inline]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    fn fallback(&mut self, material_id: &str, size: u32) -> Arc<Texture> {
        let key = TextureKey::Static { material: material_id.to_string(), size };
        match self.cache.get(&key) {
            Some(t) => t,
            None => self.cache.insert(key, Texture::fallback(size)),
        }
    }

    fn render(
        &self,
        material_id: &str,
        material: &Material,
        size: u32,
        frame: u32,
        direction: Option<Direction>,
    ) -> Result<Texture> {
        if size == 0 {
            return Err(TextureError::InvalidSize(size));
        }

        if !material.frame_paths.is_empty() {
            let idx = frame as usize % material.frame_paths.len();
            let path = self.resolve(&material.frame_paths[idx]);
            if path.is_file() {
                return Ok(Texture::cell(load_scaled(&path, size)?));
            }
        }
        if let Some(path) = &material.texture_path {
            let path = self.resolve(path);
            if !path.is_file() {
                return Err(TextureError::MissingBitmap(path));
            }
            return Ok(Texture::cell(load_scaled(&path, size)?));
        }

        let req = TileRequest {
            material_id,
            color: material.color,
            size,
            frame,
            direction,
        };
        if let Some(kind) = Procedural::for_material(material_id) {
            return Ok(kind.generate(&req));
        }

        let mut img = RgbaImage::new(size, size);
        paint::fill_noisy(&mut img, material.color, 10, noise::fold(req.static_seed()));
        Ok(Texture::cell(img))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.asset_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn warn_once(&mut self, material_id: &str, msg: std::fmt::Arguments) {
        if self.warned.insert(material_id.to_string()) {
            log::warn!("{msg}");
        }
    }
}

fn load_scaled(path: &Path, size: u32) -> Result<RgbaImage> {
    let img = image::open(path)?.to_rgba8();
    if img.dimensions() == (size, size) {
        return Ok(img);
    }
    Ok(imageops::resize(&img, size, size, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tabletop_core::Rgb;

    fn registry() -> MaterialRegistry {
        let mut reg = MaterialRegistry::builtin();
        reg.put("swamp", Material::new("Swamp", Rgb::new(60, 80, 50))).unwrap();
        reg
    }

    #[test]
    fn static_textures_are_shared() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        let a = engine.get_texture(&reg, "grass", 32, 0, None);
        let b = engine.get_texture(&reg, "grass", 32, 17, Some(Direction::Left));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn animated_textures_key_on_frame_and_direction() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        let a = engine.get_texture(&reg, "water", 16, 0, None);
        let b = engine.get_texture(&reg, "water", 16, 1, None);
        let c = engine.get_texture(&reg, "water", 16, 0, Some(Direction::Up));
        let d = engine.get_texture(&reg, "water", 16, FRAME_PERIOD, None);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(Arc::ptr_eq(&a, &d));
    }

    #[test]
    fn unknown_material_is_grey() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        let t = engine.get_texture(&reg, "unobtainium", 8, 0, None);
        assert_eq!(t.image.dimensions(), (8, 8));
        assert!(t.image.pixels().all(|p| *p == Rgba([128, 128, 128, 255])));
    }

    #[test]
    fn custom_material_gets_noisy_fill() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        let t = engine.get_texture(&reg, "swamp", 16, 0, None);
        let mean = paint::mean_rgb(&t.image);
        assert!((mean[1] - 80.0).abs() < 5.0);
        assert!(t.image.pixels().any(|p| p[1] != 80));
    }

    #[test]
    fn missing_reference_bitmap_falls_back_to_grey() {
        let mut reg = registry();
        reg.put(
            "statue",
            Material::new("Statue", Rgb::new(10, 10, 10)).with_texture("/nonexistent/statue.png"),
        )
        .unwrap();
        let mut engine = TextureEngine::default();
        let t = engine.get_texture(&reg, "statue", 4, 0, None);
        assert_eq!(t.image.get_pixel(0, 0), &Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn bitmaps_load_and_scale() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 255]))
            .save(dir.path().join("base.png"))
            .unwrap();
        RgbaImage::from_pixel(4, 4, Rgba([10, 200, 10, 255]))
            .save(dir.path().join("f1.png"))
            .unwrap();

        let mut reg = registry();
        reg.put(
            "banner",
            Material::new("Banner", Rgb::new(0, 0, 0))
                .animated()
                .with_texture("base.png")
                .with_frames(vec!["f0.png".into(), "f1.png".into()]),
        )
        .unwrap();
        let mut engine = TextureEngine::default().with_asset_root(dir.path());

        // frame 0 has no file: reference bitmap
        let t0 = engine.get_texture(&reg, "banner", 8, 0, None);
        assert_eq!(t0.image.dimensions(), (8, 8));
        let close = |px: &Rgba<u8>, want: [u8; 4]| {
            px.0.iter().zip(want).all(|(a, b)| (*a as i32 - b as i32).abs() <= 2)
        };
        assert!(close(t0.image.get_pixel(4, 4), [200, 10, 10, 255]));
        let t1 = engine.get_texture(&reg, "banner", 8, 1, None);
        assert!(close(t1.image.get_pixel(4, 4), [10, 200, 10, 255]));
        assert!(!engine.is_extended(&reg, "banner"));
    }

    #[test]
    fn village_is_extended() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        assert!(engine.is_extended(&reg, "village"));
        let t = engine.get_texture(&reg, "village", 16, 0, None);
        assert!(t.is_extended());
        assert_eq!(t.image.dimensions(), (16, 48));
    }

    #[test]
    fn invalidate_drops_one_material() {
        let reg = registry();
        let mut engine = TextureEngine::default();
        engine.get_texture(&reg, "grass", 8, 0, None);
        engine.get_texture(&reg, "sand", 8, 0, None);
        engine.invalidate("grass");
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn cache_stays_bounded() {
        let reg = registry();
        let mut engine = TextureEngine::new(16);
        for frame in 0..100 {
            engine.get_texture(&reg, "fire", 4, frame, None);
            assert!(engine.cache_len() <= 16);
        }
    }
}
