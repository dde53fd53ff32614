//! Dynamic lighting: a darkness overlay with holes cut by light sources.
//!
//! The overlay starts at the mode's base darkness (everywhere at night,
//! inside darkness polygons by day). Each light lowers the alpha inside its
//! disc as `base · (1 − intensity · (1 − smoothstep(d / r)))` and lights
//! combine by keeping the minimum alpha, so overlaps never over-brighten.
//! The RGB of a lit pixel is tinted toward the colour of its strongest
//! light.
//!
//! Flickering lights scale their radius by a factor in [0.85, 1.15] drawn
//! from an RNG seeded with `(light index, frame)`. Overlays depend on the
//! frame and are never cached.

use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tabletop_core::{
    DarknessPolygon, LightSource, LightingMode, LightingRecord, LightingSettings, Material, Point,
    Rgb,
};

use crate::polygon::Mask;

pub const FLICKER_MIN: f32 = 0.85;
pub const FLICKER_MAX: f32 = 1.15;

#[inline]
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Radius multiplier of light `index` at `frame`.
pub fn flicker_factor(index: usize, frame: u32) -> f32 {
    let seed = ((index as u64) << 32) | frame as u64;
    let mut rng = StdRng::seed_from_u64(seed);
    rng.random_range(FLICKER_MIN..=FLICKER_MAX)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightingEngine {
    lights: Vec<LightSource>,
    polygons: Vec<DarknessPolygon>,
    settings: LightingSettings,
}

impl LightingEngine {
    pub fn new(settings: LightingSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn from_record(record: LightingRecord) -> Self {
        Self {
            settings: record.settings(),
            lights: record.lights,
            polygons: record.darkness_polygons,
        }
    }

    pub fn to_record(&self) -> LightingRecord {
        LightingRecord {
            lights: self.lights.clone(),
            darkness_polygons: self.polygons.clone(),
            lighting_mode: self.settings.mode,
            darkness_opacity: self.settings.darkness_opacity,
        }
    }

    #[inline]
    pub fn settings(&self) -> LightingSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: LightingSettings) {
        self.settings = LightingSettings {
            darkness_opacity: settings.darkness_opacity.clamp(0.0, 1.0),
            ..settings
        };
    }

    // -----------------------------------------------------------------------
    // Lights
    // -----------------------------------------------------------------------

    #[inline]
    pub fn lights(&self) -> &[LightSource] {
        &self.lights
    }

    /// Add a light and return its index.
    pub fn add_light(&mut self, light: LightSource) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    pub fn remove_light(&mut self, index: usize) -> Option<LightSource> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    pub fn move_light(&mut self, index: usize, x: f32, y: f32) -> bool {
        match self.lights.get_mut(index) {
            Some(l) => {
                l.x = x;
                l.y = y;
                true
            }
            None => false,
        }
    }

    /// Index of the light nearest to `(x, y)` within `tolerance` tiles.
    pub fn light_at(&self, x: f32, y: f32, tolerance: f32) -> Option<usize> {
        self.lights
            .iter()
            .enumerate()
            .map(|(i, l)| (i, l.distance_to(x, y)))
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Indices of the lights sitting in cell `p`, ascending.
    pub fn lights_at_cell(&self, p: Point) -> Vec<usize> {
        self.lights
            .iter()
            .enumerate()
            .filter(|(_, l)| l.x.round() as i32 == p.x && l.y.round() as i32 == p.y)
            .map(|(i, _)| i)
            .collect()
    }

    /// Keep the lights of cell `p` in step with the material just painted
    /// there (`None` when the cell was cleared). An emitting material
    /// gets its light unless one of the same kind is already present;
    /// lights of another kind are replaced. A non-emitting material or a
    /// cleared cell loses its lights. Returns whether the set changed.
    pub fn apply_material_paint(&mut self, p: Point, material: Option<&Material>) -> bool {
        let existing = self.lights_at_cell(p);
        let emission = material.and_then(|m| m.light.as_ref());

        if let Some(e) = emission {
            if existing.iter().any(|&i| self.lights[i].light_type == e.kind) {
                return false;
            }
        } else if existing.is_empty() {
            return false;
        }

        for &i in existing.iter().rev() {
            self.lights.remove(i);
        }
        if let Some(e) = emission {
            self.lights.push(e.source_at(p.x, p.y));
        }
        true
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    // -----------------------------------------------------------------------
    // Darkness polygons
    // -----------------------------------------------------------------------

    #[inline]
    pub fn polygons(&self) -> &[DarknessPolygon] {
        &self.polygons
    }

    pub fn add_polygon(&mut self, polygon: DarknessPolygon) -> usize {
        self.polygons.push(polygon);
        self.polygons.len() - 1
    }

    pub fn replace_polygon(&mut self, index: usize, polygon: DarknessPolygon) -> bool {
        match self.polygons.get_mut(index) {
            Some(p) => {
                *p = polygon;
                true
            }
            None => false,
        }
    }

    pub fn remove_polygon(&mut self, index: usize) -> Option<DarknessPolygon> {
        (index < self.polygons.len()).then(|| self.polygons.remove(index))
    }

    // -----------------------------------------------------------------------
    // Overlay
    // -----------------------------------------------------------------------

    /// Render the darkness overlay for a `width` × `height` tile map at
    /// `cell` pixels per tile.
    pub fn render_overlay(&self, width: i32, height: i32, cell: u32, frame: u32) -> RgbaImage {
        let pw = width.max(0) as u32 * cell;
        let ph = height.max(0) as u32 * cell;
        let n = pw as usize * ph as usize;
        let base = self.settings.base_alpha();

        let floor: Vec<f32> = if self.settings.mode == LightingMode::Night {
            vec![base; n]
        } else {
            let mask = Mask::from_polygons(&self.polygons, cell as f32, pw, ph);
            (0..n)
                .map(|i| {
                    let (x, y) = ((i % pw as usize) as u32, (i / pw as usize) as u32);
                    if mask.get(x, y) { base } else { 0.0 }
                })
                .collect()
        };
        let mut alpha = floor.clone();
        let mut tint: Vec<(f32, Rgb)> = vec![(0.0, Rgb::BLACK); n];

        let cs = cell as f32;
        for (i, light) in self.lights.iter().enumerate() {
            let radius = if light.flicker {
                light.radius * flicker_factor(i, frame)
            } else {
                light.radius
            };
            let cx = (light.x + 0.5) * cs;
            let cy = (light.y + 0.5) * cs;
            let r_px = radius * cs;
            let x0 = (cx - r_px).floor().max(0.0) as u32;
            let y0 = (cy - r_px).floor().max(0.0) as u32;
            let x1 = ((cx + r_px).ceil().max(0.0) as u32).min(pw);
            let y1 = ((cy + r_px).ceil().max(0.0) as u32).min(ph);
            for y in y0..y1 {
                for x in x0..x1 {
                    let dx = x as f32 + 0.5 - cx;
                    let dy = y as f32 + 0.5 - cy;
                    let d = (dx * dx + dy * dy).sqrt() / cs;
                    if d >= radius {
                        continue;
                    }
                    let idx = y as usize * pw as usize + x as usize;
                    let lit = floor[idx] * (1.0 - light.intensity * (1.0 - smoothstep(d / radius)));
                    if lit < alpha[idx] {
                        alpha[idx] = lit;
                    }
                    let w = light.intensity * (1.0 - d / radius);
                    if w > tint[idx].0 {
                        tint[idx] = (w, light.color);
                    }
                }
            }
        }

        let mut img = RgbaImage::new(pw, ph);
        for (i, px) in img.pixels_mut().enumerate() {
            let (w, color) = tint[i];
            let rgb = Rgb::BLACK.lerp(color, w);
            *px = Rgba(rgb.to_rgba((alpha[i].clamp(0.0, 1.0) * 255.0) as u8));
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletop_core::{LightKind, LightingMode, NIGHT_OPACITY};

    fn night() -> LightingSettings {
        LightingSettings { mode: LightingMode::Night, ..Default::default() }
    }

    fn centre(cell: u32, x: u32, y: u32) -> (u32, u32) {
        (x * cell + cell / 2, y * cell + cell / 2)
    }

    fn alpha_at(img: &RgbaImage, (x, y): (u32, u32)) -> f32 {
        img.get_pixel(x, y)[3] as f32 / 255.0
    }

    #[test]
    fn light_darkens_only_outside_disc() {
        let mut engine = LightingEngine::new(night());
        engine.add_light(LightSource::new(5.0, 5.0, 3.0, Rgb::new(255, 200, 120), 1.0));
        let img = engine.render_overlay(10, 10, 8, 0);
        assert_eq!(img.dimensions(), (80, 80));
        assert_eq!(alpha_at(&img, centre(8, 5, 5)), 0.0);
        assert!(alpha_at(&img, centre(8, 0, 0)) >= 0.9);
        let mid = alpha_at(&img, centre(8, 7, 5));
        assert!(mid > 0.05 && mid < 0.9, "alpha at (7,5) = {mid}");
    }

    #[test]
    fn flicker_is_reproducible() {
        let mut engine = LightingEngine::new(night());
        engine.add_light(LightSource::new(5.0, 5.0, 3.0, Rgb::WHITE, 1.0).with_flicker(true));
        let a = engine.render_overlay(10, 10, 8, 100);
        let b = engine.render_overlay(10, 10, 8, 100);
        let c = engine.render_overlay(10, 10, 8, 101);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn flicker_factor_range() {
        for frame in 0..240 {
            for i in 0..4 {
                let f = flicker_factor(i, frame);
                assert!((FLICKER_MIN..=FLICKER_MAX).contains(&f));
            }
        }
        assert_ne!(flicker_factor(0, 7), flicker_factor(1, 7));
    }

    #[test]
    fn overlapping_lights_take_minimum() {
        let a = LightSource::new(3.0, 3.0, 3.0, Rgb::WHITE, 0.8);
        let b = LightSource::new(5.0, 3.0, 4.0, Rgb::WHITE, 0.6);

        let mut only_a = LightingEngine::new(night());
        only_a.add_light(a.clone());
        let mut only_b = LightingEngine::new(night());
        only_b.add_light(b.clone());
        let mut both = LightingEngine::new(night());
        both.add_light(a);
        both.add_light(b);

        let (ia, ib, iab) = (
            only_a.render_overlay(10, 8, 4, 0),
            only_b.render_overlay(10, 8, 4, 0),
            both.render_overlay(10, 8, 4, 0),
        );
        for (x, y, px) in iab.enumerate_pixels() {
            let want = ia.get_pixel(x, y)[3].min(ib.get_pixel(x, y)[3]);
            assert_eq!(px[3], want, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn day_mode_only_darkens_polygons() {
        let mut engine = LightingEngine::new(LightingSettings {
            mode: LightingMode::Day,
            darkness_opacity: 0.5,
        });
        engine.add_polygon(
            DarknessPolygon::new(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]).unwrap(),
        );
        let img = engine.render_overlay(4, 4, 4, 0);
        assert_eq!(img.get_pixel(1, 1)[3], 127);
        assert_eq!(img.get_pixel(12, 12)[3], 0);
    }

    #[test]
    fn night_ignores_polygons() {
        let mut engine = LightingEngine::new(night());
        engine.add_polygon(
            DarknessPolygon::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]).unwrap(),
        );
        let img = engine.render_overlay(3, 3, 2, 0);
        let expect = (NIGHT_OPACITY * 255.0) as u8;
        assert!(img.pixels().all(|p| p[3] == expect));
    }

    #[test]
    fn selection() {
        let mut engine = LightingEngine::default();
        engine.add_light(LightSource::new(1.0, 1.0, 2.0, Rgb::WHITE, 1.0));
        engine.add_light(LightSource::new(4.0, 1.0, 2.0, Rgb::WHITE, 1.0));
        assert_eq!(engine.light_at(3.6, 1.0, 0.5), Some(1));
        assert_eq!(engine.light_at(2.5, 1.0, 0.5), None);
        assert_eq!(engine.light_at(4.0, 1.0, 0.0), Some(1));
        assert!(engine.move_light(0, 2.0, 2.0));
        assert_eq!(engine.lights_at_cell(Point::new(2, 2)), vec![0]);
        assert!(engine.remove_light(5).is_none());
    }

    #[test]
    fn auto_lights_follow_painting() {
        let torch = tabletop_core::MaterialRegistry::builtin()
            .get("torch")
            .cloned()
            .unwrap();
        let fire = tabletop_core::MaterialRegistry::builtin()
            .get("fire")
            .cloned()
            .unwrap();
        let grass = Material::new("Grass", Rgb::new(76, 140, 52));
        let p = Point::new(3, 4);
        let mut engine = LightingEngine::default();

        assert!(engine.apply_material_paint(p, Some(&torch)));
        assert_eq!(engine.lights().len(), 1);
        assert_eq!(engine.lights()[0].light_type, LightKind::Torch);
        // same kind again: idempotent
        assert!(!engine.apply_material_paint(p, Some(&torch)));
        assert_eq!(engine.lights().len(), 1);
        // different kind: replaced
        assert!(engine.apply_material_paint(p, Some(&fire)));
        assert_eq!(engine.lights().len(), 1);
        assert_eq!(engine.lights()[0].light_type, LightKind::Fire);
        // non-emitting material removes it
        assert!(engine.apply_material_paint(p, Some(&grass)));
        assert!(engine.lights().is_empty());
        assert!(!engine.apply_material_paint(p, None));
    }

    #[test]
    fn record_round_trip() {
        let mut engine = LightingEngine::new(night());
        engine.add_light(LightSource::new(1.0, 2.0, 3.0, Rgb::WHITE, 0.5).with_flicker(true));
        engine.add_polygon(DarknessPolygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap());
        let record = engine.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let back = LightingEngine::from_record(serde_json::from_str(&json).unwrap());
        assert_eq!(back, engine);
    }

    #[test]
    fn polygon_editing() {
        let mut engine = LightingEngine::default();
        let tri = DarknessPolygon::new(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]).unwrap();
        let big = DarknessPolygon::new(vec![(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)]).unwrap();
        assert_eq!(engine.add_polygon(tri), 0);
        assert!(engine.replace_polygon(0, big.clone()));
        assert!(!engine.replace_polygon(9, big.clone()));
        assert_eq!(engine.polygons(), &[big.clone()]);
        assert_eq!(engine.remove_polygon(0), Some(big));
        assert!(engine.remove_polygon(0).is_none());
    }
}
