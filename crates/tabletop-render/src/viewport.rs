//! The camera over the composed map.
//!
//! Positions are in tile-index space: `(cx, cy) = (3, 4)` looks at the
//! centre of tile `(3, 4)`. Zoom 1 fits the whole map in the display;
//! larger values magnify. Each tick the current state moves a fixed
//! fraction of the way to its target, an exponential approach.

use image::{Rgba, RgbaImage};
use tabletop_core::{Point, Range};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportConfig {
    pub display_width: u32,
    pub display_height: u32,
    /// Tiles added on every side of the auto-framing box.
    pub padding: i32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Fraction of the remaining zoom distance covered per tick.
    pub zoom_rate: f32,
    /// Fraction of the remaining pan distance covered per tick.
    pub pan_rate: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            display_width: 1280,
            display_height: 720,
            padding: 3,
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_rate: 0.1,
            pan_rate: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Camera {
    zoom: f32,
    cx: f32,
    cy: f32,
}

#[derive(Clone, Debug)]
pub struct Viewport {
    config: ViewportConfig,
    map_width: i32,
    map_height: i32,
    current: Camera,
    target: Camera,
    auto: bool,
    manual: bool,
}

impl Viewport {
    pub fn new(config: ViewportConfig, map_width: i32, map_height: i32) -> Self {
        let mut vp = Self {
            config,
            map_width: map_width.max(1),
            map_height: map_height.max(1),
            current: Camera { zoom: 1.0, cx: 0.0, cy: 0.0 },
            target: Camera { zoom: 1.0, cx: 0.0, cy: 0.0 },
            auto: false,
            manual: false,
        };
        vp.reset();
        vp
    }

    #[inline]
    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.current.zoom
    }

    /// Current centre in tile-index space.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.current.cx, self.current.cy)
    }

    #[inline]
    pub fn target_zoom(&self) -> f32 {
        self.target.zoom
    }

    #[inline]
    pub fn target_center(&self) -> (f32, f32) {
        (self.target.cx, self.target.cy)
    }

    #[inline]
    pub fn auto_framing(&self) -> bool {
        self.auto
    }

    pub fn set_auto_framing(&mut self, on: bool) {
        self.auto = on;
    }

    fn map_center(&self) -> (f32, f32) {
        (
            (self.map_width - 1) as f32 / 2.0,
            (self.map_height - 1) as f32 / 2.0,
        )
    }

    /// Display pixels per tile at zoom 1.
    pub fn fit_scale(&self) -> f32 {
        let sx = self.config.display_width as f32 / self.map_width as f32;
        let sy = self.config.display_height as f32 / self.map_height as f32;
        sx.min(sy)
    }

    fn clamp_zoom(&self, z: f32) -> f32 {
        z.clamp(self.config.min_zoom, self.config.max_zoom)
    }

    /// Map resized: snap back to the whole-map view.
    pub fn set_map_size(&mut self, width: i32, height: i32) {
        self.map_width = width.max(1);
        self.map_height = height.max(1);
        self.reset();
    }

    /// Snap to the whole-map view and drop any manual adjustment.
    pub fn reset(&mut self) {
        let (cx, cy) = self.map_center();
        let zoom = self.clamp_zoom(1.0);
        self.target = Camera { zoom, cx, cy };
        self.current = self.target;
        self.manual = false;
    }

    /// Multiply the target zoom. Manual moves hold until [`reset`](Self::reset)
    /// or until auto-framing takes over.
    pub fn zoom_by(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.target.zoom = self.clamp_zoom(self.target.zoom * factor);
            self.manual = true;
        }
    }

    /// Shift the target centre by whole or fractional tiles.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.target.cx = (self.target.cx + dx).clamp(0.0, (self.map_width - 1) as f32);
        self.target.cy = (self.target.cy + dy).clamp(0.0, (self.map_height - 1) as f32);
        self.manual = true;
    }

    /// Choose targets from the recently revealed positions. With
    /// auto-framing off or no positions, targets relax to the whole map
    /// unless the view was moved by hand.
    pub fn update_targets(&mut self, positions: &[Point]) {
        let bbox = Range::bounding(positions.iter().copied());
        match bbox {
            Some(b) if self.auto => {
                let pad = self.config.padding.max(0);
                let span_x = (b.width() + 2 * pad).max(1) as f32;
                let span_y = (b.height() + 2 * pad).max(1) as f32;
                let tile = self.fit_scale();
                let zoom = (self.config.display_width as f32 / (span_x * tile))
                    .min(self.config.display_height as f32 / (span_y * tile))
                    .min(self.config.max_zoom);
                self.target = Camera {
                    zoom: self.clamp_zoom(zoom),
                    cx: (b.min.x + b.max.x - 1) as f32 / 2.0,
                    cy: (b.min.y + b.max.y - 1) as f32 / 2.0,
                };
                self.manual = false;
            }
            _ if self.manual => {}
            _ => {
                let (cx, cy) = self.map_center();
                self.target = Camera { zoom: self.clamp_zoom(1.0), cx, cy };
            }
        }
    }

    /// Advance one tick toward the targets.
    pub fn tick(&mut self) {
        let t = self.target;
        let c = &mut self.current;
        c.zoom += (t.zoom - c.zoom) * self.config.zoom_rate;
        c.cx += (t.cx - c.cx) * self.config.pan_rate;
        c.cy += (t.cy - c.cy) * self.config.pan_rate;
        c.zoom = c.zoom.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    /// Place the composed map (`cell` pixels per tile) into a display-sized
    /// buffer. Axes on which the scaled map is smaller than the display are
    /// centred; larger axes follow the camera and stop at the map edge.
    pub fn project(&self, composed: &RgbaImage, cell: u32) -> RgbaImage {
        let (dw, dh) = (self.config.display_width, self.config.display_height);
        let mut out = RgbaImage::from_pixel(dw, dh, Rgba([0, 0, 0, 255]));
        let (cw, ch) = composed.dimensions();
        if cw == 0 || ch == 0 || cell == 0 {
            return out;
        }

        // display pixels per composed pixel
        let scale = self.fit_scale() * self.current.zoom / cell as f32;
        let focus_x = (self.current.cx + 0.5) * cell as f32 * scale;
        let focus_y = (self.current.cy + 0.5) * cell as f32 * scale;
        let off_x = axis_offset(dw as f32, cw as f32 * scale, focus_x);
        let off_y = axis_offset(dh as f32, ch as f32 * scale, focus_y);

        let cols: Vec<Option<u32>> = (0..dw)
            .map(|x| source_index(x, off_x, scale, cw))
            .collect();
        for y in 0..dh {
            let Some(sy) = source_index(y, off_y, scale, ch) else {
                continue;
            };
            for (x, sx) in cols.iter().enumerate() {
                if let Some(sx) = sx {
                    out.put_pixel(x as u32, y, *composed.get_pixel(*sx, sy));
                }
            }
        }
        out
    }
}

/// Display coordinate of the composed image's origin on one axis.
fn axis_offset(display: f32, scaled: f32, focus: f32) -> f32 {
    if scaled <= display {
        (display - scaled) / 2.0
    } else {
        (display / 2.0 - focus).clamp(display - scaled, 0.0)
    }
}

#[inline]
fn source_index(d: u32, offset: f32, scale: f32, len: u32) -> Option<u32> {
    let s = ((d as f32 + 0.5 - offset) / scale).floor();
    (s >= 0.0 && s < len as f32).then_some(s as u32)
}
