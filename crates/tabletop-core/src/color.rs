//! RGB colours as stored in materials and lights.

use serde::{Deserialize, Serialize};

/// An RGB colour, serialised as a `[r, g, b]` array.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// 50% grey drawn for unknown materials and failed textures.
    pub const FALLBACK_GREY: Self = Self([128, 128, 128]);
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    #[inline]
    pub const fn r(self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub const fn g(self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0[2]
    }

    /// Linear blend toward `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
        ])
    }

    /// Add a signed offset to every channel, saturating.
    pub fn offset(self, delta: i32) -> Rgb {
        let f = |c: u8| (c as i32 + delta).clamp(0, 255) as u8;
        Rgb([f(self.0[0]), f(self.0[1]), f(self.0[2])])
    }

    /// Multiply every channel by `k`, saturating.
    pub fn scale(self, k: f32) -> Rgb {
        let f = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
        Rgb([f(self.0[0]), f(self.0[1]), f(self.0[2])])
    }

    /// RGBA channel array with the given alpha.
    #[inline]
    pub const fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.0[0], self.0[1], self.0[2], alpha]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_as_array() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: Rgb = serde_json::from_str("[10,20,30]").unwrap();
        assert_eq!(back, Rgb::new(10, 20, 30));
    }

    #[test]
    fn lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(100, 0, 250);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(50, 50, 225));
    }

    #[test]
    fn offset_saturates() {
        assert_eq!(Rgb::new(250, 5, 128).offset(10), Rgb::new(255, 15, 138));
        assert_eq!(Rgb::new(250, 5, 128).offset(-10), Rgb::new(240, 0, 118));
    }
}
