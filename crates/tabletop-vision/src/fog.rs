//! Fog of war: which cells the players have seen.
//!
//! A dense boolean grid with the same shape as the map. The shape is fixed
//! for the lifetime of a [`FogState`]; resizing the map means building a
//! new one. Coordinates outside the grid are clamped away silently.

use serde::{Deserialize, Serialize};
use tabletop_core::{Error, Point, Range, Result, cell_count, clamp_size};

/// Bulk operations offered to the game master.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogPreset {
    RevealAll,
    HideAll,
    /// Hide everything, then reveal a disc around the map centre.
    Centre { radius: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FogState {
    width: i32,
    height: i32,
    revealed: Vec<bool>,
}

impl FogState {
    /// A fully hidden `width` × `height` fog. Dimensions are clamped the
    /// same way as a [`TileGrid`](tabletop_core::TileGrid)'s.
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = clamp_size(width, height);
        Self {
            width,
            height,
            revealed: vec![false; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn bounds(&self) -> Range {
        Range::with_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        self.bounds()
            .contains(p)
            .then(|| (p.y * self.width + p.x) as usize)
    }

    /// Out-of-bounds cells are never revealed.
    #[inline]
    pub fn is_revealed(&self, p: Point) -> bool {
        self.index(p).is_some_and(|i| self.revealed[i])
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed.iter().filter(|r| **r).count()
    }

    fn set_disc(&mut self, center: Point, radius: i32, value: bool) -> usize {
        let r = radius.max(0);
        let r2 = r as i64 * r as i64;
        let area = Range::from_cells(center, center).inflate(r).intersect(self.bounds());
        let mut changed = 0;
        for p in area.iter().filter(|p| p.dist_sq(center) <= r2) {
            let i = (p.y * self.width + p.x) as usize;
            if self.revealed[i] != value {
                self.revealed[i] = value;
                changed += 1;
            }
        }
        changed
    }

    fn set_rect(&mut self, a: Point, b: Point, value: bool) -> usize {
        let area = Range::from_cells(a, b).intersect(self.bounds());
        let mut changed = 0;
        for p in area {
            let i = (p.y * self.width + p.x) as usize;
            if self.revealed[i] != value {
                self.revealed[i] = value;
                changed += 1;
            }
        }
        changed
    }

    /// Reveal every cell within `radius` (Euclidean) of `center`. Returns
    /// the number of cells that changed.
    pub fn reveal_point(&mut self, center: Point, radius: i32) -> usize {
        self.set_disc(center, radius, true)
    }

    /// Hide every cell within `radius` of `center`.
    pub fn hide_point(&mut self, center: Point, radius: i32) -> usize {
        self.set_disc(center, radius, false)
    }

    /// Reveal the inclusive rectangle between two corners, in any order.
    pub fn reveal_rect(&mut self, a: Point, b: Point) -> usize {
        self.set_rect(a, b, true)
    }

    pub fn hide_rect(&mut self, a: Point, b: Point) -> usize {
        self.set_rect(a, b, false)
    }

    pub fn reveal_all(&mut self) {
        self.revealed.fill(true);
    }

    pub fn hide_all(&mut self) {
        self.revealed.fill(false);
    }

    /// Flip one cell. Returns the new state; out of bounds stays hidden.
    pub fn toggle(&mut self, p: Point) -> bool {
        match self.index(p) {
            Some(i) => {
                self.revealed[i] = !self.revealed[i];
                self.revealed[i]
            }
            None => false,
        }
    }

    pub fn apply_preset(&mut self, preset: FogPreset) {
        match preset {
            FogPreset::RevealAll => self.reveal_all(),
            FogPreset::HideAll => self.hide_all(),
            FogPreset::Centre { radius } => {
                self.hide_all();
                let c = Point::new(self.width / 2, self.height / 2);
                self.reveal_point(c, radius);
            }
        }
    }

    /// Hidden cells, row-major.
    pub fn hidden_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.bounds()
            .iter()
            .zip(self.revealed.iter())
            .filter(|(_, r)| !**r)
            .map(|(p, _)| p)
    }

    pub fn snapshot(&self) -> FogSnapshot {
        let mut bits = vec![0u8; self.revealed.len().div_ceil(8)];
        for (i, _) in self.revealed.iter().enumerate().filter(|(_, r)| **r) {
            bits[i / 8] |= 1 << (i % 8);
        }
        FogSnapshot {
            width: self.width,
            height: self.height,
            bits,
        }
    }

    /// Restore from a snapshot of the same shape. A mismatched or
    /// truncated snapshot is rejected and leaves the state untouched.
    pub fn restore(&mut self, snapshot: &FogSnapshot) -> bool {
        if snapshot.width != self.width
            || snapshot.height != self.height
            || snapshot.bits.len() < self.revealed.len().div_ceil(8)
        {
            log::warn!(
                "fog snapshot {}x{} does not fit a {}x{} map",
                snapshot.width,
                snapshot.height,
                self.width,
                self.height
            );
            return false;
        }
        for (i, r) in self.revealed.iter_mut().enumerate() {
            *r = snapshot.bits[i / 8] & (1 << (i % 8)) != 0;
        }
        true
    }

    /// A fog state built from a snapshot. The size and bit count are
    /// checked before anything is allocated.
    pub fn from_snapshot(snapshot: &FogSnapshot) -> Result<Self> {
        let cells = cell_count(snapshot.width as i64, snapshot.height as i64).ok_or_else(|| {
            Error::MapFormat(format!(
                "invalid fog snapshot size {}x{}",
                snapshot.width, snapshot.height
            ))
        })?;
        if snapshot.bits.len() < cells.div_ceil(8) {
            return Err(Error::MapFormat("truncated fog snapshot".into()));
        }
        let mut fog = Self::new(snapshot.width, snapshot.height);
        if !fog.restore(snapshot) {
            return Err(Error::MapFormat("malformed fog snapshot".into()));
        }
        Ok(fog)
    }
}

/// Value copy of a [`FogState`]: `height` × `width` bits, row-major,
/// least significant bit first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FogSnapshot {
    pub width: i32,
    pub height: i32,
    pub bits: Vec<u8>,
}
