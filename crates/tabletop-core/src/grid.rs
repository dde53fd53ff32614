//! The [`TileGrid`]: a rectangular grid of material ids.
//!
//! Each cell holds a material id or is empty. Flow directions for river
//! cells live in a sparse side map keyed by position. Every mutation bumps
//! a revision counter so renderers can tell when cached layers are stale.

use std::collections::{HashMap, VecDeque};

use crate::direction::Direction;
use crate::geom::{Point, Range};
use crate::material::MaterialId;
use crate::registry::MaterialRegistry;

/// Id accepted in place of "no material" by editing operations.
pub const EMPTY: &str = "empty";

/// Largest number of cells a grid (or a fog state) may hold.
pub const MAX_CELLS: usize = 1 << 24;

/// Number of cells of a `width` × `height` map, or `None` when a side is
/// not positive or the area exceeds [`MAX_CELLS`].
pub fn cell_count(width: i64, height: i64) -> Option<usize> {
    let w = usize::try_from(width).ok().filter(|w| *w > 0)?;
    let h = usize::try_from(height).ok().filter(|h| *h > 0)?;
    w.checked_mul(h).filter(|n| *n <= MAX_CELLS)
}

/// Clamp map dimensions to at least 1 × 1 and at most [`MAX_CELLS`] cells,
/// shrinking the height first.
pub fn clamp_size(width: i32, height: i32) -> (i32, i32) {
    let width = width.clamp(1, MAX_CELLS as i32);
    let height = height.clamp(1, (MAX_CELLS / width as usize) as i32);
    (width, height)
}

/// A `width` × `height` grid of optional material ids.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: i32,
    height: i32,
    tiles: Vec<Option<MaterialId>>,
    directions: HashMap<Point, Direction>,
    revision: u64,
}

impl TileGrid {
    /// Create an empty grid. Dimensions are clamped by [`clamp_size`].
    pub fn new(width: i32, height: i32) -> Self {
        let (width, height) = clamp_size(width, height);
        Self {
            width,
            height,
            tiles: vec![None; width as usize * height as usize],
            directions: HashMap::new(),
            revision: 0,
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
    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }

    #[inline]
    pub fn bounds(&self) -> Range {
        Range::with_size(self.width, self.height)
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// Incremented by every mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        self.contains(p).then(|| (p.y * self.width + p.x) as usize)
    }

    /// Material id at `p`, or `None` for empty or out-of-bounds cells.
    pub fn get(&self, p: Point) -> Option<&str> {
        self.index(p).and_then(|i| self.tiles[i].as_deref())
    }

    /// Whether every cell is empty.
    pub fn is_blank(&self) -> bool {
        self.tiles.iter().all(Option::is_none)
    }

    /// Paint `id` at `p`. No-op out of bounds. [`EMPTY`] clears the cell.
    /// A changed cell loses its flow direction. Returns whether the cell
    /// changed.
    pub fn put_tile(&mut self, p: Point, id: &str) -> bool {
        let changed = self.write(p, normalize(id));
        if changed {
            self.revision += 1;
        }
        changed
    }

    /// Empty the cell at `p`.
    pub fn clear_tile(&mut self, p: Point) -> bool {
        let changed = self.write(p, None);
        if changed {
            self.revision += 1;
        }
        changed
    }

    fn write(&mut self, p: Point, id: Option<&str>) -> bool {
        let Some(i) = self.index(p) else {
            return false;
        };
        if self.tiles[i].as_deref() == id {
            return false;
        }
        self.tiles[i] = id.map(str::to_string);
        self.directions.remove(&p);
        true
    }

    /// Set or clear the flow direction of a cell. No-op out of bounds.
    pub fn set_direction(&mut self, p: Point, dir: Option<Direction>) {
        if !self.contains(p) {
            return;
        }
        let changed = match dir {
            Some(d) => self.directions.insert(p, d) != Some(d),
            None => self.directions.remove(&p).is_some(),
        };
        if changed {
            self.revision += 1;
        }
    }

    pub fn direction(&self, p: Point) -> Option<Direction> {
        self.directions.get(&p).copied()
    }

    /// Every stored direction, in row-major order.
    pub fn directions(&self) -> Vec<(Point, Direction)> {
        let mut v: Vec<_> = self.directions.iter().map(|(p, d)| (*p, *d)).collect();
        v.sort_by_key(|(p, _)| *p);
        v
    }

    /// Paint every cell of `range` (clamped to the grid). Returns the
    /// number of cells changed.
    pub fn fill_rect(&mut self, range: Range, id: &str) -> usize {
        let id = normalize(id);
        let n = range
            .intersect(self.bounds())
            .iter()
            .filter(|&p| self.write(p, id))
            .count();
        if n > 0 {
            self.revision += 1;
        }
        n
    }

    /// Paint the whole grid.
    pub fn fill(&mut self, id: &str) -> usize {
        self.fill_rect(self.bounds(), id)
    }

    /// Paint every cell whose centre lies within `radius` of `center`.
    pub fn fill_circle(&mut self, center: Point, radius: i32, id: &str) -> usize {
        let id = normalize(id);
        let r = radius.max(0);
        let r2 = (r as i64) * (r as i64);
        let area = Range::from_cells(center, center).inflate(r).intersect(self.bounds());
        let n = area
            .iter()
            .filter(|&p| p.dist_sq(center) <= r2)
            .filter(|&p| self.write(p, id))
            .count();
        if n > 0 {
            self.revision += 1;
        }
        n
    }

    /// Replace the 4-connected region of cells sharing the material at
    /// `start` with `id`. Returns the number of cells changed.
    pub fn flood_fill(&mut self, start: Point, id: &str) -> usize {
        let Some(si) = self.index(start) else {
            return 0;
        };
        let target = self.tiles[si].clone();
        let id = normalize(id);
        if target.as_deref() == id {
            return 0;
        }

        let mut seen = vec![false; self.tiles.len()];
        let mut queue = VecDeque::new();
        let mut region = Vec::new();
        seen[si] = true;
        queue.push_back(start);

        while let Some(p) = queue.pop_front() {
            region.push(p);
            for np in p.neighbors_4() {
                let Some(ni) = self.index(np) else {
                    continue;
                };
                if seen[ni] || self.tiles[ni] != target {
                    continue;
                }
                seen[ni] = true;
                queue.push_back(np);
            }
        }

        for &p in &region {
            self.write(p, id);
        }
        self.revision += 1;
        region.len()
    }

    /// Row-major iterator over `(Point, Option<&str>)`.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Option<&str>)> + '_ {
        self.bounds()
            .iter()
            .zip(self.tiles.iter())
            .map(|(p, t)| (p, t.as_deref()))
    }

    /// Non-empty cells whose material satisfies `pred`, row-major.
    pub fn cells_where(&self, mut pred: impl FnMut(&str) -> bool) -> Vec<(Point, MaterialId)> {
        self.iter()
            .filter_map(|(p, id)| id.filter(|&id| pred(id)).map(|id| (p, id.to_string())))
            .collect()
    }

    /// Cells whose material is animated in `registry`, row-major. Unknown
    /// ids are not animated.
    pub fn animated_positions(&self, registry: &MaterialRegistry) -> Vec<Point> {
        self.iter()
            .filter(|(_, id)| id.and_then(|id| registry.get(id)).is_some_and(|m| m.animated))
            .map(|(p, _)| p)
            .collect()
    }
}

fn normalize(id: &str) -> Option<&str> {
    if id.is_empty() || id == EMPTY { None } else { Some(id) }
}
