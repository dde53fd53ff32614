//! The JSON map document: the single load/save boundary of a map.
//!
//! ```text
//! {
//!   "version": 1, "name": "...", "width": W, "height": H,
//!   "tiles": [[id|null, ...], ...]  |  [{"x": .., "y": .., "material": ..}, ...],
//!   "river_directions": {"x,y": "up-left", ...},
//!   "lighting": {...}, "custom_materials": {...}, "layers": ...,
//!   "is_svg_mode": false, "svg_path": "..."
//! }
//! ```
//!
//! Both tile layouts are accepted on load; the 2D array is written on save.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::direction::Direction;
use crate::error::{Error, Result};
use crate::geom::Point;
use crate::grid::{EMPTY, MAX_CELLS, TileGrid, cell_count};
use crate::lighting::LightingRecord;
use crate::material::{Material, MaterialId};

/// Version written by [`MapDocument::to_json`].
pub const DOCUMENT_VERSION: u32 = 1;

/// A whole map as persisted on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDocument {
    pub name: Option<String>,
    pub grid: TileGrid,
    pub lighting: Option<LightingRecord>,
    pub custom_materials: BTreeMap<MaterialId, Material>,
    /// Editor layer data, carried through untouched.
    pub layers: Option<Value>,
    pub is_svg_mode: bool,
    pub svg_path: Option<String>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    width: i64,
    height: i64,
    tiles: RawTiles,
    #[serde(default)]
    river_directions: Option<BTreeMap<String, String>>,
    #[serde(default)]
    layers: Option<Value>,
    #[serde(default)]
    lighting: Option<LightingRecord>,
    #[serde(default)]
    is_svg_mode: bool,
    #[serde(default)]
    svg_path: Option<String>,
    #[serde(default)]
    custom_materials: BTreeMap<MaterialId, Material>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTiles {
    Rows(Vec<Vec<Option<String>>>),
    Records(Vec<TileRecord>),
}

#[derive(Deserialize)]
struct TileRecord {
    x: i64,
    y: i64,
    material: Option<String>,
}

#[derive(Serialize)]
struct OutDocument<'a> {
    version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    width: i32,
    height: i32,
    tiles: Vec<Vec<Option<&'a str>>>,
    river_directions: BTreeMap<String, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lighting: Option<&'a LightingRecord>,
    #[serde(skip_serializing_if = "no_custom_materials")]
    custom_materials: &'a BTreeMap<MaterialId, Material>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layers: Option<&'a Value>,
    is_svg_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    svg_path: Option<&'a str>,
}

fn no_custom_materials(m: &&BTreeMap<MaterialId, Material>) -> bool {
    m.is_empty()
}

fn format_err(msg: impl Into<String>) -> Error {
    Error::MapFormat(msg.into())
}

impl MapDocument {
    /// A document wrapping `grid` with no lighting or custom materials.
    pub fn new(grid: TileGrid) -> Self {
        Self {
            name: None,
            grid,
            lighting: None,
            custom_materials: BTreeMap::new(),
            layers: None,
            is_svg_mode: false,
            svg_path: None,
        }
    }

    /// Parse a document. Any schema violation is a [`Error::MapFormat`].
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(text).map_err(|e| format_err(e.to_string()))?;
        if let Some(v) = raw.version.filter(|v| *v > DOCUMENT_VERSION) {
            log::warn!("map document version {v} is newer than {DOCUMENT_VERSION}");
        }
        if cell_count(raw.width, raw.height).is_none() {
            return Err(format_err(format!(
                "invalid map size {}x{} (at most {MAX_CELLS} cells)",
                raw.width, raw.height
            )));
        }
        let (w, h) = (raw.width as i32, raw.height as i32);
        let mut grid = TileGrid::new(w, h);

        match raw.tiles {
            RawTiles::Rows(rows) if rows.is_empty() => {}
            RawTiles::Rows(rows) => {
                if rows.len() != h as usize {
                    let msg = format!("expected {h} tile rows, found {}", rows.len());
                    return Err(format_err(msg));
                }
                for (y, row) in rows.iter().enumerate() {
                    if row.len() != w as usize {
                        return Err(format_err(format!(
                            "tile row {y} has {} cells, expected {w}",
                            row.len()
                        )));
                    }
                    for (x, id) in row.iter().enumerate() {
                        if let Some(id) = id {
                            grid.put_tile(Point::new(x as i32, y as i32), id);
                        }
                    }
                }
            }
            RawTiles::Records(records) => {
                for r in records {
                    if r.x < 0 || r.y < 0 || r.x >= w as i64 || r.y >= h as i64 {
                        let msg = format!("tile record ({}, {}) outside the map", r.x, r.y);
                        return Err(format_err(msg));
                    }
                    let id = r.material.as_deref().unwrap_or(EMPTY);
                    grid.put_tile(Point::new(r.x as i32, r.y as i32), id);
                }
            }
        }

        for (key, dir) in raw.river_directions.unwrap_or_default() {
            let p = parse_cell_key(&key)?;
            let d: Direction = dir.parse()?;
            if !grid.contains(p) {
                log::warn!("river direction at {p} lies outside the map, ignoring");
                continue;
            }
            grid.set_direction(p, Some(d));
        }

        let lighting = raw.lighting.map(LightingRecord::validated).transpose()?;

        Ok(Self {
            name: raw.name,
            grid,
            lighting,
            custom_materials: raw.custom_materials,
            layers: raw.layers,
            is_svg_mode: raw.is_svg_mode,
            svg_path: raw.svg_path,
        })
    }

    /// Serialise in canonical form (2D tile array).
    pub fn to_json(&self) -> Result<String> {
        let g = &self.grid;
        let tiles: Vec<Vec<Option<&str>>> = (0..g.height())
            .map(|y| (0..g.width()).map(|x| g.get(Point::new(x, y))).collect())
            .collect();
        let river_directions: BTreeMap<String, &'static str> = g
            .directions()
            .into_iter()
            .map(|(p, d)| (format!("{},{}", p.x, p.y), d.as_str()))
            .collect();
        let out = OutDocument {
            version: DOCUMENT_VERSION,
            name: self.name.as_deref(),
            width: g.width(),
            height: g.height(),
            tiles,
            river_directions,
            lighting: self.lighting.as_ref(),
            custom_materials: &self.custom_materials,
            layers: self.layers.as_ref(),
            is_svg_mode: self.is_svg_mode,
            svg_path: self.svg_path.as_deref(),
        };
        Ok(serde_json::to_string_pretty(&out)?)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let doc = Self::from_json(&text)?;
        log::debug!(
            "loaded map {} ({}x{})",
            path.display(),
            doc.grid.width(),
            doc.grid.height()
        );
        Ok(doc)
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        let text = self.to_json()?;
        fs::write(path, text)?;
        log::debug!("saved map {}", path.display());
        Ok(())
    }
}

fn parse_cell_key(key: &str) -> Result<Point> {
    let bad = || format_err(format!("invalid cell key `{key}`"));
    let (x, y) = key.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse().map_err(|_| bad())?;
    let y = y.trim().parse().map_err(|_| bad())?;
    Ok(Point::new(x, y))
}
