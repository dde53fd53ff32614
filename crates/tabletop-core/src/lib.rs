//! **tabletop-core** — data model of the tabletop projection compositor.
//!
//! This crate provides the types shared by every other crate of the
//! workspace: geometry, colours, materials and their registry, bundles,
//! the tile grid, the lighting records, and the JSON map document.

pub mod bundle;
pub mod color;
pub mod direction;
pub mod document;
pub mod error;
pub mod geom;
pub mod grid;
pub mod lighting;
pub mod material;
pub mod registry;

pub use bundle::{BASE_BUNDLE, BundleSet, MaterialBundle};
pub use color::Rgb;
pub use direction::Direction;
pub use document::MapDocument;
pub use error::{Error, Result};
pub use geom::{Point, Range};
pub use grid::{EMPTY, MAX_CELLS, TileGrid, cell_count, clamp_size};
pub use lighting::{
    DarknessPolygon, LightEmission, LightKind, LightSource, LightingMode, LightingRecord,
    LightingSettings, NIGHT_OPACITY,
};
pub use material::{Material, MaterialId};
pub use registry::{CustomStore, MaterialRegistry};
