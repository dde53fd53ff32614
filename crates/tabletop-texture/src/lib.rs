//! **tabletop-texture** — tile images for the tabletop compositor.
//!
//! [`TextureEngine`] turns a material id into a square RGBA image,
//! from bitmaps on disk or from deterministic procedural generators, and
//! keeps the results in a bounded [`TextureCache`]. [`FogTextureProvider`]
//! builds the shared cloud tile drawn over hidden cells.

mod cache;
mod engine;
mod error;
mod fog;
pub mod noise;
mod paint;
pub mod procedural;
mod texture;

pub use cache::{DEFAULT_CAPACITY, TextureCache, TextureKey};
pub use engine::TextureEngine;
pub use error::{Result, TextureError};
pub use fog::{FogIntensity, FogTextureProvider};
pub use paint::{mean_rgb, over};
pub use procedural::{FRAME_PERIOD, Procedural, TileRequest};
pub use texture::Texture;
