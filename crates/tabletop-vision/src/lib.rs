//! **tabletop-vision** — what the players can see.
//!
//! - [`FogState`]: per-cell revealed flags with reveal/hide operations and
//!   packed snapshots.
//! - [`LightingEngine`]: light sources and darkness polygons rendered into a
//!   per-frame darkness overlay.

mod fog;
mod lighting;
pub mod polygon;

pub use fog::{FogPreset, FogSnapshot, FogState};
pub use lighting::{FLICKER_MAX, FLICKER_MIN, LightingEngine, flicker_factor};
pub use polygon::{Mask, fill_even_odd};
