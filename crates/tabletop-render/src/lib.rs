//! **tabletop-render** — the projection display's frame pipeline.
//!
//! A [`Session`] owns the map, its fog and lights, and ticks a
//! [`Compositor`] that layers tile textures, the darkness overlay and fog
//! clouds into one image. The [`Viewport`] crops that image for the
//! display, optionally framing the players' recent positions.

pub mod canvas;
mod clock;
mod compositor;
mod config;
mod error;
mod input;
mod minimap;
mod session;
mod viewport;

pub use clock::FrameClock;
pub use compositor::{Compositor, Scene};
pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use input::PositionSlot;
pub use minimap::MiniMap;
pub use session::{DisplaySink, PngSink, Session};
pub use viewport::{Viewport, ViewportConfig};
