//! LiveInk Render Library
//!
//! Backends implementing the [`liveink_core::InkSurface`] seam.

#[cfg(feature = "vello-renderer")]
mod vello_surface;

#[cfg(feature = "vello-renderer")]
pub use vello_surface::{InkLayer, VelloSurface, VelloSurfaceHost};
