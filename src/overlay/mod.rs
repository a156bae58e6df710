//! Map overlays drawn on top of the rendered tiles

pub mod position;

pub use position::{PositionOverlay, OverlayState};
