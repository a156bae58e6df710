//! Rendering backend trait and draw primitives

use crate::core::{LatLong, DEFAULT_TILE_SIZE, MARKER_COLOR_ARGB, MARKER_STROKE_WIDTH};
use serde::{Deserialize, Serialize};

/// Drawing surface provided by the map renderer
///
/// Overlays only ever use these three calls.
pub trait RenderBackend: Send + Sync {
    /// Display parameters an overlay binds to when attached
    fn display_model(&self) -> DisplayModel;

    /// Draw a circle of `radius_m` metres around `center`
    fn draw_circle(&self, center: LatLong, radius_m: f32, paint: &Paint);

    /// Ask the renderer to schedule a new draw pass
    fn request_redraw(&self);
}

/// Display parameters of a rendering surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayModel {
    /// Edge of a square map tile in pixels
    pub tile_size: u32,
    /// Device scale factor applied to stroke widths
    pub scale_factor: f32,
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            scale_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

/// Paint used for overlay primitives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    /// ARGB colour
    pub color: u32,
    pub stroke_width: f32,
    pub style: PaintStyle,
}

impl Paint {
    pub fn stroke(color: u32, stroke_width: f32) -> Self {
        Self {
            color,
            stroke_width,
            style: PaintStyle::Stroke,
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::stroke(MARKER_COLOR_ARGB, MARKER_STROKE_WIDTH)
    }
}

/// A single circle the overlay wants drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleCommand {
    pub center: LatLong,
    /// Radius on the ground (metres)
    pub radius_m: f32,
    /// Radius on screen at the viewport zoom (pixels)
    pub radius_px: f32,
    pub paint: Paint,
}
