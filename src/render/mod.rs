//! Rendering abstraction layer
//!
//! The map renderer itself is an external collaborator. This module
//! describes the small surface the position overlay and the feed
//! controller consume from it, plus recording doubles for tests.

pub mod backend;
pub mod layer;
pub mod map_view;
pub mod recording;

pub use backend::{RenderBackend, DisplayModel, Paint, PaintStyle, CircleCommand};
pub use layer::{Layer, Viewport, BoundingBox};
pub use map_view::MapViewport;
pub use recording::{RecordingBackend, RecordingMapView, DrawnCircle};
