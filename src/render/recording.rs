//! Recording render backend and map view for tests and the demo binary

use crate::core::LatLong;
use crate::render::{DisplayModel, MapViewport, Paint, RenderBackend};
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A circle captured by [`RecordingBackend`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawnCircle {
    pub center: LatLong,
    pub radius_m: f32,
    pub paint: Paint,
}

/// Render backend that records every call instead of drawing
pub struct RecordingBackend {
    display_model: DisplayModel,
    circles: Mutex<Vec<DrawnCircle>>,
    redraw_requests: Mutex<u32>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::with_display_model(DisplayModel::default())
    }

    pub fn with_display_model(display_model: DisplayModel) -> Self {
        Self {
            display_model,
            circles: Mutex::new(Vec::new()),
            redraw_requests: Mutex::new(0),
        }
    }

    pub fn circles(&self) -> Vec<DrawnCircle> {
        lock(&self.circles).clone()
    }

    pub fn redraw_requests(&self) -> u32 {
        *lock(&self.redraw_requests)
    }

    pub fn clear(&self) {
        lock(&self.circles).clear();
        *lock(&self.redraw_requests) = 0;
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for RecordingBackend {
    fn display_model(&self) -> DisplayModel {
        self.display_model
    }

    fn draw_circle(&self, center: LatLong, radius_m: f32, paint: &Paint) {
        lock(&self.circles).push(DrawnCircle {
            center,
            radius_m,
            paint: *paint,
        });
    }

    fn request_redraw(&self) {
        *lock(&self.redraw_requests) += 1;
    }
}

/// Map view that records centre and zoom changes
#[derive(Default)]
pub struct RecordingMapView {
    centers: Mutex<Vec<LatLong>>,
    zoom_levels: Mutex<Vec<u8>>,
}

impl RecordingMapView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every centre that was set, oldest first
    pub fn centers(&self) -> Vec<LatLong> {
        lock(&self.centers).clone()
    }

    pub fn zoom_levels(&self) -> Vec<u8> {
        lock(&self.zoom_levels).clone()
    }

    pub fn current_center(&self) -> Option<LatLong> {
        lock(&self.centers).last().copied()
    }

    pub fn current_zoom_level(&self) -> Option<u8> {
        lock(&self.zoom_levels).last().copied()
    }
}

impl MapViewport for RecordingMapView {
    fn set_center(&self, center: LatLong) {
        lock(&self.centers).push(center);
    }

    fn set_zoom_level(&self, zoom_level: u8) {
        lock(&self.zoom_levels).push(zoom_level);
    }
}
