//! Overlay capability trait and viewport description

use crate::core::{LatLong, EARTH_CIRCUMFERENCE_M};
use crate::render::RenderBackend;
use std::sync::Arc;

/// Something that can be composed onto the map view
pub trait Layer: Send + Sync {
    /// Bind to the backend's display parameters. Called before any draw.
    fn on_attach(&self, backend: Arc<dyn RenderBackend>);

    /// Draw onto the attached backend for the given viewport
    fn draw(&self, viewport: &Viewport);

    /// Release everything acquired from the backend
    fn on_detach(&self);
}

/// Geographic extent of the visible map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(min_latitude: f64, min_longitude: f64, max_latitude: f64, max_longitude: f64) -> Self {
        Self {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        }
    }

    pub fn contains(&self, point: LatLong) -> bool {
        point.latitude >= self.min_latitude
            && point.latitude <= self.max_latitude
            && point.longitude >= self.min_longitude
            && point.longitude <= self.max_longitude
    }

    /// Whether a circle of `radius_m` metres around `center` overlaps the box
    ///
    /// Uses the circle's enclosing lat/lon rectangle, so corners may report
    /// an overlap the circle itself does not reach.
    pub fn intersects_circle(&self, center: LatLong, radius_m: f32) -> bool {
        if self.contains(center) {
            return true;
        }
        let lat_delta = radius_m.max(0.0) as f64 / (EARTH_CIRCUMFERENCE_M / 360.0);
        let lon_scale = center.latitude.to_radians().cos().abs();
        let lon_delta = if lon_scale > f64::EPSILON {
            lat_delta / lon_scale
        } else {
            180.0
        };
        center.latitude - lat_delta <= self.max_latitude
            && center.latitude + lat_delta >= self.min_latitude
            && center.longitude - lon_delta <= self.max_longitude
            && center.longitude + lon_delta >= self.min_longitude
    }
}

/// Visible area and zoom of one draw pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounding_box: BoundingBox,
    pub zoom_level: u8,
}

impl Viewport {
    pub fn new(bounding_box: BoundingBox, zoom_level: u8) -> Self {
        Self {
            bounding_box,
            zoom_level,
        }
    }

    /// Viewport covering the whole Web-Mercator world
    pub fn world(zoom_level: u8) -> Self {
        Self::new(BoundingBox::new(-85.0511, -180.0, 85.0511, 180.0), zoom_level)
    }

    /// Ground resolution (metres per pixel) at `latitude` for this zoom
    pub fn meters_per_pixel(&self, latitude: f64, tile_size: u32) -> f64 {
        let map_size = tile_size as f64 * 2f64.powi(self.zoom_level as i32);
        latitude.to_radians().cos() * EARTH_CIRCUMFERENCE_M / map_size
    }
}
