//! Map view positioning interface

use crate::core::LatLong;

/// The part of the map view the feed controller moves around
pub trait MapViewport: Send + Sync {
    fn set_center(&self, center: LatLong);

    fn set_zoom_level(&self, zoom_level: u8);
}
