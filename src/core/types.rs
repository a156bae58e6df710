//! Core data types shared by the overlay, the feed controller and the map view

use serde::{Deserialize, Serialize};

/// A device position as reported by the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius (metres)
    pub accuracy_m: f32,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f32) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
        }
    }

    pub fn lat_long(&self) -> LatLong {
        LatLong::new(self.latitude, self.longitude)
    }
}

/// Geographic point used for map centring and drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for LatLong {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Operating mode of the location feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// No request outstanding
    #[default]
    Idle,
    /// A single fix has been requested and not yet delivered
    OneShotPending,
    /// Periodic updates are subscribed
    ContinuousActive,
}
