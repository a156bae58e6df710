//! Offline Map Locator
//!
//! Core of an offline vector map screen: a live GPS position overlay, the
//! one-shot/continuous location feed that drives it, and the installer that
//! fetches and unpacks the map file and render theme.

pub mod core;
pub mod render;
pub mod overlay;
pub mod location;
pub mod install;
pub mod utils;
pub mod app;

// Re-export commonly used types
pub use crate::core::{Position, LatLong, FeedMode};
pub use render::{RenderBackend, MapViewport, Layer, Viewport, BoundingBox, Paint, CircleCommand, DisplayModel};
pub use overlay::{PositionOverlay, OverlayState};
pub use location::{LocationProvider, LocationFeedController, LocationError, LocationResult, FeedSettings};
pub use install::{AssetInstaller, DownloadManager, InstallError, InstallLayout, InstallRequest, AssetSettings};
pub use utils::{AppConfig, ConfigurationManager, ConfigError};
pub use app::{MapApp, AppError};
