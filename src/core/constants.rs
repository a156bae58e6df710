//! Fixed parameters of the map view and the location feed

/// Zoom level used when the map is centred on a fresh GPS fix
pub const CLOSE_ZOOM_LEVEL: u8 = 15;

/// Zoom level shown when the map is first opened
pub const INITIAL_ZOOM_LEVEL: u8 = 12;

/// Initial map centre (Budapest)
pub const INITIAL_CENTER: (f64, f64) = (47.498333, 19.0408337);

/// Period of continuous location updates (milliseconds)
pub const UPDATE_INTERVAL_MS: u64 = 15_000;

/// Minimum distance between continuous location updates (metres)
pub const MIN_UPDATE_DISTANCE_M: f32 = 0.0;

/// Identifier of the satellite positioning provider
pub const GPS_PROVIDER: &str = "gps";

/// Square tile edge in pixels assumed before a display model is bound
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Equatorial circumference of the WGS84 ellipsoid (metres)
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Opaque red, ARGB
pub const MARKER_COLOR_ARGB: u32 = 0xFFFF_0000;

/// Stroke width of the position marker (pixels)
pub const MARKER_STROKE_WIDTH: f32 = 10.0;

/// Action name the download manager broadcasts when a transfer finishes
pub const DOWNLOAD_COMPLETE_ACTION: &str = "download.action.DOWNLOAD_COMPLETE";
