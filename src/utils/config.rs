//! Application configuration loaded from JSON

use crate::core::{LatLong, INITIAL_CENTER, INITIAL_ZOOM_LEVEL};
use crate::install::AssetSettings;
use crate::location::FeedSettings;
use crate::render::{Paint, PaintStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest zoom level the renderer supports
pub const MAX_ZOOM_LEVEL: u8 = 22;

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the installed map and theme (app-private storage)
    pub install_root: PathBuf,
    /// Initial map view
    pub map: MapSettings,
    /// Location request parameters
    pub location: FeedSettings,
    /// Download sources and on-disk names
    pub assets: AssetSettings,
    /// Paint of the position marker
    pub marker: Paint,
}

/// Initial map view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    pub initial_center: LatLong,
    pub initial_zoom_level: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("files"),
            map: MapSettings::default(),
            location: FeedSettings::default(),
            assets: AssetSettings::default(),
            marker: Paint::default(),
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_center: LatLong::from(INITIAL_CENTER),
            initial_zoom_level: INITIAL_ZOOM_LEVEL,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    #[error("config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization/deserialization error
    #[error("config serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn invalid(&mut self, parameter: &str, value: impl ToString, reason: &str) {
        self.errors.push(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Main configuration manager
pub struct ConfigurationManager {
    config: AppConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn update_config(&mut self, config: AppConfig) -> Result<(), ConfigError> {
        Self::ensure_valid(&config)?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig = serde_json::from_str(&content)?;
        Self::ensure_valid(&config)?;

        self.config = config;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.config)?;

        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::InvalidParameter {
                parameter: "config_file_path".to_string(),
                value: "None".to_string(),
                reason: "no file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    fn ensure_valid(config: &AppConfig) -> Result<(), ConfigError> {
        let validation = Self::validate_config(config);
        for warning in &validation.warnings {
            log::warn!("Configuration: {}", warning);
        }
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Check a configuration without applying it
    pub fn validate_config(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        if config.map.initial_zoom_level > MAX_ZOOM_LEVEL {
            result.invalid("map.initial_zoom_level", config.map.initial_zoom_level, "above maximum zoom level");
        }
        if config.location.close_zoom_level > MAX_ZOOM_LEVEL {
            result.invalid("location.close_zoom_level", config.location.close_zoom_level, "above maximum zoom level");
        }
        if config.location.close_zoom_level < config.map.initial_zoom_level {
            result
                .warnings
                .push("close zoom level is below the initial zoom level".to_string());
        }
        if config.location.update_interval_ms == 0 {
            result.invalid("location.update_interval_ms", 0, "must be positive");
        }
        if config.location.min_distance_m < 0.0 || !config.location.min_distance_m.is_finite() {
            result.invalid("location.min_distance_m", config.location.min_distance_m, "must be a non-negative number");
        }
        if config.location.provider.is_empty() {
            result.invalid("location.provider", "", "must not be empty");
        }

        let names = [
            ("assets.map_archive_name", &config.assets.map_archive_name),
            ("assets.map_file_name", &config.assets.map_file_name),
            ("assets.theme_archive_name", &config.assets.theme_archive_name),
            ("assets.theme_entry_point", &config.assets.theme_entry_point),
        ];
        for (parameter, name) in names {
            if name.is_empty() {
                result.invalid(parameter, "", "must not be empty");
            } else if Path::new(name).is_absolute() || name.split('/').any(|c| c == "..") {
                result.invalid(parameter, name, "must stay inside the install root");
            }
        }
        if config.assets.map_archive_name == config.assets.map_file_name {
            result.invalid(
                "assets.map_file_name",
                &config.assets.map_file_name,
                "must differ from the archive name",
            );
        }
        for (parameter, url) in [("assets.map_url", &config.assets.map_url), ("assets.theme_url", &config.assets.theme_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                result.invalid(parameter, url, "must be an http(s) URL");
            }
        }

        if config.marker.style != PaintStyle::Stroke {
            result.warnings.push("position marker is filled; accuracy circle will hide the map".to_string());
        }
        if config.marker.stroke_width <= 0.0 {
            result.invalid("marker.stroke_width", config.marker.stroke_width, "must be positive");
        }
        if config.location.update_interval_ms > 0 && config.location.update_interval_ms < 1000 {
            result
                .warnings
                .push("update interval below one second drains the battery".to_string());
        }

        result
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}
