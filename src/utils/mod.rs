//! Utility modules

pub mod config;

pub use config::{AppConfig, ConfigurationManager, ConfigError, MapSettings};
