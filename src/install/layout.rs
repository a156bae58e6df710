//! Install root layout and download requests

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where assets come from and what they are called on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    pub map_url: String,
    /// Transient archive name of the map download
    pub map_archive_name: String,
    /// Installed map file name
    pub map_file_name: String,
    pub theme_url: String,
    pub theme_archive_name: String,
    /// Theme XML entry point, relative to the install root
    pub theme_entry_point: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            map_url: "http://openmaps.eu/dltosm.php?dl=hungary_openmaps_eu_europe.map.zip".to_string(),
            map_archive_name: "hungary.zip".to_string(),
            map_file_name: "hungary.map".to_string(),
            theme_url: "https://openmaps.eu/renderthemes/Vectorial_V7.zip".to_string(),
            theme_archive_name: "Vectorial_V7.zip".to_string(),
            theme_entry_point: "Vectorial_V7/Vectorial_V7.xml".to_string(),
        }
    }
}

/// One archive to fetch and where its contents end up
#[derive(Debug, Clone, PartialEq)]
pub struct InstallRequest {
    pub source_url: String,
    pub destination_archive_name: String,
    pub final_install_path: PathBuf,
}

/// Asset paths resolved against the install root
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
    settings: AssetSettings,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>, settings: AssetSettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &AssetSettings {
        &self.settings
    }

    pub fn map_file_path(&self) -> PathBuf {
        self.root.join(&self.settings.map_file_name)
    }

    pub fn map_archive_path(&self) -> PathBuf {
        self.root.join(&self.settings.map_archive_name)
    }

    pub fn theme_archive_path(&self) -> PathBuf {
        self.root.join(&self.settings.theme_archive_name)
    }

    pub fn theme_entry_point_path(&self) -> PathBuf {
        self.root.join(&self.settings.theme_entry_point)
    }

    pub fn map_installed(&self) -> bool {
        self.map_file_path().is_file()
    }

    pub fn theme_installed(&self) -> bool {
        self.theme_entry_point_path().is_file()
    }

    pub fn map_request(&self) -> InstallRequest {
        InstallRequest {
            source_url: self.settings.map_url.clone(),
            destination_archive_name: self.settings.map_archive_name.clone(),
            final_install_path: self.map_file_path(),
        }
    }

    pub fn theme_request(&self) -> InstallRequest {
        InstallRequest {
            source_url: self.settings.theme_url.clone(),
            destination_archive_name: self.settings.theme_archive_name.clone(),
            final_install_path: self.theme_entry_point_path(),
        }
    }
}
