//! Application shell
//!
//! Wires the three user actions and the view lifecycle to the overlay, the
//! location feed and the asset installer.

use crate::core::FeedMode;
use crate::install::{AssetInstaller, DownloadId, DownloadManager, InstallError, InstallLayout};
use crate::location::{LocationError, LocationFeedController, LocationProvider};
use crate::overlay::PositionOverlay;
use crate::render::{Layer, MapViewport, RenderBackend, Viewport};
use crate::utils::{AppConfig, ConfigError};
use log::{error, info, warn};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the host UI
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Install(#[from] InstallError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The map screen: overlay, location feed and installer behind three buttons
pub struct MapApp {
    config: AppConfig,
    backend: Arc<dyn RenderBackend>,
    map_view: Arc<dyn MapViewport>,
    overlay: Arc<PositionOverlay>,
    feed: LocationFeedController,
    installer: AssetInstaller,
}

impl MapApp {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn RenderBackend>,
        map_view: Arc<dyn MapViewport>,
        location: Arc<dyn LocationProvider>,
        downloads: Arc<dyn DownloadManager>,
    ) -> Self {
        let overlay = Arc::new(PositionOverlay::with_paint(config.marker));
        let feed = LocationFeedController::with_settings(
            location,
            Arc::clone(&overlay),
            Arc::clone(&map_view),
            config.location.clone(),
        );
        let installer = AssetInstaller::new(
            InstallLayout::new(config.install_root.clone(), config.assets.clone()),
            downloads,
        );

        Self {
            config,
            backend,
            map_view,
            overlay,
            feed,
            installer,
        }
    }

    /// Attach the overlay and show the initial map area
    pub fn on_create(&self) {
        self.overlay.on_attach(Arc::clone(&self.backend));

        let layout = self.installer.layout();
        if !layout.map_installed() {
            warn!("No map installed at {}; use 'download map'", layout.map_file_path().display());
        }
        if !layout.theme_installed() {
            warn!("No render theme at {}", layout.theme_entry_point_path().display());
        }

        self.map_view.set_center(self.config.map.initial_center);
        self.map_view.set_zoom_level(self.config.map.initial_zoom_level);
        info!("Map view created");
    }

    /// "Center on GPS" button
    pub fn on_gps_center(&self) -> Result<(), AppError> {
        self.feed.request_one_shot().map_err(|e| {
            error!("Center on GPS failed: {}", e);
            AppError::from(e)
        })
    }

    /// "Center on GPS continuously" toggle
    pub fn on_gps_center_continuous(&self) -> Result<FeedMode, AppError> {
        self.feed.toggle_continuous().map_err(|e| {
            error!("Continuous GPS failed: {}", e);
            AppError::from(e)
        })
    }

    /// "Download map" button
    pub fn on_download_map(&self) -> Result<Vec<DownloadId>, AppError> {
        self.installer.install_map_and_theme().map_err(|e| {
            error!("Download map failed: {}", e);
            AppError::from(e)
        })
    }

    /// One render pass of the overlay
    pub fn draw(&self, viewport: &Viewport) {
        self.overlay.draw(viewport);
    }

    /// Release everything acquired in `on_create` and by the buttons
    pub fn on_destroy(&self) {
        self.feed.shutdown();
        self.installer.unregister();
        self.overlay.on_detach();
        info!("Map view destroyed");
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn overlay(&self) -> &PositionOverlay {
        &self.overlay
    }

    pub fn feed(&self) -> &LocationFeedController {
        &self.feed
    }

    pub fn installer(&self) -> &AssetInstaller {
        &self.installer
    }
}
