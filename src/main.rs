//! Demo driver: runs the map screen against recording and mock collaborators

use log::{error, info};
use map_locator::install::MockDownloadManager;
use map_locator::location::MockLocationProvider;
use map_locator::render::{RecordingBackend, RecordingMapView};
use map_locator::{AppConfig, AppError, ConfigurationManager, MapApp, Position, Viewport};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn build_archive(path: &Path, entries: &[(&str, &[u8])]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut writer = ZipWriter::new(File::create(path)?);
    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, SimpleFileOptions::default())?;
        } else {
            writer.start_file(*name, SimpleFileOptions::default())?;
            writer.write_all(data)?;
        }
    }
    writer.finish()?;
    let bytes = fs::read(path)?;
    fs::remove_file(path)?;
    Ok(bytes)
}

fn load_config() -> Result<AppConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            Ok(ConfigurationManager::from_file(path)?.get_config().clone())
        }
        None => Ok(AppConfig::default()),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    fs::create_dir_all(&config.install_root)?;

    let backend = Arc::new(RecordingBackend::new());
    let map_view = Arc::new(RecordingMapView::new());
    let location = Arc::new(MockLocationProvider::new());
    let downloads = Arc::new(MockDownloadManager::new(&config.install_root));

    let staging = config.install_root.join("demo-staging.zip");
    let map_name = config.assets.map_file_name.clone();
    downloads.serve(
        &config.assets.map_url,
        build_archive(&staging, &[(map_name.as_str(), b"demo map data")])?,
    );
    let theme_entry = config.assets.theme_entry_point.clone();
    let theme_dir = match theme_entry.rsplit_once('/') {
        Some((dir, _)) => format!("{}/", dir),
        None => String::new(),
    };
    let mut theme_entries: Vec<(&str, &[u8])> = Vec::new();
    if !theme_dir.is_empty() {
        theme_entries.push((theme_dir.as_str(), b""));
    }
    theme_entries.push((theme_entry.as_str(), b"<rendertheme/>"));
    downloads.serve(&config.assets.theme_url, build_archive(&staging, &theme_entries)?);

    let app = MapApp::new(config, backend.clone(), map_view.clone(), location.clone(), downloads.clone());
    app.on_create();

    println!("=== Download map ===");
    let ids = app.on_download_map()?;
    println!("Enqueued {} downloads", ids.len());
    downloads.complete_all()?;
    println!(
        "Map installed: {}, theme installed: {}",
        app.installer().layout().map_installed(),
        app.installer().layout().theme_installed()
    );

    println!("\n=== Center on GPS ===");
    app.on_gps_center()?;
    location.deliver_single(Position::new(47.4979, 19.0402, 15.0));
    println!("Map centre: {:?}, zoom {:?}", map_view.current_center(), map_view.current_zoom_level());

    println!("\n=== Continuous GPS ===");
    app.on_gps_center_continuous()?;
    for fix in [Position::new(47.50, 19.03, 20.0), Position::new(47.51, 19.05, 5.0)] {
        location.deliver_periodic(fix);
        app.draw(&Viewport::world(15));
    }
    if let Some(circle) = backend.circles().last() {
        println!(
            "Marker at ({:.2}, {:.2}) radius {}m",
            circle.center.latitude, circle.center.longitude, circle.radius_m
        );
    }
    println!("Map recentred {} times in total", map_view.centers().len());
    app.on_gps_center_continuous()?;

    app.on_destroy();
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
