//! Asset installer
//!
//! Enqueues the map and theme downloads and unpacks them when the download
//! manager reports completion. Enqueue failures are returned to the caller;
//! extraction failures are logged and contained.

use crate::core::DOWNLOAD_COMPLETE_ACTION;
use crate::install::{
    extract_single_file, extract_tree, CompletionWatcher, DownloadId, DownloadManager,
    ExtractSummary, InstallLayout, InstallResult, WatcherId,
};
use log::{debug, error, info, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of unpacking one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// No archive on disk
    NotPresent,
    Installed(ExtractSummary),
    /// Extraction failed and was logged
    Failed,
}

/// What a completion notification did to each archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReport {
    pub map: ExtractOutcome,
    pub theme: ExtractOutcome,
}

/// Fetches and installs the map file and the render theme
pub struct AssetInstaller {
    layout: Arc<InstallLayout>,
    downloads: Arc<dyn DownloadManager>,
    watcher: Mutex<Option<WatcherId>>,
}

fn remove_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed stale archive {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove stale archive {}: {}", path.display(), e),
    }
}

fn contain(kind: &str, result: InstallResult<ExtractSummary>) -> ExtractOutcome {
    match result {
        Ok(summary) => {
            info!("Installed {} ({} files, {} directories)", kind, summary.files, summary.directories);
            ExtractOutcome::Installed(summary)
        }
        Err(e) => {
            error!("Failed to install {}: {}", kind, e);
            ExtractOutcome::Failed
        }
    }
}

impl AssetInstaller {
    pub fn new(layout: InstallLayout, downloads: Arc<dyn DownloadManager>) -> Self {
        Self {
            layout: Arc::new(layout),
            downloads,
            watcher: Mutex::new(None),
        }
    }

    fn watcher_slot(&self) -> MutexGuard<'_, Option<WatcherId>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Start downloading the map archive, and the theme archive if the theme
    /// is not installed yet
    ///
    /// Returns the ids of the enqueued downloads.
    pub fn install_map_and_theme(&self) -> InstallResult<Vec<DownloadId>> {
        self.ensure_watcher();

        let mut ids = Vec::with_capacity(2);

        let map = self.layout.map_request();
        remove_stale(&self.layout.map_archive_path());
        ids.push(self.enqueue(&map.source_url, &map.destination_archive_name)?);

        if self.layout.theme_installed() {
            debug!("Theme already installed at {}", self.layout.theme_entry_point_path().display());
        } else {
            let theme = self.layout.theme_request();
            remove_stale(&self.layout.theme_archive_path());
            ids.push(self.enqueue(&theme.source_url, &theme.destination_archive_name)?);
        }

        Ok(ids)
    }

    fn enqueue(&self, url: &str, destination: &str) -> InstallResult<DownloadId> {
        match self.downloads.enqueue(url, destination) {
            Ok(id) => {
                info!("Enqueued download {} of {} -> {}", id.0, url, destination);
                Ok(id)
            }
            Err(e) => {
                error!("Could not enqueue download of {}: {}", url, e);
                Err(e)
            }
        }
    }

    fn ensure_watcher(&self) {
        let mut slot = self.watcher_slot();
        if slot.is_some() {
            return;
        }

        let layout = Arc::clone(&self.layout);
        let watcher: CompletionWatcher = Arc::new(move |id: DownloadId| {
            debug!("Download {} completed", id.0);
            handle_download_complete(&layout);
        });
        *slot = Some(
            self.downloads
                .register_completion_watcher(DOWNLOAD_COMPLETE_ACTION, watcher),
        );
    }

    /// Unpack whatever archives are on disk. Never fails.
    pub fn handle_download_complete(&self) -> CompletionReport {
        handle_download_complete(&self.layout)
    }

    pub fn is_watching(&self) -> bool {
        self.watcher_slot().is_some()
    }

    /// Stop listening for download completions
    pub fn unregister(&self) {
        if let Some(watcher) = self.watcher_slot().take() {
            self.downloads.unregister_completion_watcher(watcher);
            debug!("Download completion watcher unregistered");
        }
    }
}

impl Drop for AssetInstaller {
    fn drop(&mut self) {
        self.unregister();
    }
}

/// Extract the map archive and the theme archive if they exist
pub fn handle_download_complete(layout: &InstallLayout) -> CompletionReport {
    let map_archive = layout.map_archive_path();
    let map = if map_archive.is_file() {
        contain("map", extract_single_file(&map_archive, &layout.map_file_path()))
    } else {
        ExtractOutcome::NotPresent
    };

    let theme_archive = layout.theme_archive_path();
    let theme = if theme_archive.is_file() {
        contain("theme", extract_tree(&theme_archive, layout.root()))
    } else {
        ExtractOutcome::NotPresent
    };

    CompletionReport { map, theme }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::archive::tests::{write_zip, write_zip_with_bad_crc};
    use crate::install::InstallError;
    use crate::install::{AssetSettings, MockDownloadManager};

    struct Fixture {
        dir: tempfile::TempDir,
        downloads: Arc<MockDownloadManager>,
        installer: AssetInstaller,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let downloads = Arc::new(MockDownloadManager::new(dir.path()));
        let installer = AssetInstaller::new(
            InstallLayout::new(dir.path(), AssetSettings::default()),
            downloads.clone(),
        );
        Fixture {
            dir,
            downloads,
            installer,
        }
    }

    fn zip_bytes(dir: &Path, entries: &[(&str, &[u8])]) -> Vec<u8> {
        let path = dir.join("fixture.zip.tmp");
        write_zip(&path, entries);
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();
        bytes
    }

    #[test]
    fn test_enqueues_map_and_theme() {
        let f = fixture();
        let ids = f.installer.install_map_and_theme().unwrap();

        assert_eq!(ids.len(), 2);
        let enqueued = f.downloads.enqueued();
        assert_eq!(enqueued[0].1, "hungary.zip");
        assert_eq!(enqueued[1].1, "Vectorial_V7.zip");
        assert!(f.installer.is_watching());
    }

    #[test]
    fn test_skips_theme_when_installed() {
        let f = fixture();
        let entry = f.installer.layout().theme_entry_point_path();
        fs::create_dir_all(entry.parent().unwrap()).unwrap();
        fs::write(&entry, b"<rendertheme/>").unwrap();

        let ids = f.installer.install_map_and_theme().unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(f.downloads.enqueued()[0].1, "hungary.zip");
    }

    #[test]
    fn test_removes_stale_archives() {
        let f = fixture();
        let map_archive = f.installer.layout().map_archive_path();
        let theme_archive = f.installer.layout().theme_archive_path();
        fs::write(&map_archive, b"stale").unwrap();
        fs::write(&theme_archive, b"stale").unwrap();

        f.installer.install_map_and_theme().unwrap();
        assert!(!map_archive.exists());
        assert!(!theme_archive.exists());
    }

    #[test]
    fn test_watcher_registered_once() {
        let f = fixture();
        f.installer.install_map_and_theme().unwrap();
        f.installer.install_map_and_theme().unwrap();
        assert_eq!(f.downloads.watcher_count(), 1);

        f.installer.unregister();
        assert_eq!(f.downloads.watcher_count(), 0);
        assert!(!f.installer.is_watching());
    }

    #[test]
    fn test_enqueue_failure_is_returned() {
        let f = fixture();
        f.downloads.fail_enqueue(Some("download service unavailable"));

        let result = f.installer.install_map_and_theme();
        assert!(matches!(result, Err(InstallError::DownloadInitiation { .. })));
    }

    #[test]
    fn test_completion_installs_both_assets() {
        let f = fixture();
        let settings = AssetSettings::default();
        f.downloads.serve(&settings.map_url, zip_bytes(f.dir.path(), &[("hungary.map", b"MAP")]));
        f.downloads.serve(
            &settings.theme_url,
            zip_bytes(
                f.dir.path(),
                &[("Vectorial_V7/", b""), ("Vectorial_V7/Vectorial_V7.xml", b"<rendertheme/>")],
            ),
        );

        f.installer.install_map_and_theme().unwrap();
        f.downloads.complete_all().unwrap();

        let layout = f.installer.layout();
        assert_eq!(fs::read(layout.map_file_path()).unwrap(), b"MAP");
        assert!(layout.theme_installed());
        assert!(!layout.map_archive_path().exists());
        assert!(!layout.theme_archive_path().exists());
    }

    #[test]
    fn test_corrupt_archive_is_contained() {
        let f = fixture();
        let layout = f.installer.layout();
        fs::write(layout.map_file_path(), b"previous map").unwrap();
        fs::write(layout.map_archive_path(), b"garbage").unwrap();
        fs::write(layout.theme_archive_path(), b"garbage").unwrap();

        let report = f.installer.handle_download_complete();

        assert_eq!(report.map, ExtractOutcome::Failed);
        assert_eq!(report.theme, ExtractOutcome::Failed);
        assert_eq!(fs::read(layout.map_file_path()).unwrap(), b"previous map");
        assert!(!layout.theme_installed());
    }

    #[test]
    fn test_theme_failing_mid_extraction_keeps_installed_theme() {
        let f = fixture();
        let layout = f.installer.layout();
        let entry = layout.theme_entry_point_path();
        fs::create_dir_all(entry.parent().unwrap()).unwrap();
        fs::write(&entry, b"INSTALLED").unwrap();
        write_zip_with_bad_crc(
            &layout.theme_archive_path(),
            &[
                ("Vectorial_V7/Vectorial_V7.xml", b"<rendertheme version=\"new\"/>"),
                ("Vectorial_V7/patterns/wood.svg", b"<svg>wood</svg>"),
            ],
            b"<svg>wood</svg>",
        );

        let report = f.installer.handle_download_complete();

        assert_eq!(report.theme, ExtractOutcome::Failed);
        assert_eq!(fs::read(&entry).unwrap(), b"INSTALLED");
        assert!(!layout.root().join("Vectorial_V7/patterns/wood.svg").exists());
    }

    #[test]
    fn test_completion_without_archives() {
        let f = fixture();
        let report = f.installer.handle_download_complete();
        assert_eq!(report.map, ExtractOutcome::NotPresent);
        assert_eq!(report.theme, ExtractOutcome::NotPresent);
    }
}
