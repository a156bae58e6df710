//! Map and theme asset installation
//!
//! Downloads are delegated to the platform download manager; when it
//! broadcasts a completion the downloaded archives are unpacked into the
//! install root and removed.

pub mod error;
pub mod download;
pub mod layout;
pub mod archive;
pub mod installer;
pub mod mock;

pub use error::{InstallError, InstallResult};
pub use download::{DownloadManager, DownloadId, CompletionWatcher, WatcherId};
pub use layout::{AssetSettings, InstallLayout, InstallRequest};
pub use archive::{extract_single_file, extract_tree, ExtractSummary};
pub use installer::{AssetInstaller, CompletionReport, ExtractOutcome};
pub use mock::MockDownloadManager;
