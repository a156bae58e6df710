//! Download manager trait

use crate::install::InstallResult;
use std::sync::Arc;

/// Opaque handle of an enqueued download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DownloadId(pub u64);

/// Handle of a registered completion watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(pub u32);

/// Invoked when any download finishes
pub type CompletionWatcher = Arc<dyn Fn(DownloadId) + Send + Sync>;

/// Platform download subsystem
///
/// Transfers land in the install root under their destination file name.
/// Completion is broadcast to every watcher registered for the action.
pub trait DownloadManager: Send + Sync {
    /// Start fetching `url` into `destination_file_name`
    fn enqueue(&self, url: &str, destination_file_name: &str) -> InstallResult<DownloadId>;

    fn register_completion_watcher(&self, action: &str, watcher: CompletionWatcher) -> WatcherId;

    fn unregister_completion_watcher(&self, watcher: WatcherId);
}
