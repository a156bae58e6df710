//! Mock download manager for testing and the demo binary

use crate::install::{CompletionWatcher, DownloadId, DownloadManager, InstallError, InstallResult, WatcherId};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MockState {
    content: HashMap<String, Vec<u8>>,
    enqueued: Vec<(DownloadId, String, String)>,
    completed: Vec<DownloadId>,
    watchers: BTreeMap<WatcherId, (String, CompletionWatcher)>,
    fail_enqueue: Option<String>,
    download_counter: u64,
    watcher_counter: u32,
}

/// Download manager that serves registered bytes into a local directory
pub struct MockDownloadManager {
    destination_dir: PathBuf,
    state: Mutex<MockState>,
}

impl MockDownloadManager {
    pub fn new(destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            state: Mutex::new(MockState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes returned for `url` when its download completes
    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.lock().content.insert(url.to_string(), bytes);
    }

    /// Make every enqueue fail with the given reason
    pub fn fail_enqueue(&self, reason: Option<&str>) {
        self.lock().fail_enqueue = reason.map(str::to_string);
    }

    /// (url, destination file name) of every enqueued download
    pub fn enqueued(&self) -> Vec<(String, String)> {
        self.lock()
            .enqueued
            .iter()
            .map(|(_, url, dest)| (url.clone(), dest.clone()))
            .collect()
    }

    pub fn watcher_count(&self) -> usize {
        self.lock().watchers.len()
    }

    /// Finish every outstanding download and broadcast each completion
    ///
    /// Returns the ids that were completed.
    pub fn complete_all(&self) -> InstallResult<Vec<DownloadId>> {
        let pending: Vec<(DownloadId, String, String)> = {
            let state = self.lock();
            state
                .enqueued
                .iter()
                .filter(|(id, _, _)| !state.completed.contains(id))
                .cloned()
                .collect()
        };

        let mut finished = Vec::new();
        for (id, url, dest) in pending {
            let bytes = self.lock().content.get(&url).cloned().unwrap_or_default();
            let path = self.destination_dir.join(&dest);
            fs::write(&path, &bytes).map_err(|e| InstallError::io(&path, e))?;
            debug!("Mock download {} finished: {} ({} bytes)", id.0, dest, bytes.len());

            self.lock().completed.push(id);
            self.broadcast(id);
            finished.push(id);
        }
        Ok(finished)
    }

    fn broadcast(&self, id: DownloadId) {
        let watchers: Vec<CompletionWatcher> = self.lock().watchers.values().map(|(_, w)| w.clone()).collect();
        for watcher in watchers {
            watcher(id);
        }
    }
}

impl DownloadManager for MockDownloadManager {
    fn enqueue(&self, url: &str, destination_file_name: &str) -> InstallResult<DownloadId> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_enqueue.clone() {
            return Err(InstallError::DownloadInitiation {
                url: url.to_string(),
                reason,
            });
        }

        state.download_counter += 1;
        let id = DownloadId(state.download_counter);
        state
            .enqueued
            .push((id, url.to_string(), destination_file_name.to_string()));
        Ok(id)
    }

    fn register_completion_watcher(&self, action: &str, watcher: CompletionWatcher) -> WatcherId {
        let mut state = self.lock();
        state.watcher_counter += 1;
        let id = WatcherId(state.watcher_counter);
        state.watchers.insert(id, (action.to_string(), watcher));
        id
    }

    fn unregister_completion_watcher(&self, watcher: WatcherId) {
        self.lock().watchers.remove(&watcher);
    }
}
