//! State of an in-progress post edit.
//!
//! While a post is being edited its attachments live here instead of the
//! draft store. Transfer tasks write replacement records through the
//! `EditSession` trait; the UI listens on the watch channel and re-reads the
//! file list when it fires.

use std::sync::{Arc, Mutex, MutexGuard};

use draft_attachments::{EditSession, FileInfo};
use tokio::sync::watch;

pub struct ActiveEditSession {
    post_id: String,
    files: Mutex<Vec<FileInfo>>,
    changed: watch::Sender<u64>,
}

impl ActiveEditSession {
    fn lock_files(&self) -> MutexGuard<'_, Vec<FileInfo>> {
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        self.changed.send_modify(|v| *v += 1);
    }
}

impl EditSession for ActiveEditSession {
    fn update_file(&self, file: &FileInfo) {
        let mut files = self.lock_files();
        match files.iter_mut().find(|f| f.client_id == file.client_id) {
            Some(slot) => *slot = file.clone(),
            None => {
                log::warn!(
                    "Update for attachment {} not part of edit of post {}",
                    file.client_id,
                    self.post_id
                );
                return;
            }
        }
        drop(files);
        self.notify();
    }
}

/// Cloneable handle to one edit session
#[derive(Clone)]
pub struct EditSessionHandle(Arc<ActiveEditSession>);

impl PartialEq for EditSessionHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl EditSessionHandle {
    pub fn new(post_id: &str, files: Vec<FileInfo>) -> Self {
        let (changed, _) = watch::channel(0);
        Self(Arc::new(ActiveEditSession {
            post_id: post_id.to_string(),
            files: Mutex::new(files),
            changed,
        }))
    }

    /// Receiver that fires whenever the file list changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.0.changed.subscribe()
    }

    pub fn files(&self) -> Vec<FileInfo> {
        self.0.lock_files().clone()
    }

    pub fn remove_file(&self, client_id: &str) {
        self.0.lock_files().retain(|f| f.client_id != client_id);
        self.0.notify();
    }

    /// The session as the trait object the upload routing expects
    pub fn session(&self) -> Arc<dyn EditSession> {
        self.0.clone()
    }
}
