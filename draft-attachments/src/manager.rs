//! Upload lifecycle management for draft and edit-post attachments.
//!
//! The manager owns the in-flight transfer tasks (keyed by client id), the
//! progress handler registry, and the write-back of completion/failure state
//! through the caller-selected update route. Transfers stream the file in
//! chunks so progress can be observed while the request body is sent.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use crate::models::FileInfo;
use crate::progress::{ProgressHandler, ProgressRegistry, ProgressSubscription};
use crate::route::UpdateRoute;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while uploading an attachment
#[derive(Debug)]
pub enum UploadError {
    Io(std::io::Error),
    Http(reqwest::Error),
    Server(String),
    Store(String),
    Other(String),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Io(e) => write!(f, "IO error: {}", e),
            UploadError::Http(e) => write!(f, "HTTP error: {}", e),
            UploadError::Server(msg) => write!(f, "Server error: {}", msg),
            UploadError::Store(msg) => write!(f, "Store error: {}", msg),
            UploadError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err)
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Http(err)
    }
}

/// Configuration for the upload manager
#[derive(Debug, Clone, Default)]
pub struct UploadManagerConfig {
    /// Bearer token sent with upload requests, if the server requires one
    pub auth_token: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

struct ManagerInner {
    config: UploadManagerConfig,
    http: reqwest::Client,
    registry: ProgressRegistry,
    in_flight: Mutex<HashMap<String, JoinHandle<()>>>,
    handle: Handle,
    // Keeps the owned runtime alive when no ambient one existed
    _runtime: Option<Runtime>,
}

impl ManagerInner {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Tracks in-flight attachment uploads and their progress observers
#[derive(Clone)]
pub struct UploadManager {
    inner: Arc<ManagerInner>,
}

impl UploadManager {
    /// Create a manager, reusing the ambient tokio runtime when one exists
    /// and spinning up a small background runtime otherwise.
    pub fn new(config: UploadManagerConfig) -> Self {
        let (handle, runtime) = match Handle::try_current() {
            Ok(handle) => (handle, None),
            Err(_) => {
                let runtime = Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                    .expect("Failed to create tokio runtime");
                (runtime.handle().clone(), Some(runtime))
            }
        };

        Self {
            inner: Arc::new(ManagerInner {
                config,
                http: reqwest::Client::new(),
                registry: ProgressRegistry::new(),
                in_flight: Mutex::new(HashMap::new()),
                handle,
                _runtime: runtime,
            }),
        }
    }

    /// Register a progress handler for a client id.
    ///
    /// Replaces any previous registration for the same id; the returned guard
    /// releases it when dropped.
    pub fn register_progress_handler(
        &self,
        client_id: &str,
        handler: ProgressHandler,
    ) -> ProgressSubscription {
        self.inner.registry.register(client_id, handler)
    }

    pub fn registry(&self) -> ProgressRegistry {
        self.inner.registry.clone()
    }

    /// Whether a transfer for this client id is currently in flight
    pub fn is_uploading(&self, client_id: &str) -> bool {
        self.inner
            .lock_in_flight()
            .get(client_id)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Start (or restart) the transfer for an attachment on a background task.
    ///
    /// A client id maps to at most one concurrent transfer; a request for an
    /// id that is already in flight is skipped. `bytes_read` resumes a
    /// partial transfer from that offset. Completion and failure are written
    /// back through `route` as full replacement copies of the record.
    pub fn prepare_upload(
        &self,
        server_url: &str,
        file: FileInfo,
        channel_id: &str,
        root_id: &str,
        bytes_read: u64,
        route: UpdateRoute,
    ) {
        let client_id = file.client_id.clone();
        let mut in_flight = self.inner.lock_in_flight();

        if let Some(existing) = in_flight.get(&client_id) {
            if !existing.is_finished() {
                log::warn!("Upload for {} already in flight, skipping", client_id);
                return;
            }
        }

        log::debug!(
            "Starting upload of {} ({} bytes, offset {})",
            file.name,
            file.size,
            bytes_read
        );

        let inner = self.inner.clone();
        let server_url = server_url.trim_end_matches('/').to_string();
        let channel_id = channel_id.to_string();
        let root_id = root_id.to_string();

        let handle = self.inner.handle.spawn(run_upload(
            inner, server_url, file, channel_id, root_id, bytes_read, route,
        ));
        in_flight.insert(client_id, handle);
    }

    /// Abort the in-flight transfer for a client id, if any
    pub fn cancel_upload(&self, client_id: &str) -> bool {
        if let Some(handle) = self.inner.lock_in_flight().remove(client_id) {
            handle.abort();
            log::debug!("Cancelled upload for {}", client_id);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn test_mark_in_flight(&self, client_id: &str) {
        let handle = self
            .inner
            .handle
            .spawn(async { tokio::time::sleep(std::time::Duration::from_secs(60)).await });
        self.inner
            .lock_in_flight()
            .insert(client_id.to_string(), handle);
    }
}

async fn run_upload(
    inner: Arc<ManagerInner>,
    server_url: String,
    file: FileInfo,
    channel_id: String,
    root_id: String,
    bytes_read: u64,
    route: UpdateRoute,
) {
    let sent = Arc::new(AtomicU64::new(0));
    let result = transfer(&inner, &server_url, &file, &channel_id, bytes_read, sent.clone()).await;

    let mut updated = file;
    match result {
        Ok(server_id) => {
            log::info!("Uploaded attachment {} ({} bytes)", updated.name, updated.size);
            updated.id = Some(server_id);
            updated.failed = false;
            updated.bytes_read = updated.size;
            inner.registry.emit(&updated.client_id, 1.0);
        }
        Err(e) => {
            log::error!("Upload of {} failed: {}", updated.name, e);
            updated.failed = true;
            updated.bytes_read = bytes_read + sent.load(Ordering::SeqCst);
        }
    }

    if let Err(e) = route.apply(&channel_id, &root_id, &updated) {
        log::error!(
            "Failed to persist upload state for {}: {}",
            updated.client_id,
            e
        );
    }

    inner.lock_in_flight().remove(&updated.client_id);
}

/// Fraction of the file transferred after `done` bytes.
///
/// A zero-size file counts as fully transferred.
fn chunk_progress(done: u64, total: u64) -> f32 {
    if total == 0 {
        1.0
    } else {
        done as f32 / total as f32
    }
}

/// Stream the file to the server, emitting progress per chunk sent
async fn transfer(
    inner: &ManagerInner,
    server_url: &str,
    file: &FileInfo,
    channel_id: &str,
    bytes_read: u64,
    sent: Arc<AtomicU64>,
) -> UploadResult<String> {
    let mut source = tokio::fs::File::open(&file.local_path).await?;
    if bytes_read > 0 {
        source.seek(SeekFrom::Start(bytes_read)).await?;
    }

    let registry = inner.registry.clone();
    let client_id = file.client_id.clone();
    let total = file.size;

    let stream = futures_util::stream::unfold(source, move |mut source| {
        let registry = registry.clone();
        let client_id = client_id.clone();
        let sent = sent.clone();
        async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            match source.read(&mut buf).await {
                Ok(0) => None,
                Ok(n) => {
                    buf.truncate(n);
                    let done = bytes_read + sent.fetch_add(n as u64, Ordering::SeqCst) + n as u64;
                    registry.emit(&client_id, chunk_progress(done, total));
                    Some((Ok::<_, std::io::Error>(buf), source))
                }
                Err(e) => Some((Err(e), source)),
            }
        }
    });

    let mut request = inner
        .http
        .post(format!("{}/api/v4/files", server_url))
        .query(&[
            ("channel_id", channel_id),
            ("client_id", file.client_id.as_str()),
            ("filename", file.name.as_str()),
        ])
        .header(reqwest::header::CONTENT_TYPE, file.mime_type.clone())
        .body(reqwest::Body::wrap_stream(stream));

    if let Some(token) = &inner.config.auth_token {
        request = request.bearer_auth(token);
    }
    if bytes_read > 0 && file.size > 0 {
        request = request.header(
            reqwest::header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", bytes_read, file.size - 1, file.size),
        );
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(UploadError::Server(format!(
            "upload rejected with status {}",
            response.status()
        )));
    }

    let parsed: UploadResponse = response.json().await?;
    Ok(parsed.id)
}

/// Retry a failed attachment upload.
///
/// No-op (returns `None`) unless the failure flag is set. Otherwise persists
/// a cleared copy of the record through the route, restarts the transfer, and
/// registers `handler` for the attachment's client id. The returned guard
/// should replace the caller's previous subscription so the old registration
/// is released rather than duplicated.
pub fn retry_file_upload(
    manager: &UploadManager,
    server_url: &str,
    file: &FileInfo,
    channel_id: &str,
    root_id: &str,
    route: UpdateRoute,
    handler: ProgressHandler,
) -> Option<ProgressSubscription> {
    if !file.failed {
        return None;
    }

    let cleared = file.cleared();
    if let Err(e) = route.apply(channel_id, root_id, &cleared) {
        log::error!(
            "Retry aborted, could not persist cleared record for {}: {}",
            cleared.client_id,
            e
        );
        return None;
    }

    manager.prepare_upload(
        server_url,
        cleared.clone(),
        channel_id,
        root_id,
        cleared.bytes_read,
        route,
    );

    Some(manager.register_progress_handler(&cleared.client_id, handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::tests::{RecordingSession, RecordingStore};
    use std::time::Duration;

    fn missing_file(client_id: &str, failed: bool) -> FileInfo {
        FileInfo {
            client_id: client_id.to_string(),
            id: None,
            name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: 4096,
            bytes_read: 0,
            failed,
            local_path: "/nonexistent/report.pdf".to_string(),
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not met within timeout");
    }

    #[tokio::test]
    async fn test_failed_transfer_routes_failed_record_back() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let store = Arc::new(RecordingStore::default());

        manager.prepare_upload(
            "http://localhost:0",
            missing_file("c1", false),
            "ch1",
            "",
            0,
            UpdateRoute::Draft(store.clone()),
        );

        wait_for(|| !store.writes.lock().unwrap().is_empty()).await;

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        let (channel_id, root_id, record) = &writes[0];
        assert_eq!(channel_id, "ch1");
        assert_eq!(root_id, "");
        assert_eq!(record.client_id, "c1");
        assert!(record.failed);
    }

    #[tokio::test]
    async fn test_in_flight_entry_is_cleaned_up_after_failure() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let store = Arc::new(RecordingStore::default());

        manager.prepare_upload(
            "http://localhost:0",
            missing_file("c1", false),
            "ch1",
            "",
            0,
            UpdateRoute::Draft(store.clone()),
        );

        let probe = manager.clone();
        wait_for(move || !probe.is_uploading("c1")).await;
        assert!(!manager.is_uploading("c1"));
    }

    #[tokio::test]
    async fn test_duplicate_prepare_is_skipped() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let store = Arc::new(RecordingStore::default());

        manager.test_mark_in_flight("c1");
        assert!(manager.is_uploading("c1"));

        manager.prepare_upload(
            "http://localhost:0",
            missing_file("c1", false),
            "ch1",
            "",
            0,
            UpdateRoute::Draft(store.clone()),
        );

        // The skipped request never spawns a transfer, so no write-back happens
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.writes.lock().unwrap().is_empty());
        assert!(manager.is_uploading("c1"));

        assert!(manager.cancel_upload("c1"));
        assert!(!manager.is_uploading("c1"));
    }

    #[tokio::test]
    async fn test_cancel_unknown_upload_returns_false() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        assert!(!manager.cancel_upload("missing"));
    }

    #[test]
    fn test_zero_size_file_reports_complete_progress() {
        assert_eq!(chunk_progress(0, 0), 1.0);
    }

    #[test]
    fn test_partial_progress_fraction() {
        assert_eq!(chunk_progress(512, 1024), 0.5);
        assert_eq!(chunk_progress(1024, 1024), 1.0);
    }

    #[test]
    fn test_retry_is_noop_unless_failed() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let store = Arc::new(RecordingStore::default());
        let file = missing_file("c1", false);

        let subscription = retry_file_upload(
            &manager,
            "http://localhost:0",
            &file,
            "ch1",
            "",
            UpdateRoute::Draft(store.clone()),
            Arc::new(|_| {}),
        );

        assert!(subscription.is_none());
        assert!(store.writes.lock().unwrap().is_empty());
        assert!(!manager.is_uploading("c1"));
    }

    #[tokio::test]
    async fn test_retry_persists_cleared_copy_and_registers_once() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let store = Arc::new(RecordingStore::default());
        let file = missing_file("c1", true);

        let subscription = retry_file_upload(
            &manager,
            "http://localhost:0",
            &file,
            "ch1",
            "root1",
            UpdateRoute::Draft(store.clone()),
            Arc::new(|_| {}),
        );
        let mut subscription = subscription.expect("retry of a failed file returns a guard");

        // The original record is untouched; the persisted copy is cleared
        assert!(file.failed);
        {
            let writes = store.writes.lock().unwrap();
            assert!(!writes.is_empty());
            assert!(!writes[0].2.failed);
            assert_eq!(writes[0].2.client_id, "c1");
        }

        // Exactly one registration, released with the guard
        assert!(manager.registry().is_registered("c1"));
        subscription.release();
        assert!(!manager.registry().is_registered("c1"));

        // The restarted transfer fails (missing file) and writes back once more
        wait_for(|| store.writes.lock().unwrap().len() >= 2).await;
        let writes = store.writes.lock().unwrap();
        assert!(writes.last().unwrap().2.failed);
    }

    #[tokio::test]
    async fn test_retry_in_edit_mode_uses_session_not_store() {
        let manager = UploadManager::new(UploadManagerConfig::default());
        let session = Arc::new(RecordingSession::default());
        let file = missing_file("c1", true);

        let subscription = retry_file_upload(
            &manager,
            "http://localhost:0",
            &file,
            "ch1",
            "",
            UpdateRoute::Edit(session.clone()),
            Arc::new(|_| {}),
        );
        assert!(subscription.is_some());

        let updates = session.updates.lock().unwrap();
        assert!(!updates.is_empty());
        assert!(!updates[0].failed);
    }
}
