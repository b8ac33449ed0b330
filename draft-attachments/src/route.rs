//! Write-back routing for attachment state.
//!
//! A draft attachment and an edit-post attachment persist their state through
//! different stores. The route is chosen once, where the upload or retry is
//! requested, and carried as a tagged variant so exactly one of the two paths
//! ever runs for a given write-back.

use std::sync::Arc;

use crate::manager::UploadError;
use crate::models::FileInfo;

/// Persists replacement attachment records for a channel/thread draft
pub trait DraftStore: Send + Sync {
    fn update_draft_file(
        &self,
        channel_id: &str,
        root_id: &str,
        file: &FileInfo,
    ) -> Result<(), UploadError>;
}

/// Applies replacement attachment records to an in-progress post edit
pub trait EditSession: Send + Sync {
    fn update_file(&self, file: &FileInfo);
}

/// Where upload state changes get written back to
#[derive(Clone)]
pub enum UpdateRoute {
    Draft(Arc<dyn DraftStore>),
    Edit(Arc<dyn EditSession>),
}

impl UpdateRoute {
    /// Write a full replacement copy of the record through the selected path
    pub fn apply(
        &self,
        channel_id: &str,
        root_id: &str,
        file: &FileInfo,
    ) -> Result<(), UploadError> {
        match self {
            UpdateRoute::Draft(store) => store.update_draft_file(channel_id, root_id, file),
            UpdateRoute::Edit(session) => {
                session.update_file(file);
                Ok(())
            }
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self, UpdateRoute::Edit(_))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub writes: Mutex<Vec<(String, String, FileInfo)>>,
    }

    impl DraftStore for RecordingStore {
        fn update_draft_file(
            &self,
            channel_id: &str,
            root_id: &str,
            file: &FileInfo,
        ) -> Result<(), UploadError> {
            self.writes.lock().unwrap().push((
                channel_id.to_string(),
                root_id.to_string(),
                file.clone(),
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingSession {
        pub updates: Mutex<Vec<FileInfo>>,
    }

    impl EditSession for RecordingSession {
        fn update_file(&self, file: &FileInfo) {
            self.updates.lock().unwrap().push(file.clone());
        }
    }

    #[test]
    fn test_draft_route_writes_to_store_only() {
        let store = Arc::new(RecordingStore::default());
        let route = UpdateRoute::Draft(store.clone());
        let file = FileInfo::new("/tmp/a.png", "a.png", 10);

        route.apply("ch1", "root1", &file).unwrap();

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "ch1");
        assert_eq!(writes[0].1, "root1");
        assert_eq!(writes[0].2.client_id, file.client_id);
        assert!(!route.is_edit());
    }

    #[test]
    fn test_edit_route_updates_session_only() {
        let session = Arc::new(RecordingSession::default());
        let route = UpdateRoute::Edit(session.clone());
        let file = FileInfo::new("/tmp/a.png", "a.png", 10);

        route.apply("ch1", "root1", &file).unwrap();

        let updates = session.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].client_id, file.client_id);
        assert!(route.is_edit());
    }
}
