use draft_attachments::FileInfo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message that has been sent to the channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentPost {
    pub id: String,
    pub channel_id: String,
    pub root_id: String,
    pub message: String,
    pub files: Vec<FileInfo>,
    pub created_at: String,
}

impl SentPost {
    pub fn new(channel_id: &str, root_id: &str, message: &str, files: Vec<FileInfo>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.to_string(),
            root_id: root_id.to_string(),
            message: message.to_string(),
            files,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
