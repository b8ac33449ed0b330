use draft_attachments::FileInfo;
use serde::{Deserialize, Serialize};

/// An unsent message for a channel or thread, with its attachments.
///
/// One draft exists per (channel_id, root_id) pair; an empty root_id means
/// the channel-level draft rather than a thread reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Draft {
    pub id: i64,
    pub channel_id: String,
    pub root_id: String,
    pub message: String,
    pub files: Vec<FileInfo>,
    pub created_at: String,
    pub updated_at: String,
}
