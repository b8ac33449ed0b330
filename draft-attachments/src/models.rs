use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// One file pending or completed upload inside a draft or an in-progress edit.
///
/// The `client_id` is generated locally when the user attaches the file and
/// stays stable across retries until the attachment is replaced. The server
/// `id` is only present once the upload has completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub bytes_read: u64,
    pub failed: bool,
    pub local_path: String,
}

impl FileInfo {
    /// Create a fresh attachment record for a locally picked file
    pub fn new(local_path: &str, name: &str, size: u64) -> Self {
        Self {
            client_id: Ulid::new().to_string(),
            id: None,
            name: name.to_string(),
            mime_type: mime_for_path(name),
            size,
            bytes_read: 0,
            failed: false,
            local_path: local_path.to_string(),
        }
    }

    /// Whether the attachment should render as an image preview
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Returns a copy with the failure flag cleared.
    ///
    /// Retry never mutates the original record in place; the cleared copy is
    /// what gets written back through the draft store or edit session.
    pub fn cleared(&self) -> FileInfo {
        let mut file = self.clone();
        file.failed = false;
        file
    }

    /// File extension, lowercased, for the generic icon label
    pub fn extension(&self) -> String {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

/// Guess a mime type from the file name extension
pub fn mime_for_path(path: &str) -> String {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// Which overlay the thumbnail shows on top of the preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UploadOverlay {
    None,
    Progress(f32),
    Retry,
}

/// Rendering rule for the thumbnail overlays.
///
/// A failed attachment always shows the retry affordance, even if the manager
/// still reports the upload as loading; progress is only shown while an
/// upload is in flight and has not failed.
pub fn overlay_for(file: &FileInfo, uploading: bool, progress: f32) -> UploadOverlay {
    if file.failed {
        UploadOverlay::Retry
    } else if uploading {
        UploadOverlay::Progress(progress)
    } else {
        UploadOverlay::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str) -> FileInfo {
        FileInfo::new("/tmp/att", name, 100)
    }

    #[test]
    fn test_mime_detection() {
        assert_eq!(mime_for_path("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_path("notes.pdf"), "application/pdf");
        assert_eq!(mime_for_path("no_extension"), "application/octet-stream");
    }

    #[test]
    fn test_is_image() {
        assert!(attachment("photo.png").is_image());
        assert!(!attachment("report.pdf").is_image());
    }

    #[test]
    fn test_cleared_copies_without_mutating_original() {
        let mut original = attachment("photo.png");
        original.failed = true;
        original.bytes_read = 42;

        let cleared = original.cleared();

        assert!(original.failed);
        assert!(!cleared.failed);
        assert_eq!(cleared.client_id, original.client_id);
        assert_eq!(cleared.bytes_read, 42);
    }

    #[test]
    fn test_fresh_attachments_get_unique_client_ids() {
        let a = attachment("a.png");
        let b = attachment("b.png");
        assert_ne!(a.client_id, b.client_id);
    }

    #[test]
    fn test_overlay_precedence() {
        let mut file = attachment("photo.png");

        // Plain preview while idle
        assert_eq!(overlay_for(&file, false, 0.0), UploadOverlay::None);

        // Progress while uploading
        assert_eq!(overlay_for(&file, true, 0.4), UploadOverlay::Progress(0.4));

        // Failed beats loading, regardless of progress
        file.failed = true;
        assert_eq!(overlay_for(&file, true, 0.4), UploadOverlay::Retry);
        assert_eq!(overlay_for(&file, false, 0.0), UploadOverlay::Retry);
    }
}
