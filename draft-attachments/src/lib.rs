//! # Draft Attachments
//!
//! Attachment upload handling for message drafts and post edits.
//!
//! This crate covers the lifecycle of a file attached to a draft:
//! - Attachment records with locally generated client ids
//! - Chunked streaming uploads with resumable offsets
//! - Progress subscriptions scoped to the observing UI element
//! - Retry of failed uploads, routed back to a draft store or an edit session
//!
//! ## Platform Separation
//!
//! This crate focuses on transfer and state logic. Persistence (where drafts
//! live) and edit-session state belong to the application crate, plugged in
//! through the `DraftStore` and `EditSession` traits.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use draft_attachments::{FileInfo, UpdateRoute, UploadManager, UploadManagerConfig};
//!
//! let manager = UploadManager::new(UploadManagerConfig::default());
//! let file = FileInfo::new("/path/to/photo.jpg", "photo.jpg", 4096);
//! manager.prepare_upload(
//!     "https://chat.example.com",
//!     file,
//!     "channel-id",
//!     "",
//!     0,
//!     UpdateRoute::Draft(store),
//! );
//! ```

pub mod manager;
pub mod models;
pub mod progress;
pub mod route;

#[cfg(feature = "components")]
pub mod components;

pub use manager::{
    retry_file_upload, UploadError, UploadManager, UploadManagerConfig, UploadResult,
};
pub use models::{mime_for_path, overlay_for, FileInfo, UploadOverlay};
pub use progress::{ProgressHandler, ProgressRegistry, ProgressSubscription};
pub use route::{DraftStore, EditSession, UpdateRoute};

#[cfg(feature = "components")]
pub use components::{
    data_url_for, EditPostContext, UploadContext, UploadItem, UploadProgressBar, UploadRemove,
    UploadRetry,
};
