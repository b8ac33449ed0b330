//! Dioxus UI components for attachment thumbnails in the draft area.
//!
//! The thumbnail bridges the background transfer task to the UI through a
//! watch channel: the progress handler runs on the upload runtime, the
//! component listens on the receiver and mirrors values into a signal.

#[cfg(feature = "components")]
use dioxus::prelude::*;

#[cfg(feature = "components")]
use std::cell::RefCell;
#[cfg(feature = "components")]
use std::rc::Rc;
#[cfg(feature = "components")]
use std::sync::Arc;

#[cfg(feature = "components")]
use tokio::sync::watch;

#[cfg(feature = "components")]
use crate::manager::{retry_file_upload, UploadManager};
#[cfg(feature = "components")]
use crate::models::{overlay_for, FileInfo, UploadOverlay};
#[cfg(feature = "components")]
use crate::progress::ProgressSubscription;
#[cfg(feature = "components")]
use crate::route::{DraftStore, EditSession, UpdateRoute};

#[cfg(feature = "components")]
/// Shared wiring for all attachment thumbnails in a draft area
#[derive(Clone)]
pub struct UploadContext {
    pub manager: UploadManager,
    pub server_url: String,
    pub draft_store: Arc<dyn DraftStore>,
}

#[cfg(feature = "components")]
impl UploadContext {
    pub fn new(manager: UploadManager, server_url: String, draft_store: Arc<dyn DraftStore>) -> Self {
        Self {
            manager,
            server_url,
            draft_store,
        }
    }
}

#[cfg(feature = "components")]
/// Marks the surrounding draft area as an in-progress post edit.
///
/// The default (no edit) routes write-backs to the draft store; an edit area
/// re-provides this context with its session so retries update the edit
/// instead.
#[derive(Clone, Default)]
pub struct EditPostContext {
    pub is_edit_mode: bool,
    pub session: Option<Arc<dyn EditSession>>,
}

#[cfg(feature = "components")]
impl EditPostContext {
    pub fn editing(session: Arc<dyn EditSession>) -> Self {
        Self {
            is_edit_mode: true,
            session: Some(session),
        }
    }
}

#[cfg(feature = "components")]
/// Read a local file and convert it to a data URL for the preview
pub fn data_url_for(file: &FileInfo) -> Option<String> {
    use base64::{engine::general_purpose, Engine as _};

    match std::fs::read(&file.local_path) {
        Ok(bytes) => {
            let encoded = general_purpose::STANDARD.encode(&bytes);
            Some(format!("data:{};base64,{}", file.mime_type, encoded))
        }
        Err(e) => {
            log::debug!("No preview for {}: {}", file.local_path, e);
            None
        }
    }
}

#[cfg(feature = "components")]
/// Thumbnail for one attachment in the draft area.
///
/// Shows an image preview or a generic file tile, with the remove button on
/// top and either a progress bar (while uploading) or the retry overlay
/// (after a failure). Tapping an image preview is delegated to the parent,
/// which owns the fullscreen gallery.
#[component]
pub fn UploadItem(
    file: FileInfo,
    channel_id: String,
    root_id: String,
    on_remove: EventHandler<String>,
    on_gallery_open: EventHandler<String>,
) -> Element {
    let context = use_context::<UploadContext>();
    let edit = use_context::<EditPostContext>();

    let mut progress = use_signal(|| {
        if file.size == 0 {
            0.0f32
        } else {
            file.bytes_read as f32 / file.size as f32
        }
    });

    // One channel per thumbnail carries progress from the transfer task
    let (progress_tx, progress_rx) = use_hook(|| {
        let (tx, rx) = watch::channel(0.0f32);
        (Arc::new(tx), rx)
    });

    // Registered once on mount, released when the hook state drops on
    // unmount. Retry swaps in a fresh guard below.
    let subscription: Rc<RefCell<Option<ProgressSubscription>>> = use_hook(|| {
        let tx = progress_tx.clone();
        let guard = context.manager.register_progress_handler(
            &file.client_id,
            Arc::new(move |value| {
                let _ = tx.send(value);
            }),
        );
        Rc::new(RefCell::new(Some(guard)))
    });

    use_future(move || {
        let mut rx = progress_rx.clone();
        async move {
            while rx.changed().await.is_ok() {
                let value = *rx.borrow();
                progress.set(value);
            }
        }
    });

    let uploading = context.manager.is_uploading(&file.client_id);
    let overlay = overlay_for(&file, uploading, progress());

    let preview = use_hook(|| {
        if file.is_image() {
            data_url_for(&file)
        } else {
            None
        }
    });

    let retry_file = file.clone();
    let retry_channel = channel_id.clone();
    let retry_root = root_id.clone();
    let retry_context = context.clone();
    let retry_edit = edit.clone();
    let retry_tx = progress_tx.clone();
    let retry_subscription = subscription.clone();
    let on_retry = move |_| {
        let route = if retry_edit.is_edit_mode {
            match &retry_edit.session {
                Some(session) => UpdateRoute::Edit(session.clone()),
                None => {
                    log::warn!("Edit mode without a session, ignoring retry");
                    return;
                }
            }
        } else {
            UpdateRoute::Draft(retry_context.draft_store.clone())
        };

        let tx = retry_tx.clone();
        if let Some(guard) = retry_file_upload(
            &retry_context.manager,
            &retry_context.server_url,
            &retry_file,
            &retry_channel,
            &retry_root,
            route,
            Arc::new(move |value| {
                let _ = tx.send(value);
            }),
        ) {
            // Dropping the previous guard after the new registration exists
            // leaves the new handler in place
            retry_subscription.borrow_mut().replace(guard);
        }
    };

    let remove_id = file.client_id.clone();
    let remove_context = context.clone();
    let remove_subscription = subscription.clone();
    let on_remove_click = move |_| {
        remove_context.manager.cancel_upload(&remove_id);
        if let Some(mut guard) = remove_subscription.borrow_mut().take() {
            guard.release();
        }
        on_remove.call(remove_id.clone());
    };

    let gallery_id = file.client_id.clone();
    let extension = file.extension();
    let name = file.name.clone();

    rsx! {
        div {
            style: "position: relative; width: 104px; height: 104px; margin: 4px;",
            // The whole preview delegates the press, image or not
            div {
                style: "width: 100%; height: 100%; border-radius: 8px; overflow: hidden; background: #f0f0f0; cursor: pointer;",
                onclick: move |_| on_gallery_open.call(gallery_id.clone()),
                if let Some(url) = preview {
                    img {
                        src: "{url}",
                        alt: "{name}",
                        style: "width: 100%; height: 100%; object-fit: cover;",
                    }
                } else {
                    div {
                        style: "width: 100%; height: 100%; display: flex; flex-direction: column; align-items: center; justify-content: center; color: #666;",
                        div { style: "font-size: 28px;", "📄" }
                        div {
                            style: "font-size: 11px; text-transform: uppercase; margin-top: 4px;",
                            "{extension}"
                        }
                    }
                }
            }
            match overlay {
                UploadOverlay::Retry => rsx! {
                    UploadRetry { on_click: on_retry }
                },
                UploadOverlay::Progress(value) => rsx! {
                    UploadProgressBar { value }
                },
                UploadOverlay::None => rsx! {},
            }
            UploadRemove { on_click: on_remove_click }
        }
    }
}

#[cfg(feature = "components")]
/// Small × button in the thumbnail corner
#[component]
pub fn UploadRemove(on_click: EventHandler<()>) -> Element {
    rsx! {
        button {
            style: "position: absolute; top: -6px; right: -6px; width: 22px; height: 22px; background: #333; color: white; border-radius: 50%; font-size: 14px; line-height: 1; cursor: pointer; border: 2px solid white; z-index: 2;",
            onclick: move |_| on_click.call(()),
            "×"
        }
    }
}

#[cfg(feature = "components")]
/// Fullscreen-in-tile retry overlay shown for failed uploads
#[component]
pub fn UploadRetry(on_click: EventHandler<()>) -> Element {
    rsx! {
        div {
            style: "position: absolute; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0, 0, 0, 0.6); border-radius: 8px; display: flex; align-items: center; justify-content: center; cursor: pointer; z-index: 1;",
            onclick: move |_| on_click.call(()),
            div {
                style: "color: white; font-size: 28px;",
                "↻"
            }
        }
    }
}

#[cfg(feature = "components")]
/// Thin progress bar along the bottom edge of the thumbnail
#[component]
pub fn UploadProgressBar(value: f32) -> Element {
    let percent = (value.clamp(0.0, 1.0) * 100.0) as u32;
    rsx! {
        div {
            style: "position: absolute; left: 4px; right: 4px; bottom: 4px; height: 5px; background: rgba(0, 0, 0, 0.3); border-radius: 3px; overflow: hidden; z-index: 1;",
            div {
                style: "width: {percent}%; height: 100%; background: #1c58d9; border-radius: 3px;",
            }
        }
    }
}
