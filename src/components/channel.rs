use dioxus::prelude::*;
use draft_attachments::{EditPostContext, FileInfo};

use crate::components::{DraftArea, FullscreenAttachment};
use crate::models::SentPost;
use crate::services::edit_session::EditSessionHandle;

const CHANNEL_ID: &str = "town-square";

/// Channel view: sent posts, the draft area and the fullscreen viewer
#[component]
pub fn ChannelScreen() -> Element {
    let mut posts = use_signal(Vec::<SentPost>::new);
    let mut editing = use_signal(|| Option::<SentPost>::None);
    let mut fullscreen = use_signal(|| Option::<FileInfo>::None);

    rsx! {
        div {
            style: "display: flex; flex-direction: column; height: 100%;",

            div {
                style: "flex: 1; overflow-y: auto; padding: 12px;",
                if posts().is_empty() {
                    div {
                        style: "color: #999; text-align: center; margin-top: 40px;",
                        "No messages yet"
                    }
                }
                for post in posts() {
                    div {
                        key: "{post.id}",
                        style: "padding: 10px; margin-bottom: 8px; background: #ffffff; border: 1px solid #eee; border-radius: 8px;",
                        div {
                            style: "white-space: pre-wrap;",
                            "{post.message}"
                        }
                        if !post.files.is_empty() {
                            div {
                                style: "margin-top: 6px; font-size: 13px; color: #666;",
                                for file in post.files.clone() {
                                    span {
                                        style: if file.is_image() { "margin-right: 10px; cursor: pointer; text-decoration: underline;" } else { "margin-right: 10px;" },
                                        onclick: {
                                            let file = file.clone();
                                            move |_| {
                                                if file.is_image() {
                                                    fullscreen.set(Some(file.clone()));
                                                }
                                            }
                                        },
                                        "📎 {file.name}"
                                    }
                                }
                            }
                        }
                        button {
                            style: "margin-top: 6px; padding: 4px 10px; background: #f0f0f0; border: 1px solid #ccc; border-radius: 6px; cursor: pointer; font-size: 12px;",
                            onclick: {
                                let post = post.clone();
                                move |_| editing.set(Some(post.clone()))
                            },
                            "✏️ Edit"
                        }
                    }
                }
            }

            if let Some(post) = editing() {
                EditPostArea {
                    post: post.clone(),
                    on_save: move |files: Vec<FileInfo>| {
                        if let Some(edited) = editing() {
                            let mut posts = posts.write();
                            if let Some(slot) = posts.iter_mut().find(|p| p.id == edited.id) {
                                slot.files = files;
                            }
                        }
                        editing.set(None);
                    },
                    on_cancel: move |_| editing.set(None),
                    on_gallery_open: move |file| fullscreen.set(Some(file)),
                }
            } else {
                DraftArea {
                    channel_id: CHANNEL_ID.to_string(),
                    root_id: String::new(),
                    on_send: move |(message, files): (String, Vec<FileInfo>)| {
                        posts.write().push(SentPost::new(CHANNEL_ID, "", &message, files));
                    },
                    on_gallery_open: move |file| fullscreen.set(Some(file)),
                }
            }

            if let Some(file) = fullscreen() {
                FullscreenAttachment {
                    file,
                    on_close: move |_| fullscreen.set(None),
                }
            }
        }
    }
}

/// Attachment editor for a post being edited.
///
/// Re-provides the edit context for its thumbnails, so their retries route
/// through the edit session instead of the draft store.
#[component]
fn EditPostArea(
    post: SentPost,
    on_save: EventHandler<Vec<FileInfo>>,
    on_cancel: EventHandler<()>,
    on_gallery_open: EventHandler<FileInfo>,
) -> Element {
    let handle = use_hook(|| EditSessionHandle::new(&post.id, post.files.clone()));
    {
        let handle = handle.clone();
        use_context_provider(move || EditPostContext::editing(handle.session()));
    }

    let mut files = use_signal(|| handle.files());

    // Mirror session write-backs into the signal
    {
        let handle = handle.clone();
        use_future(move || {
            let handle = handle.clone();
            async move {
                let mut rx = handle.subscribe();
                while rx.changed().await.is_ok() {
                    files.set(handle.files());
                }
            }
        });
    }

    let save_handle = handle.clone();
    let remove_handle = handle.clone();

    rsx! {
        div {
            style: "padding: 12px; border-top: 2px solid #1c58d9; background: #f5f8ff;",
            div {
                style: "font-size: 13px; color: #1c58d9; margin-bottom: 8px;",
                "Editing message"
            }

            if !files().is_empty() {
                div {
                    style: "display: flex; flex-wrap: wrap; margin-bottom: 8px;",
                    for file in files() {
                        draft_attachments::UploadItem {
                            key: "{file.client_id}",
                            file: file.clone(),
                            channel_id: post.channel_id.clone(),
                            root_id: post.root_id.clone(),
                            on_remove: {
                                let handle = remove_handle.clone();
                                move |client_id: String| {
                                    handle.remove_file(&client_id);
                                    files.set(handle.files());
                                }
                            },
                            on_gallery_open: move |client_id: String| {
                                if let Some(file) = files().iter().find(|f| f.client_id == client_id) {
                                    on_gallery_open.call(file.clone());
                                }
                            },
                        }
                    }
                }
            }

            div {
                style: "display: flex; gap: 8px;",
                button {
                    style: "padding: 8px 16px; background: #1c58d9; color: white; border: none; border-radius: 8px; cursor: pointer;",
                    onclick: move |_| on_save.call(save_handle.files()),
                    "Save"
                }
                button {
                    style: "padding: 8px 16px; background: #ffffff; border: 1px solid #ccc; border-radius: 8px; cursor: pointer;",
                    onclick: move |_| on_cancel.call(()),
                    "Cancel"
                }
            }
        }
    }
}
