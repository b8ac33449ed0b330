use std::path::Path;

use dioxus::prelude::*;
use draft_attachments::{FileInfo, UpdateRoute, UploadContext, UploadItem};

use crate::database;
use crate::error::AppError;
use crate::services::draft_service;

/// Message box with attachment thumbnails for one channel or thread.
///
/// The stored draft is the source of truth for the attachment list; the
/// component polls it so failure flags written back by transfer tasks show
/// up without an explicit refresh.
#[component]
pub fn DraftArea(
    channel_id: String,
    root_id: String,
    on_send: EventHandler<(String, Vec<FileInfo>)>,
    on_gallery_open: EventHandler<FileInfo>,
) -> Element {
    let context = use_context::<UploadContext>();

    let mut message = use_signal(String::new);
    let mut files = use_signal(Vec::<FileInfo>::new);

    // Initial load of the stored draft
    {
        let channel_id = channel_id.clone();
        let root_id = root_id.clone();
        use_effect(move || {
            let channel_id = channel_id.clone();
            let root_id = root_id.clone();
            spawn(async move {
                match load_stored_draft(&channel_id, &root_id) {
                    Ok(Some((stored_message, stored_files))) => {
                        message.set(stored_message);
                        files.set(stored_files);
                    }
                    Ok(None) => {}
                    Err(e) => log::error!("Could not load draft: {}", e),
                }
            });
        });
    }

    // Pick up write-backs from transfer tasks
    {
        let channel_id = channel_id.clone();
        let root_id = root_id.clone();
        use_future(move || {
            let channel_id = channel_id.clone();
            let root_id = root_id.clone();
            async move {
                loop {
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    if let Ok(Some((_, stored_files))) = load_stored_draft(&channel_id, &root_id) {
                        if stored_files != files() {
                            files.set(stored_files);
                        }
                    }
                }
            }
        });
    }

    let attach_context = context.clone();
    let attach_channel = channel_id.clone();
    let attach_root = root_id.clone();
    let on_attach = move |evt: FormEvent| {
        for file in evt.files() {
            let path = file.path().to_string_lossy().into_owned();
            let context = attach_context.clone();
            let channel_id = attach_channel.clone();
            let root_id = attach_root.clone();
            spawn(async move {
                match attach_local_file(&context, &channel_id, &root_id, &path) {
                    Ok(file) => files.write().push(file),
                    Err(e) => log::error!("Could not attach {}: {}", path, e),
                }
            });
        }
    };

    let save_channel = channel_id.clone();
    let save_root = root_id.clone();
    let on_message_change = move |evt: FormEvent| {
        let text = evt.value();
        message.set(text.clone());
        let channel_id = save_channel.clone();
        let root_id = save_root.clone();
        spawn(async move {
            let result = database::init_database().and_then(|conn| {
                draft_service::save_draft(&conn, &channel_id, &root_id, &text, &files())
            });
            if let Err(e) = result {
                log::error!("Could not save draft: {}", e);
            }
        });
    };

    let send_channel = channel_id.clone();
    let send_root = root_id.clone();
    let on_send_click = move |_| {
        let text = message();
        let current = files();
        if text.trim().is_empty() && current.is_empty() {
            return;
        }
        on_send.call((text, current));
        message.set(String::new());
        files.set(Vec::new());

        let channel_id = send_channel.clone();
        let root_id = send_root.clone();
        spawn(async move {
            let result = database::init_database()
                .and_then(|conn| draft_service::delete_draft(&conn, &channel_id, &root_id));
            if let Err(e) = result {
                log::error!("Could not clear draft: {}", e);
            }
        });
    };

    rsx! {
        div {
            style: "padding: 12px; border-top: 1px solid #ddd; background: #fafafa;",

            if !files().is_empty() {
                div {
                    style: "display: flex; flex-wrap: wrap; margin-bottom: 8px;",
                    for file in files() {
                        UploadItem {
                            key: "{file.client_id}",
                            file: file.clone(),
                            channel_id: channel_id.clone(),
                            root_id: root_id.clone(),
                            on_remove: {
                                let channel_id = channel_id.clone();
                                let root_id = root_id.clone();
                                move |client_id: String| {
                                    let channel_id = channel_id.clone();
                                    let root_id = root_id.clone();
                                    spawn(async move {
                                        let result = database::init_database().and_then(|conn| {
                                            draft_service::remove_draft_file(
                                                &conn, &channel_id, &root_id, &client_id,
                                            )
                                        });
                                        if let Err(e) = result {
                                            log::error!("Could not remove attachment: {}", e);
                                        }
                                        files.write().retain(|f| f.client_id != client_id);
                                    });
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
                style: "display: flex; gap: 8px; align-items: flex-end;",
                label {
                    style: "padding: 10px; background: #ffffff; border: 1px solid #ccc; border-radius: 8px; cursor: pointer;",
                    "📎"
                    input {
                        r#type: "file",
                        multiple: true,
                        style: "display: none;",
                        onchange: on_attach,
                    }
                }
                textarea {
                    style: "flex: 1; min-height: 44px; padding: 10px; border: 1px solid #ccc; border-radius: 8px; resize: none; font-family: inherit;",
                    placeholder: "Write a message...",
                    value: "{message}",
                    onchange: on_message_change,
                }
                button {
                    style: "padding: 10px 18px; background: #1c58d9; color: white; border: none; border-radius: 8px; cursor: pointer; font-size: 14px;",
                    onclick: on_send_click,
                    "Send"
                }
            }
        }
    }
}

fn load_stored_draft(
    channel_id: &str,
    root_id: &str,
) -> Result<Option<(String, Vec<FileInfo>)>, AppError> {
    let conn = database::init_database()?;
    Ok(draft_service::load_draft(&conn, channel_id, root_id)?.map(|d| (d.message, d.files)))
}

/// Record a picked file in the draft and start its upload
fn attach_local_file(
    context: &UploadContext,
    channel_id: &str,
    root_id: &str,
    path: &str,
) -> Result<FileInfo, AppError> {
    let metadata = std::fs::metadata(path)?;
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();

    let file = FileInfo::new(path, &name, metadata.len());

    let conn = database::init_database()?;
    draft_service::add_draft_file(&conn, channel_id, root_id, &file)?;

    context.manager.prepare_upload(
        &context.server_url,
        file.clone(),
        channel_id,
        root_id,
        0,
        UpdateRoute::Draft(context.draft_store.clone()),
    );

    Ok(file)
}
